// command flows - what `commit`, `config`, `info` and `start` actually do

use anyhow::{Context, Result};
use console::style;

use crate::config::{COMMIT_FLAGS, Config, ConfigStore, DefaultCommitArgs, EmojiSet};
use crate::emojis::{EmojiCatalog, load_custom_emojis};
use crate::git::{FileStatus, GitRepo};
use crate::history::HistoryStore;
use crate::message::format_message;
use crate::paths::{AppPaths, resolve_path};
use crate::prompt::{Prompter, Recovery};
use crate::sync::{self, DivergenceReport, RemoteOps};
use crate::ui;
use crate::wizard::{CommitWizard, WizardOutcome, WizardSettings};
use crate::CommitArgs;

/// how a command ended, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failure,
}

impl Exit {
    pub fn code(&self) -> i32 {
        match self {
            Exit::Success => 0,
            Exit::Failure => 1,
        }
    }
}

/// what a `commit` run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub exit: Exit,
    /// message printed by a dry run
    pub preview: Option<String>,
    /// messages committed, in order
    pub committed: Vec<String>,
}

impl CommitSummary {
    fn new() -> Self {
        Self {
            exit: Exit::Success,
            preview: None,
            committed: Vec::new(),
        }
    }

    fn with_exit(mut self, exit: Exit) -> Self {
        self.exit = exit;
        self
    }
}

/// choices of the keep-alive menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    CommitAgain,
    PushThenCommit,
    SyncThenCommit,
    Quit,
}

impl NextAction {
    fn label(&self) -> &'static str {
        match self {
            NextAction::CommitAgain => "commit again",
            NextAction::PushThenCommit => "push and commit again",
            NextAction::SyncThenCommit => "sync (pull then push) and commit again",
            NextAction::Quit => "quit gitmoji-wizard",
        }
    }

    /// actions offered for the given remotes; sync needs a remote with the branch
    fn offered(divergence: Option<&DivergenceReport>) -> Vec<NextAction> {
        let mut actions = vec![NextAction::CommitAgain];
        if let Some(report) = divergence {
            if !report.remotes.is_empty() {
                actions.push(NextAction::PushThenCommit);
            }
            if report.any_remote_branch() {
                actions.push(NextAction::SyncThenCommit);
            }
        }
        actions.push(NextAction::Quit);
        actions
    }
}

/// what the commit loop does next
enum Step {
    Again,
    Stop,
}

/// the keep-alive menu: push or sync as often as asked, then commit again or quit
fn should_commit_again(
    repo: &dyn RemoteOps,
    prompter: &mut dyn Prompter,
    remotes: &[String],
) -> Result<bool> {
    loop {
        println!("\n{}", ui::terminal_separator(10));
        println!("\n🔄 {}\n", style("ready to commit again.").underlined());

        let divergence = match DivergenceReport::collect(repo) {
            Ok(report) => Some(report),
            Err(e) => {
                println!("{}", style(format!("could not compare with remotes: {e:#}")).dim());
                None
            }
        };
        if let Some(banner) = divergence.as_ref().map(DivergenceReport::format) {
            if !banner.is_empty() {
                println!("{banner}\n");
            }
        }

        let actions = NextAction::offered(divergence.as_ref());
        let labels: Vec<String> = actions.iter().map(|a| a.label().to_string()).collect();
        let action = prompter
            .select("what do you want to do now?", &labels)?
            .and_then(|index| actions.get(index).copied())
            .unwrap_or(NextAction::Quit);

        match action {
            NextAction::CommitAgain => {
                println!();
                return Ok(true);
            }
            NextAction::Quit => return Ok(false),
            NextAction::PushThenCommit => {
                println!();
                sync::push(repo, prompter, remotes)?;
            }
            NextAction::SyncThenCommit => {
                println!();
                sync::pull(repo, prompter, remotes)?;
                sync::push(repo, prompter, remotes)?;
            }
        }
    }
}

fn keep_going(
    args: &CommitArgs,
    repo: &GitRepo,
    prompter: &mut dyn Prompter,
) -> Result<Step> {
    if args.keep_alive && should_commit_again(repo, prompter, &args.remote)? {
        Ok(Step::Again)
    } else {
        Ok(Step::Stop)
    }
}

/// files offered by `--add`, with their state
fn addable_files(status: &FileStatus) -> Vec<(String, &'static str)> {
    status
        .unstaged
        .iter()
        .map(|path| (path.clone(), "unstaged"))
        .chain(status.untracked.iter().map(|path| (path.clone(), "untracked")))
        .collect()
}

/// the `commit` command: stage, run the wizard, commit, push, maybe loop
pub fn commit(
    args: &CommitArgs,
    paths: &AppPaths,
    prompter: &mut dyn Prompter,
) -> Result<CommitSummary> {
    let config = ConfigStore::new(paths.config()).load()?;
    let mut history = if config.enable_history {
        HistoryStore::load(paths.history())
    } else {
        HistoryStore::disabled()
    };
    let catalog = EmojiCatalog::new(config.emoji_set, &load_custom_emojis(&paths.custom_emojis()));
    let settings = WizardSettings::from_config(&config, args.simple);

    let mut summary = CommitSummary::new();

    loop {
        let repo_path = resolve_path(&args.repo);
        let repo = match GitRepo::open(&repo_path) {
            Ok(repo) => Some(repo),
            Err(e) if args.dry => {
                ui::warn(&format!("{e}, continuing the dry run without it."));
                None
            }
            Err(e) => {
                ui::error(&e.to_string());
                return Ok(summary.with_exit(Exit::Failure));
            }
        };

        let status = match &repo {
            Some(repo) => repo.file_status()?,
            None => FileStatus::default(),
        };

        let mut to_add: Vec<String> = Vec::new();
        if let Some(repo) = repo.as_ref().filter(|_| !args.dry) {
            if status.is_empty() {
                ui::warn("nothing to commit.");
                match keep_going(args, repo, prompter)? {
                    Step::Again => continue,
                    Step::Stop => break,
                }
            }

            if status.staged.is_empty() && !args.add {
                ui::warn(&format!(
                    "\nno staged files. stage files yourself or use {} to pick unstaged files.\n",
                    style("--add").bold()
                ));
                return Ok(summary.with_exit(Exit::Failure));
            }
            if !args.remote.is_empty() && !args.push {
                ui::warn("\nignoring --remote flag because --push is not set\n");
            }

            if status.staged.is_empty() {
                let files = addable_files(&status);
                let labels: Vec<String> = files
                    .iter()
                    .map(|(path, state)| format!("{path} ({state})"))
                    .collect();
                let checked = vec![true; files.len()];

                match prompter.multi_select("select files to add for the commit", &labels, &checked)? {
                    None => match prompter.restart_or_quit()? {
                        Recovery::Restart => continue,
                        Recovery::Quit => break,
                    },
                    Some(picks) if picks.is_empty() => {
                        ui::warn("no file selected, nothing to commit.");
                        match keep_going(args, repo, prompter)? {
                            Step::Again => continue,
                            Step::Stop => break,
                        }
                    }
                    Some(picks) => {
                        to_add = picks
                            .into_iter()
                            .filter_map(|i| files.get(i).map(|(path, _)| path.clone()))
                            .collect();
                    }
                }
            } else if args.add {
                ui::warn("ignoring --add flag because the stage is not empty.\n");
            }

            if to_add.is_empty() {
                ui::print_staged_files(&status.staged);
            } else {
                ui::print_staged_files(&to_add);
            }
        }

        println!("\n{}", style("commit details:").green().underlined());
        println!(
            "ℹ️  {}\n",
            style("press ctrl+c to go back to the previous step").dim()
        );

        let choices = if args.simple {
            EmojiCatalog::conventional_choices()
        } else {
            catalog.choices(&history)
        };
        let outcome = CommitWizard::new(settings, &choices, &history).run(prompter)?;
        let details = match outcome {
            WizardOutcome::Completed(details) => details,
            WizardOutcome::Restarted => continue,
            WizardOutcome::Quit => break,
        };
        let message = format_message(&details);

        if args.dry {
            println!("\nformatted commit:\n```");
            println!("{message}");
            println!("```");
            summary.preview = Some(message);
            return Ok(summary);
        }

        let repo = repo.context("repository missing outside of a dry run")?;
        for path in &to_add {
            repo.stage(path)?;
        }

        if config.enable_history {
            history.record(&details)?;
        }

        repo.commit(&message, args.sign)?;
        println!(
            "{} {}",
            style("✅ committed:").green().bold(),
            style(&details.title).green()
        );
        summary.committed.push(message);

        if args.push {
            sync::push(&repo, prompter, &args.remote)?;
        }

        match keep_going(args, &repo, prompter)? {
            Step::Again => continue,
            Step::Stop => break,
        }
    }

    println!("\ndone 🥳\n");
    Ok(summary)
}

fn toggle_label(key: &str) -> &'static str {
    match key {
        "skip_scope" => "skip commit scope",
        "skip_message" => "skip commit message",
        "capitalize_title" => "capitalize commit title",
        _ => "remember commit history for auto-complete and emoji sorting",
    }
}

/// the `config` command; `assignments` (`KEY=VALUE`) skip the prompts
pub fn configure(
    paths: &AppPaths,
    prompter: &mut dyn Prompter,
    assignments: &[String],
) -> Result<Exit> {
    let store = ConfigStore::new(paths.config());
    if !assignments.is_empty() {
        store.apply(assignments)?;
        return Ok(Exit::Success);
    }

    let current = store.load()?;
    let Some(updated) = ask_config(&current, paths, prompter)? else {
        ui::warn("configuration cancelled, nothing was saved.");
        return Ok(Exit::Success);
    };
    store.save(&updated)?;
    Ok(Exit::Success)
}

/// ask every config value in turn; `None` when a prompt is interrupted
fn ask_config(
    current: &Config,
    paths: &AppPaths,
    prompter: &mut dyn Prompter,
) -> Result<Option<Config>> {
    println!(
        "{}",
        style(format!(
            "config will be saved in {}",
            paths.config().display()
        ))
        .dim()
    );

    let toggles = [
        ("skip_scope", current.skip_scope),
        ("skip_message", current.skip_message),
        ("capitalize_title", current.capitalize_title),
        ("enable_history", current.enable_history),
    ];
    let labels: Vec<String> = toggles
        .iter()
        .map(|(key, _)| toggle_label(key).to_string())
        .collect();
    let checked: Vec<bool> = toggles.iter().map(|(_, value)| *value).collect();
    let Some(enabled) = prompter.multi_select("configure gitmoji-wizard", &labels, &checked)?
    else {
        return Ok(None);
    };
    let on = |index: usize| enabled.contains(&index);

    let sets: Vec<String> = EmojiSet::ALL.iter().map(|s| s.to_string()).collect();
    let Some(set_index) = prompter.select("emoji set to use for commits", &sets)? else {
        return Ok(None);
    };

    let flags: Vec<String> = COMMIT_FLAGS.iter().map(|f| f.to_string()).collect();
    let checked: Vec<bool> = flags
        .iter()
        .map(|f| current.default_commit_flags.contains(f))
        .collect();
    let Some(picked_flags) =
        prompter.multi_select("default commit flags used by `start`", &flags, &checked)?
    else {
        return Ok(None);
    };

    let defaults = &current.default_commit_args;
    let Some(repo) = prompter.input("repo (path to the git repository)", &defaults.repo)? else {
        return Ok(None);
    };
    let Some(remote) = prompter.input(
        "remote (comma-separated list of remotes to push to)",
        &defaults.remote,
    )?
    else {
        return Ok(None);
    };

    Ok(Some(Config {
        skip_scope: on(0),
        skip_message: on(1),
        capitalize_title: on(2),
        enable_history: on(3),
        emoji_set: EmojiSet::ALL.get(set_index).copied().unwrap_or_default(),
        default_commit_flags: picked_flags
            .into_iter()
            .filter_map(|i| flags.get(i).cloned())
            .collect(),
        default_commit_args: DefaultCommitArgs { repo, remote },
    }))
}

/// the `info` command
pub fn info(paths: &AppPaths) -> Result<Exit> {
    println!("\n{}", style("gitmoji-wizard info:").green().bold().underlined());
    println!("  version      : {}", env!("CARGO_PKG_VERSION"));
    println!("  app path     : {}", paths.root().display());
    if paths.history().exists() {
        println!("  history      : {}", paths.history().display());
    }
    println!("  config       : {}", paths.config().display());
    println!("  custom emojis: {}", paths.custom_emojis().display());

    let config = ConfigStore::new(paths.config()).load()?;
    let entries = config.entries();
    let width = entries.iter().map(|(key, _)| key.len()).max().unwrap_or_default();

    println!("\n{}", style("current configuration:").blue().bold().underlined());
    for (key, value) in entries {
        println!("  {key:width$}: {value}");
    }
    println!();
    Ok(Exit::Success)
}

/// the `commit` arguments `start` replays from the config
pub fn start_args(config: &Config) -> CommitArgs {
    let has = |flag: &str| config.default_commit_flags.iter().any(|f| f == flag);
    let push = has("push");
    CommitArgs {
        repo: config.default_commit_args.repo.clone(),
        add: has("add"),
        push,
        dry: has("dry"),
        remote: if push {
            config.default_commit_args.remotes()
        } else {
            Vec::new()
        },
        keep_alive: has("keep-alive"),
        simple: has("simple"),
        sign: has("sign"),
    }
}

/// the `start` command: `commit` with the configured defaults
pub fn start(paths: &AppPaths, prompter: &mut dyn Prompter) -> Result<CommitSummary> {
    let store = ConfigStore::new(paths.config());
    if !store.has_key("default_commit_args")? {
        configure(paths, prompter, &[])?;
    }
    let args = start_args(&store.load()?);

    println!(
        "{} {}",
        style("running:").blue().bold(),
        args.command_line()
    );
    println!("\n{}\n", ui::terminal_separator(10));

    commit(&args, paths, prompter)
}
