// gitmoji-wizard-core/src/lib.rs

// declare modules
pub mod config;
pub mod emojis;
pub mod flow;
pub mod git;
pub mod history;
pub mod message;
pub mod paths;
pub mod prompt;
pub mod sync;
pub mod testing;
pub mod ui;
pub mod wizard;

// re-export key structs/functions for the cli crate
pub use anyhow::{Context, Result};
pub use clap::Parser;
pub use console::style;

pub use crate::config::{COMMIT_FLAGS, Config, ConfigStore};
pub use crate::flow::{CommitSummary, Exit};
pub use crate::message::{CommitDetails, format_message};
pub use crate::paths::AppPaths;
pub use crate::prompt::{Prompter, TermPrompter};

use clap::{Args, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gitmoji-wizard",
    version,
    about = "interactive gitmoji commit messages, with history and multi-remote push"
)]
pub struct CoreCliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// commit staged files; use --add to pick files to stage if none is staged
    Commit(CommitArgs),

    /// configure gitmoji-wizard
    #[command(visible_alias = "setup")]
    Config {
        /// set a value without prompting, e.g. `--set skip_scope=true` (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// print version, file locations and the current configuration
    #[command(visible_alias = "version")]
    Info,

    /// run `commit` with the default flags and arguments from the configuration
    Start,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CommitArgs {
    /// path to the git repository
    #[arg(long, default_value = ".")]
    pub repo: String,

    /// interactively select files to stage if none is already staged
    #[arg(long)]
    pub add: bool,

    /// `git push` after the commit, asking which remotes to use when there are several
    #[arg(long)]
    pub push: bool,

    /// only print the formatted commit message
    #[arg(long)]
    pub dry: bool,

    /// remote to push to, skipping the remote selection (repeatable)
    #[arg(long, value_name = "NAME")]
    pub remote: Vec<String>,

    /// stay ready for another commit afterwards
    #[arg(long)]
    pub keep_alive: bool,

    /// conventional commit types with an emoji instead of gitmojis
    #[arg(long)]
    pub simple: bool,

    /// sign the commit with gpg, like `git commit -S`
    #[arg(long)]
    pub sign: bool,
}

impl Default for CommitArgs {
    fn default() -> Self {
        Self {
            repo: ".".to_string(),
            add: false,
            push: false,
            dry: false,
            remote: Vec::new(),
            keep_alive: false,
            simple: false,
            sign: false,
        }
    }
}

impl CommitArgs {
    fn flag(&self, name: &str) -> bool {
        match name {
            "add" => self.add,
            "dry" => self.dry,
            "keep-alive" => self.keep_alive,
            "push" => self.push,
            "sign" => self.sign,
            "simple" => self.simple,
            _ => false,
        }
    }

    /// the equivalent shell command, as printed by `start`
    pub fn command_line(&self) -> String {
        let mut cmd = format!("$ gitmoji-wizard commit --repo {}", self.repo);
        for flag in COMMIT_FLAGS.iter().filter(|flag| self.flag(flag)) {
            cmd.push_str(&format!(" --{flag}"));
        }
        for remote in &self.remote {
            cmd.push_str(&format!(" --remote {remote}"));
        }
        cmd
    }
}

/// run one command with the given prompter
pub fn execute(args: CoreCliArgs, prompter: &mut dyn Prompter) -> Result<Exit> {
    let paths = AppPaths::from_env();
    paths.ensure_root()?;

    match args.command {
        Commands::Commit(commit_args) => Ok(flow::commit(&commit_args, &paths, prompter)?.exit),
        Commands::Config { set } => flow::configure(&paths, prompter, &set),
        Commands::Info => flow::info(&paths),
        Commands::Start => Ok(flow::start(&paths, prompter)?.exit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn commit_flags_parse() {
        let args = CoreCliArgs::parse_from([
            "gitmoji-wizard",
            "commit",
            "--repo",
            "../project",
            "--push",
            "--remote",
            "origin",
            "--remote",
            "fork",
            "--keep-alive",
        ]);

        let Commands::Commit(commit) = args.command else {
            panic!("expected the commit command");
        };
        assert_eq!(commit.repo, "../project");
        assert_eq!(commit.remote, vec!["origin", "fork"]);
        assert!(commit.push && commit.keep_alive && !commit.add);
    }

    #[test]
    fn aliases_resolve() {
        assert!(matches!(
            CoreCliArgs::parse_from(["gitmoji-wizard", "setup", "--set", "skip_scope=true"]).command,
            Commands::Config { set } if set == vec!["skip_scope=true"]
        ));
        assert!(matches!(
            CoreCliArgs::parse_from(["gitmoji-wizard", "version"]).command,
            Commands::Info
        ));
    }

    #[test]
    fn commit_defaults_to_the_current_directory() {
        let args = CoreCliArgs::parse_from(["gitmoji-wizard", "commit"]);
        assert!(matches!(args.command, Commands::Commit(commit) if commit == CommitArgs::default()));
    }
}
