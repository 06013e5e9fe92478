// remote sync - push/pull the current branch across one or more remotes

use anyhow::Result;
use console::style;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::git::{GitError, GitRepo};
use crate::prompt::Prompter;
use crate::ui;

/// git text identifying a push refused for lack of an upstream branch
const NO_UPSTREAM_MARKER: &str = "has no upstream branch";

/// the repository operations remote syncing needs
pub trait RemoteOps {
    /// remote names in the repository's order
    fn remote_names(&self) -> Result<Vec<String>>;
    fn current_branch(&self) -> Result<String>;
    fn fetch(&self, remote: &str) -> Result<(), GitError>;
    fn has_remote_branch(&self, remote: &str, branch: &str) -> bool;
    /// `(ahead, behind)`, `None` when `remote/branch` does not exist
    fn ahead_behind(&self, remote: &str, branch: &str) -> Result<Option<(usize, usize)>>;
    fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<(), GitError>;
    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError>;
}

impl RemoteOps for GitRepo {
    fn remote_names(&self) -> Result<Vec<String>> {
        GitRepo::remote_names(self)
    }

    fn current_branch(&self) -> Result<String> {
        GitRepo::current_branch(self)
    }

    fn fetch(&self, remote: &str) -> Result<(), GitError> {
        GitRepo::fetch(self, remote)
    }

    fn has_remote_branch(&self, remote: &str, branch: &str) -> bool {
        GitRepo::has_remote_branch(self, remote, branch)
    }

    fn ahead_behind(&self, remote: &str, branch: &str) -> Result<Option<(usize, usize)>> {
        GitRepo::ahead_behind(self, remote, branch)
    }

    fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<(), GitError> {
        GitRepo::push(self, remote, branch, set_upstream)
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        GitRepo::pull(self, remote, branch)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no remote selected")]
    NoRemoteSelected,
    #[error("{remote} has no upstream branch: {detail}")]
    MissingUpstream { remote: String, detail: String },
    #[error("could not {action} {remote}: {detail}")]
    Command {
        remote: String,
        action: &'static str,
        detail: String,
    },
}

/// whether remotes are pushed to or pulled from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Push,
    Pull,
}

impl Direction {
    fn verb(&self) -> &'static str {
        match self {
            Direction::Push => "push",
            Direction::Pull => "pull",
        }
    }

    fn preposition(&self) -> &'static str {
        match self {
            Direction::Push => "push to",
            Direction::Pull => "pull from",
        }
    }
}

/// remotes chosen for one push or pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    NoRemote,
    Remotes(BTreeSet<String>),
}

/// choose the remotes to sync with.
///
/// a single remote is used without asking; with several, `cli_names` wins
/// over the interactive multi-select, whose empty answer aborts.
pub fn select_remotes(
    all: &[String],
    cli_names: &[String],
    prompter: &mut dyn Prompter,
    direction: Direction,
) -> Result<Selection> {
    match all {
        [] => Ok(Selection::NoRemote),
        [only] => Ok(Selection::Remotes(BTreeSet::from([only.clone()]))),
        _ if !cli_names.is_empty() => Ok(Selection::Remotes(cli_names.iter().cloned().collect())),
        _ => {
            let message = format!("select remotes to {}:", direction.preposition());
            let checked = vec![true; all.len()];
            let picked = prompter
                .multi_select(&message, all, &checked)?
                .unwrap_or_default();
            if picked.is_empty() {
                ui::warn("no remote selected. aborting.");
                return Err(SyncError::NoRemoteSelected.into());
            }
            Ok(Selection::Remotes(
                picked.into_iter().filter_map(|i| all.get(i).cloned()).collect(),
            ))
        }
    }
}

/// fetch the given remotes, then report which ones have `remote/branch`.
///
/// a failed fetch is reported and the remote's existing refs are used as is.
pub fn compute_upstream_status(
    repo: &dyn RemoteOps,
    remotes: &[String],
    branch: &str,
) -> BTreeMap<String, bool> {
    let spinner = ui::spinner("fetching remotes...".to_string());
    let mut failures = Vec::new();
    for remote in remotes {
        if let Err(e) = repo.fetch(remote) {
            failures.push((remote.clone(), e.detail()));
        }
    }
    spinner.finish_and_clear();

    for (remote, detail) in failures {
        ui::warn(&format!("could not fetch {remote}: {detail}"));
    }

    remotes
        .iter()
        .map(|remote| (remote.clone(), repo.has_remote_branch(remote, branch)))
        .collect()
}

/// what happened to one remote
#[derive(Debug)]
pub enum RemoteOutcome {
    Synced { upstream_created: bool },
    Skipped,
    Failed(SyncError),
}

#[derive(Debug)]
pub struct RemoteReport {
    pub remote: String,
    pub outcome: RemoteOutcome,
}

/// push the current branch to the selected remotes, one after the other
pub fn push(
    repo: &dyn RemoteOps,
    prompter: &mut dyn Prompter,
    cli_names: &[String],
) -> Result<Vec<RemoteReport>> {
    sync(repo, prompter, cli_names, Direction::Push)
}

/// pull the current branch from the selected remotes, one after the other
pub fn pull(
    repo: &dyn RemoteOps,
    prompter: &mut dyn Prompter,
    cli_names: &[String],
) -> Result<Vec<RemoteReport>> {
    sync(repo, prompter, cli_names, Direction::Pull)
}

fn sync(
    repo: &dyn RemoteOps,
    prompter: &mut dyn Prompter,
    cli_names: &[String],
    direction: Direction,
) -> Result<Vec<RemoteReport>> {
    let all = repo.remote_names()?;
    let selected = match select_remotes(&all, cli_names, prompter, direction)? {
        Selection::NoRemote => {
            ui::warn(&format!("no remote found. ignoring {}.", direction.verb()));
            return Ok(Vec::new());
        }
        Selection::Remotes(selected) => selected,
    };

    for unknown in selected.iter().filter(|r| !all.contains(*r)) {
        ui::warn(&format!("unknown remote {unknown}, skipping."));
    }
    // repository order, so output does not depend on how remotes were picked
    let targets: Vec<String> = all
        .iter()
        .filter(|r| selected.contains(*r))
        .cloned()
        .collect();

    let branch = repo.current_branch()?;
    let upstreams = compute_upstream_status(repo, &targets, &branch);

    let mut reports = Vec::new();
    for remote in &targets {
        let has_upstream = upstreams.get(remote).copied().unwrap_or(false);
        let outcome = match direction {
            Direction::Push => push_one(repo, prompter, remote, &branch, has_upstream)?,
            Direction::Pull => pull_one(repo, remote, &branch, has_upstream),
        };
        reports.push(RemoteReport {
            remote: remote.clone(),
            outcome,
        });
    }
    Ok(reports)
}

fn push_one(
    repo: &dyn RemoteOps,
    prompter: &mut dyn Prompter,
    remote: &str,
    branch: &str,
    has_upstream: bool,
) -> Result<RemoteOutcome> {
    let mut set_upstream = false;
    if !has_upstream {
        let question =
            format!("'{remote}' does not have a branch named '{branch}'. create upstream branch?");
        set_upstream = prompter.confirm(&question, true)?.unwrap_or(false);
        if !set_upstream {
            ui::warn(&format!("skipping remote {remote}."));
            return Ok(RemoteOutcome::Skipped);
        }
    }

    let spinner = ui::spinner(format!("pushing to remote {remote}..."));
    let result = repo.push(remote, branch, set_upstream);
    spinner.finish_and_clear();

    Ok(match result {
        Ok(()) => {
            let created = if set_upstream {
                " (upstream branch created)"
            } else {
                ""
            };
            println!(
                "{}",
                style(format!("pushed to remote {remote}{created}")).blue().bold()
            );
            RemoteOutcome::Synced {
                upstream_created: set_upstream,
            }
        }
        Err(e) => RemoteOutcome::Failed(report_failure(remote, Direction::Push, &e)),
    })
}

fn pull_one(repo: &dyn RemoteOps, remote: &str, branch: &str, has_upstream: bool) -> RemoteOutcome {
    if !has_upstream {
        ui::warn(&format!(
            "skipping remote {remote}: it does not have a branch named '{branch}'."
        ));
        return RemoteOutcome::Skipped;
    }

    let spinner = ui::spinner(format!("pulling from remote {remote}..."));
    let result = repo.pull(remote, branch);
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            println!(
                "{}",
                style(format!("pulled from remote {remote}")).blue().bold()
            );
            RemoteOutcome::Synced {
                upstream_created: false,
            }
        }
        Err(e) => RemoteOutcome::Failed(report_failure(remote, Direction::Pull, &e)),
    }
}

/// print a remote failure and classify it
fn report_failure(remote: &str, direction: Direction, error: &GitError) -> SyncError {
    let detail = error.detail();
    eprintln!(
        "{} could not {} {remote}:",
        style("error:").red().bold(),
        direction.preposition()
    );
    eprintln!("{}", style(&detail).red());

    if direction == Direction::Push && detail.contains(NO_UPSTREAM_MARKER) {
        SyncError::MissingUpstream {
            remote: remote.to_string(),
            detail,
        }
    } else {
        SyncError::Command {
            remote: remote.to_string(),
            action: direction.preposition(),
            detail,
        }
    }
}

/// how the local branch compares to one remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDivergence {
    Tracked { ahead: usize, behind: usize },
    MissingBranch,
}

/// divergence of the current branch against every remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceReport {
    pub branch: String,
    pub remotes: Vec<(String, RemoteDivergence)>,
}

impl DivergenceReport {
    pub fn collect(repo: &dyn RemoteOps) -> Result<Self> {
        let branch = repo.current_branch()?;
        let mut remotes = Vec::new();
        for remote in repo.remote_names()? {
            let divergence = match repo.ahead_behind(&remote, &branch)? {
                Some((ahead, behind)) => RemoteDivergence::Tracked { ahead, behind },
                None => RemoteDivergence::MissingBranch,
            };
            remotes.push((remote, divergence));
        }
        Ok(Self { branch, remotes })
    }

    pub fn is_in_sync(&self) -> bool {
        self.remotes.iter().all(|(_, divergence)| {
            matches!(divergence, RemoteDivergence::Tracked { ahead: 0, behind: 0 })
        })
    }

    /// whether at least one remote has the current branch
    pub fn any_remote_branch(&self) -> bool {
        self.remotes
            .iter()
            .any(|(_, divergence)| matches!(divergence, RemoteDivergence::Tracked { .. }))
    }

    /// one line per remote that is ahead, behind or missing the branch;
    /// empty when everything is in sync
    pub fn format(&self) -> String {
        if self.is_in_sync() {
            return String::new();
        }

        let mut lines = vec![style("remotes diff:").green().underlined().to_string()];
        for (remote, divergence) in &self.remotes {
            match divergence {
                RemoteDivergence::MissingBranch => lines.push(
                    style(format!(
                        "{remote} does not have a branch named '{}'",
                        self.branch
                    ))
                    .yellow()
                    .to_string(),
                ),
                RemoteDivergence::Tracked { ahead, behind } => {
                    if *behind > 0 {
                        lines.push(
                            style(format!("behind {remote} by {behind} commit(s)"))
                                .color256(208)
                                .to_string(),
                        );
                    }
                    if *ahead > 0 {
                        lines.push(
                            style(format!("ahead {remote} by {ahead} commit(s)"))
                                .magenta()
                                .to_string(),
                        );
                    }
                }
            }
        }
        lines.join("\n")
    }
}

/// the divergence banner for the current branch, empty when in sync
pub fn format_remote_divergence(repo: &dyn RemoteOps) -> Result<String> {
    Ok(DivergenceReport::collect(repo)?.format())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::{Answer, ScriptedPrompter};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    pub(crate) struct FakeRemotes {
        remotes: Vec<String>,
        /// remotes having `remote/main`, with `(ahead, behind)`
        tracking: HashMap<String, (usize, usize)>,
        /// stderr returned when pushing/pulling these remotes
        failing: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRemotes {
        pub(crate) fn new(remotes: &[&str]) -> Self {
            Self {
                remotes: remotes.iter().map(|r| r.to_string()).collect(),
                ..Self::default()
            }
        }

        pub(crate) fn tracked(mut self, remote: &str, ahead: usize, behind: usize) -> Self {
            self.tracking.insert(remote.to_string(), (ahead, behind));
            self
        }

        pub(crate) fn failing(mut self, remote: &str, stderr: &str) -> Self {
            self.failing.insert(remote.to_string(), stderr.to_string());
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn outcome(&self, remote: &str) -> Result<(), GitError> {
            match self.failing.get(remote) {
                Some(stderr) => Err(GitError::Command {
                    args: remote.to_string(),
                    stderr: stderr.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    impl RemoteOps for FakeRemotes {
        fn remote_names(&self) -> Result<Vec<String>> {
            Ok(self.remotes.clone())
        }

        fn current_branch(&self) -> Result<String> {
            Ok("main".to_string())
        }

        fn fetch(&self, remote: &str) -> Result<(), GitError> {
            self.calls.borrow_mut().push(format!("fetch {remote}"));
            Ok(())
        }

        fn has_remote_branch(&self, remote: &str, _branch: &str) -> bool {
            self.tracking.contains_key(remote)
        }

        fn ahead_behind(&self, remote: &str, _branch: &str) -> Result<Option<(usize, usize)>> {
            Ok(self.tracking.get(remote).copied())
        }

        fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<(), GitError> {
            let flag = if set_upstream { " --set-upstream" } else { "" };
            self.calls
                .borrow_mut()
                .push(format!("push{flag} {remote} {branch}"));
            self.outcome(remote)
        }

        fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError> {
            self.calls.borrow_mut().push(format!("pull {remote} {branch}"));
            self.outcome(remote)
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn no_remote_means_nothing_to_select() {
        let mut prompter = ScriptedPrompter::default();
        let selection = select_remotes(&[], &names(&["origin"]), &mut prompter, Direction::Push);
        assert_eq!(selection.unwrap(), Selection::NoRemote);
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn single_remote_is_used_without_prompting() {
        let mut prompter = ScriptedPrompter::default();
        let selection = select_remotes(
            &names(&["origin"]),
            &names(&["fork"]),
            &mut prompter,
            Direction::Push,
        )
        .unwrap();

        assert_eq!(
            selection,
            Selection::Remotes(BTreeSet::from(["origin".to_string()]))
        );
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn cli_names_are_used_verbatim() {
        let mut prompter = ScriptedPrompter::default();
        let selection = select_remotes(
            &names(&["origin", "fork"]),
            &names(&["fork", "nope"]),
            &mut prompter,
            Direction::Push,
        )
        .unwrap();

        assert_eq!(
            selection,
            Selection::Remotes(BTreeSet::from(["fork".to_string(), "nope".to_string()]))
        );
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn interactive_selection_picks_by_index() {
        let mut prompter = ScriptedPrompter::new([Answer::Picks(vec![1])]);
        let selection = select_remotes(
            &names(&["origin", "fork"]),
            &[],
            &mut prompter,
            Direction::Pull,
        )
        .unwrap();

        assert_eq!(
            selection,
            Selection::Remotes(BTreeSet::from(["fork".to_string()]))
        );
        assert_eq!(prompter.asked(), ["select remotes to pull from:"]);
    }

    #[test]
    fn empty_interactive_selection_aborts() {
        let mut prompter = ScriptedPrompter::new([Answer::Picks(vec![])]);
        let err = select_remotes(
            &names(&["origin", "fork"]),
            &[],
            &mut prompter,
            Direction::Push,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::NoRemoteSelected)
        ));
    }

    #[test]
    fn declined_upstream_skips_only_the_selected_remote() {
        let repo = FakeRemotes::new(&["origin", "fork"]).tracked("origin", 0, 0);
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(false)]);

        let reports = push(&repo, &mut prompter, &names(&["fork"])).unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].remote, "fork");
        assert!(matches!(reports[0].outcome, RemoteOutcome::Skipped));
        assert_eq!(repo.calls(), vec!["fetch fork"]);
        assert!(!repo.calls().iter().any(|call| call.contains("origin")));
    }

    #[test]
    fn accepted_upstream_pushes_with_set_upstream() {
        let repo = FakeRemotes::new(&["origin", "fork"]).tracked("origin", 1, 0);
        let mut prompter = ScriptedPrompter::new([Answer::Picks(vec![0, 1]), Answer::Confirm(true)]);

        let reports = push(&repo, &mut prompter, &[]).unwrap();

        assert_eq!(
            repo.calls(),
            vec![
                "fetch origin",
                "fetch fork",
                "push origin main",
                "push --set-upstream fork main",
            ]
        );
        assert!(matches!(
            reports[1].outcome,
            RemoteOutcome::Synced {
                upstream_created: true
            }
        ));
    }

    #[test]
    fn unknown_cli_names_are_neither_fetched_nor_pushed() {
        let repo = FakeRemotes::new(&["origin", "fork"])
            .tracked("origin", 1, 0)
            .tracked("fork", 1, 0);
        let mut prompter = ScriptedPrompter::default();

        let reports = push(&repo, &mut prompter, &names(&["nope", "fork", "origin"])).unwrap();

        let pushed: Vec<&str> = reports.iter().map(|r| r.remote.as_str()).collect();
        assert_eq!(pushed, vec!["origin", "fork"]);
        assert_eq!(
            repo.calls(),
            vec![
                "fetch origin",
                "fetch fork",
                "push origin main",
                "push fork main",
            ]
        );
    }

    #[test]
    fn one_failing_remote_does_not_stop_the_others() {
        let repo = FakeRemotes::new(&["fork", "origin"])
            .tracked("fork", 1, 0)
            .tracked("origin", 1, 0)
            .failing("fork", "remote: permission denied");
        let mut prompter = ScriptedPrompter::default();

        let reports = push(&repo, &mut prompter, &names(&["fork", "origin"])).unwrap();

        assert!(matches!(
            &reports[0].outcome,
            RemoteOutcome::Failed(SyncError::Command { remote, .. }) if remote == "fork"
        ));
        assert!(matches!(reports[1].outcome, RemoteOutcome::Synced { .. }));
    }

    #[test]
    fn missing_upstream_is_recognised_from_git_output() {
        let repo = FakeRemotes::new(&["origin"])
            .tracked("origin", 1, 0)
            .failing("origin", "fatal: The current branch main has no upstream branch.");
        let mut prompter = ScriptedPrompter::default();

        let reports = push(&repo, &mut prompter, &[]).unwrap();
        assert!(matches!(
            reports[0].outcome,
            RemoteOutcome::Failed(SyncError::MissingUpstream { .. })
        ));
    }

    #[test]
    fn pull_skips_remotes_without_the_branch() {
        let repo = FakeRemotes::new(&["fork", "origin"]).tracked("origin", 0, 2);
        let mut prompter = ScriptedPrompter::default();

        let reports = pull(&repo, &mut prompter, &names(&["fork", "origin"])).unwrap();

        assert!(matches!(reports[0].outcome, RemoteOutcome::Skipped));
        assert!(matches!(reports[1].outcome, RemoteOutcome::Synced { .. }));
        assert_eq!(
            repo.calls(),
            vec!["fetch fork", "fetch origin", "pull origin main"]
        );
    }

    #[test]
    fn push_without_remotes_is_a_no_op() {
        let repo = FakeRemotes::new(&[]);
        let mut prompter = ScriptedPrompter::default();
        assert!(push(&repo, &mut prompter, &[]).unwrap().is_empty());
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn divergence_is_empty_when_in_sync() {
        let repo = FakeRemotes::new(&["origin", "fork"])
            .tracked("origin", 0, 0)
            .tracked("fork", 0, 0);
        assert_eq!(format_remote_divergence(&repo).unwrap(), "");
    }

    #[test]
    fn divergence_names_diverging_remotes() {
        let repo = FakeRemotes::new(&["origin", "fork", "mirror"])
            .tracked("origin", 2, 0)
            .tracked("fork", 0, 3);
        let banner = format_remote_divergence(&repo).unwrap();

        assert!(banner.contains("ahead origin by 2 commit(s)"));
        assert!(banner.contains("behind fork by 3 commit(s)"));
        assert!(banner.contains("mirror does not have a branch named 'main'"));
    }

    #[test]
    fn missing_branch_alone_is_reported() {
        let repo = FakeRemotes::new(&["origin"]);
        let report = DivergenceReport::collect(&repo).unwrap();

        assert!(!report.is_in_sync());
        assert!(!report.any_remote_branch());
        assert!(report.format().contains("origin"));
    }
}
