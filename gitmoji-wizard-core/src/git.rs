use anyhow::{Context, Result, bail};
use git2::{BranchType, Commit, ErrorCode, Repository, Status, StatusOptions};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use which::which;

/// failures of the git binding that callers tell apart
#[derive(Debug, Error)]
pub enum GitError {
    #[error("{} is not a valid git repository", .0.display())]
    NotARepository(PathBuf),
    #[error("git executable not found in PATH")]
    GitNotFound,
    #[error("`git {args}` failed: {stderr}")]
    Command { args: String, stderr: String },
    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// text of the underlying git error, as shown to the user
    pub fn detail(&self) -> String {
        match self {
            GitError::Command { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}

/// working tree files split by state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStatus {
    pub staged: BTreeSet<String>,
    pub unstaged: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
}

impl FileStatus {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

const STAGED: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const UNSTAGED: Status = Status::WT_MODIFIED
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);

/// a git repository: local operations through git2, network ones through the
/// `git` binary, which already knows the user's credentials and ssh setup
pub struct GitRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl GitRepo {
    /// open the repository containing `path`
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(path)
            .map_err(|_| GitError::NotARepository(path.to_path_buf()))?;
        let workdir = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        Ok(Self { repo, workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// staged, unstaged and untracked files
    pub fn file_status(&self) -> Result<FileStatus> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .context("failed to read repository status")?;

        let mut status = FileStatus::default();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let flags = entry.status();
            if flags.intersects(STAGED) {
                status.staged.insert(path.to_string());
            }
            if flags.intersects(UNSTAGED) {
                status.unstaged.insert(path.to_string());
            }
            if flags.contains(Status::WT_NEW) {
                status.untracked.insert(path.to_string());
            }
        }
        Ok(status)
    }

    /// stage one path; a deleted file is removed from the index
    pub fn stage(&self, path: &str) -> Result<()> {
        let mut index = self.repo.index().context("failed to open the index")?;
        if self.workdir.join(path).exists() {
            index
                .add_path(Path::new(path))
                .with_context(|| format!("failed to stage {path}"))?;
        } else {
            index
                .remove_path(Path::new(path))
                .with_context(|| format!("failed to stage removal of {path}"))?;
        }
        index.write().context("failed to write the index")
    }

    /// commit the index; signing goes through `git commit -S` so gpg is set up as usual
    pub fn commit(&self, message: &str, sign: bool) -> Result<()> {
        if sign {
            self.run_git(&["commit", "-S", "-m", message])?;
            return Ok(());
        }

        let mut index = self.repo.index().context("failed to open the index")?;
        let tree_id = index.write_tree().context("failed to write tree")?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self
            .repo
            .signature()
            .context("git user.name and user.email must be configured")?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(e).context("failed to resolve HEAD"),
        };
        let parents: Vec<&Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .context("failed to create commit")?;
        Ok(())
    }

    /// name of the checked out branch, also for a repository without commits
    pub fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) => {
                if !head.is_branch() {
                    bail!("HEAD is detached, check out a branch first");
                }
                head.shorthand()
                    .map(str::to_string)
                    .context("branch name is not valid utf-8")
            }
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
                    .context("failed to resolve the unborn branch name")
            }
            Err(e) => Err(e).context("failed to resolve HEAD"),
        }
    }

    /// configured remotes, in the repository's order
    pub fn remote_names(&self) -> Result<Vec<String>> {
        let remotes = self.repo.remotes().context("failed to list remotes")?;
        Ok(remotes.iter().flatten().map(str::to_string).collect())
    }

    pub fn has_remote_branch(&self, remote: &str, branch: &str) -> bool {
        self.repo
            .find_reference(&format!("refs/remotes/{remote}/{branch}"))
            .is_ok()
    }

    /// `(ahead, behind)` of the local branch against `remote/branch`,
    /// `None` when the remote-tracking branch does not exist
    pub fn ahead_behind(&self, remote: &str, branch: &str) -> Result<Option<(usize, usize)>> {
        let remote_ref = match self
            .repo
            .find_reference(&format!("refs/remotes/{remote}/{branch}"))
        {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e).context("failed to read remote-tracking branch"),
        };
        let remote_tip = remote_ref.peel_to_commit()?.id();

        let local_tip = self
            .repo
            .find_branch(branch, BranchType::Local)
            .with_context(|| format!("local branch {branch} not found"))?
            .get()
            .peel_to_commit()?
            .id();

        let counts = self
            .repo
            .graph_ahead_behind(local_tip, remote_tip)
            .context("failed to compare with remote")?;
        Ok(Some(counts))
    }

    pub fn fetch(&self, remote: &str) -> Result<(), GitError> {
        self.run_git(&["fetch", remote]).map(|_| ())
    }

    pub fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<(), GitError> {
        if set_upstream {
            self.run_git(&["push", "--set-upstream", remote, branch])
        } else {
            self.run_git(&["push", remote, branch])
        }
        .map(|_| ())
    }

    pub fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run_git(&["pull", remote, branch]).map(|_| ())
    }

    fn run_git(&self, args: &[&str]) -> Result<String, GitError> {
        let git = which("git").map_err(|_| GitError::GitNotFound)?;
        let output = Command::new(git)
            .current_dir(&self.workdir)
            .args(args)
            .output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(GitError::Command {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
