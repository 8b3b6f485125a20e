use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{GitError, GitResult};
use crate::git::dispatcher::{GitDispatcher, LogCallback, OperationOutcome, OutcomeKind,
    ProgressCallback};
use crate::git::parser;
use crate::git::types::{
    Branch, Commit, Diff, LogOptions, Remote, RepositoryStatus, Stash, Tag,
};

/// Collaborator-facing handle on one repository.
///
/// Read operations return a populated (possibly empty) snapshot, or an
/// empty default on failure; they never propagate errors past this layer.
/// Check `last_error()` when an empty result is ambiguous. Write
/// operations return the classified `OperationOutcome`.
///
/// Cloning is cheap and shares the underlying dispatcher; no ordering is
/// guaranteed between concurrently issued operations.
#[derive(Clone)]
pub struct Repository {
    dispatcher: Arc<GitDispatcher>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

impl Repository {
    /// Open an existing repository, validating the path structurally
    pub fn open<P: AsRef<Path>>(path: P) -> GitResult<Self> {
        if !GitDispatcher::is_valid_repository(&path) {
            return Err(GitError::NotARepository);
        }
        Ok(Self::with_config(path, &Config::default()))
    }

    /// Create a handle without validation, using the given configuration
    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> Self {
        Self {
            dispatcher: Arc::new(GitDispatcher::with_config(path, config)),
        }
    }

    /// Detect a repository from the current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = env::current_dir().map_err(GitError::IoError)?;
        Self::discover_from(current_dir)
    }

    /// Detect a repository by walking up from a starting directory
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        let mut current = start_path.as_ref().to_path_buf();

        loop {
            if current.join(".git").exists() {
                return Self::open(current);
            }

            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// Initialize a new repository at `path` and open it
    pub fn init<P: AsRef<Path>>(path: P, bare: bool) -> GitResult<Self> {
        let path = path.as_ref();
        let dispatcher = GitDispatcher::new(path);
        let outcome = dispatcher.init(&path.to_string_lossy(), bare);

        if !outcome.is_success() {
            return Err(GitError::CommandFailed(outcome.error));
        }

        if bare {
            // A fresh bare repository has no `.git` entry; skip the
            // structural check `open` would apply.
            Ok(Self::with_config(path, &Config::default()))
        } else {
            Self::open(path)
        }
    }

    /// Clone `url` into `path` and open the result
    pub fn clone_from<P: AsRef<Path>>(url: &str, path: P) -> GitResult<Self> {
        let path = path.as_ref();
        let dispatcher = GitDispatcher::new(path);
        let outcome = dispatcher.clone_repository(url, &path.to_string_lossy());

        if !outcome.is_success() {
            return Err(GitError::CommandFailed(outcome.error));
        }

        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        self.dispatcher.repo_path()
    }

    pub fn dispatcher(&self) -> &GitDispatcher {
        &self.dispatcher
    }

    /// Request termination of the operation currently running, if any
    pub fn cancel(&self) {
        self.dispatcher.cancel();
    }

    /// Message of the most recent unsuccessful operation
    pub fn last_error(&self) -> Option<String> {
        self.dispatcher.last_error()
    }

    pub fn set_progress_callback(&self, callback: Option<ProgressCallback>) {
        self.dispatcher.set_progress_callback(callback);
    }

    pub fn set_log_callback(&self, callback: Option<LogCallback>) {
        self.dispatcher.set_log_callback(callback);
    }

    // --- read snapshots ---

    /// Working-tree status snapshot
    pub fn status(&self) -> RepositoryStatus {
        let outcome = self.dispatcher.status();
        if !outcome.is_success() {
            return RepositoryStatus::default();
        }
        parser::parse_status(&outcome.output)
    }

    /// Status snapshot with per-file line counts merged in from numstat
    pub fn status_with_line_counts(&self) -> RepositoryStatus {
        let mut status = self.status();
        if status.changes.is_empty() {
            return status;
        }

        let mut counts: HashMap<String, (Option<u32>, Option<u32>)> = HashMap::new();
        for staged in [false, true] {
            let outcome = self.dispatcher.numstat(staged);
            if outcome.is_success() {
                for (path, added, removed) in parser::parse_numstat(&outcome.output) {
                    counts.entry(path).or_insert((added, removed));
                }
            }
        }

        for change in &mut status.changes {
            if let Some((added, removed)) = counts.get(&change.path) {
                change.lines_added = *added;
                change.lines_removed = *removed;
            }
        }

        status
    }

    /// Commit history per the given options
    pub fn log(&self, options: &LogOptions) -> Vec<Commit> {
        let outcome = self.dispatcher.log(options);
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_log(&outcome.output)
    }

    /// Look up a single commit by hash or revision
    pub fn find_commit(&self, hash: &str) -> Option<Commit> {
        let outcome = self.dispatcher.show_commit(hash);
        if !outcome.is_success() {
            return None;
        }
        parser::parse_log(&outcome.output).into_iter().next()
    }

    /// All branches, optionally including remote-tracking ones
    pub fn branches(&self, include_remote: bool) -> Vec<Branch> {
        let current = self.current_branch();
        let remote_names: Vec<String> = self.remotes().into_iter().map(|r| r.name).collect();

        let outcome = self.dispatcher.branches(include_remote);
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_branches(&outcome.output, current.as_deref(), &remote_names)
    }

    /// Name of the checked-out branch; None in detached HEAD state
    pub fn current_branch(&self) -> Option<String> {
        let outcome = self.dispatcher.current_branch();
        if outcome.is_success() {
            let name = outcome.output.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }

        // Fallback for git versions without --show-current
        let outcome = self.dispatcher.symbolic_ref_head();
        if outcome.is_success() {
            let name = outcome.output.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }

        None
    }

    /// Abbreviated HEAD commit hash, for labeling detached HEAD state
    pub fn head_commit(&self) -> Option<String> {
        let outcome = self.dispatcher.head_commit();
        if !outcome.is_success() {
            return None;
        }
        let hash = outcome.output.trim();
        (!hash.is_empty()).then(|| hash.to_string())
    }

    /// Diffs of the whole working tree (or the index with `staged`)
    pub fn diff_workdir(&self, staged: bool) -> Vec<Diff> {
        let outcome = self.dispatcher.diff(staged, None);
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_diffs(&outcome.output)
    }

    /// Diff of one file
    pub fn diff_file(&self, path: &str, staged: bool) -> Option<Diff> {
        let outcome = self.dispatcher.diff(staged, Some(path));
        if !outcome.is_success() {
            return None;
        }
        parser::parse_diffs(&outcome.output).into_iter().next()
    }

    /// Diffs introduced by one commit
    pub fn commit_diff(&self, hash: &str) -> Vec<Diff> {
        let outcome = self.dispatcher.commit_diff(hash);
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_diffs(&outcome.output)
    }

    /// Diffs between two commits, optionally narrowed to one path
    pub fn diff_between(&self, from: &str, to: &str, path: Option<&str>) -> Vec<Diff> {
        let outcome = self.dispatcher.diff_between(from, to, path);
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_diffs(&outcome.output)
    }

    pub fn stashes(&self) -> Vec<Stash> {
        let outcome = self.dispatcher.stash_list();
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_stashes(&outcome.output)
    }

    pub fn tags(&self) -> Vec<Tag> {
        let outcome = self.dispatcher.tag_list();
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_tags(&outcome.output)
    }

    pub fn remotes(&self) -> Vec<Remote> {
        let outcome = self.dispatcher.remote_list();
        if !outcome.is_success() {
            return Vec::new();
        }
        parser::parse_remotes(&outcome.output)
    }

    pub fn config_value(&self, key: &str, global: bool) -> Option<String> {
        let outcome = self.dispatcher.config_get(key, global);
        if !outcome.is_success() {
            return None;
        }
        let value = outcome.output.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.status().has_uncommitted_changes()
    }

    pub fn has_staged_changes(&self) -> bool {
        self.status().has_staged_changes()
    }

    pub fn has_unstaged_changes(&self) -> bool {
        self.status().has_unstaged_changes()
    }

    // --- write operations ---

    pub fn stage_files(&self, files: &[&str]) -> OperationOutcome {
        self.dispatcher.stage_files(files)
    }

    pub fn stage_all(&self) -> OperationOutcome {
        self.dispatcher.stage_all()
    }

    pub fn unstage_files(&self, files: &[&str]) -> OperationOutcome {
        self.dispatcher.unstage_files(files)
    }

    pub fn remove_files(&self, files: &[&str], cached: bool) -> OperationOutcome {
        self.dispatcher.remove_files(files, cached)
    }

    pub fn reset_hard(&self, commit: &str) -> OperationOutcome {
        self.dispatcher.reset_hard(commit)
    }

    pub fn commit(&self, message: &str, amend: bool) -> OperationOutcome {
        self.dispatcher.commit(message, amend)
    }

    /// Stage the given files, then commit them
    pub fn commit_files(&self, message: &str, files: &[&str]) -> OperationOutcome {
        let staged = self.stage_files(files);
        if !staged.is_success() {
            return staged;
        }
        self.commit(message, false)
    }

    pub fn branch_create(&self, name: &str, start_point: &str) -> OperationOutcome {
        self.dispatcher.branch_create(name, start_point)
    }

    pub fn branch_delete(&self, name: &str, force: bool) -> OperationOutcome {
        self.dispatcher.branch_delete(name, force)
    }

    pub fn branch_rename(&self, old_name: &str, new_name: &str) -> OperationOutcome {
        self.dispatcher.branch_rename(old_name, new_name)
    }

    pub fn checkout(&self, name: &str) -> OperationOutcome {
        self.dispatcher.checkout(name)
    }

    pub fn merge(&self, branch: &str, no_fast_forward: bool) -> OperationOutcome {
        self.dispatcher.merge(branch, no_fast_forward)
    }

    pub fn rebase(&self, branch: &str) -> OperationOutcome {
        self.dispatcher.rebase(branch)
    }

    pub fn remote_add(&self, name: &str, url: &str) -> OperationOutcome {
        self.dispatcher.remote_add(name, url)
    }

    pub fn remote_remove(&self, name: &str) -> OperationOutcome {
        self.dispatcher.remote_remove(name)
    }

    pub fn remote_rename(&self, old_name: &str, new_name: &str) -> OperationOutcome {
        self.dispatcher.remote_rename(old_name, new_name)
    }

    pub fn fetch(&self, remote: &str) -> OperationOutcome {
        self.dispatcher.fetch(remote)
    }

    pub fn pull(&self, remote: &str, branch: Option<&str>) -> OperationOutcome {
        self.dispatcher.pull(remote, branch)
    }

    pub fn push(&self, remote: &str, branch: Option<&str>, force: bool) -> OperationOutcome {
        self.dispatcher.push(remote, branch, force)
    }

    pub fn push_tags(&self, remote: &str) -> OperationOutcome {
        self.dispatcher.push_tags(remote)
    }

    pub fn tag_create(
        &self,
        name: &str,
        message: Option<&str>,
        target: Option<&str>,
    ) -> OperationOutcome {
        self.dispatcher.tag_create(name, message, target)
    }

    pub fn tag_delete(&self, name: &str) -> OperationOutcome {
        self.dispatcher.tag_delete(name)
    }

    pub fn stash_push(&self, message: Option<&str>, include_untracked: bool) -> OperationOutcome {
        self.dispatcher.stash_push(message, include_untracked)
    }

    pub fn stash_pop(&self, index: usize) -> OperationOutcome {
        self.dispatcher.stash_pop(index)
    }

    pub fn stash_apply(&self, index: usize) -> OperationOutcome {
        self.dispatcher.stash_apply(index)
    }

    pub fn stash_drop(&self, index: usize) -> OperationOutcome {
        self.dispatcher.stash_drop(index)
    }

    pub fn stash_clear(&self) -> OperationOutcome {
        self.dispatcher.stash_clear()
    }

    pub fn config_set(&self, key: &str, value: &str, global: bool) -> OperationOutcome {
        self.dispatcher.config_set(key, value, global)
    }

    /// Set user.name and user.email in one call
    pub fn set_user_info(&self, name: &str, email: &str, global: bool) -> OperationOutcome {
        let outcome = self.config_set("user.name", name, global);
        if !outcome.is_success() {
            return outcome;
        }
        self.config_set("user.email", email, global)
    }

    // --- async variants ---
    //
    // Each runs the synchronous call on a blocking worker; the snapshot
    // forms fall back to an empty default if the worker dies.

    pub async fn status_async(&self) -> RepositoryStatus {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.status())
            .await
            .unwrap_or_default()
    }

    pub async fn log_async(&self, options: LogOptions) -> Vec<Commit> {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.log(&options))
            .await
            .unwrap_or_default()
    }

    pub async fn branches_async(&self, include_remote: bool) -> Vec<Branch> {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.branches(include_remote))
            .await
            .unwrap_or_default()
    }

    pub async fn fetch_async(&self, remote: String) -> OperationOutcome {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.fetch(&remote))
            .await
            .unwrap_or_else(join_failure)
    }

    pub async fn pull_async(&self, remote: String, branch: Option<String>) -> OperationOutcome {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.pull(&remote, branch.as_deref()))
            .await
            .unwrap_or_else(join_failure)
    }

    pub async fn push_async(
        &self,
        remote: String,
        branch: Option<String>,
        force: bool,
    ) -> OperationOutcome {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.push(&remote, branch.as_deref(), force))
            .await
            .unwrap_or_else(join_failure)
    }

    pub async fn clone_from_async(url: String, path: PathBuf) -> GitResult<Repository> {
        tokio::task::spawn_blocking(move || Repository::clone_from(&url, path))
            .await
            .map_err(|e| GitError::CommandFailed(format!("background task failed: {}", e)))?
    }
}

fn join_failure(error: tokio::task::JoinError) -> OperationOutcome {
    OperationOutcome {
        kind: OutcomeKind::Failed,
        output: String::new(),
        error: format!("background task failed: {}", error),
        exit_code: -1,
    }
}
