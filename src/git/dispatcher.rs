use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::audit::CommandLogger;
use crate::config::Config;
use crate::git::parser;
use crate::git::types::LogOptions;
use crate::process::{CommandResult, ProcessRunner};

/// Error taxonomy for dispatched operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failed,
    NotARepository,
    NetworkError,
    PermissionDenied,
    Cancelled,
}

/// Classified result of one dispatched operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub kind: OutcomeKind,
    pub output: String,
    pub error: String,
    pub exit_code: i32,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty() || self.exit_code != 0
    }
}

/// Callback for long-running operations: (operation, current, total)
pub type ProgressCallback = Box<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Callback for free-text operation log messages
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

const NETWORK_MARKERS: &[&str] = &[
    "could not resolve host",
    "unable to access",
    "connection timed out",
    "connection refused",
    "network is unreachable",
];

const PERMISSION_MARKERS: &[&str] = &[
    "permission denied",
    "authentication failed",
    "could not read username",
    "invalid credentials",
];

/// Builds the argument vector for each logical repository operation, runs
/// it through the ProcessRunner, and classifies the result. Classification
/// happens here and nowhere else.
///
/// The last-error cell is a convenience for single-threaded callers; the
/// per-call OperationOutcome is authoritative. Concurrent dispatch from
/// multiple threads is not serialized by this type.
pub struct GitDispatcher {
    repo_path: PathBuf,
    program: String,
    runner: ProcessRunner,
    network_timeout: Duration,
    last_error: Mutex<Option<String>>,
    logger: Option<CommandLogger>,
    progress: Mutex<Option<ProgressCallback>>,
    log_cb: Mutex<Option<LogCallback>>,
}

impl GitDispatcher {
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self::with_config(repo_path, &Config::default())
    }

    pub fn with_config<P: AsRef<Path>>(repo_path: P, config: &Config) -> Self {
        let logger = config
            .behavior
            .log_commands
            .then(|| CommandLogger::new().ok())
            .flatten();

        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            program: config.git.program.clone(),
            runner: ProcessRunner::with_timeout(Duration::from_millis(config.git.timeout_ms)),
            network_timeout: Duration::from_millis(config.git.network_timeout_ms),
            last_error: Mutex::new(None),
            logger,
            progress: Mutex::new(None),
            log_cb: Mutex::new(None),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Request termination of the operation currently running, if any
    pub fn cancel(&self) {
        self.runner.cancel();
    }

    /// Message of the most recent unsuccessful operation
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|cell| cell.clone())
    }

    pub fn set_progress_callback(&self, callback: Option<ProgressCallback>) {
        if let Ok(mut cell) = self.progress.lock() {
            *cell = callback;
        }
    }

    pub fn set_log_callback(&self, callback: Option<LogCallback>) {
        if let Ok(mut cell) = self.log_cb.lock() {
            *cell = callback;
        }
    }

    /// Structural repository check: a `.git` entry, or the three marker
    /// entries of a bare repository simultaneously.
    pub fn is_valid_repository<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        if !path.exists() {
            return false;
        }

        if path.join(".git").exists() {
            return true;
        }

        path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
    }

    // --- execution core ---

    /// Run git with the given arguments in the repository directory and
    /// classify the result
    pub fn dispatch(&self, args: &[&str]) -> OperationOutcome {
        self.dispatch_at(args, Some(&self.repo_path), self.runner.timeout())
    }

    fn dispatch_network(&self, args: &[&str]) -> OperationOutcome {
        let operation = args.first().copied().unwrap_or("network");
        self.notify_progress(operation, 0, 1);
        let outcome = self.dispatch_at(args, Some(&self.repo_path), self.network_timeout);
        self.notify_progress(operation, 1, 1);
        outcome
    }

    fn dispatch_at(
        &self,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Duration,
    ) -> OperationOutcome {
        let display = args.join(" ");
        self.notify_log(&format!("git {}", display));

        let result = self
            .runner
            .run_with_timeout(&self.program, args, working_dir, timeout);

        if let Some(logger) = &self.logger {
            let _ = logger.log_command(&display, &self.repo_path, result.exit_code);
        }

        self.classify_result(&display, &result)
    }

    fn dispatch_owned(&self, args: &[String]) -> OperationOutcome {
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.dispatch(&refs)
    }

    /// Map exit code plus captured text onto the outcome taxonomy.
    ///
    /// Exit code is authoritative for success. Network and permission
    /// failures are recognized by known substrings and default to Failed
    /// when unrecognized.
    fn classify_result(&self, display: &str, result: &CommandResult) -> OperationOutcome {
        let output = result.stdout_text();
        let error = result.stderr_text();

        let kind = if result.success() {
            OutcomeKind::Success
        } else if self.runner.was_cancelled() {
            OutcomeKind::Cancelled
        } else {
            let haystack = format!("{}\n{}", error, output).to_lowercase();
            if result.exit_code == 128 && haystack.contains("not a git repository") {
                OutcomeKind::NotARepository
            } else if NETWORK_MARKERS.iter().any(|m| haystack.contains(m)) {
                OutcomeKind::NetworkError
            } else if PERMISSION_MARKERS.iter().any(|m| haystack.contains(m)) {
                OutcomeKind::PermissionDenied
            } else {
                OutcomeKind::Failed
            }
        };

        if kind != OutcomeKind::Success {
            let message = if !error.trim().is_empty() {
                error.trim().to_string()
            } else if !output.trim().is_empty() {
                output.trim().to_string()
            } else {
                format!("git {} exited with code {}", display, result.exit_code)
            };
            if let Ok(mut cell) = self.last_error.lock() {
                *cell = Some(message);
            }
        }

        OperationOutcome {
            kind,
            output,
            error,
            exit_code: result.exit_code,
        }
    }

    /// Refuse mutating operations against a path with no repository
    fn guard_repo(&self) -> Option<OperationOutcome> {
        if Self::is_valid_repository(&self.repo_path) {
            return None;
        }

        let message = "not a git repository".to_string();
        if let Ok(mut cell) = self.last_error.lock() {
            *cell = Some(message.clone());
        }

        Some(OperationOutcome {
            kind: OutcomeKind::NotARepository,
            output: String::new(),
            error: message,
            exit_code: 1,
        })
    }

    fn notify_progress(&self, operation: &str, current: u64, total: u64) {
        if let Ok(cell) = self.progress.lock()
            && let Some(callback) = cell.as_ref()
        {
            callback(operation, current, total);
        }
    }

    fn notify_log(&self, message: &str) {
        if let Ok(cell) = self.log_cb.lock()
            && let Some(callback) = cell.as_ref()
        {
            callback(message);
        }
    }

    // --- read operations ---

    pub fn status(&self) -> OperationOutcome {
        self.dispatch(&["status", "--porcelain=v1", "-b"])
    }

    pub fn log(&self, options: &LogOptions) -> OperationOutcome {
        self.dispatch_owned(&parser::log_args(options))
    }

    pub fn show_commit(&self, hash: &str) -> OperationOutcome {
        self.dispatch(&[
            "show",
            "--pretty=format:%H|%h|%an|%ae|%s|%ct|%P",
            "--no-patch",
            hash,
        ])
    }

    pub fn branches(&self, include_remote: bool) -> OperationOutcome {
        let format = "--format=%(refname:short)|%(objectname:short)|%(committerdate:iso8601)|%(upstream:short)|%(upstream:track)|%(contents:subject)";
        let mut args = vec!["for-each-ref", format, "refs/heads"];
        if include_remote {
            args.push("refs/remotes");
        }
        self.dispatch(&args)
    }

    pub fn current_branch(&self) -> OperationOutcome {
        self.dispatch(&["branch", "--show-current"])
    }

    pub fn symbolic_ref_head(&self) -> OperationOutcome {
        self.dispatch(&["symbolic-ref", "--short", "HEAD"])
    }

    pub fn head_commit(&self) -> OperationOutcome {
        self.dispatch(&["rev-parse", "--short", "HEAD"])
    }

    pub fn diff(&self, staged: bool, path: Option<&str>) -> OperationOutcome {
        let mut args = vec!["diff"];
        if staged {
            args.push("--cached");
        }
        if let Some(path) = path {
            args.push("--");
            args.push(path);
        }
        self.dispatch(&args)
    }

    pub fn commit_diff(&self, hash: &str) -> OperationOutcome {
        self.dispatch(&["show", "--format=", hash])
    }

    pub fn diff_between(&self, from: &str, to: &str, path: Option<&str>) -> OperationOutcome {
        let range = format!("{}..{}", from, to);
        let mut args = vec!["diff", range.as_str()];
        if let Some(path) = path {
            args.push("--");
            args.push(path);
        }
        self.dispatch(&args)
    }

    pub fn numstat(&self, staged: bool) -> OperationOutcome {
        let mut args = vec!["diff", "--numstat"];
        if staged {
            args.push("--cached");
        }
        self.dispatch(&args)
    }

    pub fn stash_list(&self) -> OperationOutcome {
        self.dispatch(&["stash", "list", "--format=%gd|%ct|%gs"])
    }

    pub fn tag_list(&self) -> OperationOutcome {
        self.dispatch(&[
            "for-each-ref",
            "--format=%(refname:short)|%(objecttype)|%(objectname)|%(*objectname)|%(creatordate:unix)|%(contents:subject)",
            "refs/tags",
        ])
    }

    pub fn remote_list(&self) -> OperationOutcome {
        self.dispatch(&["remote", "-v"])
    }

    pub fn config_get(&self, key: &str, global: bool) -> OperationOutcome {
        let mut args = vec!["config"];
        if global {
            args.push("--global");
        }
        args.push("--get");
        args.push(key);
        self.dispatch(&args)
    }

    // --- write operations ---

    pub fn stage_files(&self, files: &[&str]) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["add"];
        args.extend_from_slice(files);
        self.dispatch(&args)
    }

    pub fn stage_all(&self) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["add", "."])
    }

    pub fn unstage_files(&self, files: &[&str]) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["reset", "HEAD"];
        args.extend_from_slice(files);
        self.dispatch(&args)
    }

    pub fn remove_files(&self, files: &[&str], cached: bool) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["rm"];
        if cached {
            args.push("--cached");
        }
        args.extend_from_slice(files);
        self.dispatch(&args)
    }

    pub fn reset_hard(&self, commit: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["reset", "--hard", commit])
    }

    pub fn commit(&self, message: &str, amend: bool) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["commit"];
        if amend {
            args.push("--amend");
        }
        args.push("-m");
        args.push(message);
        self.dispatch(&args)
    }

    pub fn branch_create(&self, name: &str, start_point: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["branch", name, start_point])
    }

    pub fn branch_delete(&self, name: &str, force: bool) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let flag = if force { "-D" } else { "-d" };
        self.dispatch(&["branch", flag, name])
    }

    pub fn branch_rename(&self, old_name: &str, new_name: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["branch", "-m", old_name, new_name])
    }

    pub fn checkout(&self, name: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["checkout", name])
    }

    pub fn merge(&self, branch: &str, no_fast_forward: bool) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["merge"];
        if no_fast_forward {
            args.push("--no-ff");
        }
        args.push(branch);
        self.dispatch(&args)
    }

    pub fn rebase(&self, branch: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["rebase", branch])
    }

    pub fn remote_add(&self, name: &str, url: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["remote", "add", name, url])
    }

    pub fn remote_remove(&self, name: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["remote", "remove", name])
    }

    pub fn remote_rename(&self, old_name: &str, new_name: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["remote", "rename", old_name, new_name])
    }

    pub fn fetch(&self, remote: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch_network(&["fetch", remote])
    }

    pub fn pull(&self, remote: &str, branch: Option<&str>) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["pull", remote];
        if let Some(branch) = branch {
            args.push(branch);
        }
        self.dispatch_network(&args)
    }

    pub fn push(&self, remote: &str, branch: Option<&str>, force: bool) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        args.push(remote);
        if let Some(branch) = branch {
            args.push(branch);
        }
        self.dispatch_network(&args)
    }

    pub fn push_tags(&self, remote: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch_network(&["push", remote, "--tags"])
    }

    pub fn tag_create(
        &self,
        name: &str,
        message: Option<&str>,
        target: Option<&str>,
    ) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["tag"];
        if let Some(message) = message {
            args.push("-a");
            args.push(name);
            args.push("-m");
            args.push(message);
        } else {
            args.push(name);
        }
        if let Some(target) = target {
            args.push(target);
        }
        self.dispatch(&args)
    }

    pub fn tag_delete(&self, name: &str) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["tag", "-d", name])
    }

    pub fn stash_push(&self, message: Option<&str>, include_untracked: bool) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let mut args = vec!["stash", "push"];
        if include_untracked {
            args.push("-u");
        }
        if let Some(message) = message {
            args.push("-m");
            args.push(message);
        }
        self.dispatch(&args)
    }

    pub fn stash_pop(&self, index: usize) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let selector = format!("stash@{{{}}}", index);
        self.dispatch(&["stash", "pop", &selector])
    }

    pub fn stash_apply(&self, index: usize) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let selector = format!("stash@{{{}}}", index);
        self.dispatch(&["stash", "apply", &selector])
    }

    pub fn stash_drop(&self, index: usize) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        let selector = format!("stash@{{{}}}", index);
        self.dispatch(&["stash", "drop", &selector])
    }

    pub fn stash_clear(&self) -> OperationOutcome {
        if let Some(outcome) = self.guard_repo() {
            return outcome;
        }
        self.dispatch(&["stash", "clear"])
    }

    pub fn config_set(&self, key: &str, value: &str, global: bool) -> OperationOutcome {
        let mut args = vec!["config"];
        if global {
            args.push("--global");
        }
        args.push(key);
        args.push(value);
        self.dispatch(&args)
    }

    /// `git init` runs outside the repository working directory since the
    /// target may not exist yet
    pub fn init(&self, path: &str, bare: bool) -> OperationOutcome {
        let mut args = vec!["init"];
        if bare {
            args.push("--bare");
        }
        args.push(path);
        self.dispatch_at(&args, None, self.runner.timeout())
    }

    /// `git clone` runs outside the repository working directory
    pub fn clone_repository(&self, url: &str, path: &str) -> OperationOutcome {
        self.notify_progress("clone", 0, 1);
        let outcome = self.dispatch_at(&["clone", "--progress", url, path], None, self.network_timeout);
        self.notify_progress("clone", 1, 1);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        Command::new("git")
            .args(["init"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        Command::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        (temp_dir, repo_path)
    }

    fn synthetic(exit_code: i32, stdout: &str, stderr: &str) -> CommandResult {
        CommandResult {
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_classify_success() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let outcome = dispatcher.classify_result("status", &synthetic(0, "ok", ""));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert!(outcome.is_success());
        assert!(dispatcher.last_error().is_none());
    }

    #[test]
    fn test_classify_not_a_repository() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let outcome = dispatcher.classify_result(
            "status",
            &synthetic(
                128,
                "",
                "fatal: not a git repository (or any of the parent directories): .git",
            ),
        );
        assert_eq!(outcome.kind, OutcomeKind::NotARepository);
    }

    #[test]
    fn test_classify_exit_128_without_marker_is_failed() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let outcome =
            dispatcher.classify_result("log", &synthetic(128, "", "fatal: bad revision 'xyz'"));
        assert_eq!(outcome.kind, OutcomeKind::Failed);
    }

    #[test]
    fn test_classify_network_error() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let outcome = dispatcher.classify_result(
            "fetch origin",
            &synthetic(
                128,
                "",
                "fatal: unable to access 'https://example.com/repo.git/': Could not resolve host: example.com",
            ),
        );
        assert_eq!(outcome.kind, OutcomeKind::NetworkError);
    }

    #[test]
    fn test_classify_permission_denied() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let outcome = dispatcher.classify_result(
            "push origin main",
            &synthetic(128, "", "git@example.com: Permission denied (publickey)."),
        );
        assert_eq!(outcome.kind, OutcomeKind::PermissionDenied);
    }

    #[test]
    fn test_classify_generic_failure_sets_last_error() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let outcome =
            dispatcher.classify_result("commit", &synthetic(1, "", "nothing to commit"));
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert_eq!(dispatcher.last_error().as_deref(), Some("nothing to commit"));
    }

    #[test]
    fn test_last_error_overwritten_per_failure() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        dispatcher.classify_result("a", &synthetic(1, "", "first"));
        dispatcher.classify_result("b", &synthetic(1, "", "second"));
        assert_eq!(dispatcher.last_error().as_deref(), Some("second"));
    }

    #[test]
    fn test_cancelled_run_classifies_as_cancelled() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        dispatcher.cancel();
        let outcome = dispatcher.classify_result("fetch", &synthetic(-1, "", "process cancelled"));
        assert_eq!(outcome.kind, OutcomeKind::Cancelled);
    }

    #[test]
    fn test_is_valid_repository() {
        let (_temp, repo_path) = create_test_repo();
        assert!(GitDispatcher::is_valid_repository(&repo_path));

        let plain = TempDir::new().unwrap();
        assert!(!GitDispatcher::is_valid_repository(plain.path()));
        assert!(!GitDispatcher::is_valid_repository("/no/such/path"));
    }

    #[test]
    fn test_is_valid_repository_bare_markers() {
        let temp = TempDir::new().unwrap();
        let bare = temp.path();

        fs::write(bare.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        assert!(!GitDispatcher::is_valid_repository(bare));

        fs::create_dir(bare.join("objects")).unwrap();
        assert!(!GitDispatcher::is_valid_repository(bare));

        fs::create_dir(bare.join("refs")).unwrap();
        assert!(GitDispatcher::is_valid_repository(bare));
    }

    #[test]
    fn test_status_against_real_repo() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let outcome = dispatcher.status();
        assert!(outcome.is_success());
        assert!(outcome.output.starts_with("## "));
    }

    #[test]
    fn test_status_outside_repo_classified() {
        let temp = TempDir::new().unwrap();
        let dispatcher = GitDispatcher::new(temp.path());

        let outcome = dispatcher.status();
        assert_eq!(outcome.kind, OutcomeKind::NotARepository);
        assert!(dispatcher.last_error().is_some());
    }

    #[test]
    fn test_write_guard_refuses_invalid_path() {
        let temp = TempDir::new().unwrap();
        let dispatcher = GitDispatcher::new(temp.path());

        let outcome = dispatcher.commit("message", false);
        assert_eq!(outcome.kind, OutcomeKind::NotARepository);
    }

    #[test]
    fn test_stage_and_commit_flow() {
        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        fs::write(repo_path.join("a.txt"), "content").unwrap();

        let outcome = dispatcher.stage_files(&["a.txt"]);
        assert!(outcome.is_success(), "stage failed: {}", outcome.error);

        let outcome = dispatcher.commit("add a.txt", false);
        assert!(outcome.is_success(), "commit failed: {}", outcome.error);

        let log = dispatcher.log(&LogOptions::default());
        assert!(log.is_success());
        assert!(log.output.contains("add a.txt"));
    }

    #[test]
    fn test_log_callback_sees_command_line() {
        use std::sync::{Arc, Mutex};

        let (_temp, repo_path) = create_test_repo();
        let dispatcher = GitDispatcher::new(&repo_path);

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher.set_log_callback(Some(Box::new(move |message| {
            sink.lock().unwrap().push(message.to_string());
        })));

        dispatcher.status();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], "git status --porcelain=v1 -b");
    }
}
