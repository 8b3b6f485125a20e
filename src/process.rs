use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default wall-clock timeout for a child process
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Sleep interval of the wait loop; bounds cancellation latency
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Raw result of running a child process to completion
///
/// `success()` is decided solely from the OS exit status; it is never
/// inferred from the captured text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Captured stdout as text, lossy on invalid UTF-8
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Captured stderr as text, lossy on invalid UTF-8
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    fn failure(message: String) -> Self {
        Self {
            exit_code: -1,
            stdout: Vec::new(),
            stderr: message.into_bytes(),
        }
    }
}

/// Shared cancellation flag for an in-flight run
///
/// Cloneable and safe to trigger from any thread. The flag is cleared at
/// the start of each run and stays set after a cancelled run so the caller
/// can distinguish cancellation from an ordinary failure.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination of the run currently using this token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Owns a spawned child and guarantees it is killed and reaped on every
/// exit path, including early returns and panics.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait();
        if matches!(status, Ok(Some(_))) {
            self.reaped = true;
        }
        status
    }

    fn terminate(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Spawns external commands with output capture, timeout, and cooperative
/// cancellation. Knows nothing about git.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
    cancel: CancelToken,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancelToken::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Token shared with every run started from this runner
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request termination of the currently running child, if any
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the most recent run was interrupted by `cancel()`
    pub fn was_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a command to completion, capturing stdout and stderr.
    ///
    /// Never blocks past the configured timeout: on expiry the child is
    /// killed and the result carries exit code -1 and a timeout message.
    /// A concurrent `cancel()` is observed within one poll interval.
    pub fn run(&self, program: &str, args: &[&str], working_dir: Option<&Path>) -> CommandResult {
        self.run_with_timeout(program, args, working_dir, self.timeout)
    }

    /// Same as `run` with an explicit timeout for this call only
    pub fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Duration,
    ) -> CommandResult {
        self.cancel.clear();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return CommandResult::failure(format!("failed to spawn {}: {}", program, e)),
        };
        let mut guard = ChildGuard::new(child);

        // Drain both pipes on their own threads so a chatty child can
        // never fill a pipe buffer and deadlock against our wait loop.
        let stdout_reader = spawn_reader(guard.child.stdout.take());
        let stderr_reader = spawn_reader(guard.child.stderr.take());

        let started = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                guard.terminate();
                let stdout = join_reader(stdout_reader);
                drop(join_reader(stderr_reader));
                return CommandResult {
                    exit_code: -1,
                    stdout,
                    stderr: b"process cancelled".to_vec(),
                };
            }

            if started.elapsed() > timeout {
                guard.terminate();
                let stdout = join_reader(stdout_reader);
                drop(join_reader(stderr_reader));
                return CommandResult {
                    exit_code: -1,
                    stdout,
                    stderr: format!("process timed out after {}ms", timeout.as_millis())
                        .into_bytes(),
                };
            }

            match guard.try_wait() {
                Ok(Some(status)) => {
                    let stdout = join_reader(stdout_reader);
                    let stderr = join_reader(stderr_reader);
                    return CommandResult {
                        exit_code: status.code().unwrap_or(-1),
                        stdout,
                        stderr,
                    };
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    guard.terminate();
                    drop(join_reader(stdout_reader));
                    drop(join_reader(stderr_reader));
                    return CommandResult::failure(format!("failed to wait for {}: {}", program, e));
                }
            }
        }
    }

    /// Run on a detached thread and hand the result to `callback`.
    ///
    /// The callback runs on the worker thread; callers must not assume a
    /// specific thread.
    pub fn run_async<F>(
        &self,
        program: String,
        args: Vec<String>,
        working_dir: Option<PathBuf>,
        callback: F,
    ) where
        F: FnOnce(CommandResult) + Send + 'static,
    {
        let runner = self.clone();
        thread::spawn(move || {
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            let result = runner.run(&program, &arg_refs, working_dir.as_deref());
            callback(result);
        });
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
