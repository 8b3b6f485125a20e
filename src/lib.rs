pub mod audit;
pub mod config;
pub mod error;
pub mod git;
pub mod process;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{AppError, AppResult, GitError, GitResult};
pub use git::{
    GitDispatcher, GitVersion, LogOptions, OperationOutcome, OutcomeKind, Repository,
    RepositoryStatus,
};
pub use process::{CancelToken, CommandResult, ProcessRunner};
