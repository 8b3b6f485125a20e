pub mod dispatcher;
pub mod parser;
pub mod repository;
pub mod types;
pub mod version;

// Re-export commonly used types
pub use dispatcher::{
    GitDispatcher, LogCallback, OperationOutcome, OutcomeKind, ProgressCallback,
};
pub use parser::{
    parse_branches, parse_diffs, parse_log, parse_numstat, parse_remotes, parse_stashes,
    parse_status, parse_tags,
};
pub use repository::Repository;
pub use types::{
    Branch, Commit, Diff, DiffHunk, DiffLine, DiffLineKind, FileChange, FileStatus, LogOptions,
    Remote, RepositoryStatus, Stash, Tag,
};
pub use version::{GitVersion, git_program};
