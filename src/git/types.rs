use chrono::{DateTime, Utc};

/// Classification of one working-tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Untracked,
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Conflicted,
    Ignored,
}

/// One changed path from `git status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    /// Rename/copy source, when the status line carries one
    pub old_path: Option<String>,
    pub status: FileStatus,
    pub staged: bool,
    pub lines_added: Option<u32>,
    pub lines_removed: Option<u32>,
}

/// Snapshot of the working tree and branch tracking state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStatus {
    pub branch: String,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    /// Order as reported by git
    pub changes: Vec<FileChange>,
}

impl RepositoryStatus {
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }

    /// Tracked modifications exist. Untracked and ignored entries never
    /// count here.
    pub fn has_uncommitted_changes(&self) -> bool {
        self.changes
            .iter()
            .any(|c| !matches!(c.status, FileStatus::Untracked | FileStatus::Ignored))
    }

    pub fn has_staged_changes(&self) -> bool {
        self.changes.iter().any(|c| c.staged)
    }

    pub fn has_unstaged_changes(&self) -> bool {
        self.changes
            .iter()
            .any(|c| !c.staged && !matches!(c.status, FileStatus::Untracked | FileStatus::Ignored))
    }
}

/// One commit from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    pub email: String,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
    pub parents: Vec<String>,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// A local or remote-tracking branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Short name, e.g. `main` or `origin/main`
    pub name: String,
    /// Fully qualified ref, e.g. `refs/heads/main`
    pub ref_name: String,
    /// Abbreviated object id of the branch tip
    pub tip_hash: String,
    pub is_remote: bool,
    pub is_current: bool,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub last_commit_date: DateTime<Utc>,
    pub last_commit_summary: Option<String>,
}

/// A configured remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub url: String,
    pub push_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    Context,
    Addition,
    Deletion,
    Header,
}

/// One line of a unified diff
///
/// Addition lines carry only a new line number, deletion lines only an old
/// one, context lines both, header lines neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub content: String,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
}

/// A contiguous block of changed lines in one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub header: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
}

/// Diff of one file. Binary diffs carry no hunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub path: String,
    pub old_path: Option<String>,
    pub is_binary: bool,
    pub is_new_file: bool,
    pub is_deleted_file: bool,
    pub hunks: Vec<DiffHunk>,
}

impl Diff {
    pub fn lines_added(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == DiffLineKind::Addition)
            .count()
    }

    pub fn lines_removed(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == DiffLineKind::Deletion)
            .count()
    }
}

/// One entry from `git stash list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stash {
    /// Reflog selector, e.g. `stash@{0}`
    pub name: String,
    pub index: usize,
    pub message: String,
    /// Best-effort branch extracted from the conventional message shape;
    /// empty when the message doesn't follow it
    pub branch: String,
    pub timestamp: DateTime<Utc>,
}

/// One tag ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub message: String,
    /// Peeled commit hash for annotated tags, the ref target otherwise
    pub commit_hash: String,
    pub is_annotated: bool,
    pub timestamp: DateTime<Utc>,
}

/// Switches for history retrieval
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub max_count: Option<usize>,
    pub first_parent: bool,
    /// Merge commits are excluded unless set
    pub include_merges: bool,
    /// Only honored together with `path`
    pub follow_renames: bool,
    pub branch: Option<String>,
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn change(status: FileStatus, staged: bool) -> FileChange {
        FileChange {
            path: "file.txt".to_string(),
            old_path: None,
            status,
            staged,
            lines_added: None,
            lines_removed: None,
        }
    }

    #[test]
    fn test_is_merge() {
        let mut commit = Commit {
            hash: "a".repeat(40),
            short_hash: "aaaaaaa".to_string(),
            author: "A".to_string(),
            email: "a@example.com".to_string(),
            subject: "subject".to_string(),
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            parents: vec![],
        };
        assert!(!commit.is_merge());

        commit.parents = vec!["b".repeat(40)];
        assert!(!commit.is_merge());

        commit.parents.push("c".repeat(40));
        assert!(commit.is_merge());
    }

    #[test]
    fn test_untracked_and_ignored_do_not_count_as_uncommitted() {
        let status = RepositoryStatus {
            branch: "main".to_string(),
            changes: vec![
                change(FileStatus::Untracked, false),
                change(FileStatus::Ignored, false),
            ],
            ..Default::default()
        };

        assert!(!status.is_clean());
        assert!(!status.has_uncommitted_changes());
        assert!(!status.has_unstaged_changes());
        assert!(!status.has_staged_changes());
    }

    #[test]
    fn test_staged_and_unstaged_flags() {
        let status = RepositoryStatus {
            branch: "main".to_string(),
            changes: vec![
                change(FileStatus::Modified, true),
                change(FileStatus::Deleted, false),
            ],
            ..Default::default()
        };

        assert!(status.has_uncommitted_changes());
        assert!(status.has_staged_changes());
        assert!(status.has_unstaged_changes());
    }

    #[test]
    fn test_binary_diff_has_no_line_counts() {
        let diff = Diff {
            path: "logo.png".to_string(),
            is_binary: true,
            ..Default::default()
        };
        assert_eq!(diff.lines_added(), 0);
        assert_eq!(diff.lines_removed(), 0);
        assert!(diff.hunks.is_empty());
    }
}
