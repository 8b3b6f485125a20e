//! Pure parsers for git porcelain output.
//!
//! Every function here is total: malformed or short records are dropped,
//! numeric fields that fail to parse fall back to a safe default (zero, or
//! the current time), and nothing performs I/O. A partially-wrong snapshot
//! is preferred over a hard failure on one bad record.

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use crate::git::types::{
    Branch, Commit, Diff, DiffHunk, DiffLine, DiffLineKind, FileChange, FileStatus, LogOptions,
    Remote, RepositoryStatus, Stash, Tag,
};

static BRANCH_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(?:\.\.\.([^\s\[]+))?(?:\s+\[([^\]]+)\])?\s*$").unwrap()
});
static AHEAD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ahead (\d+)").unwrap());
static BEHIND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"behind (\d+)").unwrap());
static HUNK_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());
static DIFF_GIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^diff --git a/(.+) b/(.+)$").unwrap());
static STASH_SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"stash@\{(\d+)\}").unwrap());
static STASH_BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:WIP on|On) ([^:]+):").unwrap());

/// Epoch seconds, defaulting to now when unparsable
fn epoch_or_now(field: &str) -> DateTime<Utc> {
    field
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}

/// Parse `git status --porcelain=v1 -b` output.
///
/// The first line carries the branch header (`## branch...upstream [ahead
/// N, behind M]`); the remaining lines are two-character status flags
/// followed by the path. Ahead/behind default to zero when no tracking
/// clause is present.
pub fn parse_status(output: &str) -> RepositoryStatus {
    let mut status = RepositoryStatus::default();

    for line in output.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            parse_branch_header(header, &mut status);
        } else if let Some(change) = parse_file_change(line) {
            status.changes.push(change);
        }
    }

    status
}

fn parse_branch_header(header: &str, status: &mut RepositoryStatus) {
    let Some(caps) = BRANCH_LINE_RE.captures(header) else {
        return;
    };

    status.branch = caps[1].to_string();
    status.upstream = caps.get(2).map(|m| m.as_str().to_string());

    if let Some(tracking) = caps.get(3) {
        let tracking = tracking.as_str();
        if let Some(ahead) = AHEAD_RE.captures(tracking) {
            status.ahead = ahead[1].parse().unwrap_or(0);
        }
        if let Some(behind) = BEHIND_RE.captures(tracking) {
            status.behind = behind[1].parse().unwrap_or(0);
        }
    }
}

/// Parse one porcelain v1 status line into a FileChange.
///
/// The `??`/`!!` sentinels are checked before single-character flags so a
/// literal `?` or `!` in one column cannot be misread. Lines with an
/// unrecognized flag pair are dropped.
pub fn parse_file_change(line: &str) -> Option<FileChange> {
    if line.len() < 3 || !line.is_char_boundary(3) {
        return None;
    }

    let staged_flag = line.as_bytes()[0] as char;
    let unstaged_flag = line.as_bytes()[1] as char;
    let mut path = line[3..].to_string();
    let mut old_path = None;

    if let Some((from, to)) = path.split_once(" -> ") {
        old_path = Some(from.to_string());
        path = to.to_string();
    }

    let (status, staged) = if line.starts_with("??") {
        (FileStatus::Untracked, false)
    } else if line.starts_with("!!") {
        (FileStatus::Ignored, false)
    } else if staged_flag == 'A' {
        (FileStatus::Added, true)
    } else if staged_flag == 'M' {
        (FileStatus::Modified, true)
    } else if staged_flag == 'D' {
        (FileStatus::Deleted, true)
    } else if staged_flag == 'R' {
        (FileStatus::Renamed, true)
    } else if staged_flag == 'C' {
        (FileStatus::Copied, true)
    } else if unstaged_flag == 'M' {
        (FileStatus::Modified, false)
    } else if unstaged_flag == 'D' {
        (FileStatus::Deleted, false)
    } else if staged_flag == 'U' || unstaged_flag == 'U' {
        (FileStatus::Conflicted, false)
    } else {
        return None;
    };

    Some(FileChange {
        path,
        old_path,
        status,
        staged,
        lines_added: None,
        lines_removed: None,
    })
}

/// Parse NUL-delimited log records in the wire format
/// `%H|%h|%an|%ae|%s|%ct|%P`.
///
/// Records are NUL-delimited (never newline-delimited) because subjects may
/// contain arbitrary characters. Records with fewer than seven fields are
/// discarded rather than partially populated; a subject containing `|` is
/// reassembled from the surplus splits.
pub fn parse_log(output: &str) -> Vec<Commit> {
    let mut commits = Vec::new();

    for record in output.split('\0') {
        let record = record.trim_start_matches('\n');
        if record.is_empty() {
            continue;
        }

        let parts: Vec<&str> = record.split('|').collect();
        if parts.len() < 7 {
            continue;
        }

        let subject = parts[4..parts.len() - 2].join("|");
        let parents: Vec<String> = parts[parts.len() - 1]
            .split_whitespace()
            .map(str::to_string)
            .collect();

        commits.push(Commit {
            hash: parts[0].to_string(),
            short_hash: parts[1].to_string(),
            author: parts[2].to_string(),
            email: parts[3].to_string(),
            subject,
            timestamp: epoch_or_now(parts[parts.len() - 2]),
            parents,
        });
    }

    commits
}

/// Parse `for-each-ref` branch records in the wire format
/// `%(refname:short)|%(objectname:short)|%(committerdate:iso8601)|%(upstream:short)|%(upstream:track)|%(contents:subject)`.
///
/// `current_branch` marks the matching local branch; `remote_names` lets a
/// `origin/main`-shaped short name be recognized as remote even without
/// the `remotes/` prefix.
pub fn parse_branches(
    output: &str,
    current_branch: Option<&str>,
    remote_names: &[String],
) -> Vec<Branch> {
    let mut branches = Vec::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() < 6 {
            continue;
        }

        let raw_name = parts[0];
        if raw_name.is_empty() {
            continue;
        }

        let stripped = raw_name.strip_prefix("remotes/").unwrap_or(raw_name);
        let is_remote = raw_name.starts_with("remotes/")
            || stripped
                .split_once('/')
                .is_some_and(|(segment, _)| remote_names.iter().any(|r| r == segment));

        let name = stripped.to_string();
        let ref_name = if is_remote {
            format!("refs/remotes/{}", name)
        } else {
            format!("refs/heads/{}", name)
        };

        let upstream = (!parts[3].is_empty()).then(|| parts[3].to_string());

        let tracking = parts[4];
        let ahead = AHEAD_RE
            .captures(tracking)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);
        let behind = BEHIND_RE
            .captures(tracking)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);

        let last_commit_date = DateTime::parse_from_str(parts[2], "%Y-%m-%d %H:%M:%S %z")
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let subject = parts[5..].join("|");
        let is_current = !is_remote && current_branch == Some(name.as_str());

        branches.push(Branch {
            name,
            ref_name,
            tip_hash: parts[1].to_string(),
            is_remote,
            is_current,
            upstream,
            ahead,
            behind,
            last_commit_date,
            last_commit_summary: (!subject.is_empty()).then_some(subject),
        });
    }

    branches
}

/// Parse unified diff output, possibly covering several files.
///
/// A running old/new line counter is seeded from each hunk's declared
/// ranges and advanced per content line. Envelope lines (`diff `, `index `,
/// `+++`, `---`) are tagged Header and never advance the counters. Any
/// unrecognized line (e.g. the "no newline at end of file" marker) is
/// skipped.
pub fn parse_diffs(output: &str) -> Vec<Diff> {
    let mut diffs: Vec<Diff> = Vec::new();
    let mut current: Option<Diff> = None;
    let mut hunk: Option<DiffHunk> = None;
    let mut old_line: u32 = 0;
    let mut new_line: u32 = 0;

    for line in output.lines() {
        if let Some(caps) = DIFF_GIT_RE.captures(line) {
            flush_hunk(&mut current, &mut hunk);
            if let Some(done) = current.take() {
                diffs.push(done);
            }

            let a_path = caps[1].to_string();
            let b_path = caps[2].to_string();
            current = Some(Diff {
                old_path: (a_path != b_path).then_some(a_path),
                path: b_path,
                ..Default::default()
            });
            continue;
        }

        if current.is_none() {
            continue;
        }

        if let Some(caps) = HUNK_HEADER_RE.captures(line) {
            flush_hunk(&mut current, &mut hunk);

            let old_start: u32 = caps[1].parse().unwrap_or(0);
            let old_count: u32 = caps.get(2).map_or(1, |m| m.as_str().parse().unwrap_or(1));
            let new_start: u32 = caps[3].parse().unwrap_or(0);
            let new_count: u32 = caps.get(4).map_or(1, |m| m.as_str().parse().unwrap_or(1));

            old_line = old_start;
            new_line = new_start;
            hunk = Some(DiffHunk {
                header: line.to_string(),
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            });
            continue;
        }

        let Some(diff) = current.as_mut() else {
            continue;
        };

        if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            diff.is_binary = true;
            continue;
        }
        if line.starts_with("new file mode") {
            diff.is_new_file = true;
            continue;
        }
        if line.starts_with("deleted file mode") {
            diff.is_deleted_file = true;
            continue;
        }
        if let Some(from) = line.strip_prefix("rename from ") {
            diff.old_path = Some(from.to_string());
            continue;
        }
        if let Some(to) = line.strip_prefix("rename to ") {
            diff.path = to.to_string();
            continue;
        }

        let envelope = line.starts_with("diff ")
            || line.starts_with("index ")
            || line.starts_with("+++")
            || line.starts_with("---");

        let Some(open) = hunk.as_mut() else {
            // Envelope between the file header and the first hunk; the
            // /dev/null sides confirm creation/deletion.
            if line.starts_with("--- /dev/null") {
                diff.is_new_file = true;
            } else if line.starts_with("+++ /dev/null") {
                diff.is_deleted_file = true;
            }
            continue;
        };

        if envelope {
            open.lines.push(DiffLine {
                kind: DiffLineKind::Header,
                content: line.to_string(),
                old_line: None,
                new_line: None,
            });
        } else if let Some(content) = line.strip_prefix('+') {
            open.lines.push(DiffLine {
                kind: DiffLineKind::Addition,
                content: content.to_string(),
                old_line: None,
                new_line: Some(new_line),
            });
            new_line += 1;
        } else if let Some(content) = line.strip_prefix('-') {
            open.lines.push(DiffLine {
                kind: DiffLineKind::Deletion,
                content: content.to_string(),
                old_line: Some(old_line),
                new_line: None,
            });
            old_line += 1;
        } else if let Some(content) = line.strip_prefix(' ') {
            open.lines.push(DiffLine {
                kind: DiffLineKind::Context,
                content: content.to_string(),
                old_line: Some(old_line),
                new_line: Some(new_line),
            });
            old_line += 1;
            new_line += 1;
        }
        // Anything else ("\ No newline at end of file", mode lines inside
        // a hunk) is skipped.
    }

    flush_hunk(&mut current, &mut hunk);
    if let Some(done) = current.take() {
        diffs.push(done);
    }

    diffs
}

fn flush_hunk(current: &mut Option<Diff>, hunk: &mut Option<DiffHunk>) {
    if let (Some(diff), Some(done)) = (current.as_mut(), hunk.take()) {
        diff.hunks.push(done);
    }
}

/// Parse `git stash list --format=%gd|%ct|%gs` records.
///
/// The branch is extracted from the conventional "WIP on branch: …" / "On
/// branch: …" message shape when present; this is a convenience field, not
/// authoritative.
pub fn parse_stashes(output: &str) -> Vec<Stash> {
    let mut stashes = Vec::new();

    for (position, line) in output.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() < 3 {
            continue;
        }

        let name = parts[0].to_string();
        let index = STASH_SELECTOR_RE
            .captures(&name)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(position);
        let message = parts[2..].join("|");
        let branch = STASH_BRANCH_RE
            .captures(&message)
            .map(|c| c[1].to_string())
            .unwrap_or_default();

        stashes.push(Stash {
            name,
            index,
            message,
            branch,
            timestamp: epoch_or_now(parts[1]),
        });
    }

    stashes
}

/// Parse `for-each-ref` tag records in the wire format
/// `%(refname:short)|%(objecttype)|%(objectname)|%(*objectname)|%(creatordate:unix)|%(contents:subject)`.
///
/// Annotated tags are tag objects; their peeled target is preferred as the
/// commit hash.
pub fn parse_tags(output: &str) -> Vec<Tag> {
    let mut tags = Vec::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() < 6 {
            continue;
        }

        let is_annotated = parts[1] == "tag";
        let commit_hash = if parts[3].is_empty() {
            parts[2].to_string()
        } else {
            parts[3].to_string()
        };

        tags.push(Tag {
            name: parts[0].to_string(),
            message: parts[5..].join("|"),
            commit_hash,
            is_annotated,
            timestamp: epoch_or_now(parts[4]),
        });
    }

    tags
}

/// Parse `git remote -v` output, merging the fetch and push lines of each
/// remote while preserving first-seen order.
pub fn parse_remotes(output: &str) -> Vec<Remote> {
    let mut remotes: Vec<Remote> = Vec::new();

    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(name), Some(url)) = (fields.next(), fields.next()) else {
            continue;
        };
        let direction = fields.next().unwrap_or("(fetch)");

        match remotes.iter_mut().find(|r| r.name == name) {
            Some(remote) => {
                if direction == "(push)" {
                    remote.push_url = url.to_string();
                }
            }
            None => {
                remotes.push(Remote {
                    name: name.to_string(),
                    url: url.to_string(),
                    push_url: url.to_string(),
                });
            }
        }
    }

    remotes
}

/// Parse `git diff --numstat` output into (path, added, removed) triples.
/// Binary entries report `-` counts and map to `None`.
pub fn parse_numstat(output: &str) -> Vec<(String, Option<u32>, Option<u32>)> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            continue;
        }

        let added = parts[0].parse().ok();
        let removed = parts[1].parse().ok();
        entries.push((parts[2..].join("\t"), added, removed));
    }

    entries
}

/// Render the argument tail for a log invocation; kept next to the parser
/// because the two sides form one wire contract.
pub fn log_args(options: &LogOptions) -> Vec<String> {
    let mut args = vec![
        "log".to_string(),
        "--pretty=format:%H|%h|%an|%ae|%s|%ct|%P".to_string(),
        "-z".to_string(),
    ];

    if let Some(n) = options.max_count {
        args.push(format!("-{}", n));
    }
    if options.first_parent {
        args.push("--first-parent".to_string());
    }
    if !options.include_merges {
        args.push("--no-merges".to_string());
    }
    if options.follow_renames && options.path.is_some() {
        args.push("--follow".to_string());
    }
    if let Some(branch) = &options.branch {
        args.push(branch.clone());
    }
    if let Some(path) = &options.path {
        args.push("--".to_string());
        args.push(path.clone());
    }

    args
}
