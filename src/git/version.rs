use std::sync::LazyLock;

use regex::Regex;

use crate::error::{GitError, GitResult};
use crate::process::ProcessRunner;

/// Minimum required git version
const MIN_GIT_VERSION: (u32, u32) = (2, 20);

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^git version (\d+)\.(\d+)(?:\.(\d+))?").unwrap());

/// Version of the installed git binary
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Detect the version of the default git binary
    pub fn detect() -> GitResult<Self> {
        Self::detect_program("git")
    }

    /// Detect the version of a specific git binary
    pub fn detect_program(program: &str) -> GitResult<Self> {
        let runner = ProcessRunner::new();
        let result = runner.run(program, &["--version"], None);

        if !result.success() {
            return Err(GitError::VersionDetectionFailed(format!(
                "{} --version failed: {}",
                program,
                result.stderr_text().trim()
            )));
        }

        Self::parse(&result.stdout_text())
    }

    /// Parse a version string like "git version 2.39.2" or
    /// "git version 2.39.2.windows.1"
    pub fn parse(version_str: &str) -> GitResult<Self> {
        let caps = VERSION_RE.captures(version_str.trim()).ok_or_else(|| {
            GitError::ParseError(format!("Unexpected git version format: {}", version_str))
        })?;

        Ok(GitVersion {
            major: caps[1].parse().unwrap_or(0),
            minor: caps[2].parse().unwrap_or(0),
            patch: caps.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0)),
        })
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        self.major > MIN_GIT_VERSION.0
            || (self.major == MIN_GIT_VERSION.0 && self.minor >= MIN_GIT_VERSION.1)
    }

    /// Validate that the installed git version is sufficient
    pub fn validate() -> GitResult<Self> {
        let version = Self::detect()?;

        if !version.is_supported() {
            return Err(GitError::VersionTooOld(version.to_string()));
        }

        Ok(version)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Locate a usable git executable.
///
/// Prefers plain `git` on PATH; on Windows, falls back to the common
/// installation paths before giving up and returning "git".
pub fn git_program() -> String {
    if GitVersion::detect_program("git").is_ok() {
        return "git".to_string();
    }

    #[cfg(windows)]
    {
        let candidates = [
            r"C:\Program Files\Git\bin\git.exe",
            r"C:\Program Files (x86)\Git\bin\git.exe",
            r"C:\Git\bin\git.exe",
        ];
        for candidate in candidates {
            if std::path::Path::new(candidate).exists() {
                return candidate.to_string();
            }
        }
    }

    "git".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_version() {
        let version = GitVersion::parse("git version 2.39.2").unwrap();
        assert_eq!(version.major, 2);
        assert_eq!(version.minor, 39);
        assert_eq!(version.patch, 2);
    }

    #[test]
    fn test_parse_version_with_suffix() {
        let version = GitVersion::parse("git version 2.39.2.windows.1").unwrap();
        assert_eq!(version.major, 2);
        assert_eq!(version.minor, 39);
        assert_eq!(version.patch, 2);
    }

    #[test]
    fn test_parse_version_no_patch() {
        let version = GitVersion::parse("git version 2.39").unwrap();
        assert_eq!(version.patch, 0);
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!(GitVersion::parse("version 2.39.2").is_err());
        assert!(GitVersion::parse("git 2.39.2").is_err());
        assert!(GitVersion::parse("random string").is_err());
    }

    #[test]
    fn test_version_comparison() {
        let v1 = GitVersion { major: 2, minor: 20, patch: 0 };
        let v2 = GitVersion { major: 2, minor: 39, patch: 2 };
        let v3 = GitVersion { major: 3, minor: 0, patch: 0 };

        assert!(v1 < v2);
        assert!(v2 < v3);
    }

    #[test]
    fn test_is_supported() {
        assert!(GitVersion { major: 2, minor: 20, patch: 0 }.is_supported());
        assert!(GitVersion { major: 3, minor: 0, patch: 0 }.is_supported());
        assert!(!GitVersion { major: 2, minor: 19, patch: 9 }.is_supported());
        assert!(!GitVersion { major: 1, minor: 9, patch: 0 }.is_supported());
    }

    #[test]
    fn test_display() {
        let version = GitVersion { major: 2, minor: 39, patch: 2 };
        assert_eq!(format!("{}", version), "2.39.2");
    }

    #[test]
    fn test_git_program_prefers_path_git() {
        // CI always has git on PATH
        assert_eq!(git_program(), "git");
    }
}
