use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Appends every dispatched git command to a history log for later
/// inspection. One line per command, oldest file rotated away at 10MB.
pub struct CommandLogger {
    log_path: PathBuf,
}

impl CommandLogger {
    /// Create a CommandLogger with the default log path
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create a CommandLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Get the default log path: ~/.config/gitscope/history.log
    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gitscope")
            .join("history.log"))
    }

    /// Log one executed command with its exit code
    pub fn log_command(
        &self,
        command: &str,
        repo_path: &Path,
        exit_code: i32,
    ) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());

        let log_entry = format!(
            "[{}] [{}] [{}] [exit:{}] git {}\n",
            timestamp,
            user,
            repo_path.display(),
            exit_code,
            command
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(log_entry.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate the log file once it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let size = fs::metadata(&self.log_path)?.len();
        if size < MAX_LOG_SIZE {
            return Ok(());
        }

        let mut rotated = self.log_path.clone();
        rotated.set_extension("log.1");
        fs::rename(&self.log_path, &rotated)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_command_appends_lines() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("history.log");
        let logger = CommandLogger::with_path(&log_path).unwrap();

        logger
            .log_command("status --porcelain=v1 -b", Path::new("/repo"), 0)
            .unwrap();
        logger
            .log_command("push origin main", Path::new("/repo"), 1)
            .unwrap();

        let contents = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[exit:0] git status --porcelain=v1 -b"));
        assert!(lines[1].contains("[exit:1] git push origin main"));
        assert!(lines[1].contains("[/repo]"));
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("nested").join("dir").join("history.log");

        let logger = CommandLogger::with_path(&log_path).unwrap();
        logger.log_command("fetch", Path::new("/repo"), 0).unwrap();

        assert!(log_path.exists());
    }

    #[test]
    fn test_rotation_moves_oversized_log() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("history.log");
        let logger = CommandLogger::with_path(&log_path).unwrap();

        fs::write(&log_path, vec![b'x'; (MAX_LOG_SIZE + 1) as usize]).unwrap();
        logger.log_command("status", Path::new("/repo"), 0).unwrap();

        let rotated = temp.path().join("history.log.1");
        assert!(rotated.exists());
        let contents = fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
