//! Run lock - prevents overlapping passes over one staging directory.
//!
//! A PID file next to the checkpoint marks the running instance. A file left
//! behind by a dead process is reclaimed.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IndexerError;

/// Lock file path for a checkpoint file: `<checkpoint>.lock`.
pub fn lock_path(checkpoint: &Path) -> PathBuf {
    let mut name = checkpoint
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "checkpoint".into());
    name.push(".lock");
    checkpoint.with_file_name(name)
}

/// Check if a process is running by PID.
fn process_is_running(pid: u32) -> bool {
    // Unix: kill -0 checks if process exists without sending signal.
    // EPERM means it exists but belongs to someone else.
    #[cfg(unix)]
    {
        let rc = unsafe { libc::kill(pid as i32, 0) };
        rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

/// RAII guard that owns the PID file.
/// Removes it on drop.
#[derive(Debug)]
pub struct RunGuard {
    pid_file: PathBuf,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.pid_file);
    }
}

impl RunGuard {
    pub fn path(&self) -> &Path {
        &self.pid_file
    }
}

/// Take the run lock for `checkpoint`.
///
/// Fails with `IndexerError::LockHeld` while another live process holds it.
pub fn acquire(checkpoint: &Path) -> Result<RunGuard> {
    let pid_file = lock_path(checkpoint);

    if let Some(parent) = pid_file.parent() {
        fs::create_dir_all(parent)?;
    }

    if pid_file.exists() {
        let content = fs::read_to_string(&pid_file)?;
        if let Ok(pid) = content.trim().parse::<u32>() {
            if pid != std::process::id() && process_is_running(pid) {
                return Err(IndexerError::LockHeld(pid).into());
            }
        }
        // Stale PID file - process died, clean up
        tracing::warn!("Removing stale lock {}", pid_file.display());
        fs::remove_file(&pid_file)?;
    }

    fs::write(&pid_file, std::process::id().to_string())
        .with_context(|| format!("Failed to write lock {}", pid_file.display()))?;
    Ok(RunGuard { pid_file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::lock_holder;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path(Path::new("/var/lib/indexer/last-run")),
            PathBuf::from("/var/lib/indexer/last-run.lock")
        );
    }

    #[test]
    fn test_guard_writes_and_removes_pid_file() {
        let tmp = TempDir::new().unwrap();
        let checkpoint = tmp.path().join("last-run");
        let lock = lock_path(&checkpoint);
        {
            let guard = acquire(&checkpoint).unwrap();
            assert_eq!(guard.path(), lock.as_path());
            let pid: u32 = fs::read_to_string(&lock).unwrap().parse().unwrap();
            assert_eq!(pid, std::process::id());
        }
        assert!(!lock.exists());
    }

    #[test]
    fn test_stale_lock_is_reclaimed() {
        let tmp = TempDir::new().unwrap();
        let checkpoint = tmp.path().join("last-run");
        // PID well above any default pid_max
        fs::write(lock_path(&checkpoint), "4194999").unwrap();
        assert!(acquire(&checkpoint).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_live_holder_blocks() {
        let tmp = TempDir::new().unwrap();
        let checkpoint = tmp.path().join("last-run");
        // PID 1 is always alive
        fs::write(lock_path(&checkpoint), "1").unwrap();
        let err = acquire(&checkpoint).unwrap_err();
        assert_eq!(lock_holder(&err), Some(1));
    }
}
