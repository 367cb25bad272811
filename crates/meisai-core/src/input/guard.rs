//! Path containment and size checks run before any parsing.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde_json::json;
use tracing::debug;

use crate::error::{Result, StatementError};
use crate::models::config::GuardConfig;

/// A file that passed the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedFile {
    /// Canonical path of the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Checks that a file lives under an authorized root and is not too large.
#[derive(Debug, Clone)]
pub struct FileGuard {
    max_file_size: u64,
}

impl FileGuard {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(config.max_file_size)
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Run the containment check, then the existence and size checks.
    pub fn check(&self, file: &Path, allowed_dir: &Path) -> Result<GuardedFile> {
        let path = self.validate_path(file, allowed_dir)?;
        let size = self.validate_size(&path)?;
        Ok(GuardedFile { path, size })
    }

    /// Confirm `file` resolves to a descendant of `allowed_dir`.
    ///
    /// Both paths are canonicalized, so symlinks pointing out of the root
    /// are rejected. Returns the resolved file path.
    pub fn validate_path(&self, file: &Path, allowed_dir: &Path) -> Result<PathBuf> {
        let resolved_file = resolve(file)?;
        let resolved_root = resolve(allowed_dir)?;

        if !resolved_file.starts_with(&resolved_root) {
            return Err(StatementError::path_validation(
                format!("file is outside the allowed directory: {}", file.display()),
                json!({
                    "file_path": resolved_file.display().to_string(),
                    "allowed_dir": resolved_root.display().to_string(),
                }),
            ));
        }

        debug!("{} is inside {}", resolved_file.display(), resolved_root.display());
        Ok(resolved_file)
    }

    /// Confirm `file` exists and is at most `max_file_size` bytes.
    pub fn validate_size(&self, file: &Path) -> Result<u64> {
        let metadata = match fs::metadata(file) {
            Ok(m) => m,
            Err(e) if is_missing(&e) => {
                return Err(not_found(file));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(StatementError::file_not_found(
                format!("not a regular file: {}", file.display()),
                json!({ "file_path": file.display().to_string() }),
            ));
        }

        let size = metadata.len();
        if size > self.max_file_size {
            let size_mb = size as f64 / (1024.0 * 1024.0);
            let max_mb = self.max_file_size as f64 / (1024.0 * 1024.0);
            return Err(StatementError::file_size(
                format!("file is {:.2}MB, limit is {:.0}MB", size_mb, max_mb),
                json!({
                    "file_size_bytes": size,
                    "file_size_mb": size_mb,
                    "max_size_bytes": self.max_file_size,
                    "max_size_mb": max_mb,
                }),
            ));
        }

        Ok(size)
    }
}

impl Default for FileGuard {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}

pub(crate) fn not_found(file: &Path) -> StatementError {
    StatementError::file_not_found(
        format!("file not found: {}", file.display()),
        json!({ "file_path": file.display().to_string() }),
    )
}

/// The path names nothing: a component is absent, or an intermediate
/// component is a regular file.
fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Canonicalize `path`, tolerating a missing tail.
///
/// The longest existing ancestor is canonicalized and the missing
/// components are appended, so containment can still be decided for a
/// file that does not exist yet.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(p) => return Ok(p),
        Err(e) if !is_missing(&e) => return Err(e),
        Err(_) => {}
    }

    let normalized = normalize_lexically(&std::path::absolute(path)?);
    for ancestor in normalized.ancestors().skip(1) {
        if let Ok(base) = fs::canonicalize(ancestor) {
            let rest = normalized.strip_prefix(ancestor).unwrap_or(&normalized);
            return Ok(base.join(rest));
        }
    }
    Ok(normalized)
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
