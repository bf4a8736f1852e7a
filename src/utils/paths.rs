use crate::error::{AppError, Result};
use serde::Serializer;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Entries whose name starts with a dot are never treated as groups or
/// files, and are ignored when deciding whether a directory is empty.
pub fn is_hidden_name(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// True if `inner` equals `outer` or lies below it, compared component-wise.
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    inner.starts_with(outer)
}

/// Resolves a tree root to its canonical form so nesting checks are not
/// fooled by `..`, symlinks or trailing separators.
pub fn canonical_root(path: &Path, role: &str) -> Result<PathBuf> {
    let metadata = std::fs::metadata(path).map_err(|e| AppError::ConfigError {
        message: format!("The {} dir {} is not accessible: {}", role, path.display(), e),
    })?;

    if !metadata.is_dir() {
        return Err(AppError::ConfigError {
            message: format!("The {} dir {} is not a directory", role, path.display()),
        });
    }

    Ok(path.canonicalize()?)
}

/// Renders a relative path with `/` separators for log lines and plans.
pub fn display_relative(group: &OsStr, relative_path: &Path) -> String {
    let mut out = group.to_string_lossy().into_owned();
    for component in relative_path.components() {
        out.push('/');
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// Serializes a name or path as a string, replacing bytes that are not valid
/// UTF-8 instead of failing.
pub fn serialize_lossy<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<OsStr>,
    S: Serializer,
{
    serializer.serialize_str(&value.as_ref().to_string_lossy())
}
