//! Workspace path resolution
//!
//! Paths are resolved lexically (the target may not exist yet) and then
//! through any existing ancestor, so symlinks cannot smuggle a path out of
//! the workspace.

use std::path::{Component, Path, PathBuf};

use crate::execution_engine::ToolError;

/// Remove `.` and `..` components without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
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

/// Resolve symlinks through the longest existing ancestor
fn canonicalize_existing(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut tail = Vec::new();
    while !existing.exists() {
        match existing.file_name() {
            Some(name) => tail.push(name.to_os_string()),
            None => return path.to_path_buf(),
        }
        if !existing.pop() {
            return path.to_path_buf();
        }
    }
    let mut resolved = existing.canonicalize().unwrap_or(existing);
    for name in tail.into_iter().rev() {
        resolved.push(name);
    }
    resolved
}

/// Expand a leading `~` to the home directory
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Resolve `raw` against `root`
///
/// With `allow_outside` false, anything that lands outside `root` is
/// rejected with [`ToolError::OutsideWorkspace`].
pub fn resolve_path(raw: &str, root: &Path, allow_outside: bool) -> Result<PathBuf, ToolError> {
    let root = canonicalize_existing(&normalize_lexically(root));
    let candidate = expand_home(raw);
    let joined = if candidate.is_absolute() {
        candidate
    } else {
        root.join(candidate)
    };
    let resolved = canonicalize_existing(&normalize_lexically(&joined));

    if allow_outside || resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(ToolError::OutsideWorkspace(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/./c/../d")),
            PathBuf::from("/a/b/d")
        );
    }

    #[test]
    fn test_resolve_inside_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_path("sub/new.txt", dir.path(), false).unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(resolved, root.join("sub/new.txt"));
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_path("../outside.txt", dir.path(), false).unwrap_err();
        assert!(matches!(err, ToolError::OutsideWorkspace(_)));
        assert!(resolve_path("/etc/passwd", dir.path(), false).is_err());
    }

    #[test]
    fn test_resolve_allows_escape_when_unsafe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_path("../outside.txt", dir.path(), true).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        assert!(resolve_path("link/secret.txt", dir.path(), false).is_err());
    }
}
