//! Path validation against the relay's allowed directories.
//!
//! Every path the relay reads or writes passes through [`validate_path`],
//! which resolves `..` segments and symlinks before checking containment.
//! [`is_within_allowed`] and [`is_writable_directory`] are total: they answer
//! `false` instead of failing.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

/// Errors from path validation.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// The path is empty.
    #[error("path is empty")]
    Empty,
    /// The path contains a null byte.
    #[error("path contains null byte")]
    NullByte,
    /// The path is outside all allowed directories.
    #[error("path {} is not within the allowed directories: {allowed}", .path.display())]
    NotAllowed { path: PathBuf, allowed: AllowedDirs },
    /// No allowed directory was configured.
    #[error("at least one allowed directory is required")]
    NoAllowedDirs,
    /// An I/O error occurred during path resolution.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered, non-empty set of directory roots the relay may touch.
///
/// The first entry is where artifacts go when no directory is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedDirs(Vec<PathBuf>);

impl AllowedDirs {
    /// Resolve each directory to an absolute, canonical form.
    ///
    /// Directories that do not exist yet are kept in normalized form so the
    /// configured set is reported verbatim.
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Result<Self, ValidateError> {
        let mut resolved = Vec::new();
        for dir in dirs {
            if !dir.exists() {
                tracing::warn!(dir = %dir.display(), "allowed directory does not exist");
            }
            let dir = resolve(&dir)?;
            if !resolved.contains(&dir) {
                resolved.push(dir);
            }
        }
        if resolved.is_empty() {
            return Err(ValidateError::NoAllowedDirs);
        }
        Ok(Self(resolved))
    }

    /// The default storage directory.
    pub fn primary(&self) -> &Path {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    /// Whether an already-resolved path equals or descends from an entry.
    ///
    /// [`Path::starts_with`] compares whole components, so `/data-old` is not
    /// inside `/data`.
    pub fn contains(&self, resolved: &Path) -> bool {
        self.0.iter().any(|dir| resolved.starts_with(dir))
    }
}

impl fmt::Display for AllowedDirs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, dir) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", dir.display())?;
        }
        f.write_str("]")
    }
}

/// Make `path` absolute and fold away `.` and `..` without touching the
/// filesystem.
fn normalize(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    Ok(out)
}

/// Normalize, then canonicalize the longest existing ancestor so symlinks
/// are resolved even when the leaf does not exist yet.
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let normalized = normalize(path)?;
    for ancestor in normalized.ancestors() {
        if let Ok(canonical) = ancestor.canonicalize() {
            let rest = normalized
                .strip_prefix(ancestor)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
            return Ok(if rest.as_os_str().is_empty() {
                canonical
            } else {
                canonical.join(rest)
            });
        }
    }
    Ok(normalized)
}

/// Validate that a path is within the allowed directories.
///
/// Steps:
/// 1. Reject empty paths and paths containing null bytes
/// 2. Resolve the path (absolute, `..` folded, symlinks followed as far as
///    the path exists)
/// 3. Verify the resolved path equals or descends from an allowed directory
pub fn validate_path(path: &str, allowed: &AllowedDirs) -> Result<PathBuf, ValidateError> {
    if path.is_empty() {
        return Err(ValidateError::Empty);
    }
    if path.contains('\0') {
        return Err(ValidateError::NullByte);
    }

    let resolved = resolve(Path::new(path))?;
    if !allowed.contains(&resolved) {
        return Err(ValidateError::NotAllowed {
            path: resolved,
            allowed: allowed.clone(),
        });
    }

    Ok(resolved)
}

/// Whether `path` resolves inside one of the allowed directories.
pub fn is_within_allowed(path: &str, allowed: &AllowedDirs) -> bool {
    validate_path(path, allowed).is_ok()
}

/// Whether `path` is an existing directory in which a file can be created.
///
/// Probes by creating and removing a uniquely named empty file.
pub async fn is_writable_directory(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return false,
    }

    let dir = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(".wmcp-relay-probe-")
            .tempfile_in(&dir)
            .and_then(|probe| probe.close())
            .is_ok()
    })
    .await
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use crate::validate::{AllowedDirs, ValidateError, is_within_allowed, is_writable_directory, validate_path};
    use std::{fs, path::PathBuf};

    fn allowed(dir: &std::path::Path) -> AllowedDirs {
        AllowedDirs::new(vec![dir.to_path_buf()]).unwrap()
    }

    #[test]
    fn allows_path_within_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = allowed(tmp.path());
        let test_path = tmp.path().join("data.json");
        fs::write(&test_path, "{}").unwrap();
        assert!(validate_path(test_path.to_str().unwrap(), &dirs).is_ok());
        assert!(is_within_allowed(tmp.path().to_str().unwrap(), &dirs));
    }

    #[test]
    fn allows_nonexistent_nested_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = allowed(tmp.path());
        let path = tmp.path().join("not/yet/here.csv");
        assert!(is_within_allowed(path.to_str().unwrap(), &dirs));
    }

    #[test]
    fn traversal_out_of_allowed_dir_is_rejected() {
        let dirs = AllowedDirs::new(vec![PathBuf::from("/wmcp-relay-test/a")]).unwrap();
        assert!(is_within_allowed("/wmcp-relay-test/a", &dirs));
        assert!(is_within_allowed("/wmcp-relay-test/a/x/../y", &dirs));
        assert!(!is_within_allowed("/wmcp-relay-test/a/../b", &dirs));
        assert!(!is_within_allowed("/wmcp-relay-test/a/../../etc/passwd", &dirs));
    }

    #[test]
    fn sibling_with_shared_prefix_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        let sibling = tmp.path().join("data-old");
        fs::create_dir(&data).unwrap();
        fs::create_dir(&sibling).unwrap();
        let dirs = allowed(&data);
        assert!(!is_within_allowed(sibling.join("x.txt").to_str().unwrap(), &dirs));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_allowed_dir_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let link = tmp.path().join("escape");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();
        let dirs = allowed(tmp.path());
        assert!(!is_within_allowed(link.join("secret.txt").to_str().unwrap(), &dirs));
    }

    #[test]
    fn rejects_empty_and_null_byte() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = allowed(tmp.path());
        assert!(matches!(validate_path("", &dirs), Err(ValidateError::Empty)));
        assert!(matches!(validate_path("/tmp/foo\0bar", &dirs), Err(ValidateError::NullByte)));
    }

    #[test]
    fn rejection_names_path_and_allow_list() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let dirs =
            AllowedDirs::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();
        let err = validate_path("/etc/passwd", &dirs).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/etc/passwd"));
        for dir in dirs.iter() {
            assert!(msg.contains(&dir.display().to_string()));
        }
    }

    #[test]
    fn empty_allow_list_is_rejected() {
        assert!(matches!(AllowedDirs::new(Vec::new()), Err(ValidateError::NoAllowedDirs)));
    }

    #[test]
    fn primary_is_first_entry() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let dirs =
            AllowedDirs::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();
        assert_eq!(dirs.primary(), first.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn writable_directory_probe() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(is_writable_directory(tmp.path()).await);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);

        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(!is_writable_directory(&file).await);
        assert!(!is_writable_directory(&tmp.path().join("missing")).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_probes_all_succeed() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..32 {
            let dir = tmp.path().to_path_buf();
            tasks.spawn(async move { is_writable_directory(&dir).await });
        }
        while let Some(writable) = tasks.join_next().await {
            assert!(writable.unwrap());
        }
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
