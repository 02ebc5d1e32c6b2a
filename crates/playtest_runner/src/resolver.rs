//! Filesystem-backed content resolver.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RunnerError, RunnerResult};
use crate::executor::ContentResolver;

/// Resolves content paths relative to a root directory.
///
/// Absolute paths and paths that climb out of the root are rejected.
#[derive(Debug, Clone)]
pub struct FsContentResolver {
    root: PathBuf,
}

impl FsContentResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> RunnerResult<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(RunnerError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentResolver for FsContentResolver {
    async fn resolve(&self, path: &str) -> RunnerResult<Vec<u8>> {
        let full = self.full_path(path)?;
        debug!("Resolving content {:?}", full);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RunnerError::ContentNotFound(path.to_string()))
            }
            Err(e) => Err(RunnerError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolves_relative_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/cat.png"), b"\x89PNG").unwrap();

        let resolver = FsContentResolver::new(dir.path());
        let bytes = resolver.resolve("images/cat.png").await.unwrap();
        assert_eq!(bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let resolver = FsContentResolver::new(dir.path());

        let err = resolver.resolve("nope.txt").await.unwrap_err();
        assert!(matches!(err, RunnerError::ContentNotFound(p) if p == "nope.txt"));
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let resolver = FsContentResolver::new(dir.path());

        for path in ["../secret", "/etc/passwd", "a/../../b", ""] {
            let err = resolver.resolve(path).await.unwrap_err();
            assert!(matches!(err, RunnerError::InvalidPath(_)), "{path}");
        }
    }
}
