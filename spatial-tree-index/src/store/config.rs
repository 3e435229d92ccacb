use std::path::{Path, PathBuf};

/// Where a [`RTreeStore`](super::RTreeStore) keeps its maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    file_path: Option<PathBuf>,
}

impl StoreConfig {
    /// A process-local store that is discarded on close.
    pub fn in_memory() -> Self {
        StoreConfig { file_path: None }
    }

    /// A store persisted to `path` on flush and close.
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        StoreConfig {
            file_path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_persistent(&self) -> bool {
        self.file_path.is_some()
    }
}
