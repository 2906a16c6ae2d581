//! Host collaborators: output directories, file writes, and the post-bake
//! refresh notification.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use texbake_core::{BakeError, Result};

/// What the bake needs from its host environment.
pub trait BakeHost {
    /// Makes sure `path` exists and can be written to.
    fn ensure_directory(&mut self, path: &Path) -> Result<()>;

    /// Writes `bytes` to `path`, replacing any existing file.
    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Called once after a bake schedule completes.
    fn refresh_assets(&mut self) {}
}

/// Writes to the local filesystem.
#[derive(Default)]
pub struct FsHost {
    on_refresh: Option<Box<dyn FnMut() + Send>>,
}

impl FsHost {
    /// Creates a host with no refresh hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a callback run by [`BakeHost::refresh_assets`].
    #[must_use]
    pub fn with_refresh_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_refresh = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for FsHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsHost")
            .field("on_refresh", &self.on_refresh.is_some())
            .finish()
    }
}

impl BakeHost for FsHost {
    fn ensure_directory(&mut self, path: &Path) -> Result<()> {
        let not_writable = |reason: String| BakeError::OutputNotWritable {
            path: path.to_path_buf(),
            reason,
        };
        fs::create_dir_all(path).map_err(|e| not_writable(e.to_string()))?;
        let metadata = fs::metadata(path).map_err(|e| not_writable(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(not_writable("not a directory".to_string()));
        }
        if metadata.permissions().readonly() {
            return Err(not_writable("directory is read-only".to_string()));
        }
        Ok(())
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes).map_err(|source| BakeError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }

    fn refresh_assets(&mut self) {
        log::debug!("refreshing assets");
        if let Some(hook) = self.on_refresh.as_mut() {
            hook();
        }
    }
}

/// Keeps written files in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    directories: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    read_only: bool,
    refreshes: usize,
}

impl MemoryHost {
    /// Creates an empty, writable host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host that rejects every directory and write.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Written files by path.
    #[must_use]
    pub fn files(&self) -> &BTreeMap<PathBuf, Vec<u8>> {
        &self.files
    }

    /// Contents of the file at `path`.
    #[must_use]
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    /// Directories ensured so far.
    #[must_use]
    pub fn directories(&self) -> &BTreeSet<PathBuf> {
        &self.directories
    }

    /// How many times [`BakeHost::refresh_assets`] ran.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }
}

impl BakeHost for MemoryHost {
    fn ensure_directory(&mut self, path: &Path) -> Result<()> {
        if self.read_only {
            return Err(BakeError::OutputNotWritable {
                path: path.to_path_buf(),
                reason: "host is read-only".to_string(),
            });
        }
        self.directories.insert(path.to_path_buf());
        Ok(())
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(BakeError::WriteError {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only host"),
            });
        }
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn refresh_assets(&mut self) {
        self.refreshes += 1;
    }
}
