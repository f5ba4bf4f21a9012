use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::ExportError;

/// Off-screen workspace for one export job.
///
/// Layout sources, fetched images and intermediate renders live here. The
/// directory is deleted when the surface is dropped, whichever way the job ends.
pub struct RenderSurface {
    dir: TempDir,
}

impl RenderSurface {
    pub fn acquire(label: &str) -> Result<Self, ExportError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("receipt-{label}-"))
            .tempdir()
            .map_err(ExportError::Surface)?;
        log::debug!("Render surface acquired at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<(), ExportError> {
        fs::write(self.file(name), contents).map_err(ExportError::Surface)
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, ExportError> {
        fs::read(self.file(name)).map_err(ExportError::ReadOutput)
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        log::debug!("Render surface released at {}", self.dir.path().display());
    }
}
