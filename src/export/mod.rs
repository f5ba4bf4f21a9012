//! Export pathways for receipt documents.
//!
//! - `print` - vector PDF of one printable region, served inline for the browser print dialog
//! - `raster` - off-screen capture of the receipt to PNG, embedded into an A4 PDF download
//!
//! Both pathways lay documents out with Typst (`engine`), stage their files in a
//! scoped `RenderSurface`, and are guarded by an independent per-receipt `ExportGate`.

pub mod engine;
pub mod gate;
pub mod images;
pub mod print;
pub mod raster;
pub mod source;
pub mod surface;

pub use engine::{DocumentCompiler, OutputFormat, Templates, TypstCli};
pub use gate::{ExportGate, ExportPathway, ExportState, ExportStatus, ExportTicket};
pub use images::SignatureFetcher;
pub use print::PrintRegion;
pub use surface::RenderSurface;

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0} export already in progress for this receipt")]
    AlreadyInProgress(ExportPathway),
    #[error("failed to load layout template: {0}")]
    TemplateIo(#[source] std::io::Error),
    #[error("failed to prepare render surface: {0}")]
    Surface(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    TypstIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {0}")]
    TypstExit(i32),
    #[error("failed to read rendered output: {0}")]
    ReadOutput(#[source] std::io::Error),
    #[error("captured bitmap is not a valid PNG")]
    InvalidBitmap,
    #[error("export task aborted: {0}")]
    Aborted(String),
}

/// How the browser should treat the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Opened in place, for printing.
    Inline,
    /// Saved as a download.
    Attachment,
}

/// A finished PDF export.
#[derive(Debug)]
pub struct ExportedPdf {
    pub filename: String,
    pub pdf: Vec<u8>,
    pub disposition: Disposition,
}

/// Shared entry point for both export pathways.
#[derive(Clone)]
pub struct ExportService {
    compiler: Arc<dyn DocumentCompiler>,
    templates: Arc<Templates>,
    gate: ExportGate,
    signatures: SignatureFetcher,
}

impl ExportService {
    pub fn new(
        compiler: Arc<dyn DocumentCompiler>,
        templates: Templates,
        signatures: SignatureFetcher,
    ) -> Self {
        Self {
            compiler,
            templates: Arc::new(templates),
            gate: ExportGate::new(),
            signatures,
        }
    }

    pub fn gate(&self) -> &ExportGate {
        &self.gate
    }

    pub fn status(&self, receipt_ref: &str) -> ExportStatus {
        self.gate.status(receipt_ref)
    }
}

/// Run a blocking render job on the blocking pool.
async fn run_blocking<T, F>(job: F) -> Result<T, ExportError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ExportError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ExportError::Aborted(e.to_string()))?
}
