//! Print pathway: a vector PDF of one printable region, opened inline so the
//! browser's own print dialog takes over.

use std::sync::Arc;

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::engine::{DocumentCompiler, OutputFormat, Templates, LETTER_LAYOUT_FILE, RECEIPT_LAYOUT_FILE};
use super::gate::ExportPathway;
use super::images::{stage_images, StagedImage};
use super::source::{document_dict, entry_source, PageSetup};
use super::surface::RenderSurface;
use super::{run_blocking, Disposition, ExportError, ExportService, ExportedPdf};
use crate::receipt::document::ReceiptDocument;

const PRINT_SOURCE: &str = "print.typ";
const PRINT_OUTPUT: &str = "print.pdf";

/// Independently printable regions of the receipt view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrintRegion {
    #[default]
    Receipt,
    Letter,
}

impl PrintRegion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Letter => "letter",
        }
    }

    fn layout_file(&self) -> &'static str {
        match self {
            Self::Receipt => RECEIPT_LAYOUT_FILE,
            Self::Letter => LETTER_LAYOUT_FILE,
        }
    }

    fn layout_function(&self) -> &'static str {
        self.as_str()
    }

    fn template<'a>(&self, templates: &'a Templates) -> &'a str {
        match self {
            Self::Receipt => &templates.receipt,
            Self::Letter => &templates.letter,
        }
    }

    pub fn margin_mm(&self) -> f64 {
        match self {
            Self::Receipt => 2.0,
            Self::Letter => 1.0,
        }
    }

    /// Document title shown by the print dialog, e.g. `Letter_R-1001`.
    pub fn title(&self, doc: &ReceiptDocument) -> String {
        match self {
            Self::Receipt => doc.export_stem(),
            Self::Letter => format!("Letter_{}", doc.receipt_ref_no),
        }
    }
}

fn print_blocking(
    compiler: &dyn DocumentCompiler,
    templates: &Templates,
    doc: &ReceiptDocument,
    region: PrintRegion,
    images: &[Option<StagedImage>],
) -> Result<Vec<u8>, ExportError> {
    let surface = RenderSurface::acquire(region.as_str())?;
    let signature_files = stage_images(&surface, images)?;

    surface.write(region.layout_file(), region.template(templates))?;
    surface.write(
        PRINT_SOURCE,
        entry_source(
            region.layout_file(),
            region.layout_function(),
            &region.title(doc),
            PageSetup::A4 {
                margin_mm: region.margin_mm(),
            },
            &document_dict(doc, &signature_files),
        ),
    )?;

    compiler.compile(surface.path(), PRINT_SOURCE, PRINT_OUTPUT, OutputFormat::Pdf)?;
    surface.read(PRINT_OUTPUT)
}

impl ExportService {
    /// Render `region` of the document for printing.
    ///
    /// Fails with [`ExportError::AlreadyInProgress`] while the same region of
    /// receipt `receipt_id` is still being prepared.
    pub async fn print(
        &self,
        receipt_id: &str,
        doc: &ReceiptDocument,
        region: PrintRegion,
    ) -> Result<ExportedPdf, ExportError> {
        let ticket = self
            .gate
            .try_acquire(ExportPathway::Print(region), receipt_id)?;

        let job_id = Uuid::new_v4();
        log::debug!("Export job {} started for receipt {}", job_id, receipt_id);

        let images = self.signatures.collect(&doc.signatories).await;
        let compiler = Arc::clone(&self.compiler);
        let templates = Arc::clone(&self.templates);
        let job_doc = doc.clone();

        // Owned by the render job: the gate stays closed until Typst finishes.
        let result = run_blocking(move || {
            let _ticket = ticket;
            print_blocking(compiler.as_ref(), &templates, &job_doc, region, &images)
        })
        .await;

        match result {
            Ok(pdf) => {
                log::info!(
                    "Export job {}: prepared {} print for receipt {} ({} bytes)",
                    job_id,
                    region.as_str(),
                    doc.receipt_ref_no,
                    pdf.len()
                );
                Ok(ExportedPdf {
                    filename: format!("{}.pdf", region.title(doc)),
                    pdf,
                    disposition: Disposition::Inline,
                })
            }
            Err(e) => {
                log::error!(
                    "Export job {}: {} print for receipt {} failed: {}",
                    job_id,
                    region.as_str(),
                    doc.receipt_ref_no,
                    e
                );
                Err(e)
            }
        }
    }
}
