//! Rasterized PDF pathway.
//!
//! The receipt is laid out off-screen at A4 width, captured to PNG at twice
//! screen density, and the bitmap is placed on a single A4 page with a 2mm margin.

use std::sync::Arc;

use uuid::Uuid;

use super::engine::{DocumentCompiler, OutputFormat, Templates, RECEIPT_LAYOUT_FILE};
use super::gate::ExportPathway;
use super::images::{stage_images, StagedImage};
use super::source::{document_dict, embed_source, entry_source, ImagePlacement, PageSetup, PAGE_MARGIN_MM};
use super::surface::RenderSurface;
use super::{run_blocking, Disposition, ExportError, ExportService, ExportedPdf};
use crate::receipt::document::ReceiptDocument;

/// CSS reference density.
const SCREEN_PPI: f32 = 96.0;
/// Capture at twice screen density.
const RASTER_SCALE: f32 = 2.0;
pub const RASTER_PPI: f32 = SCREEN_PPI * RASTER_SCALE;

const CAPTURE_SOURCE: &str = "capture.typ";
const CAPTURE_BITMAP: &str = "capture.png";
const EMBED_SOURCE: &str = "embed.typ";
const EMBED_OUTPUT: &str = "receipt.pdf";

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Width and height from the IHDR chunk of a PNG.
pub fn png_dimensions(data: &[u8]) -> Result<(u32, u32), ExportError> {
    if data.len() < 24 || data[..8] != PNG_SIGNATURE || &data[12..16] != b"IHDR" {
        return Err(ExportError::InvalidBitmap);
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    if width == 0 || height == 0 {
        return Err(ExportError::InvalidBitmap);
    }
    Ok((width, height))
}

fn rasterize_blocking(
    compiler: &dyn DocumentCompiler,
    templates: &Templates,
    doc: &ReceiptDocument,
    images: &[Option<StagedImage>],
) -> Result<Vec<u8>, ExportError> {
    let surface = RenderSurface::acquire("raster")?;
    let signature_files = stage_images(&surface, images)?;
    let title = doc.export_stem();

    surface.write(RECEIPT_LAYOUT_FILE, &templates.receipt)?;
    surface.write(
        CAPTURE_SOURCE,
        entry_source(
            RECEIPT_LAYOUT_FILE,
            "receipt",
            &title,
            PageSetup::Strip {
                padding_mm: PAGE_MARGIN_MM,
            },
            &document_dict(doc, &signature_files),
        ),
    )?;
    compiler.compile(
        surface.path(),
        CAPTURE_SOURCE,
        CAPTURE_BITMAP,
        OutputFormat::Png { ppi: RASTER_PPI },
    )?;

    let (width, height) = png_dimensions(&surface.read(CAPTURE_BITMAP)?)?;
    let placement = ImagePlacement::fit_width(width, height);
    if !placement.fits_page() {
        log::warn!(
            "Receipt {} capture is {:.1}mm tall and will be clipped to one page",
            doc.receipt_ref_no,
            placement.height_mm
        );
    }

    surface.write(EMBED_SOURCE, embed_source(CAPTURE_BITMAP, &title, placement))?;
    compiler.compile(surface.path(), EMBED_SOURCE, EMBED_OUTPUT, OutputFormat::Pdf)?;
    surface.read(EMBED_OUTPUT)
}

impl ExportService {
    /// Produce the downloadable `Receipt_<ref>.pdf`.
    ///
    /// Fails with [`ExportError::AlreadyInProgress`] while a previous download of
    /// receipt `receipt_id` is still rendering. Print exports are not affected.
    pub async fn rasterize(
        &self,
        receipt_id: &str,
        doc: &ReceiptDocument,
    ) -> Result<ExportedPdf, ExportError> {
        let ticket = self.gate.try_acquire(ExportPathway::Rasterize, receipt_id)?;

        let job_id = Uuid::new_v4();
        log::debug!("Export job {} started for receipt {}", job_id, receipt_id);

        let images = self.signatures.collect(&doc.signatories).await;
        let compiler = Arc::clone(&self.compiler);
        let templates = Arc::clone(&self.templates);
        let job_doc = doc.clone();

        let result = run_blocking(move || {
            let _ticket = ticket;
            rasterize_blocking(compiler.as_ref(), &templates, &job_doc, &images)
        })
        .await;

        match result {
            Ok(pdf) => {
                log::info!(
                    "Export job {}: rendered PDF download for receipt {} ({} bytes)",
                    job_id,
                    doc.receipt_ref_no,
                    pdf.len()
                );
                Ok(ExportedPdf {
                    filename: format!("{}.pdf", doc.export_stem()),
                    pdf,
                    disposition: Disposition::Attachment,
                })
            }
            Err(e) => {
                log::error!(
                    "Export job {}: PDF download for receipt {} failed: {}",
                    job_id,
                    doc.receipt_ref_no,
                    e
                );
                Err(e)
            }
        }
    }
}
