//! Typst source generation for receipt exports.

use crate::receipt::document::ReceiptDocument;

/// Page width of an A4 sheet.
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;
/// Uniform margin around printed and embedded content.
pub const PAGE_MARGIN_MM: f64 = 2.0;

/// Escape special characters for Typst strings.
pub fn escape_typst_string(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('"', r#"\""#)
        .replace('\n', r"\n")
        .replace('\r', "")
}

fn string(value: &str) -> String {
    format!("\"{}\"", escape_typst_string(value))
}

fn optional(value: Option<&str>) -> String {
    value.map(string).unwrap_or_else(|| "none".to_string())
}

/// Typst array literal; always carries a trailing comma so one-element arrays stay arrays.
fn array(items: impl IntoIterator<Item = String>) -> String {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        return "()".to_string();
    }
    format!("({},)", items.join(", "))
}

/// Page geometry for an entry source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageSetup {
    /// A4 sheet with the given margin in millimetres.
    A4 { margin_mm: f64 },
    /// Fixed A4 width and free height, used for the off-screen capture.
    Strip { padding_mm: f64 },
}

impl PageSetup {
    fn to_typst(self) -> String {
        match self {
            Self::A4 { margin_mm } => format!("#set page(paper: \"a4\", margin: {margin_mm}mm)"),
            Self::Strip { padding_mm } => format!(
                "#set page(width: {A4_WIDTH_MM}mm, height: auto, margin: {padding_mm}mm, fill: white)"
            ),
        }
    }
}

/// The document as a Typst dictionary literal.
///
/// `signature_files` holds, per signatory, the surface file name of its staged
/// image or `None` when no image could be staged.
pub fn document_dict(doc: &ReceiptDocument, signature_files: &[Option<String>]) -> String {
    let addresses = array(
        doc.addresses
            .iter()
            .map(|block| array(block.lines.iter().map(|l| string(l)))),
    );

    let signatories = array(doc.signatories.iter().enumerate().map(|(i, sig)| {
        let image = signature_files.get(i).cloned().flatten();
        format!(
            "(name: {}, designation: {}, image: {})",
            string(&sig.name),
            string(&sig.designation),
            optional(image.as_deref()),
        )
    }));

    let pan = match &doc.pan {
        Some(field) => format!(
            "(label: {}, value: {})",
            string(&field.label),
            string(&field.value)
        ),
        None => "none".to_string(),
    };

    let fields = [
        ("ref", string(&doc.receipt_ref_no)),
        ("chapter_name", string(&doc.chapter_name)),
        ("chapter_contact", string(&doc.chapter_contact)),
        ("head_office", string(&doc.head_office)),
        ("donor_name", string(&doc.donor_name)),
        ("addresses", addresses),
        ("date", string(&doc.receipt_date)),
        ("donation_type", string(&doc.donation_type)),
        ("pan", pan),
        ("pay_mode", string(&doc.pay_mode)),
        ("amount", string(&doc.amount)),
        ("amount_words", string(&doc.amount_in_words)),
        ("reference", string(&doc.reference)),
        ("clause", optional(doc.clause_text.as_deref())),
        ("issuer", string(&doc.issuer)),
        ("signatories", signatories),
    ];

    let body: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("  {key}: {value},"))
        .collect();
    format!("(\n{}\n)", body.join("\n"))
}

/// Entry source that imports `layout_file` and renders `function` for the document.
pub fn entry_source(
    layout_file: &str,
    function: &str,
    title: &str,
    page: PageSetup,
    dict: &str,
) -> String {
    format!(
        "#import \"{layout_file}\": {function}\n\
         #set document(title: {title})\n\
         {page}\n\
         #let doc = {dict}\n\
         #{function}(doc)\n",
        title = string(title),
        page = page.to_typst(),
    )
}

/// Where the captured bitmap lands on the A4 page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl ImagePlacement {
    /// Fill the page width inside the margin and derive the height from the bitmap's aspect ratio.
    pub fn fit_width(pixel_width: u32, pixel_height: u32) -> Self {
        let width_mm = A4_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
        let height_mm = f64::from(pixel_height) * width_mm / f64::from(pixel_width.max(1));
        Self {
            width_mm,
            height_mm,
        }
    }

    pub fn fits_page(&self) -> bool {
        self.height_mm <= A4_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM
    }
}

/// Single A4 page holding the captured bitmap at the top-left margin.
pub fn embed_source(image_file: &str, title: &str, placement: ImagePlacement) -> String {
    format!(
        "#set document(title: {title})\n\
         #set page(paper: \"a4\", margin: {margin}mm)\n\
         #place(top + left, image({image}, width: {w:.3}mm, height: {h:.3}mm, fit: \"stretch\"))\n",
        title = string(title),
        margin = PAGE_MARGIN_MM,
        image = string(image_file),
        w = placement.width_mm,
        h = placement.height_mm,
    )
}
