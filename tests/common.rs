//! Shared fakes for the integration tests. Nothing here touches the network
//! or needs a Typst binary.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use donor_receipt_server::export::{
    DocumentCompiler, ExportError, ExportService, OutputFormat, SignatureFetcher, Templates,
};
use donor_receipt_server::receipt::loader::{LoadError, ReceiptSource};
use donor_receipt_server::receipt::models::ReceiptSnapshot;
use donor_receipt_server::session::Session;
use donor_receipt_server::AppState;

pub const TOKEN: &str = "test-token";

pub const SNAPSHOT_JSON: &str = r#"{
    "data": {
        "receipt_ref_no": "R-1001",
        "receipt_date": "2019-01-01",
        "receipt_total_amount": "5000",
        "receipt_donation_type": "General",
        "receipt_exemption_type": "80G",
        "receipt_tran_pay_mode": "Cheque",
        "receipt_tran_pay_details": "CHQ 000123",
        "tally_status": "True",
        "donor": {
            "indicomp_type": "Individual",
            "title": "Mr",
            "indicomp_full_name": "John Doe",
            "indicomp_pan_no": "ABCDE1234F",
            "indicomp_res_reg_address": "12 Park Street",
            "indicomp_res_reg_city": "Kolkata",
            "indicomp_res_reg_state": "West Bengal",
            "indicomp_res_reg_pin_code": "700016"
        },
        "chapter": {
            "chapter_name": "Kolkata Chapter",
            "chapter_email": "kolkata@example.org"
        }
    },
    "auth_sign": [{ "indicomp_full_name": "Jane Roe", "signature_image": null }],
    "country": [{ "state_country": "India" }]
}"#;

pub fn sample_snapshot() -> ReceiptSnapshot {
    serde_json::from_str(SNAPSHOT_JSON).expect("sample snapshot is valid")
}

/// What the fake source answers with.
pub enum SourceReply {
    Snapshot,
    Unauthorized,
    NotFound,
}

/// In-memory receipt source that counts how often it is asked.
pub struct FakeSource {
    reply: SourceReply,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(reply: SourceReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReceiptSource for FakeSource {
    async fn fetch_receipt(
        &self,
        _session: &Session,
        receipt_id: &str,
    ) -> Result<ReceiptSnapshot, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            SourceReply::Snapshot => Ok(sample_snapshot()),
            SourceReply::Unauthorized => Err(LoadError::Unauthorized),
            SourceReply::NotFound => Err(LoadError::NotFound(receipt_id.to_string())),
        }
    }
}

pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% fake output\n";

/// One recorded compile call.
#[derive(Debug, Clone)]
pub struct CompileCall {
    pub workdir: PathBuf,
    pub source: String,
    pub contents: String,
    pub format: OutputFormat,
}

/// Compiler stand-in: writes a fake bitmap or PDF, or fails, and records every call.
pub struct FakeCompiler {
    bitmap: (u32, u32),
    fail: bool,
    hold: Mutex<Option<Receiver<()>>>,
    calls: Mutex<Vec<CompileCall>>,
}

impl FakeCompiler {
    pub fn succeeding(bitmap_width: u32, bitmap_height: u32) -> Arc<Self> {
        Arc::new(Self {
            bitmap: (bitmap_width, bitmap_height),
            fail: false,
            hold: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            bitmap: (1, 1),
            fail: true,
            hold: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Blocks its first compile until `release` yields a value.
    pub fn held(release: Receiver<()>) -> Arc<Self> {
        Arc::new(Self {
            bitmap: (1000, 500),
            fail: false,
            hold: Mutex::new(Some(release)),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<CompileCall> {
        self.calls.lock().clone()
    }
}

impl DocumentCompiler for FakeCompiler {
    fn compile(
        &self,
        workdir: &Path,
        source: &str,
        output: &str,
        format: OutputFormat,
    ) -> Result<(), ExportError> {
        let contents = std::fs::read_to_string(workdir.join(source)).unwrap_or_default();
        self.calls.lock().push(CompileCall {
            workdir: workdir.to_path_buf(),
            source: source.to_string(),
            contents,
            format,
        });

        let hold = self.hold.lock().take();
        if let Some(release) = hold {
            let _ = release.recv_timeout(Duration::from_secs(10));
        }

        if self.fail {
            return Err(ExportError::TypstExit(1));
        }

        let bytes = match format {
            OutputFormat::Png { .. } => png_header(self.bitmap.0, self.bitmap.1),
            OutputFormat::Pdf => FAKE_PDF.to_vec(),
        };
        std::fs::write(workdir.join(output), bytes).map_err(ExportError::ReadOutput)
    }
}

pub fn export_service(compiler: Arc<FakeCompiler>) -> ExportService {
    ExportService::new(
        compiler,
        Templates::load().expect("layout templates load"),
        SignatureFetcher::new(reqwest::Client::new()),
    )
}

pub fn app_state(source: Arc<FakeSource>, compiler: Arc<FakeCompiler>) -> AppState {
    AppState::from_parts(source, export_service(compiler))
}

/// Poll `condition` until it holds, yielding to other tasks in between.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
