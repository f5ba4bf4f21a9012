use std::sync::Arc;

use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};

use crate::config::ServerConfig;
use crate::export::{ExportError, ExportService, SignatureFetcher, Templates, TypstCli};
use crate::receipt::loader::{HttpReceiptSource, ReceiptLoader, ReceiptSource};

#[derive(Clone)]
pub struct AppState {
    pub loader: ReceiptLoader,
    pub exports: ExportService,
    pub metrics: ExportMetrics,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(900))
            .timeout(config.upstream_timeout)
            .user_agent("donor-receipt-server/0.3")
            .build()?;

        let source = Arc::new(HttpReceiptSource::new(
            http_client.clone(),
            config.api_base_url.clone(),
        ));
        let loader = ReceiptLoader::new(source, config.cache_ttl, config.cache_capacity);

        let exports = ExportService::new(
            Arc::new(TypstCli::new(config.typst_bin.clone())),
            Templates::load()?,
            SignatureFetcher::new(http_client),
        );

        Ok(Self {
            loader,
            exports,
            metrics: ExportMetrics::new(),
        })
    }

    /// Assemble a state from pre-built parts.
    pub fn from_parts(source: Arc<dyn ReceiptSource>, exports: ExportService) -> Self {
        Self {
            loader: ReceiptLoader::new(source, std::time::Duration::from_secs(300), 100),
            exports,
            metrics: ExportMetrics::new(),
        }
    }
}

/// Export outcome counters, exposed on `/metrics/exports`.
#[derive(Clone)]
pub struct ExportMetrics {
    registry: Registry,
    exports: IntCounterVec,
}

impl ExportMetrics {
    pub fn new() -> Self {
        let exports = IntCounterVec::new(
            Opts::new("receipt_exports_total", "Receipt export attempts by pathway and outcome"),
            &["pathway", "outcome"],
        )
        .expect("valid metric definition");
        let registry = Registry::new();
        registry
            .register(Box::new(exports.clone()))
            .expect("metric registered once on a fresh registry");
        Self { registry, exports }
    }

    pub fn record<T>(&self, pathway: &str, result: &Result<T, ExportError>) {
        let outcome = match result {
            Ok(_) => "success",
            Err(ExportError::AlreadyInProgress(_)) => "rejected",
            Err(_) => "failure",
        };
        self.exports.with_label_values(&[pathway, outcome]).inc();
    }

    pub fn count(&self, pathway: &str, outcome: &str) -> u64 {
        self.exports.with_label_values(&[pathway, outcome]).get()
    }

    /// Prometheus text exposition of the export counters.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl Default for ExportMetrics {
    fn default() -> Self {
        Self::new()
    }
}
