use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod error;
pub mod export;
pub mod receipt;
pub mod session;
pub mod state;

pub use crate::state::AppState;

use crate::config::ServerConfig;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "0.3.0")]
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn export_metrics(state: web::Data<AppState>) -> HttpResponse {
    match state.metrics.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            log::error!("Failed to encode export metrics: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::health,
        crate::receipt::handlers::view_receipt,
        crate::receipt::handlers::print_receipt,
        crate::receipt::handlers::download_receipt,
        crate::receipt::handlers::export_status
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            receipt::handlers::ReceiptViewResponse,
            receipt::document::ReceiptDocument,
            receipt::document::SignatoryLine,
            receipt::document::ViewChrome,
            receipt::address::AddressBlock,
            receipt::address::AddressKind,
            receipt::address::PanField,
            receipt::clause::ExemptionClause,
            receipt::models::ReceiptSnapshot,
            receipt::models::Receipt,
            receipt::models::Donor,
            receipt::models::Chapter,
            receipt::models::AuthorizedSignatory,
            receipt::models::CountryReference,
            export::ExportStatus,
            export::ExportState,
            export::PrintRegion,
        )
    ),
    tags(
        (name = "Receipts", description = "Donor receipt view and export endpoints."),
        (name = "Health", description = "Liveness probe.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost server")
    )
)]
pub struct ApiDoc;

/// Register every application route on `cfg`. Shared by the server and the tests.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").configure(receipt::handlers::config))
        .route("/health", web::get().to(health))
        .route("/metrics/exports", web::get().to(export_metrics));
}

fn build_cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::CONTENT_DISPOSITION])
        .supports_credentials()
        .max_age(3600)
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let app_state = match AppState::new(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise receipt services: {:#}", e);
            return Err(e);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("donor_receipt_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {}", e))?;

    log::info!(
        "Starting server at http://{}:{} (donor API: {})",
        config.bind_address,
        config.port,
        config.api_base_url
    );

    let cors_origins = config.cors_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(build_cors(&cors_origins))
            .app_data(app_state.clone())
            .configure(configure_app)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((config.bind_address.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.bind_address, config.port))?
    .run()
    .await?;

    Ok(())
}
