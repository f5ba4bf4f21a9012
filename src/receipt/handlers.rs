use std::sync::Arc;

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::export::{Disposition, ExportStatus, ExportedPdf, PrintRegion};
use crate::receipt::document::ReceiptDocument;
use crate::receipt::loader::LoadState;
use crate::receipt::models::ReceiptSnapshot;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReceiptQuery {
    /// Receipt identifier; without it nothing is fetched.
    #[serde(rename = "ref")]
    pub receipt_ref: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PrintQuery {
    #[serde(rename = "ref")]
    pub receipt_ref: Option<String>,
    #[serde(default)]
    pub region: PrintRegion,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReceiptViewResponse {
    Disabled,
    Ready { document: ReceiptDocument },
}

fn required_ref(receipt_ref: Option<&str>) -> Result<&str, AppError> {
    receipt_ref
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter 'ref' is required".to_string()))
}

/// Exports read the composed document, so the fetch always resolves first.
async fn load_for_export(
    state: &AppState,
    session: &Session,
    receipt_ref: &str,
) -> Result<Arc<ReceiptSnapshot>, AppError> {
    match state.loader.load(session, Some(receipt_ref)).await? {
        LoadState::Ready(snapshot) => Ok(snapshot),
        LoadState::Disabled => Err(AppError::BadRequest(
            "Query parameter 'ref' is required".to_string(),
        )),
    }
}

fn pdf_response(export: ExportedPdf) -> HttpResponse {
    let disposition = ContentDisposition {
        disposition: match export.disposition {
            Disposition::Inline => DispositionType::Inline,
            Disposition::Attachment => DispositionType::Attachment,
        },
        parameters: vec![DispositionParam::Filename(export.filename)],
    };

    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(disposition)
        .body(export.pdf)
}

#[utoipa::path(
    get,
    path = "/api/receipts/view",
    tag = "Receipts",
    params(ReceiptQuery),
    responses(
        (status = 200, description = "Composed receipt, or disabled when no ref is given", body = ReceiptViewResponse),
        (status = 401, description = "Missing or rejected credentials", body = crate::ErrorResponse),
        (status = 404, description = "Receipt not found", body = crate::ErrorResponse),
        (status = 502, description = "Donor API unavailable", body = crate::ErrorResponse)
    )
)]
pub async fn view_receipt(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ReceiptQuery>,
) -> Result<HttpResponse, AppError> {
    let session = Session::from_request(&req)?;
    let response = match state
        .loader
        .load(&session, query.receipt_ref.as_deref())
        .await?
    {
        LoadState::Disabled => ReceiptViewResponse::Disabled,
        LoadState::Ready(snapshot) => ReceiptViewResponse::Ready {
            document: ReceiptDocument::compose(&snapshot),
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/receipts/print",
    tag = "Receipts",
    params(PrintQuery),
    responses(
        (status = 200, description = "Print-ready PDF of the requested region", content_type = "application/pdf"),
        (status = 400, description = "Missing ref", body = crate::ErrorResponse),
        (status = 409, description = "Same region already being prepared", body = crate::ErrorResponse),
        (status = 500, description = "Rendering failed", body = crate::ErrorResponse)
    )
)]
pub async fn print_receipt(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<PrintQuery>,
) -> Result<HttpResponse, AppError> {
    let session = Session::from_request(&req)?;
    let receipt_ref = required_ref(query.receipt_ref.as_deref())?;
    let snapshot = load_for_export(&state, &session, receipt_ref).await?;
    let document = ReceiptDocument::compose(&snapshot);

    let result = state.exports.print(receipt_ref, &document, query.region).await;
    state.metrics.record("print", &result);
    Ok(pdf_response(result?))
}

#[utoipa::path(
    get,
    path = "/api/receipts/download",
    tag = "Receipts",
    params(ReceiptQuery),
    responses(
        (status = 200, description = "Rasterized A4 receipt PDF", content_type = "application/pdf"),
        (status = 400, description = "Missing ref", body = crate::ErrorResponse),
        (status = 409, description = "Download already in progress", body = crate::ErrorResponse),
        (status = 500, description = "Rasterization failed", body = crate::ErrorResponse)
    )
)]
pub async fn download_receipt(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ReceiptQuery>,
) -> Result<HttpResponse, AppError> {
    let session = Session::from_request(&req)?;
    let receipt_ref = required_ref(query.receipt_ref.as_deref())?;
    let snapshot = load_for_export(&state, &session, receipt_ref).await?;
    let document = ReceiptDocument::compose(&snapshot);

    let result = state.exports.rasterize(receipt_ref, &document).await;
    state.metrics.record("rasterize", &result);
    Ok(pdf_response(result?))
}

#[utoipa::path(
    get,
    path = "/api/receipts/export-status",
    tag = "Receipts",
    params(ReceiptQuery),
    responses(
        (status = 200, description = "In-progress state of each export pathway", body = ExportStatus),
        (status = 400, description = "Missing ref", body = crate::ErrorResponse)
    )
)]
pub async fn export_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ReceiptQuery>,
) -> Result<HttpResponse, AppError> {
    Session::from_request(&req)?;
    let receipt_ref = required_ref(query.receipt_ref.as_deref())?;

    Ok(HttpResponse::Ok().json(state.exports.status(receipt_ref)))
}

/// Configure receipt routes under the `/api` scope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/receipts")
            .route("/view", web::get().to(view_receipt))
            .route("/print", web::get().to(print_receipt))
            .route("/download", web::get().to(download_receipt))
            .route("/export-status", web::get().to(export_status)),
    );
}
