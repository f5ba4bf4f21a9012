use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::export::ExportError;
use crate::receipt::loader::LoadError;
use crate::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) | Self::Load(LoadError::Unauthorized) => "Unauthorized",
            Self::BadRequest(_) => "BadRequest",
            Self::Load(LoadError::NotFound(_)) => "NotFound",
            Self::Load(_) => "UpstreamError",
            Self::Export(ExportError::AlreadyInProgress(_)) => "ExportInProgress",
            Self::Export(_) => "ExportFailed",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::Load(LoadError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Load(LoadError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Load(_) => StatusCode::BAD_GATEWAY,
            Self::Export(ExportError::AlreadyInProgress(_)) => StatusCode::CONFLICT,
            Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.error_type(), &self.to_string()))
    }
}
