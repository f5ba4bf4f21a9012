use std::fmt;

use actix_web::HttpRequest;

use crate::error::AppError;

/// Cookie set by the donor login flow.
pub const TOKEN_COOKIE: &str = "token";

/// Caller credentials, passed explicitly into every upstream call.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Resolve the session from the `Authorization` header, falling back to the `token` cookie.
    pub fn from_request(req: &HttpRequest) -> Result<Self, AppError> {
        if let Some(token) = extract_bearer(req) {
            return Ok(Self::new(token));
        }

        if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
            let value = cookie.value().trim();
            if !value.is_empty() {
                return Ok(Self::new(value));
            }
        }

        log::warn!("Rejected request to {} without credentials", req.path());
        Err(AppError::Unauthorized("Missing authorization token".to_string()))
    }
}

// Keep tokens out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

fn extract_bearer(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
