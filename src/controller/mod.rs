//! HTTP and websocket surface of the editor.
//!
//! Controllers return [`crate::Result`]; an [`Error`] renders as a JSON body
//! with the matching status code:
//!
//! ```json
//! { "error": "not_found", "description": "Resource was not found" }
//! ```

pub mod format;
pub mod monitoring;
mod routes;
pub mod sessions;
pub mod websocket;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
pub use routes::{AppRoutes, Routes};
use serde::Serialize;

use crate::{app::AppContext, errors::Error};

/// Every route of the application.
#[must_use]
pub fn routes(_ctx: &AppContext) -> AppRoutes {
    AppRoutes::empty()
        .add_route(monitoring::routes())
        .add_route(sessions::routes())
        .add_route(websocket::routes())
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ErrorDetail {
    #[must_use]
    pub fn new<T: Into<String>>(error: T, description: T) -> Self {
        Self {
            error: Some(error.into()),
            description: Some(description.into()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound | Self::BadRequest(_) | Self::Codec(_) | Self::Multipart(_) => {
                tracing::debug!(error.msg = %self, "controller_error");
            }
            _ => tracing::error!(error.msg = %self, error.details = ?self, "controller_error"),
        }

        let (status, detail) = match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("not_found", "Resource was not found"),
            ),
            Self::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("Bad Request", reason.as_str()),
            ),
            Self::Codec(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("unprocessable_document".to_string(), err.to_string()),
            ),
            Self::Multipart(err) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("Bad Request".to_string(), err.to_string()),
            ),
            Self::CustomError(status, detail) => (status, detail),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("internal_server_error", "Internal Server Error"),
            ),
        };

        (status, Json(detail)).into_response()
    }
}
