//! Response helpers for controllers.
//!
//! ```rust
//! use rdfs_studio::{controller::format, Result};
//! use axum::response::Response;
//!
//! async fn ping() -> Result<Response> {
//!     format::text("pong")
//! }
//! ```

use axum::{
    body::Body,
    http::{header, response::Builder, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::Result;

/// Returns an empty `200 OK` response.
///
/// # Errors
///
/// Currently this function doesn't return any error.
pub fn empty() -> Result<Response> {
    Ok(().into_response())
}

/// Returns a plain text response.
///
/// # Errors
///
/// Currently this function doesn't return any error.
pub fn text(t: &str) -> Result<Response> {
    Ok(t.to_string().into_response())
}

/// Returns a JSON response.
///
/// # Errors
///
/// Currently this function doesn't return any error.
pub fn json<T: Serialize>(t: T) -> Result<Response> {
    Ok(Json(t).into_response())
}

/// Starts a response with explicit status and headers.
#[must_use]
pub fn render() -> RenderBuilder {
    RenderBuilder::new()
}

#[derive(Debug)]
pub struct RenderBuilder {
    response: Builder,
}

impl Default for RenderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            response: Builder::new().status(StatusCode::OK),
        }
    }

    #[must_use]
    pub fn status<T>(self, status: T) -> Self
    where
        StatusCode: TryFrom<T>,
        <StatusCode as TryFrom<T>>::Error: Into<axum::http::Error>,
    {
        Self {
            response: self.response.status(status),
        }
    }

    #[must_use]
    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<axum::http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<axum::http::Error>,
    {
        Self {
            response: self.response.header(key, value),
        }
    }

    /// Sends a download with `Content-Disposition: attachment`.
    #[must_use]
    pub fn attachment(self, file_name: &str) -> Self {
        let value = format!("attachment; filename=\"{file_name}\"");
        self.header(header::CONTENT_DISPOSITION, value)
    }

    /// Finishes with a body of the given content type.
    ///
    /// # Errors
    ///
    /// Fails when a status or header given to the builder was invalid.
    pub fn body(self, content_type: &str, body: impl Into<Body>) -> Result<Response> {
        Ok(self
            .response
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())?)
    }

    /// Finishes with a JSON body.
    ///
    /// # Errors
    ///
    /// Fails when serialization fails or a status or header was invalid.
    pub fn json<T: Serialize>(self, item: T) -> Result<Response> {
        let body = serde_json::to_vec(&item)?;
        self.body("application/json", body)
    }

    /// Finishes without a body.
    ///
    /// # Errors
    ///
    /// Fails when a status or header given to the builder was invalid.
    pub fn empty(self) -> Result<Response> {
        Ok(self.response.body(Body::empty())?)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use super::render;

    #[test]
    fn attachment_sets_disposition() {
        let response = render()
            .attachment("ex.ttl")
            .body("text/turtle", "")
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ex.ttl\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/turtle");
    }

    #[test]
    fn status_is_kept() {
        let response = render().status(StatusCode::NO_CONTENT).empty().expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
