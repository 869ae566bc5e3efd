//! Liveness and readiness routes.

use axum::{extract::State, response::Response, routing::get};
use serde::Serialize;

use super::{format, routes::Routes};
use crate::{app::AppContext, Result};

/// Represents the health status of the application.
#[derive(Serialize)]
pub struct Health {
    pub ok: bool,
}

/// Readiness status together with the number of open sessions.
#[derive(Serialize)]
pub struct Readiness {
    pub ok: bool,
    pub sessions: usize,
}

/// Check application ping endpoint
///
/// # Errors
/// This function always returns `Ok` with a JSON response indicating the
/// server is alive.
pub async fn ping() -> Result<Response> {
    format::json(Health { ok: true })
}

/// Check application health endpoint
///
/// # Errors
/// This function always returns `Ok` with a JSON response indicating the
/// server is alive.
pub async fn health() -> Result<Response> {
    format::json(Health { ok: true })
}

/// Reports whether the session hub is accepting work.
///
/// # Errors
/// This function always returns `Ok`.
pub async fn readiness(State(ctx): State<AppContext>) -> Result<Response> {
    format::json(Readiness {
        ok: true,
        sessions: ctx.hub.session_count(),
    })
}

/// Defines and returns the readiness-related routes.
pub fn routes() -> Routes {
    Routes::new()
        .add("/_readiness", get(readiness))
        .add("/_ping", get(ping))
        .add("/_health", get(health))
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{controller::monitoring, tests_cfg};

    #[tokio::test]
    async fn health_works() {
        let ctx = tests_cfg::app::get_app_context().await;

        let router = axum::Router::new()
            .route("/_health", get(monitoring::health))
            .with_state(ctx);

        let req = axum::http::Request::builder()
            .uri("/_health")
            .method("GET")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), 200);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let res_json: Value = serde_json::from_slice(&body).expect("Valid JSON response");
        assert_eq!(res_json["ok"], true);
    }

    #[tokio::test]
    async fn readiness_counts_sessions() {
        let ctx = tests_cfg::app::get_app_context().await;
        ctx.hub.create_session();

        let router = axum::Router::new()
            .route("/_readiness", get(monitoring::readiness))
            .with_state(ctx);

        let req = axum::http::Request::builder()
            .uri("/_readiness")
            .method("GET")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), 200);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let res_json: Value = serde_json::from_slice(&body).expect("Valid JSON response");
        assert_eq!(res_json["ok"], true);
        assert_eq!(res_json["sessions"], 1);
    }
}
