use axum::http::StatusCode;
use rdfs_studio::{boot, tests_cfg, TestServer};
use serde_json::Value;

#[tokio::test]
async fn readiness_counts_open_sessions() {
    let ctx = tests_cfg::app::get_app_context().await;
    let server = TestServer::new(boot::create_router(&ctx)).expect("start test server");

    let response = server.get("/_ping").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["ok"], Value::Bool(true));

    ctx.hub.create_session();
    ctx.hub.create_session();
    let readiness = server.get("/_readiness").await.json::<Value>();
    assert_eq!(readiness["ok"], Value::Bool(true));
    assert_eq!(readiness["sessions"], 2);
}
