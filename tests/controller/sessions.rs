use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use rdfs_studio::{boot, tests_cfg, TestServer};
use serde_json::Value;

const VEHICLES: &str = r#"
@prefix cars: <http://example.com/cars#> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

cars:Vehicle a rdfs:Class ;
    rdfs:label "Vehicle"@en .
cars:Car a rdfs:Class ;
    rdfs:subClassOf cars:Vehicle .
"#;

async fn server() -> TestServer {
    let ctx = tests_cfg::app::get_app_context().await;
    TestServer::new(boot::create_router(&ctx)).expect("start test server")
}

fn turtle_form(file_name: &str, content: &str) -> MultipartForm {
    let part = Part::bytes(content.as_bytes().to_vec())
        .file_name(file_name)
        .mime_type("text/turtle");
    MultipartForm::new().add_part("file", part)
}

#[tokio::test]
async fn session_lifecycle() {
    let server = server().await;

    let response = server.post("/sessions").await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created = response.json::<Value>();
    let id = created["sessionId"].as_str().expect("session id").to_string();
    assert_eq!(created["prefix"], id.as_str());
    assert_eq!(
        created["uri"],
        format!("http://localhost:5555/sessions/{id}/").as_str()
    );
    assert_eq!(created["state"], "created");
    assert_eq!(created["members"], 0);

    let shown = server.get(&format!("/sessions/{id}")).await;
    assert_eq!(shown.status_code(), StatusCode::OK);
    assert_eq!(shown.json::<Value>()["sessionId"], id.as_str());

    let removed = server.delete(&format!("/sessions/{id}")).await;
    assert_eq!(removed.status_code(), StatusCode::NO_CONTENT);

    let missing = server
        .get(&format!("/sessions/{id}"))
        .expect_failure()
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    let again = server
        .delete(&format!("/sessions/{id}"))
        .expect_failure()
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_then_download_as_turtle() {
    let server = server().await;
    let id = server.post("/sessions").await.json::<Value>()["sessionId"]
        .as_str()
        .expect("session id")
        .to_string();

    let response = server
        .post(&format!("/upload/{id}"))
        .multipart(turtle_form("cars.ttl", VEHICLES))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let state = response.json::<Value>();
    let user = &state["ontologies"][0];
    assert_eq!(user["isUser"], true);
    assert_eq!(user["prefix"], "cars");
    assert_eq!(user["classes"]["children"][0]["localName"], "Vehicle");
    assert_eq!(
        user["classes"]["children"][0]["children"][0]["localName"],
        "Car"
    );

    let download = server.get(&format!("/download/{id}")).await;
    assert_eq!(download.status_code(), StatusCode::OK);
    assert_eq!(
        download.header("content-disposition"),
        "attachment; filename=\"cars.ttl\""
    );
    assert!(download
        .header("content-type")
        .to_str()
        .expect("content type")
        .starts_with("text/turtle"));
    let turtle = download.text();
    assert!(turtle.contains("@prefix cars: <http://example.com/cars#>"));
    assert!(turtle.contains("cars:Car"));
}

#[tokio::test]
async fn broken_documents_are_rejected() {
    let server = server().await;
    let id = server.post("/sessions").await.json::<Value>()["sessionId"]
        .as_str()
        .expect("session id")
        .to_string();

    let response = server
        .post(&format!("/upload/{id}"))
        .multipart(turtle_form("broken.ttl", "this is { not rdf"))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json::<Value>()["error"],
        "unprocessable_document"
    );

    let response = server
        .post(&format!("/import/{id}"))
        .multipart(MultipartForm::new().add_text("note", "no file here"))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/upload/unknown1")
        .multipart(turtle_form("cars.ttl", VEHICLES))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn imports_appear_next_to_the_user_ontology() {
    let server = server().await;
    let id = server.post("/sessions").await.json::<Value>()["sessionId"]
        .as_str()
        .expect("session id")
        .to_string();

    let response = server
        .post(&format!("/import/{id}"))
        .multipart(turtle_form("cars.ttl", VEHICLES))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let ontologies = response.json::<Value>()["ontologies"]
        .as_array()
        .expect("ontologies")
        .clone();
    assert_eq!(ontologies[0]["prefix"], id.as_str());
    let imported = ontologies
        .iter()
        .find(|ontology| ontology["prefix"] == "cars")
        .expect("imported ontology");
    assert_eq!(imported["isUser"], false);
}
