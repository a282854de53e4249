use http::StatusCode;
use mvc_http::axum::routing::{get, post};
use mvc_http::Router;
use mvc_test::TestApp;
use serde_json::json;

fn router() -> Router {
    Router::new()
        .route("/ping", get(|| async { "pong" }))
        .route(
            "/echo",
            post(|headers: http::HeaderMap, body: String| async move {
                let kind = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                format!("{kind}:{body}")
            }),
        )
}

#[tokio::test]
async fn sends_requests_without_a_socket() {
    let app = TestApp::new(router());
    app.get("/ping").send().await.assert_ok().assert_text("pong");
    app.get("/missing").send().await.assert_not_found();
}

#[tokio::test]
async fn json_bodies_set_the_content_type() {
    let app = TestApp::new(router());
    let response = app
        .post("/echo")
        .json(&json!({ "a": 1 }))
        .send()
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(response.text(), r#"application/json:{"a":1}"#);

    app.post("/echo")
        .header("content-type", "text/plain")
        .body("hi")
        .send()
        .await
        .assert_text("text/plain:hi");
}

#[tokio::test]
async fn builds_from_an_mvc_app() {
    let app = TestApp::from_app(mvc_http::MvcApp::new());
    let response = app.get("/").send().await.assert_not_found();
    assert!(response.body.is_empty());
}
