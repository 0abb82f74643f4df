mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use campus_assist::answer::{AnswerGenerator, Assistant};
use campus_assist::knowledge::builtin_corpus;
use campus_assist::llm::ChatModel;
use campus_assist::retrieve::Retriever;
use campus_assist::server::{router, AppState};

use common::{params, static_assistant, test_config, FailingModel, HashEmbedder, KeywordModel};

fn app_with(assistant: Assistant) -> Router {
    router(AppState::new(assistant, Duration::from_secs(600)))
}

fn app(model: Arc<dyn ChatModel>) -> Router {
    app_with(static_assistant(&builtin_corpus(), model))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    req.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Open a session and return its `name=value` cookie pair.
async fn start_session(app: &Router) -> String {
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("new session sets a cookie")
        .to_str()
        .unwrap()
        .to_string();
    let pair = set_cookie.split(';').next().unwrap().to_string();
    assert!(pair.starts_with("campus_session="));
    pair
}

#[tokio::test]
async fn test_health() {
    let app = app(Arc::new(KeywordModel));
    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_known_session_gets_no_new_cookie() {
    let app = app(Arc::new(KeywordModel));
    let cookie = start_session(&app).await;
    let response = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_todo_flow() {
    let app = app(Arc::new(KeywordModel));
    let cookie = start_session(&app).await;

    let response = app
        .clone()
        .oneshot(post_form("/todo", Some(&cookie), "item=++Revise+DBMS++"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/#productivity"
    );

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("<li>Revise DBMS</li>"));
    assert!(html.contains("Task added."));

    // Flash messages are shown once.
    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(!html.contains("Task added."));

    app.clone()
        .oneshot(post_form("/todo/clear", Some(&cookie), ""))
        .await
        .unwrap();
    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(!html.contains("Revise DBMS"));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = app(Arc::new(KeywordModel));
    let alice = start_session(&app).await;
    let bob = start_session(&app).await;
    assert_ne!(alice, bob);

    app.clone()
        .oneshot(post_form("/todo", Some(&alice), "item=alice-task"))
        .await
        .unwrap();
    let html = body_string(app.clone().oneshot(get("/", Some(&bob))).await.unwrap()).await;
    assert!(!html.contains("alice-task"));
}

#[tokio::test]
async fn test_ask_form_renders_answer() {
    let app = app(Arc::new(KeywordModel));
    let cookie = start_session(&app).await;
    app.clone()
        .oneshot(post_form(
            "/ask",
            Some(&cookie),
            "question=What+programs+are+offered%3F",
        ))
        .await
        .unwrap();
    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("BCA, B.Com, BBA"));
    assert!(html.contains("/export/answer.pdf"));
}

#[tokio::test]
async fn test_failed_ask_is_inline_and_keeps_todo() {
    let app = app(Arc::new(FailingModel));
    let cookie = start_session(&app).await;
    app.clone()
        .oneshot(post_form("/todo", Some(&cookie), "item=keep+me"))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post_form("/ask", Some(&cookie), "question=Facilities"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("upstream request failed"));
    assert!(html.contains("<li>keep me</li>"));
}

#[tokio::test]
async fn test_grade_form_and_pdf_export() {
    let app = app(Arc::new(KeywordModel));
    let cookie = start_session(&app).await;

    let response = app
        .clone()
        .oneshot(get("/export/grades.pdf", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.clone()
        .oneshot(post_form(
            "/grades",
            Some(&cookie),
            "name=Maths&score=90&name=Physics&score=85&name=Chemistry&score=78",
        ))
        .await
        .unwrap();
    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("253/300"));
    assert!(html.contains("84.33%"));

    let response = app
        .clone()
        .oneshot(get("/export/grades.pdf", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_unknown_export_panel() {
    let app = app(Arc::new(KeywordModel));
    let response = app
        .oneshot(get("/export/notes.pdf", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_study_tips_and_plan() {
    let app = app(Arc::new(KeywordModel));
    let cookie = start_session(&app).await;

    app.clone()
        .oneshot(post_form("/study/tips", Some(&cookie), ""))
        .await
        .unwrap();
    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("active recall"));

    app.clone()
        .oneshot(post_form("/study", Some(&cookie), "topic=Operating+Systems"))
        .await
        .unwrap();
    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Operating Systems"));
    assert!(html.contains("/export/study.pdf"));
}

#[tokio::test]
async fn test_end_session() {
    let app = app(Arc::new(KeywordModel));
    let cookie = start_session(&app).await;
    app.clone()
        .oneshot(post_form("/todo", Some(&cookie), "item=gone+soon"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_form("/session/end", Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    let html = body_string(response).await;
    assert!(!html.contains("gone soon"));
}

#[tokio::test]
async fn test_api_grades() {
    let app = app(Arc::new(KeywordModel));
    let response = app
        .clone()
        .oneshot(post_json("/api/grades", serde_json::json!({ "marks": [40, 30, 20] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["total"], 90);
    assert_eq!(json["possible"], 300);
    assert_eq!(json["letter"], "Fail");

    let response = app
        .oneshot(post_json("/api/grades", serde_json::json!({ "marks": [101] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn test_api_ask() {
    let app = app(Arc::new(KeywordModel));
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/ask",
            serde_json::json!({ "question": "What programs are offered?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["no_answer"], false);
    assert!(json["answer"].as_str().unwrap().contains("BBA"));

    let response = app
        .oneshot(post_json("/api/ask", serde_json::json!({ "question": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_ask_errors_map_to_status() {
    let response = app(Arc::new(FailingModel))
        .oneshot(post_json("/api/ask", serde_json::json!({ "question": "Facilities" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path());
    let indexed = Assistant::new(
        Retriever::indexed(cfg.store, Arc::new(HashEmbedder { dims: 16 }), 3, false),
        AnswerGenerator::new(Arc::new(KeywordModel), params()),
    );
    let response = app_with(indexed)
        .oneshot(post_json("/api/ask", serde_json::json!({ "question": "library" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"]["code"], "store_not_found");
}

#[tokio::test]
async fn test_api_malformed_json_is_invalid_input() {
    let app = app(Arc::new(KeywordModel));
    let cases = [
        ("/api/ask", serde_json::json!({})),
        ("/api/grades", serde_json::json!({ "marks": [90.5, 80] })),
    ];
    for (uri, body) in cases {
        let response = app.clone().oneshot(post_json(uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["code"], "invalid_input", "{}", uri);
        assert!(json["error"]["message"].is_string());
    }
}
