//! HTTP front end.
//!
//! Serves the form UI and a small JSON API. Form posts run one action on
//! the caller's session and redirect back to the page (post/redirect/get),
//! so a browser refresh never repeats a model call.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Render the page for the session |
//! | `POST` | `/ask`, `/ask/clear` | Ask a question / clear it |
//! | `POST` | `/grades/rows`, `/grades` | Resize the grade form / calculate |
//! | `POST` | `/todo`, `/todo/clear` | Add a to-do item / clear the list |
//! | `POST` | `/notes` | Save notes |
//! | `POST` | `/study`, `/study/tips` | Study plan from the model / local tips |
//! | `GET`  | `/export/{panel}.pdf` | PDF of the answer, grades, or study panel |
//! | `POST` | `/session/end` | Discard the session |
//! | `POST` | `/api/ask`, `/api/grades` | JSON equivalents |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! JSON errors use the body
//!
//! ```json
//! { "error": { "code": "invalid_input", "message": "question is empty" } }
//! ```
//!
//! Codes: `invalid_input` (400), `not_found` (404), `store_not_found` (503),
//! `transport_failure` (502), `internal` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::actions::{self, ExportPanel};
use crate::answer::{Answer, Assistant};
use crate::config::Config;
use crate::error::AssistError;
use crate::export;
use crate::grade;
use crate::models::SubjectMark;
use crate::render;
use crate::session::{session_id_from_cookie, Session, SessionStore, SubjectRow, COOKIE_NAME};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
    sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(assistant: Assistant, session_ttl: Duration) -> Self {
        Self {
            assistant: Arc::new(assistant),
            sessions: Arc::new(SessionStore::new(session_ttl)),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Resolve the caller's session from the request cookie.
    async fn session(&self, headers: &HeaderMap) -> SessionHandle {
        let id = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(session_id_from_cookie);
        let (session, created) = self.sessions.get_or_create(id).await;
        let set_cookie = if created {
            let id = session.lock().await.id.clone();
            Some(format!("{}={}; Path=/; HttpOnly; SameSite=Lax", COOKIE_NAME, id))
        } else {
            None
        };
        SessionHandle {
            session,
            set_cookie,
        }
    }
}

struct SessionHandle {
    session: Arc<Mutex<Session>>,
    /// Present when the session was created by this request.
    set_cookie: Option<String>,
}

impl SessionHandle {
    fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(cookie) = &self.set_cookie {
            if let Ok(value) = HeaderValue::from_str(cookie) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        response
    }

    fn back_to(&self, anchor: &str) -> Response {
        self.respond(Redirect::to(&format!("/#{}", anchor)))
    }
}

/// Build the router. Exposed for tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/ask", post(handle_ask))
        .route("/ask/clear", post(handle_ask_clear))
        .route("/grades/rows", post(handle_grade_rows))
        .route("/grades", post(handle_grades))
        .route("/todo", post(handle_todo))
        .route("/todo/clear", post(handle_todo_clear))
        .route("/notes", post(handle_notes))
        .route("/study", post(handle_study))
        .route("/study/tips", post(handle_study_tips))
        .route("/export/{file}", get(handle_export))
        .route("/session/end", post(handle_session_end))
        .route("/api/ask", post(handle_api_ask))
        .route("/api/grades", post(handle_api_grades))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config)?;
    let state = AppState::new(
        assistant,
        Duration::from_secs(config.server.session_ttl_secs),
    );
    let app = router(state);

    let bind_addr = config.server.bind.clone();
    println!("campus assistant listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AssistError> for AppError {
    fn from(err: AssistError) -> Self {
        let status = match err {
            AssistError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AssistError::StoreNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
            AssistError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AssistError::invalid(rejection.body_text()).into()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ Page and form actions ============

async fn handle_index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = state.session(&headers).await;
    let html = {
        let mut session = handle.session.lock().await;
        let flash = session.take_flash();
        render::page(&session, flash.as_ref())
    };
    handle.respond(Html(html))
}

#[derive(Deserialize)]
struct AskForm {
    #[serde(default)]
    question: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AskForm>,
) -> Response {
    let handle = state.session(&headers).await;
    {
        let mut session = handle.session.lock().await;
        actions::ask(&mut session, &state.assistant, &form.question).await;
    }
    handle.back_to("chat")
}

async fn handle_ask_clear(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = state.session(&headers).await;
    actions::clear_question(&mut *handle.session.lock().await);
    handle.back_to("chat")
}

#[derive(Deserialize)]
struct RowsForm {
    #[serde(default)]
    count: String,
}

async fn handle_grade_rows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RowsForm>,
) -> Response {
    let handle = state.session(&headers).await;
    actions::set_subject_count(&mut *handle.session.lock().await, &form.count);
    handle.back_to("grades")
}

/// The grade form repeats `name` and `score` once per row, in row order.
async fn handle_grades(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let handle = state.session(&headers).await;
    actions::calculate_grades(&mut *handle.session.lock().await, rows_from_fields(fields));
    handle.back_to("grades")
}

fn rows_from_fields(fields: Vec<(String, String)>) -> Vec<SubjectRow> {
    let mut names = Vec::new();
    let mut scores = Vec::new();
    for (key, value) in fields {
        match key.as_str() {
            "name" => names.push(value),
            "score" => scores.push(value),
            _ => {}
        }
    }
    let rows = names.len().max(scores.len());
    (0..rows)
        .map(|i| SubjectRow {
            name: names.get(i).cloned().unwrap_or_default(),
            score: scores.get(i).cloned().unwrap_or_default(),
        })
        .collect()
}

#[derive(Deserialize)]
struct TodoForm {
    #[serde(default)]
    item: String,
}

async fn handle_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TodoForm>,
) -> Response {
    let handle = state.session(&headers).await;
    actions::add_todo(&mut *handle.session.lock().await, &form.item);
    handle.back_to("productivity")
}

async fn handle_todo_clear(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = state.session(&headers).await;
    actions::clear_todo(&mut *handle.session.lock().await);
    handle.back_to("productivity")
}

#[derive(Deserialize)]
struct NotesForm {
    #[serde(default)]
    notes: String,
}

async fn handle_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<NotesForm>,
) -> Response {
    let handle = state.session(&headers).await;
    actions::save_notes(&mut *handle.session.lock().await, &form.notes);
    handle.back_to("productivity")
}

#[derive(Deserialize)]
struct StudyForm {
    #[serde(default)]
    topic: String,
}

async fn handle_study(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<StudyForm>,
) -> Response {
    let handle = state.session(&headers).await;
    {
        let mut session = handle.session.lock().await;
        actions::study_plan(&mut session, state.assistant.generator(), &form.topic).await;
    }
    handle.back_to("productivity")
}

async fn handle_study_tips(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = state.session(&headers).await;
    actions::quick_tips(&mut *handle.session.lock().await);
    handle.back_to("productivity")
}

async fn handle_export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let panel: ExportPanel = file
        .strip_suffix(".pdf")
        .ok_or_else(|| not_found(format!("no such export: {}", file)))?
        .parse()?;

    let handle = state.session(&headers).await;
    let doc = actions::export_document(&*handle.session.lock().await, panel)?;
    let bytes = export::render_pdf(&doc.title, &doc.body).map_err(|e| internal(e.to_string()))?;

    let disposition = format!("attachment; filename=\"{}.pdf\"", panel);
    Ok(handle.respond((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )))
}

async fn handle_session_end(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_id_from_cookie)
    {
        state.sessions.end(id).await;
    }
    let expired = format!("{}=; Path=/; Max-Age=0", COOKIE_NAME);
    let mut response = Redirect::to("/").into_response();
    if let Ok(value) = HeaderValue::from_str(&expired) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

// ============ JSON API ============

#[derive(Deserialize)]
struct ApiAskRequest {
    question: String,
}

#[derive(Serialize)]
struct ApiAskResponse {
    answer: String,
    /// True when the model reported that the context has no answer.
    no_answer: bool,
}

async fn handle_api_ask(
    State(state): State<AppState>,
    body: Result<Json<ApiAskRequest>, JsonRejection>,
) -> Result<Json<ApiAskResponse>, AppError> {
    let Json(req) = body?;
    let answer = state.assistant.ask(&req.question).await?;
    Ok(Json(ApiAskResponse {
        answer: answer.text().to_string(),
        no_answer: answer == Answer::NoAnswer,
    }))
}

/// Either bare marks or named subjects.
#[derive(Deserialize)]
struct ApiGradesRequest {
    #[serde(default)]
    marks: Option<Vec<i64>>,
    #[serde(default)]
    subjects: Option<Vec<SubjectMark>>,
}

async fn handle_api_grades(
    body: Result<Json<ApiGradesRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(req) = body?;
    let value = match (req.marks, req.subjects) {
        (Some(marks), None) => serde_json::to_value(grade::calculate(&marks)?),
        (None, Some(subjects)) => serde_json::to_value(grade::calculate_subjects(&subjects)?),
        _ => {
            return Err(AssistError::invalid("provide exactly one of `marks` or `subjects`").into())
        }
    };
    value.map(Json).map_err(|e| internal(e.to_string()))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
