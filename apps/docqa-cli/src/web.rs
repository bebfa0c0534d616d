//! HTTP surface: the HTML form at `/`, a JSON endpoint and a health check.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use docqa_core::credentials::resolve_from;
use docqa_core::error::Error;
use docqa_core::types::{Answer, Exchange};
use docqa_core::ApiKey;

use crate::factory::PipelineFactory;
use crate::render::{self, PageView, KEY_WARNING, SNIPPET_CHARS};

#[derive(Clone)]
pub struct AppState {
    pub factory: Arc<dyn PipelineFactory>,
    /// Key resolved from config or environment at startup. When set, the
    /// form has no key field and requests may omit one.
    pub server_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub history: Vec<Exchange>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourceView {
    pub id: String,
    pub source: String,
    pub score: f32,
    pub snippet: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&Answer> for AskResponse {
    fn from(answer: &Answer) -> Self {
        Self {
            answer: answer.answer.clone(),
            sources: answer
                .sources
                .iter()
                .map(|c| SourceView {
                    id: c.chunk.id.clone(),
                    source: c.chunk.source.clone(),
                    score: c.score,
                    snippet: c.chunk.snippet(SNIPPET_CHARS).to_string(),
                })
                .collect(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page).post(ask_form))
        .route("/api/ask", post(ask_json))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "docqa listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;
    Ok(())
}

/// HTTP status for a failed question: credential problems are the caller's,
/// upstream failures are the provider's.
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.chain().find_map(|e| e.downcast_ref::<Error>()) {
        Some(e) if e.is_credential() => StatusCode::UNAUTHORIZED,
        Some(Error::Provider { status: 401, .. }) => StatusCode::UNAUTHORIZED,
        Some(Error::Provider { .. }) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn ask(state: &AppState, key: &ApiKey, question: &str, history: &[Exchange]) -> Result<Answer> {
    let pipeline = state.factory.pipeline(key)?;
    pipeline.answer(question, history).await
}

async fn health_check() -> &'static str {
    "OK"
}

async fn index_page(State(state): State<AppState>) -> Html<String> {
    let needs_key = state.server_key.is_none();
    Html(render::page(&PageView {
        show_key_field: needs_key,
        warning: needs_key.then_some(KEY_WARNING),
        ..Default::default()
    }))
}

async fn ask_form(State(state): State<AppState>, Form(form): Form<AskForm>) -> (StatusCode, Html<String>) {
    let mut view = PageView {
        show_key_field: state.server_key.is_none(),
        api_key: &form.api_key,
        question: &form.question,
        ..Default::default()
    };

    let key = match resolve_from(Some(form.api_key.as_str()), state.server_key.as_deref(), None) {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "No usable API key; question not sent");
            view.warning = Some(KEY_WARNING);
            return (StatusCode::OK, Html(render::page(&view)));
        }
    };

    let question = form.question.trim();
    if question.is_empty() {
        return (StatusCode::OK, Html(render::page(&view)));
    }

    match ask(&state, &key, question, &[]).await {
        Ok(answer) => {
            view.answer = Some(&answer);
            (StatusCode::OK, Html(render::page(&view)))
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Question failed");
            view.error = Some(format!("{e:#}"));
            (StatusCode::INTERNAL_SERVER_ERROR, Html(render::page(&view)))
        }
    }
}

async fn ask_json(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, Json<ErrorResponse>)> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: "question must not be empty".to_string() }),
        ));
    }

    let key = resolve_from(req.api_key.as_deref(), state.server_key.as_deref(), None).map_err(|e| {
        (StatusCode::UNAUTHORIZED, Json(ErrorResponse { error: e.to_string() }))
    })?;

    match ask(&state, &key, question, &req.history).await {
        Ok(answer) => Ok(Json(AskResponse::from(&answer))),
        Err(e) => {
            let status = status_for(&e);
            warn!(status = status.as_u16(), error = %format!("{e:#}"), "Question failed");
            Err((status, Json(ErrorResponse { error: format!("{e:#}") })))
        }
    }
}
