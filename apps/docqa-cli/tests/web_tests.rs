use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use docqa_chain::{PipelineConfig, RagPipeline};
use docqa_cli::factory::PipelineFactory;
use docqa_cli::web::{router, AppState, AskResponse, ErrorResponse};
use docqa_core::config::{CorpusConfig, HistoryPolicy};
use docqa_core::traits::ChatModel;
use docqa_core::types::ChatMessage;
use docqa_core::{ApiKey, ChunkingConfig};
use docqa_embed::FakeEmbedder;
use docqa_vector::IndexCache;

const KEY: &str = "sk-test-web-key-1234";

/// Replies with a fixed answer, or fails with the given upstream status.
struct CannedChat {
    fail: Option<u16>,
}

#[async_trait]
impl ChatModel for CannedChat {
    fn model_id(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        if let Some(status) = self.fail {
            let body = if status == 401 { "invalid_api_key" } else { "overloaded" };
            return Err(docqa_core::Error::Provider { status, body: body.into() }.into());
        }
        Ok("Tomatoes want <full> sun.".to_string())
    }
}

struct StubFactory {
    corpus: TempDir,
    cache: Arc<IndexCache>,
    calls: AtomicUsize,
    fail: Option<u16>,
}

impl StubFactory {
    fn new(fail: Option<u16>) -> Arc<Self> {
        let corpus = TempDir::new().unwrap();
        fs::write(
            corpus.path().join("garden.txt"),
            format!("Tomatoes need full sun & warm soil. {}", "x".repeat(400)),
        )
        .unwrap();
        fs::write(corpus.path().join("rust.txt"), "Lifetimes describe how long references live.").unwrap();
        Arc::new(Self { corpus, cache: Arc::new(IndexCache::new()), calls: AtomicUsize::new(0), fail })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PipelineFactory for StubFactory {
    fn pipeline(&self, _api_key: &ApiKey) -> Result<RagPipeline> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let config = PipelineConfig {
            corpus: CorpusConfig {
                dir: self.corpus.path().to_string_lossy().into_owned(),
                glob: "*.txt".into(),
            },
            chunking: ChunkingConfig::default(),
            k: 4,
            temperature: 0.0,
            history: HistoryPolicy::Discard,
        };
        RagPipeline::new(
            config,
            Arc::new(FakeEmbedder::new(64)),
            Arc::new(CannedChat { fail: self.fail }),
            Arc::clone(&self.cache),
        )
    }
}

fn state(factory: &Arc<StubFactory>, server_key: Option<&str>) -> AppState {
    AppState {
        factory: Arc::clone(factory) as Arc<dyn PipelineFactory>,
        server_key: server_key.map(str::to_string),
    }
}

fn form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn landing_page_asks_for_a_key() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("type=\"password\""));
    assert!(html.contains("Please enter your OpenAI API key!"));
}

#[tokio::test]
async fn landing_page_without_key_field_when_server_has_one() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, Some(KEY)))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(!html.contains("name=\"api_key\""));
    assert!(!html.contains("Please enter your OpenAI API key!"));
}

#[tokio::test]
async fn missing_key_warns_without_building_a_pipeline() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None)).oneshot(form("api_key=&question=tomatoes")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Please enter your OpenAI API key!"));
    assert_eq!(factory.calls(), 0);
}

#[tokio::test]
async fn placeholder_key_warns_without_building_a_pipeline() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None))
        .oneshot(form("api_key=sk-xxxxxxxxxxxx&question=tomatoes"))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Please enter your OpenAI API key!"));
    assert_eq!(factory.calls(), 0);
}

#[tokio::test]
async fn empty_question_renders_plain_form() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None)).oneshot(form(&format!("api_key={KEY}&question=+"))).await.unwrap();
    let html = body_text(response).await;
    assert!(!html.contains("Please enter your OpenAI API key!"));
    assert!(!html.contains("Answer:"));
    assert_eq!(factory.calls(), 0);
}

#[tokio::test]
async fn question_renders_answer_and_snippets() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None))
        .oneshot(form(&format!("api_key={KEY}&question=how+much+sun+do+tomatoes+need")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("🤖 Answer: Tomatoes want &lt;full&gt; sun."));
    assert!(html.contains("📚 Sources:"));
    let expected = format!("- Tomatoes need full sun &amp; warm soil. {}...", "x".repeat(164));
    assert!(html.contains(&expected), "{html}");
    assert!(html.contains("- Lifetimes describe how long references live...."));
    // The submitted key is kept in the form.
    assert!(html.contains(&format!("value=\"{KEY}\"")));
    assert_eq!(factory.calls(), 1);
}

#[tokio::test]
async fn server_key_is_used_when_form_omits_one() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, Some(KEY))).oneshot(form("question=tomatoes")).await.unwrap();
    assert!(body_text(response).await.contains("🤖 Answer:"));
    assert_eq!(factory.calls(), 1);
}

#[tokio::test]
async fn upstream_failure_is_a_500_page() {
    let factory = StubFactory::new(Some(503));
    let response = router(state(&factory, None))
        .oneshot(form(&format!("api_key={KEY}&question=tomatoes")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("overloaded"));
}

#[tokio::test]
async fn json_api_returns_answer_and_sources() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None))
        .oneshot(json(serde_json::json!({"question": "tomatoes sun", "api_key": KEY})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: AskResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body.answer, "Tomatoes want <full> sun.");
    assert_eq!(body.sources.len(), 2);
    assert_eq!(body.sources[0].id, "garden.txt:0");
    assert_eq!(body.sources[0].snippet.chars().count(), 200);
}

#[tokio::test]
async fn json_api_status_codes() {
    let factory = StubFactory::new(None);
    let response = router(state(&factory, None))
        .oneshot(json(serde_json::json!({"question": "tomatoes"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body.error.contains("Missing credential"));

    let response = router(state(&factory, None))
        .oneshot(json(serde_json::json!({"question": "  ", "api_key": KEY})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(factory.calls(), 0);

    let failing = StubFactory::new(Some(503));
    let response = router(state(&failing, None))
        .oneshot(json(serde_json::json!({"question": "tomatoes", "api_key": KEY})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn rejected_key_upstream_is_unauthorized() {
    let factory = StubFactory::new(Some(401));
    let response = router(state(&factory, None))
        .oneshot(json(serde_json::json!({"question": "tomatoes", "api_key": KEY})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body.error.contains("invalid_api_key"));
}
