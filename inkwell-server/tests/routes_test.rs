use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use async_trait::async_trait;
use inkwell_server::config::{DescriberConfig, ProviderConfig};
use inkwell_server::error::StoreResult;
use inkwell_server::generator::{
    AnthropicGenerator, GeminiGenerator, Generator, OpenAiGenerator, RuleGenerator, SketchDescriber,
};
use inkwell_server::routes::{router, AppState};
use inkwell_server::store::{GenerationRecord, GenerationStore, MemoryGenerationStore};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "inkwell-test-boundary";

fn rules_app() -> (Router, Arc<MemoryGenerationStore>) {
    let store = Arc::new(MemoryGenerationStore::new());
    let state = AppState::new(Arc::new(RuleGenerator), store.clone());
    (router(state), store)
}

fn app_with(generator: Arc<dyn Generator>) -> Router {
    router(AppState::new(generator, Arc::new(MemoryGenerationStore::new())))
}

/// Generations are recorded after the response goes out.
async fn wait_for_records(store: &MemoryGenerationStore, count: usize) {
    for _ in 0..200 {
        if store.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {} stored generations, found {}", count, store.len());
}

/// Takes far longer to persist than any request should.
struct SlowStore;

#[async_trait]
impl GenerationStore for SlowStore {
    async fn record(&self, prompt: &str, output: &Value) -> StoreResult<GenerationRecord> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(GenerationRecord {
            id: uuid::Uuid::new_v4(),
            prompt: prompt.to_string(),
            output: output.clone(),
            created_at: chrono::Utc::now(),
        })
    }

    async fn recent(&self, _limit: i64) -> StoreResult<Vec<GenerationRecord>> {
        Ok(Vec::new())
    }
}

fn provider(server: &MockServer, model: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: Some("test-key".to_string()),
        model: model.to_string(),
        base_url: server.uri(),
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Hand-built multipart body with text fields and an optional PNG part.
fn multipart(fields: &[(&str, &str)], image: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some(bytes) = image {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"image\"; filename=\"overlay.png\"\r\nContent-Type: image/png\r\n\r\n",
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/reprompt")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(res: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(res: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

fn collect(node: &Value, kind: &str, out: &mut Vec<String>) {
    if node["type"] == kind {
        let label = node["text"]
            .as_str()
            .or_else(|| node["placeholder"].as_str())
            .unwrap_or_default();
        out.push(label.to_string());
    }
    if let Some(children) = node["children"].as_array() {
        for child in children {
            collect(child, kind, out);
        }
    }
}

fn labels(ui: &Value, kind: &str) -> Vec<String> {
    let mut out = Vec::new();
    collect(&ui["root"], kind, &mut out);
    out
}

#[tokio::test]
async fn generate_form_prompt_returns_form_ui() {
    let (app, store) = rules_app();
    let res = app
        .oneshot(post_json("/generate", json!({ "prompt": "a contact form" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(labels(&body["ui"], "input"), vec!["Name", "Email"]);
    assert_eq!(labels(&body["ui"], "button"), vec!["Submit"]);
    wait_for_records(&store, 1).await;
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn slow_store_does_not_delay_response() {
    let app = router(AppState::new(Arc::new(RuleGenerator), Arc::new(SlowStore)));
    let started = Instant::now();
    let res = app
        .oneshot(post_json("/generate", json!({ "prompt": "a contact form" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_json(res).await["ui"]["root"].is_object());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn generate_without_prompt_is_bad_request() {
    let (app, store) = rules_app();
    for body in [json!({}), json!({ "prompt": "   " })] {
        let res = app.clone().oneshot(post_json("/generate", body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], "Missing prompt");
    }

    let garbage = Request::builder()
        .method("POST")
        .uri("/generate")
        .body(Body::from("not json"))
        .unwrap();
    let res = app.oneshot(garbage).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty());
}

#[tokio::test]
async fn generate_expands_templates() {
    let (app, store) = rules_app();
    let res = app
        .clone()
        .oneshot(post_json("/generate", json!({ "template": "productCard" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    // "product card" hits the card layout.
    assert_eq!(labels(&body_json(res).await["ui"], "button").len(), 6);

    wait_for_records(&store, 1).await;
    let recent = store.recent(1).await.unwrap();
    assert!(recent[0].prompt.starts_with("Create a modern product card"));

    let res = app
        .oneshot(post_json("/generate", json!({ "template": "blog" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reprompt_with_sketch_grows_buttons() {
    let (app, store) = rules_app();
    let previous = json!({ "ui": { "root": { "type": "button", "text": "Go" } } }).to_string();
    let res = app
        .oneshot(multipart(
            &[("prompt", "make it bigger"), ("previousUI", previous.as_str())],
            Some(&b"\x89PNG\r\n\x1a\nfake"[..]),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(
        labels(&body["ui"], "button"),
        vec!["Primary (Large)", "Secondary (Large)", "Continue"]
    );
    wait_for_records(&store, 1).await;
    assert_eq!(store.recent(1).await.unwrap()[0].prompt, "make it bigger");
}

#[tokio::test]
async fn reprompt_rejects_empty_and_bad_previous_ui() {
    let (app, _) = rules_app();
    let res = app.clone().oneshot(multipart(&[("prompt", "  ")], None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(multipart(&[("prompt", "tweak"), ("previousUI", "{not json")], None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"]
        .as_str()
        .unwrap()
        .starts_with("previousUI is not valid JSON"));
}

#[tokio::test]
async fn reprompt_appends_sketch_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "  a search bar above two buttons \n" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryGenerationStore::new());
    let describer = SketchDescriber::new(&DescriberConfig {
        base_url: server.uri(),
        model: "llava".to_string(),
    });
    let app = router(AppState::new(Arc::new(RuleGenerator), store.clone()).with_describer(describer));

    let res = app
        .oneshot(multipart(&[("prompt", "tidy up")], Some(&b"\x89PNG"[..])))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    wait_for_records(&store, 1).await;
    assert_eq!(
        store.recent(1).await.unwrap()[0].prompt,
        "tidy up\n\nSketch description:\na search bar above two buttons"
    );
}

#[tokio::test]
async fn describer_failure_keeps_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryGenerationStore::new());
    let describer = SketchDescriber::new(&DescriberConfig {
        base_url: server.uri(),
        model: "llava".to_string(),
    });
    let app = router(AppState::new(Arc::new(RuleGenerator), store.clone()).with_describer(describer));

    let res = app
        .oneshot(multipart(&[("prompt", "tidy up")], Some(&b"\x89PNG"[..])))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    wait_for_records(&store, 1).await;
    assert_eq!(store.recent(1).await.unwrap()[0].prompt, "tidy up");
}

#[tokio::test]
async fn placeholder_images_are_cacheable() {
    let (app, _) = rules_app();
    let res = app.clone().oneshot(get("/images/hero.png")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(
        res.headers()[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    let etag = res.headers()[header::ETAG].to_str().unwrap().to_string();
    let svg = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(svg.contains(">hero</text>"));

    // Same label, different extension: same tag.
    let res = app.clone().oneshot(get("/images/hero.jpg")).await.unwrap();
    assert_eq!(res.headers()[header::ETAG].to_str().unwrap(), etag);

    let conditional = Request::builder()
        .uri("/images/hero.webp")
        .header(header::IF_NONE_MATCH, etag.as_str())
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(conditional).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(res).await.is_empty());
}

#[tokio::test]
async fn recent_generations_newest_first() {
    let (app, store) = rules_app();
    for (count, prompt) in ["first list", "second form"].into_iter().enumerate() {
        let res = app
            .clone()
            .oneshot(post_json("/generate", json!({ "prompt": prompt })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        wait_for_records(&store, count + 1).await;
    }

    let res = app.clone().oneshot(get("/generations/recent")).await.unwrap();
    let body = body_json(res).await;
    let prompts: Vec<&str> = body["generations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["prompt"].as_str().unwrap())
        .collect();
    assert_eq!(prompts, vec!["second form", "first list"]);
    assert!(body["generations"][0]["createdAt"].is_string());
    assert!(body["generations"][0]["output"]["ui"]["root"].is_object());

    let res = app.oneshot(get("/generations/recent?limit=1")).await.unwrap();
    assert_eq!(body_json(res).await["generations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn render_ui_output() {
    let (app, _) = rules_app();
    let res = app
        .oneshot(post_json(
            "/render",
            json!({ "output": { "ui": { "root": { "type": "button", "text": "Go" } } } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["kind"], "ui");
    assert!(body["document"].as_str().unwrap().contains(">Go</button>"));
    assert!(body["sandbox"].as_str().unwrap().contains("allow-scripts"));
}

#[tokio::test]
async fn render_code_output_with_preflight() {
    let (app, _) = rules_app();
    let code = "export default function App() {\n  const items = undefined;\n  return <ul>{items.map((i) => <li key={i}>{i}</li>)}</ul>;\n}\n";

    let res = app
        .clone()
        .oneshot(post_json("/render", json!({ "output": { "code": code } })))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["kind"], "code");
    assert_eq!(body["shape"], "component");
    assert!(body["document"].as_str().unwrap().contains("inkwell-boundary-error"));
    assert!(body.get("preflight").is_none());

    let res = app
        .oneshot(post_json(
            "/render",
            json!({ "output": { "kind": "code", "code": code }, "preflight": true }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["preflight"]["outcome"], "runtime_error");
    assert_eq!(body["preflight"]["phase"], "render");
    assert_eq!(body["reports"][0]["phase"], "render");
    assert_eq!(body["reports"][0]["boundary"], body["boundary"]);
}

#[tokio::test]
async fn render_rejects_unknown_output() {
    let (app, _) = rules_app();
    let res = app
        .oneshot(post_json("/render", json!({ "output": { "kind": "video" } })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_page_lists_recent() {
    let (app, store) = rules_app();
    let res = app.clone().oneshot(get("/profile")).await.unwrap();
    let html = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(html.contains("No generations yet."));

    app.clone()
        .oneshot(post_json("/generate", json!({ "prompt": "signup form" })))
        .await
        .unwrap();
    wait_for_records(&store, 1).await;
    let res = app.oneshot(get("/profile")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(html.contains("Your recent generations"));
    assert!(html.contains(">Submit</button>"));
}

#[tokio::test]
async fn healthz() {
    let (app, _) = rules_app();
    let res = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn openai_schema_reaches_client() {
    let server = MockServer::start().await;
    let content = json!({ "root": { "type": "card", "children": [{ "type": "text", "text": "Hello" }] } });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header_is("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content.to_string() } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = OpenAiGenerator::from_config(&provider(&server, "gpt-4o-mini")).unwrap();
    let res = app_with(Arc::new(generator))
        .oneshot(post_json("/generate", json!({ "prompt": "greeting card" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["ui"]["root"]["type"], "card");
    assert_eq!(labels(&body["ui"], "text"), vec!["Hello"]);
}

#[tokio::test]
async fn openai_non_json_answer_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "Sure! Here is your UI." } }]
        })))
        .mount(&server)
        .await;

    let generator = OpenAiGenerator::from_config(&provider(&server, "gpt-4o-mini")).unwrap();
    let res = app_with(Arc::new(generator))
        .oneshot(post_json("/generate", json!({ "prompt": "anything" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(res).await["reason"], "malformed_output");
}

#[tokio::test]
async fn anthropic_rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header_is("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let generator =
        AnthropicGenerator::from_config(&provider(&server, "claude-3-5-sonnet-latest")).unwrap();
    let res = app_with(Arc::new(generator))
        .oneshot(post_json("/generate", json!({ "prompt": "a pricing table" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(res).await;
    assert_eq!(body["reason"], "quota_exceeded");
    assert!(body["error"].as_str().unwrap().contains("anthropic"));
}

#[tokio::test]
async fn gemini_code_is_unfenced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "```html\n<section>Hi</section>\n```" }] } }]
        })))
        .mount(&server)
        .await;

    let generator = GeminiGenerator::from_config(&provider(&server, "gemini-1.5-pro")).unwrap();
    let res = app_with(Arc::new(generator))
        .oneshot(post_json("/generate", json!({ "prompt": "hero section" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!({ "code": "<section>Hi</section>" }));
}
