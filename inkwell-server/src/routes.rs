use crate::error::ApiError;
use crate::generator::{Generator, SketchDescriber};
use crate::images::{self, etag_for, label_for, placeholder_svg, SVG_CONTENT_TYPE};
use crate::profile::{profile_page, PROFILE_RECENT};
use crate::store::{recent_limit, recent_quietly, record_quietly, GenerationStore};
use crate::templates::PromptTemplate;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use inkwell_preview::realm::DEFAULT_TIMEOUT;
use inkwell_preview::{BoundaryHost, DocumentOptions, SandboxPolicy};
use inkwell_sketch::overlay::PNG_MIME;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{ui_document, GeneratedOutput, GeneratedUiSchema};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Sketch uploads can be a few megabytes.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const RENDER_SLOT: &str = "render";

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn Generator>,
    pub store: Arc<dyn GenerationStore>,
    pub describer: Option<Arc<SketchDescriber>>,
    pub preview: DocumentOptions,
}

impl AppState {
    pub fn new(generator: Arc<dyn Generator>, store: Arc<dyn GenerationStore>) -> Self {
        Self {
            generator,
            store,
            describer: None,
            preview: DocumentOptions::default(),
        }
    }

    pub fn with_describer(mut self, describer: SketchDescriber) -> Self {
        self.describer = Some(Arc::new(describer));
        self
    }

    pub fn with_preview(mut self, preview: DocumentOptions) -> Self {
        self.preview = preview;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/generate", post(generate))
        .route("/reprompt", post(reprompt))
        .route("/render", post(render))
        .route("/images/:name", get(image))
        .route("/generations/recent", get(recent))
        .route("/profile", get(profile))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The route-level shape of an output: `{ui}` or `{code}`.
pub fn response_body(output: &GeneratedOutput) -> Value {
    match output {
        GeneratedOutput::Ui { ui } => json!({ "ui": ui }),
        GeneratedOutput::Code { code } => json!({ "code": code }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateRequest {
    prompt: Option<String>,
    template: Option<String>,
    brand: Option<String>,
}

impl GenerateRequest {
    fn resolve_prompt(&self) -> Result<String, ApiError> {
        if let Some(name) = &self.template {
            let template = PromptTemplate::parse(name)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown template '{}'", name)))?;
            return Ok(template.prompt(self.brand.as_deref()));
        }
        match self.prompt.as_deref().map(str::trim) {
            Some(prompt) if !prompt.is_empty() => Ok(prompt.to_string()),
            _ => Err(ApiError::BadRequest("Missing prompt".to_string())),
        }
    }
}

async fn generate(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    // An unreadable body is treated like an empty one.
    let request: GenerateRequest = serde_json::from_slice(&body).unwrap_or_default();
    let prompt = request.resolve_prompt()?;

    let output = state.generator.generate(&prompt).await?;
    tracing::info!(generator = state.generator.name(), kind = output.kind(), "generated output");

    let response = response_body(&output);
    record_in_background(&state, prompt, response.clone());
    Ok(Json(response))
}

/// Persists a generation without holding up the response. A slow or failing
/// store only shows up in the logs.
fn record_in_background(state: &AppState, prompt: String, response: Value) {
    let store = Arc::clone(&state.store);
    tokio::spawn(async move {
        record_quietly(store.as_ref(), &prompt, &response).await;
    });
}

fn bad_multipart(err: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {}", err))
}

/// Reads the `previousUI` form field. Blank and `null` mean no previous UI;
/// a code output carries no tree and is ignored.
fn parse_previous_ui(raw: Option<&str>) -> Result<Option<GeneratedUiSchema>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("previousUI is not valid JSON: {}", e)))?;
    if value.is_null() {
        return Ok(None);
    }
    let output = GeneratedOutput::from_value(&value)
        .map_err(|e| ApiError::BadRequest(format!("previousUI is not a UI tree: {}", e)))?;
    Ok(output.as_ui().cloned())
}

async fn reprompt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut prompt = String::new();
    let mut previous_raw: Option<String> = None;
    let mut overlay: Option<ImageBlob> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prompt" => prompt = field.text().await.map_err(bad_multipart)?,
            "previousUI" => previous_raw = Some(field.text().await.map_err(bad_multipart)?),
            "image" => {
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    overlay = Some(ImageBlob {
                        mime: PNG_MIME,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let previous = parse_previous_ui(previous_raw.as_deref())?;
    let mut prompt = prompt.trim().to_string();
    if prompt.is_empty() && overlay.is_none() {
        return Err(ApiError::BadRequest("Missing prompt or image".to_string()));
    }

    if let (Some(describer), Some(sketch)) = (&state.describer, &overlay) {
        match describer.describe(sketch, &prompt).await {
            Ok(description) if description.is_empty() => {}
            Ok(description) if prompt.is_empty() => prompt = description,
            Ok(description) => {
                prompt = format!("{}\n\nSketch description:\n{}", prompt, description);
            }
            Err(e) => {
                tracing::warn!(error = %e, "sketch describer failed, continuing with the original prompt");
            }
        }
    }

    let output = state
        .generator
        .reprompt(&prompt, previous.as_ref(), overlay.as_ref())
        .await?;
    tracing::info!(
        generator = state.generator.name(),
        kind = output.kind(),
        with_sketch = overlay.is_some(),
        "reprompted output"
    );

    let response = response_body(&output);
    record_in_background(&state, prompt, response.clone());
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct RenderRequest {
    output: Value,
    #[serde(default)]
    preflight: bool,
}

async fn render(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let request: RenderRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid render request: {}", e)))?;
    let output = GeneratedOutput::from_value(&request.output)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let sandbox = SandboxPolicy::preview().attribute();

    let code = match output {
        GeneratedOutput::Ui { ui } => {
            let document = ui_document(Some(&ui)).map_err(|e| ApiError::Internal(e.to_string()))?;
            return Ok(Json(json!({
                "kind": "ui",
                "document": document,
                "sandbox": sandbox,
            })));
        }
        GeneratedOutput::Code { code } => code,
    };

    let mut host = BoundaryHost::new(state.preview.clone());
    let boundary = host.mount(RENDER_SLOT, Some(&code));
    let (document, shape) = match host.boundary(RENDER_SLOT) {
        Some(b) => (b.document().to_string(), b.prepared().shape),
        None => return Err(ApiError::Internal("boundary vanished after mount".to_string())),
    };
    let mut response = json!({
        "kind": "code",
        "shape": shape,
        "document": document,
        "sandbox": sandbox,
        "boundary": boundary,
    });

    if request.preflight {
        let (outcome, reports) = tokio::task::spawn_blocking(move || {
            let mut rx = host.subscribe(boundary);
            let outcome = host.preflight(RENDER_SLOT, DEFAULT_TIMEOUT);
            let mut reports = Vec::new();
            if let Some(rx) = rx.as_mut() {
                while let Ok(report) = rx.try_recv() {
                    reports.push(report);
                }
            }
            (outcome, reports)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("preflight task failed: {}", e)))?;

        if let Some(outcome) = outcome {
            let outcome = outcome.map_err(|e| ApiError::Internal(e.to_string()))?;
            tracing::info!(%boundary, mounted = outcome.is_mounted(), "preflight finished");
            response["preflight"] = json!(outcome);
        }
        response["reports"] = json!(reports);
    }

    Ok(Json(response))
}

async fn image(Path(name): Path<String>, headers: HeaderMap) -> Response {
    let label = label_for(&name);
    let etag = etag_for(&label);
    let cache = [
        (header::CACHE_CONTROL, images::CACHE_CONTROL.to_string()),
        (header::ETAG, etag.clone()),
    ];

    let matches = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if matches {
        return (StatusCode::NOT_MODIFIED, cache).into_response();
    }
    (
        cache,
        [(header::CONTENT_TYPE, SVG_CONTENT_TYPE)],
        placeholder_svg(&label),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<i64>,
}

async fn recent(State(state): State<AppState>, Query(query): Query<RecentQuery>) -> Json<Value> {
    let records = recent_quietly(state.store.as_ref(), recent_limit(query.limit)).await;
    Json(json!({ "generations": records }))
}

async fn profile(State(state): State<AppState>) -> Html<String> {
    let records = recent_quietly(state.store.as_ref(), PROFILE_RECENT).await;
    Html(profile_page(&records, &state.preview))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_ui_accepts_tree_and_blank() {
        assert_eq!(parse_previous_ui(None).unwrap(), None);
        assert_eq!(parse_previous_ui(Some("  ")).unwrap(), None);
        assert_eq!(parse_previous_ui(Some("null")).unwrap(), None);
        let ui = parse_previous_ui(Some(r#"{"root":{"type":"button","text":"Go"}}"#))
            .unwrap()
            .unwrap();
        assert_eq!(ui.root.text.as_deref(), Some("Go"));
        assert_eq!(parse_previous_ui(Some(r#"{"code":"<p/>"}"#)).unwrap(), None);
    }

    #[test]
    fn previous_ui_rejects_garbage() {
        assert!(matches!(parse_previous_ui(Some("{oops")), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_previous_ui(Some("[1,2]")), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn template_overrides_prompt() {
        let req = GenerateRequest {
            prompt: Some("ignored".into()),
            template: Some("dashboard".into()),
            brand: None,
        };
        assert!(req.resolve_prompt().unwrap().starts_with("Generate a clean dashboard"));
        let unknown = GenerateRequest {
            template: Some("blog".into()),
            ..GenerateRequest::default()
        };
        assert!(matches!(unknown.resolve_prompt(), Err(ApiError::BadRequest(_))));
        assert!(matches!(GenerateRequest::default().resolve_prompt(), Err(ApiError::BadRequest(_))));
    }
}
