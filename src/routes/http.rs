//! HTTP endpoint handlers. These are thin wrappers that forward to the studio
//! and the admin store. Each handler is instrumented.

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use crate::admin::PromptConfig;
use crate::domain::{CefrLevel, GenerationRequest};
use crate::protocol::*;
use crate::state::AppState;
use crate::studio::SubmitError;
use crate::util::log_safe;
use crate::view::{render, View};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorOut>)>;

fn error_out(status: StatusCode, error: &str, message: impl Into<String>, details: Vec<String>) -> (StatusCode, Json<ErrorOut>) {
    (status, Json(ErrorOut { error: error.to_string(), message: message.into(), details }))
}

fn submit_error(e: SubmitError) -> (StatusCode, Json<ErrorOut>) {
    match e {
        SubmitError::EmptyTopic => error_out(StatusCode::BAD_REQUEST, ErrorKind::Validation.as_code(), e.to_string(), vec![]),
        SubmitError::Busy => error_out(StatusCode::CONFLICT, "BUSY", e.to_string(), vec![]),
    }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "debug", skip(state))]
pub async fn http_get_view(State(state): State<Arc<AppState>>) -> Json<View> {
    Json(render(&state.studio.snapshot()))
}

/// Resolves once the generate call has; adaptation continues in the background.
#[instrument(level = "info", skip(state, body), fields(level = %body.level, topic = %log_safe(&body.topic)))]
pub async fn http_post_submit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitIn>,
) -> ApiResult<View> {
    let request = GenerationRequest::new(body.topic, body.level).with_variant(body.variant);
    let submitted = state.studio.submit(request).await.map_err(submit_error)?;
    let view = render(&state.studio.snapshot());
    info!(target: "lesson_studio", cycle = submitted.cycle, status = ?view.status, "HTTP submit resolved");
    Ok(Json(view))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_reset(State(state): State<Arc<AppState>>) -> ApiResult<View> {
    state.studio.reset().map_err(submit_error)?;
    Ok(Json(render(&state.studio.snapshot())))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_prompt_configs(State(state): State<Arc<AppState>>) -> Json<Vec<PromptConfig>> {
    Json(state.admin.list().await)
}

#[instrument(level = "info", skip(state), fields(%level))]
pub async fn http_get_prompt_config(
    State(state): State<Arc<AppState>>,
    Path(level): Path<CefrLevel>,
) -> ApiResult<PromptConfig> {
    state
        .admin
        .get(level)
        .await
        .map(Json)
        .ok_or_else(|| error_out(StatusCode::NOT_FOUND, "NOT_FOUND", format!("no prompt config for level {level}"), vec![]))
}

#[instrument(level = "info", skip(state, body), fields(%level))]
pub async fn http_put_prompt_config(
    State(state): State<Arc<AppState>>,
    Path(level): Path<CefrLevel>,
    Json(body): Json<PromptConfig>,
) -> ApiResult<PromptConfig> {
    state.admin.put(level, body).await.map(Json).map_err(|problems| {
        error_out(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", "prompt config is invalid", problems)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tokio::sync::oneshot;
    use tower::ServiceExt;

    use super::*;
    use crate::admin::tests::valid_config;
    use crate::config::StudioConfig;
    use crate::domain::fixtures::{adapted, lesson};
    use crate::domain::{AdaptationRequest, AdaptedContent, ContentModel};
    use crate::routes::build_router;
    use crate::transport::LessonApi;

    struct FixedApi;

    #[async_trait]
    impl LessonApi for FixedApi {
        async fn generate(&self, req: &GenerationRequest) -> Envelope<ContentModel> {
            if req.topic == "limit" {
                return Envelope::failure("RATE_LIMITED", Some("Rate limited".into()));
            }
            Envelope::ok(lesson(&req.topic))
        }

        async fn adapt(&self, _req: &AdaptationRequest) -> Envelope<AdaptedContent> {
            Envelope::failure("INTERNAL_ERROR", None)
        }
    }

    /// Holds each call until its gate (if armed) is released.
    #[derive(Default)]
    struct GatedApi {
        generate_gate: Mutex<Option<oneshot::Receiver<()>>>,
        adapt_gate: Mutex<Option<oneshot::Receiver<()>>>,
        adapt_returned: AtomicBool,
    }

    impl GatedApi {
        fn arm(slot: &Mutex<Option<oneshot::Receiver<()>>>) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            *slot.lock().unwrap() = Some(rx);
            tx
        }
    }

    #[async_trait]
    impl LessonApi for GatedApi {
        async fn generate(&self, req: &GenerationRequest) -> Envelope<ContentModel> {
            let gate = self.generate_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Envelope::ok(lesson(&req.topic))
        }

        async fn adapt(&self, _req: &AdaptationRequest) -> Envelope<AdaptedContent> {
            let gate = self.adapt_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.adapt_returned.store(true, Ordering::SeqCst);
            Envelope::ok(adapted("טֶקְסְט פָּשׁוּט"))
        }
    }

    fn gated_app(api: Arc<GatedApi>) -> (Arc<AppState>, Router) {
        let state = Arc::new(AppState::with_api(StudioConfig::default(), api));
        (state.clone(), build_router(state))
    }

    fn app() -> Router {
        build_router(Arc::new(AppState::with_api(StudioConfig::default(), Arc::new(FixedApi))))
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = call(app(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn submit_returns_ready_view() {
        let (status, body) =
            call(app(), Method::POST, "/api/v1/submit", Some(json!({"topic": "הים", "level": "A1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["lesson"]["title"], "הים");
        assert_eq!(body["cycle"], 1);
    }

    #[tokio::test]
    async fn submit_failure_is_visible_in_view() {
        let (status, body) =
            call(app(), Method::POST, "/api/v1/submit", Some(json!({"topic": "limit", "level": "B1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Rate limited");
        assert_eq!(body["support"]["state"], "hidden");
    }

    #[tokio::test]
    async fn empty_topic_is_a_bad_request() {
        let (status, body) =
            call(app(), Method::POST, "/api/v1/submit", Some(json!({"topic": "  ", "level": "A2"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION");
    }

    #[tokio::test]
    async fn admin_put_rejects_invalid_config_with_details() {
        let mut cfg = valid_config(CefrLevel::A1);
        cfg.system_prompt_template = "no placeholder here, but long enough to pass the length rule easily".into();
        let (status, body) = call(
            app(),
            Method::PUT,
            "/api/v1/admin/prompt-config/A1",
            Some(serde_json::to_value(&cfg).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["details"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn admin_put_then_get_round_trips() {
        let app = app();
        let cfg = valid_config(CefrLevel::B2);
        let (status, _) = call(
            app.clone(),
            Method::PUT,
            "/api/v1/admin/prompt-config/B2",
            Some(serde_json::to_value(&cfg).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app.clone(), Method::GET, "/api/v1/admin/prompt-config/B2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "1.2.0");

        let (status, _) = call(app, Method::GET, "/api/v1/admin/prompt-config/C1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submit_while_generating_is_a_conflict() {
        let api = Arc::new(GatedApi::default());
        let release = GatedApi::arm(&api.generate_gate);
        let (state, app) = gated_app(api);

        let first = tokio::spawn(call(
            app.clone(),
            Method::POST,
            "/api/v1/submit",
            Some(json!({"topic": "הים", "level": "A1"})),
        ));
        state.studio.subscribe().wait_for(|s| s.generation.is_in_flight()).await.unwrap();

        let (status, body) =
            call(app.clone(), Method::POST, "/api/v1/submit", Some(json!({"topic": "עוד", "level": "A1"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "BUSY");

        let (status, _) = call(app, Method::POST, "/api/v1/reset", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        release.send(()).unwrap();
        let (status, body) = first.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lesson"]["title"], "הים");
    }

    #[tokio::test]
    async fn reset_during_adaptation_keeps_support_hidden() {
        let api = Arc::new(GatedApi::default());
        let release = GatedApi::arm(&api.adapt_gate);
        let (_state, app) = gated_app(api.clone());

        let (_, body) =
            call(app.clone(), Method::POST, "/api/v1/submit", Some(json!({"topic": "הים", "level": "A1"}))).await;
        assert_eq!(body["support"]["state"], "loading");

        let (status, body) = call(app.clone(), Method::POST, "/api/v1/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "idle");
        assert_eq!(body["support"]["state"], "hidden");

        release.send(()).unwrap();
        while !api.adapt_returned.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let (_, body) = call(app, Method::GET, "/api/v1/view", None).await;
        assert_eq!(body["status"], "idle");
        assert!(body["lesson"].is_null());
        assert_eq!(body["support"]["state"], "hidden");
    }
}
