//! Transport client for the content API.
//!
//! One POST endpoint per operation (generate, adapt). Every call resolves to an
//! `Envelope`; transport failures, failing statuses, and unparseable bodies are
//! folded into it so callers branch on exactly one shape.
//!
//! NOTE: request bodies are never logged; topics only appear redacted and truncated.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{
    header::{CONTENT_TYPE, USER_AGENT},
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::StudioConfig;
use crate::domain::{AdaptationRequest, AdaptedContent, ContentModel, GenerationRequest};
use crate::protocol::{ApiErrorBody, Envelope, ErrorKind, MALFORMED_MESSAGE};
use crate::util::log_safe;

/// The two content API operations. Implementations never fail: every outcome
/// is expressed through the returned envelope.
#[async_trait]
pub trait LessonApi: Send + Sync {
    async fn generate(&self, req: &GenerationRequest) -> Envelope<ContentModel>;
    async fn adapt(&self, req: &AdaptationRequest) -> Envelope<AdaptedContent>;
}

/// How a 2xx body is laid out.
#[derive(Clone, Copy, Debug)]
enum BodyShape {
    /// `{success, data, error, message, ...}`
    Wrapped,
    /// The payload itself, or an object with an `error` field.
    Bare,
}

#[derive(Clone)]
pub struct HttpLessonApi {
    pub client: reqwest::Client,
    pub base_url: String,
    pub generate_path: String,
    pub adapt_path: String,
}

impl HttpLessonApi {
    pub fn from_config(cfg: &StudioConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            generate_path: cfg.generate_path.clone(),
            adapt_path: cfg.adapt_path.clone(),
        })
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        shape: BodyShape,
    ) -> Envelope<T> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let res = match self
            .client
            .post(&url)
            .header(USER_AGENT, "lesson-studio/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header("x-request-id", &request_id)
            .json(body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                warn!(target: "transport", %url, %request_id, error = %e, elapsed_ms, "No response from content API");
                return Envelope::network_error(Some(e.to_string()));
            }
        };

        let status = res.status();
        let text = match res.text().await {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "transport", %url, %request_id, %status, error = %e, "Failed reading response body");
                return Envelope::network_error(Some(e.to_string()));
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(target: "transport", %url, %request_id, status = status.as_u16(), body_len = text.len(), elapsed_ms, "Content API responded");

        if !status.is_success() {
            return decode_error_body(status, &text);
        }
        match shape {
            BodyShape::Wrapped => decode_wrapped(&text),
            BodyShape::Bare => decode_bare(&text),
        }
    }
}

#[async_trait]
impl LessonApi for HttpLessonApi {
    #[instrument(level = "info", skip(self, req), fields(level = %req.level, topic = %log_safe(&req.topic)))]
    async fn generate(&self, req: &GenerationRequest) -> Envelope<ContentModel> {
        self.post(&self.generate_path, req, BodyShape::Wrapped).await
    }

    #[instrument(level = "info", skip(self, req), fields(text_len = req.original_text.len(), questions = req.original_questions.len()))]
    async fn adapt(&self, req: &AdaptationRequest) -> Envelope<AdaptedContent> {
        self.post(&self.adapt_path, req, BodyShape::Bare).await
    }
}

fn malformed<T>() -> Envelope<T> {
    Envelope::failure(ErrorKind::MalformedResponse.as_code(), Some(MALFORMED_MESSAGE.to_string()))
}

/// Failing status: prefer the server's structured error, else `HTTP_ERROR` + status text.
fn decode_error_body<T>(status: StatusCode, text: &str) -> Envelope<T> {
    if let Ok(body) = serde_json::from_str::<ApiErrorBody>(text) {
        if body.error.is_some() || body.message.is_some() {
            debug!(target: "transport", status = status.as_u16(), error = ?body.error, "Structured error body");
            let code = body.error.unwrap_or_else(|| ErrorKind::ApplicationError.as_code().to_string());
            let mut env = Envelope::failure(code, body.message);
            env.request_id = body.request_id;
            return env;
        }
    }
    let status_text = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Envelope::failure(ErrorKind::HttpError.as_code(), Some(status_text))
}

fn decode_wrapped<T: DeserializeOwned>(text: &str) -> Envelope<T> {
    match serde_json::from_str::<Envelope<T>>(text) {
        Ok(env) => env,
        Err(e) => {
            warn!(target: "transport", error = %e, "Unparseable envelope");
            malformed()
        }
    }
}

fn decode_bare<T: DeserializeOwned>(text: &str) -> Envelope<T> {
    let value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(target: "transport", error = %e, "Unparseable response body");
            return malformed();
        }
    };

    if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
        let code = match err {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let message = value.get("message").and_then(|m| m.as_str()).map(str::to_string);
        // success stays true: the error field alone marks the failure.
        let mut env = Envelope::failure(code, message);
        env.success = true;
        return env;
    }

    match serde_json::from_value::<T>(value) {
        Ok(data) => Envelope::ok(data),
        Err(e) => {
            warn!(target: "transport", error = %e, "Response body does not match the expected payload");
            malformed()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::domain::fixtures::{adapted, lesson};
    use crate::domain::CefrLevel;

    async fn spawn_backend(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn api(base_url: String) -> HttpLessonApi {
        let cfg = StudioConfig { api_base_url: base_url, ..StudioConfig::default() };
        HttpLessonApi::from_config(&cfg).expect("client")
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("בַּיָּם", CefrLevel::A1)
    }

    #[tokio::test]
    async fn generate_unwraps_success_envelope() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(req): Json<GenerationRequest>| async move {
                Json(json!({
                    "success": true,
                    "data": lesson(&req.topic),
                    "generation_time_ms": 1200,
                    "metadata": {"level": req.level, "variant": "default", "version": "1.0.0"}
                }))
            }),
        );
        let env = api(spawn_backend(app).await).generate(&request()).await;
        assert!(env.success);
        assert_eq!(env.generation_time_ms, Some(1200));
        assert_eq!(env.into_result().unwrap(), lesson("בַּיָּם"));
    }

    #[tokio::test]
    async fn failing_status_keeps_structured_error() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"success": false, "error": "RATE_LIMITED", "message": "Rate limited", "request_id": "r-1"})),
                )
            }),
        );
        let env = api(spawn_backend(app).await).generate(&request()).await;
        assert!(!env.success);
        assert_eq!(env.error.as_deref(), Some("RATE_LIMITED"));
        assert_eq!(env.request_id.as_deref(), Some("r-1"));
        let failure = env.into_result().unwrap_err();
        assert_eq!(failure.kind, ErrorKind::ApplicationError);
        assert_eq!(failure.display_message(), "Rate limited");
    }

    #[tokio::test]
    async fn failing_status_without_json_becomes_http_error() {
        let app = Router::new().route("/api/generate", post(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream</html>") }));
        let env = api(spawn_backend(app).await).generate(&request()).await;
        assert_eq!(env.error.as_deref(), Some("HTTP_ERROR"));
        assert_eq!(env.message.as_deref(), Some("Bad Gateway"));
        assert_eq!(env.into_result().unwrap_err().kind, ErrorKind::HttpError);
    }

    #[tokio::test]
    async fn unreachable_backend_becomes_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let env = api(format!("http://{addr}")).generate(&request()).await;
        assert!(!env.success);
        assert_eq!(env.error.as_deref(), Some("NETWORK_ERROR"));
        assert!(env.message.as_deref().is_some_and(|m| !m.is_empty()));
        assert_eq!(env.into_result().unwrap_err().kind, ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn adapt_reads_bare_payload() {
        let app = Router::new().route(
            "/api/adapt",
            post(|Json(req): Json<AdaptationRequest>| async move {
                assert_eq!(req.original_questions.len(), 2);
                Json(adapted("טֶקְסְט פָּשׁוּט"))
            }),
        );
        let req = AdaptationRequest::from_content(&lesson("בַּיָּם"), Some("general_difficulty"));
        let env = api(spawn_backend(app).await).adapt(&req).await;
        assert_eq!(env.into_result().unwrap(), adapted("טֶקְסְט פָּשׁוּט"));
    }

    #[tokio::test]
    async fn adapt_error_field_marks_failure_despite_ok_status() {
        let app = Router::new().route(
            "/api/adapt",
            post(|| async { Json(json!({"error": "MODEL_UNAVAILABLE", "message": "try later"})) }),
        );
        let req = AdaptationRequest::from_content(&lesson("בַּיָּם"), None);
        let env = api(spawn_backend(app).await).adapt(&req).await;
        assert!(env.success);
        assert_eq!(env.error.as_deref(), Some("MODEL_UNAVAILABLE"));
        assert_eq!(env.into_result().unwrap_err().kind, ErrorKind::ApplicationError);
    }

    #[tokio::test]
    async fn unparseable_success_body_is_malformed() {
        let app = Router::new().route("/api/generate", post(|| async { "not json" }));
        let env = api(spawn_backend(app).await).generate(&request()).await;
        assert_eq!(env.into_result().unwrap_err().kind, ErrorKind::MalformedResponse);
    }
}
