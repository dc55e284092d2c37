//! Wire structs: the content API envelope, error taxonomy, and the DTOs of the
//! studio's own HTTP/WebSocket surface (serde ready).

use serde::{Deserialize, Serialize};

use crate::domain::CefrLevel;
use crate::view::View;

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";
pub const MALFORMED_MESSAGE: &str = "The server returned an incomplete response. Please try again.";
pub const CONNECTIVITY_MESSAGE: &str = "Could not reach the content server. Check your connection and try again.";

/// Where a failure came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Rejected locally before any request was issued.
    Validation,
    /// No response at all (DNS, connection reset, timeout).
    NetworkError,
    /// Failing status with no parseable structured error.
    HttpError,
    /// Structured error or message returned by the server.
    ApplicationError,
    /// success=true but the payload is absent or unusable.
    MalformedResponse,
}

impl ErrorKind {
    pub fn as_code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::HttpError => "HTTP_ERROR",
            ErrorKind::ApplicationError => "APPLICATION_ERROR",
            ErrorKind::MalformedResponse => "MALFORMED_RESPONSE",
        }
    }

    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("VALIDATION") => ErrorKind::Validation,
            Some("NETWORK_ERROR") => ErrorKind::NetworkError,
            Some("HTTP_ERROR") => ErrorKind::HttpError,
            Some("MALFORMED_RESPONSE") => ErrorKind::MalformedResponse,
            _ => ErrorKind::ApplicationError,
        }
    }
}

/// Uniform result of every content API call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<u64>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            generation_time_ms: None,
            cached: false,
            metadata: None,
            request_id: None,
        }
    }

    pub fn failure(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message,
            generation_time_ms: None,
            cached: false,
            metadata: None,
            request_id: None,
        }
    }

    pub fn network_error(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Network request failed".to_string());
        Self::failure(ErrorKind::NetworkError.as_code(), Some(message))
    }

    /// Enforces the envelope contract: a success must carry a payload and no
    /// error field; everything else becomes a `Failure`.
    pub fn into_result(self) -> Result<T, Failure> {
        if self.success {
            if self.error.is_some() {
                return Err(Failure {
                    kind: ErrorKind::ApplicationError,
                    code: self.error,
                    message: self.message,
                });
            }
            return self.data.ok_or_else(Failure::malformed);
        }
        Err(Failure {
            kind: ErrorKind::from_code(self.error.as_deref()),
            code: self.error,
            message: self.message,
        })
    }
}

/// A failed call, normalized from an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl Failure {
    pub fn malformed() -> Self {
        Self {
            kind: ErrorKind::MalformedResponse,
            code: Some(ErrorKind::MalformedResponse.as_code().to_string()),
            message: Some(MALFORMED_MESSAGE.to_string()),
        }
    }

    pub fn connectivity() -> Self {
        Self {
            kind: ErrorKind::NetworkError,
            code: Some(ErrorKind::NetworkError.as_code().to_string()),
            message: Some(CONNECTIVITY_MESSAGE.to_string()),
        }
    }

    pub fn into_envelope<T>(self) -> Envelope<T> {
        Envelope {
            success: false,
            data: None,
            error: self.code,
            message: self.message,
            generation_time_ms: None,
            cached: false,
            metadata: None,
            request_id: None,
        }
    }

    /// Text shown to the user: message, else error code, else a generic line.
    pub fn display_message(&self) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or(self.code.as_deref().filter(|c| !c.trim().is_empty()))
            .unwrap_or(UNKNOWN_ERROR_MESSAGE)
            .to_string()
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_code(), self.display_message())
    }
}

/// Structured error body the content API sends with failing statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

//
// Studio HTTP surface
//

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub topic: String,
    pub level: CefrLevel,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Messages the browser can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    View,
    Reset,
    Submit {
        topic: String,
        level: CefrLevel,
        #[serde(default)]
        variant: Option<String>,
    },
}

/// Messages the studio sends over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    View { view: View },
    Error { error: String, message: String },
}
