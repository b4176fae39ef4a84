//! Response envelopes and response types.
//!
//! Every dispatch produces an [`Envelope`] (`{code, message?, data?}`) which
//! the contract's bound [`ResponseType`] renders into a [`Payload`].

use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a response type.
pub type SharedResponse = Arc<dyn ResponseType>;

/// The uniform response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Response code from the contract's code table.
    pub code: String,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Creates an envelope with only a code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: None,
            data: None,
        }
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns `true` for the `success` code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == crate::code::SUCCESS
    }
}

/// A rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// HTTP status.
    pub status: StatusCode,
    /// `Content-Type` header value.
    pub content_type: String,
    /// Response body.
    pub body: Bytes,
    /// The envelope code this payload was rendered from.
    pub code: String,
}

impl Payload {
    /// Returns the body as UTF-8 text, if it is.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Renders envelopes into payloads.
pub trait ResponseType: Send + Sync + fmt::Debug + 'static {
    /// Name used in `response` directives.
    fn name(&self) -> &str;

    /// Renders an envelope.
    fn render(&self, envelope: &Envelope) -> Payload;
}

/// JSON body; every envelope is a `200 OK`, clients read the code.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponse;

impl ResponseType for JsonResponse {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, envelope: &Envelope) -> Payload {
        let body = match serde_json::to_vec(envelope) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(code = %envelope.code, error = %e, "failed to serialize envelope");
                format!(r#"{{"code":"{}"}}"#, crate::code::EXCEPTION).into_bytes()
            }
        };
        Payload {
            status: StatusCode::OK,
            content_type: "application/json".to_string(),
            body: Bytes::from(body),
            code: envelope.code.clone(),
        }
    }
}

/// Plain text body: the message, or the code when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextResponse;

impl ResponseType for PlainTextResponse {
    fn name(&self) -> &str {
        "text"
    }

    fn render(&self, envelope: &Envelope) -> Payload {
        let text = envelope.message.as_deref().unwrap_or(&envelope.code);
        let status = if envelope.is_success() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        Payload {
            status,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: Bytes::from(text.to_string()),
            code: envelope.code.clone(),
        }
    }
}
