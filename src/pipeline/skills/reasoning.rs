//! Client for the remote semantic reasoning service.
//!
//! The service accepts a system instruction, a JSON context and an optional
//! base64 attachment, and is configured to answer strictly in JSON. Model
//! identity, cost and latency are deployment concerns; the pipeline only
//! depends on this narrow contract.

use std::collections::VecDeque;
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Attachment;

#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Cannot reach reasoning service at {0}")]
    Connection(String),

    #[error("Reasoning request timed out after {0}s")]
    Timeout(u64),

    #[error("Reasoning service error {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Malformed reasoning response: {0}")]
    ResponseParsing(String),
}

/// One reasoning invocation.
#[derive(Debug)]
pub struct ReasoningRequest<'a> {
    pub system_instruction: &'a str,
    pub context: &'a serde_json::Value,
    pub attachment: Option<&'a Attachment>,
}

/// Transport abstraction over the reasoning service.
pub trait ReasoningClient: Send + Sync {
    fn generate(&self, request: &ReasoningRequest<'_>) -> Result<String, ReasoningError>;
}

/// HTTP client for the reasoning gateway.
pub struct HttpReasoningClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpReasoningClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }
}

/// Request body for the gateway /v1/generate endpoint.
#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    system: &'a str,
    context: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<AttachmentBody>,
    response_mime_type: &'a str,
}

#[derive(Serialize)]
struct AttachmentBody {
    data: String,
    media_type: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    output: String,
}

impl ReasoningClient for HttpReasoningClient {
    fn generate(&self, request: &ReasoningRequest<'_>) -> Result<String, ReasoningError> {
        let url = format!("{}/v1/generate", self.base_url);
        let body = GenerateBody {
            model: &self.model,
            system: request.system_instruction,
            context: request.context,
            attachment: request.attachment.map(|a| AttachmentBody {
                data: BASE64.encode(&a.bytes),
                media_type: a.media_type.clone(),
            }),
            response_mime_type: "application/json",
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                ReasoningError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ReasoningError::Timeout(self.timeout_secs)
            } else {
                ReasoningError::ResponseParsing(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReasoningError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ReasoningError::ResponseParsing(e.to_string()))?;

        Ok(parsed.output)
    }
}

/// Mock reasoning client for testing. Replays a queue of canned responses.
pub struct MockReasoningClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    seen_instructions: Mutex<Vec<String>>,
}

impl MockReasoningClient {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
            seen_instructions: Mutex::new(Vec::new()),
        }
    }

    /// Queue a transport failure instead of a response.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(message.to_string())])),
            seen_instructions: Mutex::new(Vec::new()),
        }
    }

    /// System instructions received so far, in call order.
    pub fn seen_instructions(&self) -> Vec<String> {
        self.seen_instructions.lock().unwrap().clone()
    }
}

impl ReasoningClient for MockReasoningClient {
    fn generate(&self, request: &ReasoningRequest<'_>) -> Result<String, ReasoningError> {
        self.seen_instructions
            .lock()
            .unwrap()
            .push(request.system_instruction.to_string());

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ReasoningError::Connection(message)),
            None => Err(ReasoningError::Connection("mock queue exhausted".into())),
        }
    }
}
