use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use atelier_contracts::events::{EventPayload, EventWriter};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::error::FailureKind;

/// Sends one `generateContent` call and returns the decoded JSON body.
pub trait ModelTransport: Send + Sync {
    fn generate_content(&self, model: &str, payload: &Value) -> Result<Value>;
}

/// The service answered with a non-success status.
#[derive(Debug, Error)]
#[error("{provider} request failed ({code}): {body}")]
pub struct ServiceRejection {
    pub provider: String,
    pub code: u16,
    pub body: String,
}

pub struct GeminiTransport {
    api_base: String,
    api_key: String,
    http: HttpClient,
    request_timeout_s: f64,
    transport_retries: usize,
    retry_backoff_s: f64,
    events: Option<EventWriter>,
}

impl GeminiTransport {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let Some(api_key) = config.api_key.clone() else {
            bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set");
        };
        Ok(Self {
            api_base: config.api_base.clone(),
            api_key,
            http: HttpClient::new(),
            request_timeout_s: config.request_timeout_s,
            transport_retries: config.transport_retries,
            retry_backoff_s: config.retry_backoff_s,
            events: None,
        })
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn post_with_transport_retries(&self, endpoint: &str, payload: &Value) -> Result<HttpResponse> {
        let mut attempt = 0;
        loop {
            let response = self
                .http
                .post(endpoint)
                .query(&[("key", self.api_key.as_str())])
                .timeout(Duration::from_secs_f64(self.request_timeout_s))
                .json(payload)
                .send();

            let err = match response {
                Ok(ok) => return Ok(ok),
                Err(raw) => {
                    anyhow::Error::new(raw).context(format!("Gemini request failed ({endpoint})"))
                }
            };
            if !is_retryable_transport_error(&err) || attempt >= self.transport_retries {
                return Err(err);
            }
            attempt += 1;
            if let Some(events) = &self.events {
                let mut payload = EventPayload::new();
                payload.insert("attempt".to_string(), json!(attempt));
                payload.insert("max_retries".to_string(), json!(self.transport_retries));
                payload.insert("error".to_string(), json!(error_chain_text(&err, 256)));
                // The retry goes ahead even if the log cannot be written.
                let _ = events.emit("transport_retry", payload);
            }
            thread::sleep(Duration::from_secs_f64(
                self.retry_backoff_s * attempt as f64,
            ));
        }
    }
}

impl ModelTransport for GeminiTransport {
    fn generate_content(&self, model: &str, payload: &Value) -> Result<Value> {
        let endpoint = self.endpoint_for_model(model);
        let response = self.post_with_transport_retries(&endpoint, payload)?;
        response_json_or_error("Gemini", response)
    }
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        return Err(ServiceRejection {
            provider: provider.to_string(),
            code: status.as_u16(),
            body: truncate_text(&body, 512),
        }
        .into());
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

pub(crate) fn is_retryable_transport_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .map(|reqwest_err| reqwest_err.is_timeout() || reqwest_err.is_connect())
            .unwrap_or(false)
    })
}

/// Sorts a transport-level error into a [`FailureKind`].
pub(crate) fn classify_failure(err: &anyhow::Error) -> FailureKind {
    for cause in err.chain() {
        if cause.downcast_ref::<ServiceRejection>().is_some() {
            return FailureKind::Service;
        }
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return FailureKind::Malformed;
        }
        if cause.downcast_ref::<reqwest::Error>().is_some() {
            return FailureKind::Transport;
        }
    }
    FailureKind::Service
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts.last().map(|existing| existing == trimmed).unwrap_or(false) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
