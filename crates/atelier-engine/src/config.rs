use std::env;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Engine settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub analysis_model: String,
    pub image_model: String,
    pub request_timeout_s: f64,
    pub transport_retries: usize,
    pub retry_backoff_s: f64,
    pub max_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            api_base: get("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            analysis_model: get("ATELIER_ANALYSIS_MODEL")
                .unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.to_string()),
            image_model: get("ATELIER_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            request_timeout_s: clamped(get("ATELIER_REQUEST_TIMEOUT"), 90.0, 15.0, 300.0),
            transport_retries: clamped(get("ATELIER_TRANSPORT_RETRIES"), 1.0, 0.0, 2.0).round()
                as usize,
            retry_backoff_s: clamped(get("ATELIER_RETRY_BACKOFF"), 1.2, 0.1, 10.0),
            max_concurrency: clamped(get("ATELIER_MAX_CONCURRENCY"), 8.0, 1.0, 16.0).round()
                as usize,
        }
    }
}

fn clamped(raw: Option<String>, default: f64, min: f64, max: f64) -> f64 {
    raw.and_then(|text| text.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
        .clamp(min, max)
}
