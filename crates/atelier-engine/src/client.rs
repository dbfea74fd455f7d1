use anyhow::Result;
use atelier_contracts::analysis::{analysis_response_schema, AnalysisResult};
use atelier_contracts::catalog::StyleDescriptor;
use atelier_contracts::media::{encode_data_uri, SourceImage};
use atelier_contracts::modes::Mode;
use serde_json::{json, Map, Value};

use crate::config::EngineConfig;
use crate::error::{AnalysisError, FailureKind, GenerationError};
use crate::prompts::{analysis_instruction, variant_instruction};
use crate::transport::{classify_failure, error_chain_text, GeminiTransport, ModelTransport};

/// The two remote operations the orchestrator depends on.
pub trait GenerativeService: Send + Sync {
    fn analyze(
        &self,
        image: Option<&SourceImage>,
        mode: Mode,
        free_text: &str,
    ) -> Result<AnalysisResult, AnalysisError>;

    /// Returns the generated image as a data URI.
    fn generate_variant(
        &self,
        image: Option<&SourceImage>,
        mode: Mode,
        style: &StyleDescriptor,
        free_text: Option<&str>,
    ) -> Result<String, GenerationError>;
}

pub struct GenerativeClient<T: ModelTransport> {
    transport: T,
    analysis_model: String,
    image_model: String,
}

impl GenerativeClient<GeminiTransport> {
    pub fn gemini(config: &EngineConfig, transport: GeminiTransport) -> Self {
        Self::new(
            transport,
            config.analysis_model.clone(),
            config.image_model.clone(),
        )
    }
}

impl<T: ModelTransport> GenerativeClient<T> {
    pub fn new(transport: T, analysis_model: String, image_model: String) -> Self {
        Self {
            transport,
            analysis_model,
            image_model,
        }
    }
}

impl<T: ModelTransport> GenerativeService for GenerativeClient<T> {
    fn analyze(
        &self,
        image: Option<&SourceImage>,
        mode: Mode,
        free_text: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let payload = analysis_payload(image, mode, free_text);
        let response = self
            .transport
            .generate_content(&self.analysis_model, &payload)
            .map_err(|err| AnalysisError {
                kind: classify_failure(&err),
                message: error_chain_text(&err, 512),
            })?;
        parse_analysis(&response)
    }

    fn generate_variant(
        &self,
        image: Option<&SourceImage>,
        mode: Mode,
        style: &StyleDescriptor,
        free_text: Option<&str>,
    ) -> Result<String, GenerationError> {
        let payload = variant_payload(image, mode, style, free_text);
        let response = self
            .transport
            .generate_content(&self.image_model, &payload)
            .map_err(|err| GenerationError {
                style_id: style.id.clone(),
                kind: classify_failure(&err),
                message: error_chain_text(&err, 512),
            })?;
        first_inline_image(&response).ok_or_else(|| GenerationError {
            style_id: style.id.clone(),
            kind: FailureKind::NoImage,
            message: "Không thể tạo hình ảnh.".to_string(),
        })
    }
}

fn user_content(image: Option<&SourceImage>, instruction: String) -> Value {
    let mut parts = Vec::new();
    if let Some(image) = image {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type(),
                "data": image.base64(),
            }
        }));
    }
    parts.push(json!({ "text": instruction }));
    json!([{ "role": "user", "parts": parts }])
}

pub(crate) fn analysis_payload(image: Option<&SourceImage>, mode: Mode, free_text: &str) -> Value {
    json!({
        "contents": user_content(image, analysis_instruction(mode, free_text)),
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": analysis_response_schema(),
        },
    })
}

pub(crate) fn variant_payload(
    image: Option<&SourceImage>,
    mode: Mode,
    style: &StyleDescriptor,
    free_text: Option<&str>,
) -> Value {
    let instruction = variant_instruction(mode, style, free_text, image.is_some());
    json!({
        "contents": user_content(image, instruction),
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": {
                "aspectRatio": mode.aspect_ratio(),
            },
        },
    })
}

fn candidate_parts(response: &Value) -> Vec<Map<String, Value>> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .flat_map(|candidate| {
            candidate
                .get("content")
                .and_then(|content| content.get("parts"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        })
        .filter_map(|part| part.as_object().cloned())
        .collect()
}

/// Concatenated text parts of the first candidate.
fn response_text(response: &Value) -> String {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_analysis(response: &Value) -> Result<AnalysisResult, AnalysisError> {
    let text = response_text(response);
    if text.trim().is_empty() {
        return Err(AnalysisError {
            kind: FailureKind::Malformed,
            message: "analysis response had no text".to_string(),
        });
    }
    serde_json::from_str::<AnalysisResult>(text.trim()).map_err(|err| AnalysisError {
        kind: FailureKind::Malformed,
        message: format!("analysis response did not match the schema: {err}"),
    })
}

pub(crate) fn first_inline_image(response: &Value) -> Option<String> {
    candidate_parts(response).into_iter().find_map(|part| {
        let inline = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
            .and_then(Value::as_object)?;
        let data = inline
            .get("data")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())?;
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str);
        Some(encode_data_uri(mime_type, data))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use anyhow::Result;
    use atelier_contracts::catalog::StyleCatalog;
    use atelier_contracts::media::SourceImage;
    use atelier_contracts::modes::Mode;
    use serde_json::{json, Value};

    use super::{first_inline_image, parse_analysis, GenerativeClient, GenerativeService};
    use crate::error::FailureKind;
    use crate::transport::{ModelTransport, ServiceRejection};

    #[derive(Default)]
    struct FakeTransport {
        responses: Mutex<VecDeque<Result<Value>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl FakeTransport {
        fn answering(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().map(|rows| rows.clone()).unwrap_or_default()
        }
    }

    impl ModelTransport for &FakeTransport {
        fn generate_content(&self, model: &str, payload: &Value) -> Result<Value> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((model.to_string(), payload.clone()));
            }
            self.responses
                .lock()
                .map_err(|_| anyhow::anyhow!("fake transport poisoned"))?
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response")))
        }
    }

    fn client(transport: &FakeTransport) -> GenerativeClient<&FakeTransport> {
        GenerativeClient::new(
            transport,
            "analysis-model".to_string(),
            "image-model".to_string(),
        )
    }

    fn png_source() -> Result<SourceImage> {
        SourceImage::from_bytes(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2])
    }

    fn text_response(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    #[test]
    fn analyze_sends_image_first_and_requests_schema() -> Result<()> {
        let transport = FakeTransport::answering(vec![Ok(text_response(
            r#"{"architectureStyle":"Modern","structureNotes":"Cantilever","recommendations":"Glass"}"#,
        ))]);
        let source = png_source()?;
        let analysis = client(&transport).analyze(Some(&source), Mode::SketchToRender, "")?;
        assert_eq!(analysis.architecture_style, "Modern");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (model, payload) = &calls[0];
        assert_eq!(model, "analysis-model");
        let parts = payload["contents"][0]["parts"].as_array().cloned().unwrap_or_default();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], json!("image/png"));
        assert_eq!(parts[0]["inlineData"]["data"], json!(source.base64()));
        assert!(parts[1]["text"].as_str().unwrap_or("").contains("phác thảo"));
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(
            payload["generationConfig"]["responseSchema"]["required"],
            json!(["architectureStyle", "structureNotes", "recommendations"])
        );
        Ok(())
    }

    #[test]
    fn analyze_without_image_sends_text_only() -> Result<()> {
        let transport = FakeTransport::answering(vec![Ok(text_response(
            r#"{"architectureStyle":"a","structureNotes":"b","recommendations":"c"}"#,
        ))]);
        client(&transport).analyze(None, Mode::LandToFloorplan, "Đất 6x18m mặt tiền hướng Đông")?;
        let calls = transport.calls();
        let parts = calls[0].1["contents"][0]["parts"].as_array().cloned().unwrap_or_default();
        assert_eq!(parts.len(), 1);
        assert!(parts[0]["text"]
            .as_str()
            .unwrap_or("")
            .contains("Đất 6x18m mặt tiền hướng Đông"));
        Ok(())
    }

    #[test]
    fn analyze_fails_hard_on_empty_or_partial_bodies() {
        let empty = parse_analysis(&json!({"candidates": []})).err();
        assert_eq!(empty.map(|err| err.kind), Some(FailureKind::Malformed));

        let partial = parse_analysis(&text_response(r#"{"architectureStyle":"Modern"}"#)).err();
        assert_eq!(partial.map(|err| err.kind), Some(FailureKind::Malformed));

        let garbage = parse_analysis(&text_response("Here is your analysis")).err();
        assert_eq!(garbage.map(|err| err.kind), Some(FailureKind::Malformed));
    }

    #[test]
    fn analyze_maps_rejections_to_service_failures() {
        let transport = FakeTransport::answering(vec![Err(ServiceRejection {
            provider: "Gemini".to_string(),
            code: 429,
            body: "quota".to_string(),
        }
        .into())]);
        let err = client(&transport)
            .analyze(None, Mode::HomeRenovation, "")
            .err();
        assert_eq!(err.as_ref().map(|err| err.kind), Some(FailureKind::Service));
        assert!(err
            .map(|err| err.message)
            .unwrap_or_default()
            .contains("(429)"));
    }

    #[test]
    fn generate_sets_aspect_ratio_per_mode() -> Result<()> {
        let catalog = StyleCatalog::default();
        let image_response = json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
        ]}}]});
        for (mode, ratio) in [
            (Mode::SketchToRender, "16:9"),
            (Mode::PerspectiveToFloorplan, "1:1"),
            (Mode::LandToFloorplan, "1:1"),
            (Mode::HomeRenovation, "16:9"),
        ] {
            let transport = FakeTransport::answering(vec![Ok(image_response.clone())]);
            let style = &catalog.for_mode(mode)[0];
            let uri = client(&transport).generate_variant(None, mode, style, Some("thêm hồ bơi"))?;
            assert_eq!(uri, "data:image/png;base64,AAAA");

            let calls = transport.calls();
            let (model, payload) = &calls[0];
            assert_eq!(model, "image-model");
            assert_eq!(
                payload["generationConfig"]["imageConfig"]["aspectRatio"],
                json!(ratio)
            );
            assert!(payload["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap_or("")
                .contains("thêm hồ bơi"));
        }
        Ok(())
    }

    #[test]
    fn generate_reports_missing_image_part() {
        let catalog = StyleCatalog::default();
        let style = &catalog.for_mode(Mode::SketchToRender)[1];
        let transport = FakeTransport::answering(vec![Ok(text_response("I cannot draw that."))]);
        let err = client(&transport)
            .generate_variant(None, Mode::SketchToRender, style, None)
            .err();
        assert_eq!(err.as_ref().map(|err| err.kind), Some(FailureKind::NoImage));
        assert_eq!(
            err.map(|err| err.style_id).as_deref(),
            Some("tropical")
        );
    }

    #[test]
    fn first_inline_image_skips_text_and_empty_parts() {
        let response = json!({"candidates": [
            {"content": {"parts": [
                {"text": "Here you go"},
                {"inlineData": {"mimeType": "image/png", "data": ""}}
            ]}},
            {"content": {"parts": [
                {"inline_data": {"mime_type": "image/jpeg", "data": "/9j/"}},
                {"inlineData": {"mimeType": "image/png", "data": "BBBB"}}
            ]}}
        ]});
        assert_eq!(
            first_inline_image(&response).as_deref(),
            Some("data:image/jpeg;base64,/9j/")
        );
        assert_eq!(first_inline_image(&json!({})), None);
    }
}
