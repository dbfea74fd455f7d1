use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Structured reading of the source produced by the analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub architecture_style: String,
    pub structure_notes: String,
    pub recommendations: String,
}

/// A generated image bound to the style that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignVariant {
    pub id: String,
    pub style: String,
    pub image_url: String,
    pub description: String,
}

impl DesignVariant {
    pub fn download_file_name(&self) -> String {
        format!("Architect-{}.png", self.id)
    }
}

/// JSON schema the analysis model must answer with.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "architectureStyle": {
                "type": "STRING",
                "description": "Phong cách hiện tại hoặc đề xuất",
            },
            "structureNotes": {
                "type": "STRING",
                "description": "Ghi chú về kết cấu/đường nét",
            },
            "recommendations": {
                "type": "STRING",
                "description": "Đề xuất thiết kế",
            },
        },
        "required": ["architectureStyle", "structureNotes", "recommendations"],
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{analysis_response_schema, AnalysisResult, DesignVariant};

    #[test]
    fn analysis_requires_all_three_fields() {
        let parsed = serde_json::from_str::<AnalysisResult>(
            r#"{"architectureStyle": "Modern", "structureNotes": "Two volumes"}"#,
        );
        assert!(parsed.is_err());

        let parsed = serde_json::from_str::<AnalysisResult>(
            r#"{"architectureStyle": "Modern", "structureNotes": "Two volumes", "recommendations": "Add shading"}"#,
        );
        assert_eq!(
            parsed.ok().map(|row| row.recommendations),
            Some("Add shading".to_string())
        );
    }

    #[test]
    fn schema_lists_every_field_as_required() {
        let schema = analysis_response_schema();
        let required = schema["required"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| row.as_str().map(str::to_string))
            .collect::<Vec<String>>();
        assert_eq!(
            required,
            vec!["architectureStyle", "structureNotes", "recommendations"]
        );
        for field in &required {
            assert_eq!(
                schema["properties"][field]["type"],
                Value::String("STRING".to_string())
            );
        }
    }

    #[test]
    fn download_name_uses_variant_id() {
        let variant = DesignVariant {
            id: "renov-luxury".to_string(),
            style: "Luxury Facelift".to_string(),
            image_url: "data:image/png;base64,AA==".to_string(),
            description: String::new(),
        };
        assert_eq!(variant.download_file_name(), "Architect-renov-luxury.png");
    }
}
