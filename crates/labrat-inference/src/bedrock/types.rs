//! Bedrock Converse API request and response types.

use serde::{Deserialize, Serialize};

use labrat_core::{ContentItem, InferenceParameters, InferencePayload};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request body for `POST /model/{modelId}/converse`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    pub messages: Vec<ConverseMessage>,
    pub inference_config: InferenceConfig,
}

impl ConverseRequest {
    /// Single user turn built from an assembled payload.
    pub fn from_payload(payload: &InferencePayload, params: &InferenceParameters) -> Self {
        let content = payload
            .items()
            .iter()
            .map(|item| match item {
                ContentItem::Text(text) => ContentBlock::Text { text: text.clone() },
                ContentItem::Image(image) => ContentBlock::Image {
                    image: ImageBlock {
                        format: image.encoding.as_str().to_string(),
                        source: ImageSource {
                            bytes: image.to_base64(),
                        },
                    },
                },
            })
            .collect();

        Self {
            messages: vec![ConverseMessage {
                role: "user".to_string(),
                content,
            }],
            inference_config: InferenceConfig {
                max_tokens: params.max_output_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
            },
        }
    }
}

/// A single conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverseMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

/// One content block. Untagged: the key (`text` / `image`) is the tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Text { text: String },
    Image { image: ImageBlock },
}

/// Inline image content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBlock {
    /// "png", "jpeg", "gif" or "webp".
    pub format: String,
    pub source: ImageSource,
}

/// Base64 image bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSource {
    pub bytes: String,
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Response from the Converse endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub output: ConverseOutput,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl ConverseResponse {
    /// Text of the first content block, if it is a text block.
    pub fn first_text(&self) -> Option<&str> {
        self.output
            .message
            .content
            .first()
            .and_then(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Image { .. } => None,
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct ConverseOutput {
    pub message: ConverseMessage,
}

/// Token usage reported by the provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Error body returned by the runtime on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct BedrockErrorResponse {
    #[serde(alias = "Message")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use labrat_core::{ImageEncoding, NormalizedImage, RequestClass};

    #[test]
    fn test_request_serializes_converse_shape() {
        let payload = InferencePayload::from_items(vec![
            ContentItem::Text("What is drawn here?".to_string()),
            ContentItem::Image(NormalizedImage {
                encoding: ImageEncoding::Png,
                width: 10,
                height: 10,
                bytes: vec![1, 2, 3],
                size_bytes: 3,
            }),
        ]);
        let request =
            ConverseRequest::from_payload(&payload, &RequestClass::DrawingAnalysis.parameters());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["text"], "What is drawn here?");
        assert_eq!(json["messages"][0]["content"][1]["image"]["format"], "png");
        assert_eq!(
            json["messages"][0]["content"][1]["image"]["source"]["bytes"],
            "AQID"
        );
        assert_eq!(json["inferenceConfig"]["maxTokens"], 2500);
        assert!((json["inferenceConfig"]["topP"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_response_first_text() {
        let response: ConverseResponse = serde_json::from_value(serde_json::json!({
            "output": {
                "message": {
                    "role": "assistant",
                    "content": [{"text": "Consider the slope."}]
                }
            },
            "stopReason": "end_turn",
            "usage": {"inputTokens": 10, "outputTokens": 4, "totalTokens": 14}
        }))
        .unwrap();

        assert_eq!(response.first_text(), Some("Consider the slope."));
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(response.usage.unwrap().total_tokens, 14);
    }

    #[test]
    fn test_response_with_empty_content() {
        let response: ConverseResponse = serde_json::from_value(serde_json::json!({
            "output": {"message": {"role": "assistant", "content": []}}
        }))
        .unwrap();
        assert_eq!(response.first_text(), None);
    }
}
