//! Gemini API連携
//!
//! `generateContent` に指示文とインラインデータ（Base64）を1件送る。

use super::ReceiptModel;
use crate::config::Config;
use crate::error::{Result, ScanError};
use async_trait::async_trait;
use receipt_scan_common::ExtractionRequest;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini API クライアント
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base_url, &config.model)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// 指示文 → 画像/PDF の順に1つのcontentへ詰める
fn request_body(request: &ExtractionRequest) -> GeminiRequest<'_> {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: &request.instruction },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: &request.payload.mime_type,
                        data: &request.payload.data,
                    },
                },
            ],
        }],
        generation_config: GenerationConfig { temperature: 0.1 },
    }
}

#[async_trait]
impl ReceiptModel for GeminiClient {
    async fn generate(&self, api_key: &str, request: &ExtractionRequest) -> Result<String> {
        let body = request_body(request);

        tracing::debug!(
            model = %self.model,
            mime_type = %request.payload.mime_type,
            payload_len = request.payload.data.len(),
            "calling Gemini generateContent"
        );

        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::ApiCall(e.without_url().to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScanError::RateLimited);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ScanError::ApiCall(format!("API error {}: {}", status, text)));
        }

        let response: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| ScanError::ApiParse(e.without_url().to_string()))?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| ScanError::ApiParse("Empty response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_scan_common::{build_request, EncodedPayload};

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("https://example.com/", "gemini-2.0-flash");
        assert_eq!(
            client.endpoint(),
            "https://example.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = build_request(EncodedPayload {
            data: "QUJD".into(),
            mime_type: "application/pdf".into(),
        });
        let body = request_body(&request);

        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], request.instruction.as_str());
        assert_eq!(parts[1]["inline_data"]["mime_type"], "application/pdf");
        assert_eq!(parts[1]["inline_data"]["data"], "QUJD");
        assert!(json["generationConfig"]["temperature"].is_number());
    }
}
