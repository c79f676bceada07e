//! Gemini API連携
//!
//! 前処理済みのペイロードを generateContent に送り、
//! 応答スキーマに沿ったJSONを AnalysisResult に変換する。

use super::MediaAnalyzer;
use crate::config::Config;
use crate::error::{DeepScanError, Result};
use async_trait::async_trait;
use chrono::Utc;
use deepscan_common::{
    build_analysis_prompt, parse_verdict_response, verdict_response_schema, AnalysisResult,
    SYSTEM_INSTRUCTION,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
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
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.iter().find_map(|p| p.text.as_deref()))
    }
}

fn build_request(payload: &str, mime_type: &str) -> GeminiRequest {
    GeminiRequest {
        system_instruction: Content {
            parts: vec![Part::Text {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: payload.to_string(),
                    },
                },
                Part::Text {
                    text: build_analysis_prompt(mime_type),
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: 0.1,
            response_mime_type: "application/json".to_string(),
            response_schema: verdict_response_schema(),
        },
    }
}

/// 応答テキストを検証し、作成時刻を付与
///
/// 作成時刻はこの層でのみ付与する（サービスは返さない）。
pub fn finalize_response(text: Option<&str>) -> Result<AnalysisResult> {
    let text = match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(DeepScanError::EmptyResponse),
    };

    let payload = parse_verdict_response(text)
        .map_err(|e| DeepScanError::ResponseParse(e.to_string()))?;

    Ok(payload.into_result(Utc::now()))
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_seconds: u64,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()
            .map_err(|e| DeepScanError::Config(format!("HTTPクライアント初期化失敗: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            timeout_seconds: timeout_seconds.max(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        Self::new(api_key, &config.model, &config.api_base_url, config.timeout_seconds)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn call(&self, request: &GeminiRequest) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DeepScanError::AnalysisRequest(format!(
                "API error {}: {}",
                status, text
            )));
        }

        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;
        if body.trim().is_empty() {
            return Err(DeepScanError::EmptyResponse);
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| DeepScanError::ResponseParse(format!("レスポンス形式が不正: {}", e)))?;

        Ok(parsed.first_text().map(str::to_string))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> DeepScanError {
        if e.is_timeout() {
            DeepScanError::Timeout(self.timeout_seconds)
        } else {
            DeepScanError::AnalysisRequest(e.to_string())
        }
    }
}

#[async_trait]
impl MediaAnalyzer for GeminiClient {
    async fn analyze(&self, payload: &str, mime_type: &str) -> Result<AnalysisResult> {
        let request = build_request(payload, mime_type);

        log::debug!(
            "解析リクエスト送信: model={} mime={} payload={} chars",
            self.model,
            mime_type,
            payload.len()
        );

        let text = self.call(&request).await?;
        finalize_response(text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERDICT: &str = r#"{
        "isAiGenerated": true,
        "confidenceScore": 77,
        "verdict": "AI Generated",
        "reasoning": "Warped text in background.",
        "technicalDetails": ["Irregular JPEG grid"],
        "modelSignature": {"name": "Stable Diffusion XL", "confidence": 58},
        "forensicMetrics": {"noiseConsistency": 30, "compressionArtifacts": 40, "frequencyAnomalies": 25, "lightingPhysics": 50},
        "perceptionMetrics": {"anatomicalAccuracy": 45, "textureRealism": 35, "backgroundCoherence": 20, "semanticLogic": 30},
        "suspiciousRegions": [],
        "watermark": {"detected": false, "signatures": []}
    }"#;

    #[test]
    fn test_request_serialize() {
        let request = build_request("QUJD", "image/jpeg");
        let json = serde_json::to_string(&request).expect("シリアライズ失敗");
        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"responseMimeType\":\"application/json\""));
        assert!(json.contains("\"responseSchema\""));
        assert!(json.contains("\"mime_type\":\"image/jpeg\""));
        assert!(json.contains("\"data\":\"QUJD\""));
    }

    #[test]
    fn test_part_text_serialize() {
        let part = Part::Text { text: "Hello".to_string() };
        let json = serde_json::to_string(&part).expect("シリアライズ失敗");
        assert_eq!(json, r#"{"text":"Hello"}"#);
    }

    #[test]
    fn test_response_first_text() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\": 1}"}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(response.first_text(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GeminiResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert!(response.first_text().is_none());
    }

    #[test]
    fn test_finalize_response_stamps_time() {
        let before = Utc::now();
        let result = finalize_response(Some(VERDICT)).unwrap();
        assert!(result.created_at >= before);
        assert_eq!(result.confidence_score, 77.0);
        assert!(!result.media.is_video());
    }

    #[test]
    fn test_finalize_response_empty() {
        assert!(matches!(finalize_response(None), Err(DeepScanError::EmptyResponse)));
        assert!(matches!(finalize_response(Some("  ")), Err(DeepScanError::EmptyResponse)));
    }

    #[test]
    fn test_finalize_response_incomplete() {
        let result = finalize_response(Some(r#"{"isAiGenerated": true}"#));
        assert!(matches!(result, Err(DeepScanError::ResponseParse(_))));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("k", "gemini-2.5-flash", "https://example.com/v1beta/models/", 10).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
