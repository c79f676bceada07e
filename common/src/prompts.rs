//! プロンプト生成モジュール
//!
//! 解析サービスへ渡す固定のシステム指示と応答スキーマ:
//! - SYSTEM_INSTRUCTION: 採点ルーブリック
//! - build_analysis_prompt: メディア種別ごとの指示文
//! - verdict_response_schema: 応答JSONスキーマ（VerdictPayloadと同じ形）

use serde_json::{json, Value};

/// 採点ルーブリック（システム指示）
pub const SYSTEM_INSTRUCTION: &str = r#"You are a digital media forensics analyst. Decide whether the supplied media was produced or substantially altered by a generative AI system.

Scoring rubric:
- confidenceScore is 0-100 where 100 means almost certainly synthetic and 0 means almost certainly authentic camera capture.
- isAiGenerated is true when confidenceScore is above 50.
- forensicMetrics (0-100 each, higher = more natural): noiseConsistency (sensor noise pattern), compressionArtifacts (plausible compression history), frequencyAnomalies (absence of periodic upsampling traces), lightingPhysics (consistent shadows and reflections).
- perceptionMetrics (0-100 each, higher = more natural): anatomicalAccuracy, textureRealism, backgroundCoherence, semanticLogic.
- suspiciousRegions use boxes normalized to 0-100 of the image width and height.
- watermark lists any visible or invisible provenance signatures (provider, type, confidence).
- modelSignature is your best guess of the generator family with a 0-100 confidence; use "Unknown" when none fits.
- For video input also fill videoAnalysis with temporalConsistency (0-100) and frameAnomalies with timestamps in seconds.

Be concise. verdict is a short label such as "AI Generated", "Likely Authentic" or "Manipulated"."#;

/// 指示文を生成
///
/// # Arguments
/// * `mime_type` - 送信するメディアのMIMEタイプ
pub fn build_analysis_prompt(mime_type: &str) -> String {
    let media = if mime_type.starts_with("video/") { "video" } else { "image" };
    format!(
        "Analyze this {media} ({mime_type}) for signs of synthetic generation and return ONLY the JSON object described by the schema."
    )
}

fn score() -> Value {
    json!({ "type": "NUMBER" })
}

fn metrics(fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|name| (name.to_string(), score()))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": fields,
    })
}

/// 応答スキーマ（Gemini responseSchema形式）
pub fn verdict_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isAiGenerated": { "type": "BOOLEAN" },
            "confidenceScore": score(),
            "verdict": { "type": "STRING" },
            "reasoning": { "type": "STRING" },
            "technicalDetails": { "type": "ARRAY", "items": { "type": "STRING" } },
            "modelSignature": {
                "type": "OBJECT",
                "properties": { "name": { "type": "STRING" }, "confidence": score() },
                "required": ["name", "confidence"]
            },
            "forensicMetrics": metrics(&[
                "noiseConsistency",
                "compressionArtifacts",
                "frequencyAnomalies",
                "lightingPhysics",
            ]),
            "perceptionMetrics": metrics(&[
                "anatomicalAccuracy",
                "textureRealism",
                "backgroundCoherence",
                "semanticLogic",
            ]),
            "suspiciousRegions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "box": metrics(&["x", "y", "width", "height"]),
                        "label": { "type": "STRING" },
                        "confidence": score()
                    },
                    "required": ["box", "label", "confidence"]
                }
            },
            "watermark": {
                "type": "OBJECT",
                "properties": {
                    "detected": { "type": "BOOLEAN" },
                    "signatures": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "provider": { "type": "STRING" },
                                "type": { "type": "STRING" },
                                "confidence": score()
                            },
                            "required": ["provider", "type", "confidence"]
                        }
                    }
                },
                "required": ["detected", "signatures"]
            },
            "videoAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "temporalConsistency": score(),
                    "frameAnomalies": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "timestamp": score(),
                                "description": { "type": "STRING" }
                            },
                            "required": ["timestamp", "description"]
                        }
                    }
                },
                "required": ["temporalConsistency", "frameAnomalies"]
            }
        },
        "required": [
            "isAiGenerated",
            "confidenceScore",
            "verdict",
            "reasoning",
            "technicalDetails",
            "modelSignature",
            "forensicMetrics",
            "perceptionMetrics",
            "suspiciousRegions",
            "watermark"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_analysis_prompt_image() {
        let prompt = build_analysis_prompt("image/jpeg");
        assert!(prompt.contains("this image"));
        assert!(prompt.contains("image/jpeg"));
    }

    #[test]
    fn test_build_analysis_prompt_video() {
        let prompt = build_analysis_prompt("video/mp4");
        assert!(prompt.contains("this video"));
    }

    #[test]
    fn test_schema_video_block_is_optional() {
        let schema = verdict_response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required.len(), 10);
        assert!(!required.contains(&"videoAnalysis"));
        assert!(schema["properties"]["videoAnalysis"].is_object());
    }

    #[test]
    fn test_schema_metric_blocks() {
        let schema = verdict_response_schema();
        let forensic = &schema["properties"]["forensicMetrics"];
        assert_eq!(forensic["required"].as_array().unwrap().len(), 4);
        assert_eq!(forensic["properties"]["lightingPhysics"]["type"], "NUMBER");
    }

    #[test]
    fn test_system_instruction_mentions_rubric() {
        assert!(SYSTEM_INSTRUCTION.contains("confidenceScore is 0-100"));
        assert!(SYSTEM_INSTRUCTION.contains("videoAnalysis"));
    }
}
