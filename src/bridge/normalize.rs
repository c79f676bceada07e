//! ブリッジ入力の正規化
//!
//! ホストから届く値はフィールドが欠けていたり名前が揺れていたりする。
//! 欠けた項目は中立値で埋め、常に完全な `AnalysisResult` を返す。

use super::BridgeInput;
use crate::error::DeepScanError;
use chrono::Utc;
use deepscan_common::{
    extract_json, AnalysisResult, ForensicMetrics, MediaAnalysis, ModelSignature,
    PerceptionMetrics, SuspiciousRegion, VideoAnalysis, WatermarkReport, WatermarkSignature,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// 欠けているサブ指標の値
pub const NEUTRAL_METRIC: f64 = 50.0;
/// キーワード判定で生成AIと判断したときのスコア
pub const HEURISTIC_POSITIVE_SCORE: f64 = 85.0;
/// キーワード判定で本物と判断したときのスコア
pub const HEURISTIC_NEGATIVE_SCORE: f64 = 15.0;

const UNKNOWN_MODEL: &str = "Unknown";
const VERDICT_SYNTHETIC: &str = "AI Generated";
const VERDICT_AUTHENTIC: &str = "Likely Authentic";
const DEFAULT_REASONING: &str = "Result delivered by the native host.";

lazy_static::lazy_static! {
    static ref SYNTHETIC_KEYWORD: Regex = Regex::new(r"(?i)ai|synthetic").unwrap();
}

/// 入力を結果に変換（失敗しない）
pub fn normalize_input(input: &BridgeInput) -> AnalysisResult {
    match input {
        BridgeInput::Structured(Value::String(text)) | BridgeInput::Text(text) => normalize_text(text),
        BridgeInput::Structured(Value::Object(map)) => normalize_object(map),
        BridgeInput::Structured(other) => {
            log::warn!(
                "{}",
                DeepScanError::BridgeNormalization(format!("オブジェクト以外の値: {}", other))
            );
            heuristic_result(&other.to_string())
        }
    }
}

/// 文字列はまずJSONとして厳密に解釈し、だめならキーワード判定
pub fn normalize_text(text: &str) -> AnalysisResult {
    let parsed = extract_json(text)
        .map_err(|e| e.to_string())
        .and_then(|json| serde_json::from_str::<Value>(json).map_err(|e| e.to_string()));

    match parsed {
        Ok(Value::Object(map)) => normalize_object(&map),
        Ok(_) => heuristic_result(text),
        Err(e) => {
            log::debug!("{}", DeepScanError::BridgeNormalization(e));
            heuristic_result(text)
        }
    }
}

/// "ai" / "synthetic" を含むか（大文字小文字を区別しない）
pub fn classify_text(text: &str) -> bool {
    SYNTHETIC_KEYWORD.is_match(text)
}

fn heuristic_result(text: &str) -> AnalysisResult {
    let is_ai = classify_text(text);
    let score = if is_ai {
        HEURISTIC_POSITIVE_SCORE
    } else {
        HEURISTIC_NEGATIVE_SCORE
    };

    let reasoning = text.trim();
    AnalysisResult {
        is_ai_generated: is_ai,
        confidence_score: score,
        verdict: verdict_label(is_ai).to_string(),
        reasoning: if reasoning.is_empty() {
            DEFAULT_REASONING.to_string()
        } else {
            reasoning.to_string()
        },
        technical_details: Vec::new(),
        model_signature: unknown_model(),
        forensic_metrics: neutral_forensics(),
        perception_metrics: neutral_perception(),
        suspicious_regions: Vec::new(),
        watermark: WatermarkReport {
            detected: false,
            signatures: Vec::new(),
        },
        media: MediaAnalysis::Image,
        created_at: Utc::now(),
    }
}

fn normalize_object(map: &Map<String, Value>) -> AnalysisResult {
    let flag = get_bool(map, &["isAiGenerated", "is_ai_generated", "isAI", "synthetic"]);
    let score = get_f64(map, &["confidenceScore", "confidence_score", "score", "confidence"])
        .map(clamp_score);

    let (is_ai, score) = match (flag, score) {
        (Some(is_ai), Some(score)) => (is_ai, score),
        (Some(true), None) => (true, HEURISTIC_POSITIVE_SCORE),
        (Some(false), None) => (false, HEURISTIC_NEGATIVE_SCORE),
        (None, Some(score)) => (score > NEUTRAL_METRIC, score),
        (None, None) => (false, NEUTRAL_METRIC),
    };

    let verdict = get_string(map, &["verdict", "label"])
        .unwrap_or_else(|| verdict_label(is_ai).to_string());
    let reasoning = get_string(map, &["reasoning", "explanation", "summary"])
        .unwrap_or_else(|| DEFAULT_REASONING.to_string());
    let technical_details = get_list::<String>(map, &["technicalDetails", "technical_details"]);

    let model_signature = get_object(map, &["modelSignature", "model_signature"])
        .map(|m| ModelSignature {
            name: get_string(m, &["name"]).unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
            confidence: get_f64(m, &["confidence"]).map(clamp_score).unwrap_or(0.0),
        })
        .unwrap_or_else(unknown_model);

    let forensic_metrics = get_object(map, &["forensicMetrics", "forensic_metrics"])
        .map(|m| ForensicMetrics {
            noise_consistency: metric(m, &["noiseConsistency", "noise_consistency"]),
            compression_artifacts: metric(m, &["compressionArtifacts", "compression_artifacts"]),
            frequency_anomalies: metric(m, &["frequencyAnomalies", "frequency_anomalies"]),
            lighting_physics: metric(m, &["lightingPhysics", "lighting_physics"]),
        })
        .unwrap_or_else(neutral_forensics);

    let perception_metrics = get_object(map, &["perceptionMetrics", "perception_metrics"])
        .map(|m| PerceptionMetrics {
            anatomical_accuracy: metric(m, &["anatomicalAccuracy", "anatomical_accuracy"]),
            texture_realism: metric(m, &["textureRealism", "texture_realism"]),
            background_coherence: metric(m, &["backgroundCoherence", "background_coherence"]),
            semantic_logic: metric(m, &["semanticLogic", "semantic_logic"]),
        })
        .unwrap_or_else(neutral_perception);

    let suspicious_regions =
        get_list::<SuspiciousRegion>(map, &["suspiciousRegions", "suspicious_regions"]);

    let watermark = match get_object(map, &["watermark"]) {
        Some(w) => {
            let signatures = get_list::<WatermarkSignature>(w, &["signatures"]);
            WatermarkReport {
                detected: get_bool(w, &["detected"]).unwrap_or(!signatures.is_empty()),
                signatures,
            }
        }
        None => WatermarkReport {
            detected: false,
            signatures: Vec::new(),
        },
    };

    let media = map
        .get("videoAnalysis")
        .or_else(|| map.get("video_analysis"))
        .and_then(|v| serde_json::from_value::<VideoAnalysis>(v.clone()).ok())
        .map(MediaAnalysis::Video)
        .unwrap_or(MediaAnalysis::Image);

    AnalysisResult {
        is_ai_generated: is_ai,
        confidence_score: score,
        verdict,
        reasoning,
        technical_details,
        model_signature,
        forensic_metrics,
        perception_metrics,
        suspicious_regions,
        watermark,
        media,
        created_at: Utc::now(),
    }
}

fn verdict_label(is_ai: bool) -> &'static str {
    if is_ai {
        VERDICT_SYNTHETIC
    } else {
        VERDICT_AUTHENTIC
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn unknown_model() -> ModelSignature {
    ModelSignature {
        name: UNKNOWN_MODEL.to_string(),
        confidence: 0.0,
    }
}

fn neutral_forensics() -> ForensicMetrics {
    ForensicMetrics {
        noise_consistency: NEUTRAL_METRIC,
        compression_artifacts: NEUTRAL_METRIC,
        frequency_anomalies: NEUTRAL_METRIC,
        lighting_physics: NEUTRAL_METRIC,
    }
}

fn neutral_perception() -> PerceptionMetrics {
    PerceptionMetrics {
        anatomical_accuracy: NEUTRAL_METRIC,
        texture_realism: NEUTRAL_METRIC,
        background_coherence: NEUTRAL_METRIC,
        semantic_logic: NEUTRAL_METRIC,
    }
}

fn metric(map: &Map<String, Value>, keys: &[&str]) -> f64 {
    get_f64(map, keys).map(clamp_score).unwrap_or(NEUTRAL_METRIC)
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k)).filter(|v| !v.is_null())
}

fn get_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    lookup(map, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn get_bool(map: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match lookup(map, keys)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 数値または数値文字列
fn get_f64(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let value = match lookup(map, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn get_object<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    lookup(map, keys).and_then(Value::as_object)
}

/// 配列の要素のうち読めるものだけを取り出す
fn get_list<T: DeserializeOwned>(map: &Map<String, Value>, keys: &[&str]) -> Vec<T> {
    lookup(map, keys)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
