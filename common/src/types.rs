//! 解析結果の型定義
//!
//! 各フロントエンドで共有される型:
//! - VerdictPayload: 解析サービスの応答（タイムスタンプなし）
//! - AnalysisResult: 作成時刻を付与した確定済みの判定結果
//! - BatchAnalysisResult: バッチ解析の1ファイル分
//! - HistoryItem: 履歴台帳の1エントリ

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 推定される生成モデル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSignature {
    pub name: String,
    pub confidence: f64,
}

/// フォレンジック指標（各0-100）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicMetrics {
    pub noise_consistency: f64,
    pub compression_artifacts: f64,
    pub frequency_anomalies: f64,
    pub lighting_physics: f64,
}

/// 人間の知覚に基づく指標（各0-100）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerceptionMetrics {
    pub anatomical_accuracy: f64,
    pub texture_realism: f64,
    pub background_coherence: f64,
    pub semantic_logic: f64,
}

/// 0-100に正規化された矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 疑わしい領域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousRegion {
    #[serde(rename = "box")]
    pub bounds: BoundingBox,
    pub label: String,
    pub confidence: f64,
}

/// 検出された透かしの署名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkSignature {
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: f64,
}

/// 透かし検出結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkReport {
    pub detected: bool,
    pub signatures: Vec<WatermarkSignature>,
}

/// フレーム単位の異常（timestampは秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAnomaly {
    pub timestamp: f64,
    pub description: String,
}

/// 動画専用の解析ブロック
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    pub temporal_consistency: f64,
    pub frame_anomalies: Vec<FrameAnomaly>,
}

/// メディア種別ごとの追加情報
///
/// 動画ブロックは `Video` を経由しないと参照できない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MediaAnalysis {
    Image,
    Video(VideoAnalysis),
}

impl MediaAnalysis {
    pub fn video(&self) -> Option<&VideoAnalysis> {
        match self {
            MediaAnalysis::Video(video) => Some(video),
            MediaAnalysis::Image => None,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaAnalysis::Video(_))
    }
}

/// 解析サービスの応答
///
/// `videoAnalysis` 以外はすべて必須。作成時刻はサービスからは返らない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictPayload {
    pub is_ai_generated: bool,
    pub confidence_score: f64,
    pub verdict: String,
    pub reasoning: String,
    pub technical_details: Vec<String>,
    pub model_signature: ModelSignature,
    pub forensic_metrics: ForensicMetrics,
    pub perception_metrics: PerceptionMetrics,
    pub suspicious_regions: Vec<SuspiciousRegion>,
    pub watermark: WatermarkReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_analysis: Option<VideoAnalysis>,
}

impl VerdictPayload {
    /// 作成時刻を付与して確定済みの結果に変換
    pub fn into_result(self, created_at: DateTime<Utc>) -> AnalysisResult {
        let media = match self.video_analysis {
            Some(video) => MediaAnalysis::Video(video),
            None => MediaAnalysis::Image,
        };

        AnalysisResult {
            is_ai_generated: self.is_ai_generated,
            confidence_score: self.confidence_score,
            verdict: self.verdict,
            reasoning: self.reasoning,
            technical_details: self.technical_details,
            model_signature: self.model_signature,
            forensic_metrics: self.forensic_metrics,
            perception_metrics: self.perception_metrics,
            suspicious_regions: self.suspicious_regions,
            watermark: self.watermark,
            media,
            created_at,
        }
    }
}

/// 確定済みの判定結果
///
/// 生成後は変更しない。台帳やバッチ結果にはコピーして渡す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub is_ai_generated: bool,
    /// 0-100（100 = 生成AIの可能性が最も高い）
    pub confidence_score: f64,
    pub verdict: String,
    pub reasoning: String,
    pub technical_details: Vec<String>,
    pub model_signature: ModelSignature,
    pub forensic_metrics: ForensicMetrics,
    pub perception_metrics: PerceptionMetrics,
    pub suspicious_regions: Vec<SuspiciousRegion>,
    pub watermark: WatermarkReport,
    pub media: MediaAnalysis,
    pub created_at: DateTime<Utc>,
}

/// バッチ解析の1ファイル分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnalysisResult {
    pub file_name: String,
    pub thumbnail: String,
    pub result: AnalysisResult,
}

/// 履歴台帳のエントリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub thumbnail: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl HistoryItem {
    pub fn new(result: AnalysisResult, thumbnail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            thumbnail: thumbnail.into(),
            result,
        }
    }
}
