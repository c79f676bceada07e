//! 履歴台帳
//!
//! 完了したすべての解析（単発・バッチ・ブリッジ）を追記のみで記録する。
//! 保存順は古い順、表示は `newest_first` で新しい順。

use deepscan_common::{AnalysisResult, HistoryItem};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct HistoryLedger {
    items: Vec<HistoryItem>,
}

/// ダッシュボード用の集計
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    pub synthetic: usize,
    pub authentic: usize,
    pub average_score: f64,
    /// 最も多く推定されたモデル名と件数
    pub top_model: Option<(String, usize)>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 結果を追記（削除手段はない）
    pub fn record(&mut self, result: &AnalysisResult, thumbnail: &str) -> &HistoryItem {
        self.items.push(HistoryItem::new(result.clone(), thumbnail));
        &self.items[self.items.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn latest(&self) -> Option<&HistoryItem> {
        self.items.last()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter().rev()
    }

    pub fn stats(&self) -> DashboardStats {
        let total = self.items.len();
        let synthetic = self.items.iter().filter(|i| i.result.is_ai_generated).count();
        let average_score = if total == 0 {
            0.0
        } else {
            self.items.iter().map(|i| i.result.confidence_score).sum::<f64>() / total as f64
        };

        let mut models: HashMap<&str, usize> = HashMap::new();
        for item in &self.items {
            let name = item.result.model_signature.name.trim();
            if item.result.is_ai_generated && !name.is_empty() && !name.eq_ignore_ascii_case("unknown") {
                *models.entry(name).or_default() += 1;
            }
        }
        let top_model = models
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, count)| (name.to_string(), count));

        DashboardStats {
            total,
            synthetic,
            authentic: total - synthetic,
            average_score,
            top_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deepscan_common::VerdictPayload;

    fn result(is_ai: bool, score: f64, model: &str) -> AnalysisResult {
        let verdict = if is_ai { "AI Generated" } else { "Likely Authentic" };
        let json = serde_json::json!({
            "isAiGenerated": is_ai,
            "confidenceScore": score,
            "verdict": verdict,
            "reasoning": "",
            "technicalDetails": [],
            "modelSignature": {"name": model, "confidence": 50},
            "forensicMetrics": {"noiseConsistency": 50, "compressionArtifacts": 50, "frequencyAnomalies": 50, "lightingPhysics": 50},
            "perceptionMetrics": {"anatomicalAccuracy": 50, "textureRealism": 50, "backgroundCoherence": 50, "semanticLogic": 50},
            "suspiciousRegions": [],
            "watermark": {"detected": false, "signatures": []}
        });
        serde_json::from_value::<VerdictPayload>(json)
            .unwrap()
            .into_result(Utc::now())
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&result(true, 90.0, "DALL-E 3"), "a.jpg");
        ledger.record(&result(false, 10.0, "Unknown"), "b.jpg");

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.items()[0].thumbnail, "a.jpg");
        assert_eq!(ledger.latest().unwrap().thumbnail, "b.jpg");

        let newest: Vec<&str> = ledger.newest_first().map(|i| i.thumbnail.as_str()).collect();
        assert_eq!(newest, vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_stats_empty() {
        let stats = HistoryLedger::new().stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, 0.0);
        assert!(stats.top_model.is_none());
    }

    #[test]
    fn test_stats() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&result(true, 90.0, "Midjourney"), "1");
        ledger.record(&result(true, 80.0, "Midjourney"), "2");
        ledger.record(&result(true, 70.0, "DALL-E 3"), "3");
        ledger.record(&result(false, 0.0, "Unknown"), "4");

        let stats = ledger.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.synthetic, 3);
        assert_eq!(stats.authentic, 1);
        assert_eq!(stats.average_score, 60.0);
        assert_eq!(stats.top_model, Some(("Midjourney".to_string(), 2)));
    }
}
