mod gemini;

pub use deepscan_common::AnalysisResult;
pub use gemini::{finalize_response, GeminiClient};

use crate::config::Config;
use crate::error::{DeepScanError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// 解析サービス呼び出しの境界
///
/// 失敗は自動でリトライせず、そのまま呼び出し元に返す。
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    async fn analyze(&self, payload: &str, mime_type: &str) -> Result<AnalysisResult>;
}

/// APIキー未設定時の解析器（常に MissingApiKey を返す）
pub struct UnconfiguredAnalyzer;

#[async_trait]
impl MediaAnalyzer for UnconfiguredAnalyzer {
    async fn analyze(&self, _payload: &str, _mime_type: &str) -> Result<AnalysisResult> {
        Err(DeepScanError::MissingApiKey)
    }
}

/// 設定から解析器を構築（APIキーがなければ UnconfiguredAnalyzer）
pub fn analyzer_from_config(config: &Config) -> Result<Arc<dyn MediaAnalyzer>> {
    match GeminiClient::from_config(config) {
        Ok(client) => Ok(Arc::new(client)),
        Err(DeepScanError::MissingApiKey) => {
            log::warn!("APIキーが未設定のため解析は実行できません");
            Ok(Arc::new(UnconfiguredAnalyzer))
        }
        Err(e) => Err(e),
    }
}
