use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeepScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`deepscan config --set-api-key YOUR_KEY` で設定するか GEMINI_API_KEY を指定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("解析対象のメディアが見つかりません: {0}")]
    NoMediaFound(String),

    #[error("前処理エラー: {0}")]
    Preprocess(String),

    #[error("解析リクエストエラー: {0}")]
    AnalysisRequest(String),

    #[error("解析サービスから空のレスポンスが返されました")]
    EmptyResponse,

    #[error("APIレスポンスのパースに失敗: {0}")]
    ResponseParse(String),

    #[error("解析リクエストがタイムアウトしました ({0}秒)")]
    Timeout(u64),

    #[error("ブリッジ入力の正規化に失敗: {0}")]
    BridgeNormalization(String),

    #[error("ブリッジハンドラエラー: {0}")]
    BridgeHandler(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] deepscan_common::Error),
}

impl DeepScanError {
    /// 解析リクエスト系の失敗か
    pub fn is_analysis_failure(&self) -> bool {
        matches!(
            self,
            DeepScanError::AnalysisRequest(_)
                | DeepScanError::EmptyResponse
                | DeepScanError::ResponseParse(_)
                | DeepScanError::Timeout(_)
                | DeepScanError::MissingApiKey
        )
    }

    /// 単発スキャン失敗時にユーザーへ表示する対処方法
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            DeepScanError::MissingApiKey => "APIキーを設定してから再度お試しください",
            DeepScanError::Timeout(_) => {
                "ネットワーク接続を確認するか、より小さいファイルで再度お試しください"
            }
            DeepScanError::Io(_) | DeepScanError::FileNotFound(_) => {
                "ファイルが読み取れるか確認してください"
            }
            _ => "別のファイルで試すか、しばらくしてから再度お試しください",
        }
    }
}

pub type Result<T> = std::result::Result<T, DeepScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_failure_classification() {
        assert!(DeepScanError::EmptyResponse.is_analysis_failure());
        assert!(DeepScanError::Timeout(30).is_analysis_failure());
        assert!(!DeepScanError::Preprocess("decode".into()).is_analysis_failure());
    }

    #[test]
    fn test_remediation_hint_timeout() {
        let hint = DeepScanError::Timeout(120).remediation_hint();
        assert!(hint.contains("ネットワーク"));
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            DeepScanError::Timeout(120).to_string(),
            "解析リクエストがタイムアウトしました (120秒)"
        );
    }
}
