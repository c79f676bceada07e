//! 1ファイル分のスキャン（前処理 → 解析）

use crate::analyzer::{AnalysisResult, MediaAnalyzer};
use crate::error::Result;
use crate::preprocess::{self, PreparedMedia, PreprocessOptions};
use crate::scanner::MediaFile;

/// ブリッジ経由の結果に割り当てるプレビュー参照
pub const BRIDGE_PREVIEW_REF: &str = "native://bridge";
const BRIDGE_PLACEHOLDER_MIME: &str = "image/jpeg";

/// 解析中の入力
///
/// ブリッジ経由の結果ではローカルファイルが存在しないため `file` は None。
#[derive(Debug, Clone)]
pub struct FileData {
    pub file: Option<MediaFile>,
    pub preview: String,
    pub mime_type: String,
    pub payload: String,
}

impl FileData {
    pub fn from_prepared(file: MediaFile, prepared: PreparedMedia) -> Self {
        Self {
            preview: file.preview_ref(),
            mime_type: prepared.mime_type,
            payload: prepared.payload,
            file: Some(file),
        }
    }

    /// ブリッジ注入時のプレースホルダ
    pub fn placeholder() -> Self {
        Self {
            file: None,
            preview: BRIDGE_PREVIEW_REF.to_string(),
            mime_type: BRIDGE_PLACEHOLDER_MIME.to_string(),
            payload: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.file.is_none()
    }

    pub fn file_name(&self) -> &str {
        self.file
            .as_ref()
            .map(|f| f.file_name.as_str())
            .unwrap_or(BRIDGE_PREVIEW_REF)
    }
}

/// 前処理してFileDataを作成
pub async fn prepare_file(file: &MediaFile, options: PreprocessOptions) -> Result<FileData> {
    let prepared = preprocess::prepare(file, options).await?;

    if let Some((w, h)) = prepared.dimensions {
        log::debug!("{}: {}x{} {} に正規化", file.file_name, w, h, prepared.mime_type);
    }

    Ok(FileData::from_prepared(file.clone(), prepared))
}

/// 前処理済みの入力を解析
pub async fn analyze_file(analyzer: &dyn MediaAnalyzer, data: &FileData) -> Result<AnalysisResult> {
    analyzer.analyze(&data.payload, &data.mime_type).await
}

/// 前処理と解析をまとめて実行
pub async fn scan_file(
    analyzer: &dyn MediaAnalyzer,
    file: &MediaFile,
    options: PreprocessOptions,
) -> Result<(FileData, AnalysisResult)> {
    let data = prepare_file(file, options).await?;
    let result = analyze_file(analyzer, &data).await?;
    Ok((data, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let data = FileData::placeholder();
        assert!(data.is_placeholder());
        assert_eq!(data.preview, BRIDGE_PREVIEW_REF);
        assert_eq!(data.mime_type, "image/jpeg");
        assert!(data.payload.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_file_video_passthrough() {
        let file = MediaFile::from_bytes("clip.mp4", "video/mp4", b"frames".to_vec());
        let data = prepare_file(&file, PreprocessOptions::default()).await.unwrap();
        assert_eq!(data.mime_type, "video/mp4");
        assert_eq!(data.payload, "ZnJhbWVz");
        assert_eq!(data.preview, "memory://clip.mp4");
        assert_eq!(data.file_name(), "clip.mp4");
    }
}
