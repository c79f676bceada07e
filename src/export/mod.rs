//! 解析結果のJSON出力

use crate::error::Result;
use deepscan_common::{AnalysisResult, BatchAnalysisResult, HistoryItem};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_RESULT_NAME: &str = "deepscan-result";
pub const DEFAULT_BATCH_NAME: &str = "deepscan-batch";
pub const DEFAULT_HISTORY_NAME: &str = "deepscan-history";

/// 出力先がディレクトリ（または拡張子なし）なら `{title}.json` を付ける
pub fn output_path_for(output: &Path, title: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.json", title))
    } else {
        output.to_path_buf()
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T, output: &Path, title: &str) -> Result<PathBuf> {
    let path = output_path_for(output, title);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, json)?;
    log::debug!("JSON出力: {}", path.display());
    Ok(path)
}

/// 単発の結果をそのまま出力
pub fn write_result_json(result: &AnalysisResult, output: &Path) -> Result<PathBuf> {
    write_json(result, output, DEFAULT_RESULT_NAME)
}

/// バッチ結果を処理順のまま出力
pub fn write_batch_json(results: &[BatchAnalysisResult], output: &Path) -> Result<PathBuf> {
    write_json(results, output, DEFAULT_BATCH_NAME)
}

/// 履歴を新しい順で出力
pub fn write_history_json<'a>(
    items: impl Iterator<Item = &'a HistoryItem>,
    output: &Path,
) -> Result<PathBuf> {
    let items: Vec<&HistoryItem> = items.collect();
    write_json(&items, output, DEFAULT_HISTORY_NAME)
}

pub fn read_result_json(path: &Path) -> Result<AnalysisResult> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn read_batch_json(path: &Path) -> Result<Vec<BatchAnalysisResult>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_path_for_directory() {
        let dir = tempdir().unwrap();
        assert_eq!(
            output_path_for(dir.path(), "scan"),
            dir.path().join("scan.json")
        );
    }

    #[test]
    fn test_output_path_for_file() {
        let path = Path::new("out/result.json");
        assert_eq!(output_path_for(path, "scan"), PathBuf::from("out/result.json"));
    }

    #[test]
    fn test_output_path_without_extension() {
        let path = Path::new("reports");
        assert_eq!(output_path_for(path, "scan"), PathBuf::from("reports/scan.json"));
    }
}
