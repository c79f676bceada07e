//! APIレスポンスパーサー
//!
//! 解析サービスの応答テキストからJSONを抽出し、
//! 判定結果（VerdictPayload）として厳密にパースする

use crate::error::{Error, Result};
use crate::types::VerdictPayload;

/// レスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use deepscan_common::extract_json;
///
/// let response = "result: {\"verdict\": \"AI Generated\"}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"verdict\": \"AI Generated\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // 生の {...} を探す
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 判定レスポンスをパース
///
/// 必須フィールドが欠けている場合はエラー。補完はしない。
///
/// # Arguments
/// * `response` - 解析サービスの応答テキスト
pub fn parse_verdict_response(response: &str) -> Result<VerdictPayload> {
    if response.trim().is_empty() {
        return Err(Error::Parse("レスポンスが空です".into()));
    }

    let json_str = extract_json(response)?;
    serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("判定JSONパースエラー: {}", e)))
}
