//! ネイティブブリッジ
//!
//! 組み込み先のホストは既知の名前のコールバックに解析結果を渡してくる。
//! `NativeBridge` はその場所に自分のハンドラを差し込み、元のハンドラを
//! 先に呼んだうえで結果を正規化し、コントローラ宛てのチャネルに送る。
//! 取り外すと元のハンドラをそのまま戻す。

pub mod normalize;

pub use normalize::{classify_text, normalize_input, normalize_text};

use crate::analyzer::AnalysisResult;
use crate::error::{DeepScanError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;

/// ホストが結果を渡すコールバック名
pub const NATIVE_CALLBACK_NAME: &str = "onNativeAnalysisResult";

/// ホストから渡される値
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeInput {
    Text(String),
    Structured(Value),
}

impl BridgeInput {
    /// 1行分の入力を解釈する
    ///
    /// JSON文字列はその中身をテキストとして、それ以外のJSONは構造化値として扱う。
    /// JSONでなければ行全体をテキストとする。
    pub fn from_host_line(line: &str) -> Self {
        match serde_json::from_str::<Value>(line.trim()) {
            Ok(Value::String(text)) => BridgeInput::Text(text),
            Ok(value) => BridgeInput::Structured(value),
            Err(_) => BridgeInput::Text(line.to_string()),
        }
    }
}

impl From<String> for BridgeInput {
    fn from(text: String) -> Self {
        BridgeInput::Text(text)
    }
}

impl From<&str> for BridgeInput {
    fn from(text: &str) -> Self {
        BridgeInput::Text(text.to_string())
    }
}

impl From<Value> for BridgeInput {
    fn from(value: Value) -> Self {
        BridgeInput::Structured(value)
    }
}

pub type BridgeHandler = Arc<dyn Fn(&BridgeInput) -> Result<()> + Send + Sync>;

/// ホスト側のコールバック登録先
#[derive(Default)]
pub struct CallbackRegistry {
    slots: Mutex<HashMap<String, BridgeHandler>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<BridgeHandler> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(name).cloned()
    }

    /// ハンドラを差し替え、以前のハンドラを返す（None で削除）
    pub fn replace(&self, name: &str, handler: Option<BridgeHandler>) -> Option<BridgeHandler> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match handler {
            Some(handler) => slots.insert(name.to_string(), handler),
            None => slots.remove(name),
        }
    }

    /// 登録されたハンドラを呼ぶ。未登録なら Ok(false)
    pub fn invoke(&self, name: &str, input: &BridgeInput) -> Result<bool> {
        // ロックを持ったまま呼ぶとハンドラ内からの登録変更でデッドロックする
        let handler = self.get(name);
        match handler {
            Some(handler) => handler(input).map(|_| true),
            None => Ok(false),
        }
    }
}

/// 差し込んだハンドラの管理
pub struct NativeBridge {
    registry: Arc<CallbackRegistry>,
    name: String,
    legacy: Option<BridgeHandler>,
    active: bool,
}

impl NativeBridge {
    pub fn install(registry: Arc<CallbackRegistry>, sink: UnboundedSender<AnalysisResult>) -> Self {
        Self::install_at(registry, NATIVE_CALLBACK_NAME, sink)
    }

    pub fn install_at(
        registry: Arc<CallbackRegistry>,
        name: &str,
        sink: UnboundedSender<AnalysisResult>,
    ) -> Self {
        let legacy = registry.get(name);
        let handler = bridge_handler(legacy.clone(), sink);
        registry.replace(name, Some(handler));

        log::debug!(
            "ブリッジを設置: {} (既存ハンドラ: {})",
            name,
            if legacy.is_some() { "あり" } else { "なし" }
        );

        Self {
            registry,
            name: name.to_string(),
            legacy,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn legacy(&self) -> Option<&BridgeHandler> {
        self.legacy.as_ref()
    }

    /// 元のハンドラを戻す（元が無ければ登録を消す）
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.registry.replace(&self.name, self.legacy.clone());
        self.active = false;
        log::debug!("ブリッジを撤去: {}", self.name);
    }
}

impl Drop for NativeBridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn bridge_handler(legacy: Option<BridgeHandler>, sink: UnboundedSender<AnalysisResult>) -> BridgeHandler {
    Arc::new(move |input: &BridgeInput| {
        if let Some(legacy) = &legacy {
            call_legacy(legacy, input);
        }

        let result = normalize_input(input);
        log::info!(
            "ブリッジ結果を受信: {} ({:.0})",
            result.verdict,
            result.confidence_score
        );

        sink.send(result)
            .map_err(|_| DeepScanError::BridgeHandler("結果の送信先が閉じています".into()))
    })
}

/// 元のハンドラの失敗（エラー/パニック）はログに残すだけにする
fn call_legacy(legacy: &BridgeHandler, input: &BridgeInput) {
    match panic::catch_unwind(AssertUnwindSafe(|| legacy(input))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("既存ハンドラがエラーを返しました: {}", e),
        Err(_) => log::warn!("既存ハンドラがパニックしました"),
    }
}
