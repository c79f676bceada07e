//! アプリケーションコントローラ
//!
//! 画面状態・現在の入力・バッチキュー・履歴台帳を一か所で所有し、
//! 単発スキャン/バッチ/ブリッジ注入のすべてをここで反映する。

pub mod state;

pub use state::{
    next_status, next_view, AnalysisStatus, StatusEvent, StatusTicker, ViewEvent, ViewMachine,
    ViewState, STATUS_MESSAGES,
};

use crate::analyzer::{AnalysisResult, MediaAnalyzer};
use crate::batch::{BatchProgress, BatchRunner};
use crate::config::Config;
use crate::error::{DeepScanError, Result};
use crate::history::{DashboardStats, HistoryLedger};
use crate::pipeline::{self, FileData};
use crate::preprocess::PreprocessOptions;
use crate::scanner::MediaFile;
use deepscan_common::BatchAnalysisResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};

/// 状態変化の通知先（表示層）
pub trait ControllerObserver: Send {
    fn view_changed(&mut self, _from: ViewState, _to: ViewState) {}
    fn status_changed(&mut self, _status: AnalysisStatus) {}
    fn status_text(&mut self, _text: &str) {}
    fn batch_started(&mut self, _total: usize) {}
    fn batch_progress(&mut self, _progress: &BatchProgress) {}
    fn alert(&mut self, _message: &str) {}
}

pub struct NoopObserver;

impl ControllerObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub preprocess: PreprocessOptions,
    /// スキャン中メッセージの切り替え間隔
    pub status_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            preprocess: PreprocessOptions::default(),
            status_interval: Duration::from_millis(1500),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            preprocess: PreprocessOptions::from_config(config),
            status_interval: Duration::from_millis(config.status_interval_ms.max(1)),
        }
    }
}

/// ファイル選択の振り分け結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRoute {
    Ignored,
    Single,
    Batch(usize),
}

/// 直接遷移できる画面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Home,
    Dashboard,
    Settings,
}

impl Destination {
    fn event(self) -> ViewEvent {
        match self {
            Destination::Home => ViewEvent::GoHome,
            Destination::Dashboard => ViewEvent::OpenDashboard,
            Destination::Settings => ViewEvent::OpenSettings,
        }
    }
}

pub struct AppController {
    analyzer: Arc<dyn MediaAnalyzer>,
    settings: ControllerSettings,
    machine: ViewMachine,
    current_file: Option<FileData>,
    current_result: Option<AnalysisResult>,
    batch: BatchRunner,
    history: HistoryLedger,
    bridge_tx: Option<mpsc::UnboundedSender<AnalysisResult>>,
    bridge_rx: Option<mpsc::UnboundedReceiver<AnalysisResult>>,
    observer: Box<dyn ControllerObserver>,
    last_alert: Option<String>,
}

impl AppController {
    pub fn new(analyzer: Arc<dyn MediaAnalyzer>, settings: ControllerSettings) -> Self {
        Self {
            analyzer,
            settings,
            machine: ViewMachine::new(),
            current_file: None,
            current_result: None,
            batch: BatchRunner::new(),
            history: HistoryLedger::new(),
            bridge_tx: None,
            bridge_rx: None,
            observer: Box::new(NoopObserver),
            last_alert: None,
        }
    }

    pub fn with_observer(mut self, observer: impl ControllerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn view(&self) -> ViewState {
        self.machine.view()
    }

    pub fn status(&self) -> AnalysisStatus {
        self.machine.status()
    }

    pub fn status_cursor(&self) -> usize {
        self.machine.ticker().cursor()
    }

    pub fn current_file(&self) -> Option<&FileData> {
        self.current_file.as_ref()
    }

    pub fn current_result(&self) -> Option<&AnalysisResult> {
        self.current_result.as_ref()
    }

    pub fn batch_results(&self) -> &[BatchAnalysisResult] {
        self.batch.results()
    }

    pub fn pending_batch(&self) -> usize {
        self.batch.pending()
    }

    /// 直近のバッチで処理済み（成功・スキップ両方）の件数
    pub fn batch_completed(&self) -> usize {
        self.batch.completed()
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        self.history.stats()
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// 直近の単発スキャン失敗時に表示したメッセージ
    pub fn last_alert(&self) -> Option<&str> {
        self.last_alert.as_deref()
    }

    /// 選択されたファイルを件数に応じて振り分けて実行
    ///
    /// 0件は何もしない。スキャン中の選択は無視する。
    pub async fn select_files(&mut self, files: Vec<MediaFile>) -> ScanRoute {
        if files.is_empty() {
            log::debug!("ファイルが選択されていないため無視");
            return ScanRoute::Ignored;
        }

        if self.view().is_busy() {
            log::warn!("スキャン中のため選択を無視: {}件", files.len());
            return ScanRoute::Ignored;
        }

        if self.view() != ViewState::Home {
            self.transition(ViewEvent::GoHome);
        }

        if files.len() == 1 {
            let mut files = files;
            if let Some(file) = files.pop() {
                // 失敗はアラートとステータスに反映済み
                let _ = self.scan_single(file).await;
            }
            ScanRoute::Single
        } else {
            let count = files.len();
            self.run_batch(files).await;
            ScanRoute::Batch(count)
        }
    }

    /// 1ファイルをスキャン
    ///
    /// 失敗時はステータス Error、画面 Home に戻し、対処方法付きのアラートを出す。
    pub async fn scan_single(&mut self, file: MediaFile) -> Result<()> {
        self.current_file = None;
        self.current_result = None;
        self.last_alert = None;

        self.transition(ViewEvent::ScanStarted);
        self.set_status(StatusEvent::Begin);
        let first = self.machine.ticker().current();
        self.observer.status_text(first);

        match self.scan_current(&file).await {
            Ok(result) => {
                let thumbnail = self
                    .current_file
                    .as_ref()
                    .map(|f| f.preview.clone())
                    .unwrap_or_else(|| file.preview_ref());
                self.history.record(&result, &thumbnail);
                self.current_result = Some(result);
                self.set_status(StatusEvent::Succeeded);
                self.transition(ViewEvent::ScanCompleted);
                log::info!("解析完了: {}", file.file_name);
                Ok(())
            }
            Err(e) => {
                log::error!("解析失敗: {}: {}", file.file_name, e);
                self.current_file = None;
                self.set_status(StatusEvent::Failed);
                self.transition(ViewEvent::ScanFailed);

                let message = alert_message(&e);
                self.observer.alert(&message);
                self.last_alert = Some(message);
                Err(e)
            }
        }
    }

    async fn scan_current(&mut self, file: &MediaFile) -> Result<AnalysisResult> {
        let options = self.settings.preprocess;
        let data = self.while_scanning(pipeline::prepare_file(file, options)).await?;
        self.current_file = Some(data.clone());
        self.set_status(StatusEvent::PayloadReady);

        let analyzer = Arc::clone(&self.analyzer);
        self.while_scanning(pipeline::analyze_file(analyzer.as_ref(), &data))
            .await
    }

    /// 処理の完了を待つ間、一定間隔でスキャン中メッセージを進める
    async fn while_scanning<F, T>(&mut self, work: F) -> T
    where
        F: Future<Output = T>,
    {
        tokio::pin!(work);
        let period = self.settings.status_interval.max(Duration::from_millis(1));
        let mut ticks = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                biased;
                out = &mut work => return out,
                _ = ticks.tick() => {
                    if let Some(text) = self.machine.tick() {
                        self.observer.status_text(text);
                    }
                }
            }
        }
    }

    /// 複数ファイルを順番に解析（失敗はスキップ）
    pub async fn run_batch(&mut self, files: Vec<MediaFile>) -> usize {
        self.current_file = None;
        self.current_result = None;
        self.last_alert = None;

        let total = files.len();
        self.batch.load(files);
        self.transition(ViewEvent::BatchStarted);
        self.set_status(StatusEvent::Begin);
        self.set_status(StatusEvent::PayloadReady);
        self.observer.batch_started(total);

        let analyzer = Arc::clone(&self.analyzer);
        let options = self.settings.preprocess;
        while let Some(progress) = self
            .batch
            .step(analyzer.as_ref(), options, &mut self.history)
            .await
        {
            self.observer.batch_progress(&progress);
        }

        let succeeded = self.batch.results().len();
        log::info!("バッチ解析完了: {}/{}件成功", succeeded, total);

        self.set_status(StatusEvent::Succeeded);
        self.transition(ViewEvent::BatchCompleted);
        succeeded
    }

    /// 外部から届いた結果を現在の結果として反映
    pub fn inject_external(&mut self, result: AnalysisResult) {
        let data = self.current_file.get_or_insert_with(FileData::placeholder);
        let thumbnail = data.preview.clone();

        self.history.record(&result, &thumbnail);
        self.current_result = Some(result);
        self.set_status(StatusEvent::ExternalDelivered);
        self.transition(ViewEvent::ExternalResult);
    }

    /// ブリッジから結果を受け取るための送信側
    pub fn bridge_sender(&mut self) -> mpsc::UnboundedSender<AnalysisResult> {
        if let Some(tx) = &self.bridge_tx {
            return tx.clone();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.bridge_tx = Some(tx.clone());
        self.bridge_rx = Some(rx);
        tx
    }

    /// 届いているブリッジ結果をすべて反映し、件数を返す
    pub fn pump_bridge(&mut self) -> usize {
        let mut received = Vec::new();
        if let Some(rx) = self.bridge_rx.as_mut() {
            while let Ok(result) = rx.try_recv() {
                received.push(result);
            }
        }

        let count = received.len();
        for result in received {
            self.inject_external(result);
        }
        count
    }

    pub fn navigate(&mut self, destination: Destination) {
        self.transition(destination.event());
    }

    /// 現在の入力・結果・バッチを破棄して Home/Idle に戻す（履歴は残す）
    pub fn reset(&mut self) {
        self.current_file = None;
        self.current_result = None;
        self.last_alert = None;
        self.batch.clear();
        self.set_status(StatusEvent::Reset);
        self.transition(ViewEvent::Reset);
    }

    fn transition(&mut self, event: ViewEvent) {
        match self.machine.apply(event) {
            Some((from, to)) => {
                if from != to {
                    log::debug!("画面遷移: {} -> {}", from, to);
                    self.observer.view_changed(from, to);
                }
            }
            None => log::debug!("無効な遷移を無視: {:?} ({})", event, self.machine.view()),
        }
    }

    fn set_status(&mut self, event: StatusEvent) {
        if let Some(status) = self.machine.apply_status(event) {
            self.observer.status_changed(status);
        }
    }
}

/// 単発スキャンでユーザーへ見せるエラーメッセージ
pub fn alert_message(error: &DeepScanError) -> String {
    let headline = if error.is_analysis_failure() {
        "解析できませんでした"
    } else {
        "ファイルを準備できませんでした"
    };
    format!("{}: {}\n{}", headline, error, error.remediation_hint())
}
