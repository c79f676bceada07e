//! 画面/ステータスの状態遷移
//!
//! 遷移はすべて `next_view` / `next_status` の表で決まる。
//! 表にない組み合わせは無視される（状態は変わらない）。

use std::fmt;

/// 表示中の画面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Home,
    Scanning,
    Result,
    BatchProcessing,
    BatchResult,
    Dashboard,
    Settings,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Home => "home",
            ViewState::Scanning => "scanning",
            ViewState::Result => "result",
            ViewState::BatchProcessing => "batch-processing",
            ViewState::BatchResult => "batch-result",
            ViewState::Dashboard => "dashboard",
            ViewState::Settings => "settings",
        }
    }

    /// スキャン処理中か
    pub fn is_busy(&self) -> bool {
        matches!(self, ViewState::Scanning | ViewState::BatchProcessing)
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 現在の解析処理のライフサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Complete,
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Idle => "idle",
            AnalysisStatus::Uploading => "uploading",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Complete => "complete",
            AnalysisStatus::Error => "error",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 画面遷移イベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    ScanStarted,
    ScanCompleted,
    ScanFailed,
    BatchStarted,
    BatchCompleted,
    ExternalResult,
    GoHome,
    OpenDashboard,
    OpenSettings,
    Reset,
}

/// ステータス遷移イベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Begin,
    PayloadReady,
    Succeeded,
    Failed,
    ExternalDelivered,
    Reset,
}

pub fn next_view(current: ViewState, event: ViewEvent) -> Option<ViewState> {
    use ViewEvent::*;
    use ViewState::*;

    match (current, event) {
        (Home, ScanStarted) => Some(Scanning),
        (Scanning, ScanCompleted) => Some(Result),
        (Scanning, ScanFailed) => Some(Home),
        (Home, BatchStarted) => Some(BatchProcessing),
        (BatchProcessing, BatchCompleted) => Some(BatchResult),
        (_, ExternalResult) => Some(Result),
        (_, GoHome) | (_, Reset) => Some(Home),
        (_, OpenDashboard) => Some(Dashboard),
        (_, OpenSettings) => Some(Settings),
        _ => None,
    }
}

pub fn next_status(current: AnalysisStatus, event: StatusEvent) -> Option<AnalysisStatus> {
    use AnalysisStatus::*;
    use StatusEvent::*;

    match (current, event) {
        (Idle | Complete | Error, Begin) => Some(Uploading),
        (Uploading, PayloadReady) => Some(Analyzing),
        (Uploading | Analyzing, Succeeded) => Some(Complete),
        (Uploading | Analyzing, Failed) => Some(Error),
        (_, ExternalDelivered) => Some(Complete),
        (_, StatusEvent::Reset) => Some(Idle),
        _ => None,
    }
}

/// スキャン中に順番に表示するメッセージ
pub const STATUS_MESSAGES: &[&str] = &[
    "Uploading media to the forensic engine...",
    "Extracting sensor noise residuals...",
    "Inspecting compression history...",
    "Checking lighting and shadow physics...",
    "Searching for provenance watermarks...",
    "Comparing against known generator signatures...",
    "Compiling forensic verdict...",
];

/// 表示メッセージのカーソル（末尾で先頭に戻る）
#[derive(Debug, Clone, Default)]
pub struct StatusTicker {
    cursor: usize,
}

impl StatusTicker {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &'static str {
        STATUS_MESSAGES[self.cursor]
    }

    pub fn advance(&mut self) -> &'static str {
        self.cursor = (self.cursor + 1) % STATUS_MESSAGES.len();
        self.current()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// 画面とステータスの状態機械
#[derive(Debug, Clone, Default)]
pub struct ViewMachine {
    view: ViewState,
    status: AnalysisStatus,
    ticker: StatusTicker,
}

impl ViewMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn ticker(&self) -> &StatusTicker {
        &self.ticker
    }

    /// 画面遷移を適用し、遷移した場合は (遷移前, 遷移後) を返す
    pub fn apply(&mut self, event: ViewEvent) -> Option<(ViewState, ViewState)> {
        let next = next_view(self.view, event)?;
        let prev = self.view;
        self.view = next;

        if prev == ViewState::Scanning && next != ViewState::Scanning {
            self.ticker.reset();
        }

        Some((prev, next))
    }

    /// ステータス遷移を適用し、変化した場合は新しいステータスを返す
    pub fn apply_status(&mut self, event: StatusEvent) -> Option<AnalysisStatus> {
        let next = next_status(self.status, event)?;
        if next == self.status {
            return None;
        }
        self.status = next;
        Some(next)
    }

    /// Scanning中のみカーソルを進める
    pub fn tick(&mut self) -> Option<&'static str> {
        if self.view == ViewState::Scanning {
            Some(self.ticker.advance())
        } else {
            None
        }
    }
}
