//! ターミナル表示

use crate::batch::{BatchProgress, ItemOutcome};
use crate::config::Config;
use crate::controller::{AnalysisStatus, AppController, ControllerObserver, ViewState};
use crate::history::{DashboardStats, HistoryLedger};
use deepscan_common::{AnalysisResult, BatchAnalysisResult};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_WIDTH: usize = 20;

/// 0-100のスコアを棒グラフにする
pub fn score_bar(score: f64) -> String {
    let filled = ((score.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn format_result(result: &AnalysisResult) -> String {
    let mut lines = Vec::new();

    let mark = if result.is_ai_generated { "⚠" } else { "✔" };
    lines.push(format!(
        "{} {} (スコア {:.0}/100)",
        mark, result.verdict, result.confidence_score
    ));
    lines.push(format!("  {}", score_bar(result.confidence_score)));

    if !result.reasoning.is_empty() {
        lines.push(format!("  根拠: {}", result.reasoning));
    }

    lines.push(format!(
        "  推定モデル: {} ({:.0}%)",
        result.model_signature.name, result.model_signature.confidence
    ));

    let f = &result.forensic_metrics;
    lines.push("  フォレンジック指標:".to_string());
    lines.push(format!("    ノイズ一貫性     {:>5.1}", f.noise_consistency));
    lines.push(format!("    圧縮アーティファクト {:>5.1}", f.compression_artifacts));
    lines.push(format!("    周波数異常       {:>5.1}", f.frequency_anomalies));
    lines.push(format!("    照明の物理整合   {:>5.1}", f.lighting_physics));

    let p = &result.perception_metrics;
    lines.push("  知覚指標:".to_string());
    lines.push(format!("    解剖学的正確さ   {:>5.1}", p.anatomical_accuracy));
    lines.push(format!("    質感のリアルさ   {:>5.1}", p.texture_realism));
    lines.push(format!("    背景の一貫性     {:>5.1}", p.background_coherence));
    lines.push(format!("    意味的整合       {:>5.1}", p.semantic_logic));

    for detail in &result.technical_details {
        lines.push(format!("  - {}", detail));
    }

    for region in &result.suspicious_regions {
        let b = &region.bounds;
        lines.push(format!(
            "  領域: {} ({:.0}%) x={:.0} y={:.0} w={:.0} h={:.0}",
            region.label, region.confidence, b.x, b.y, b.width, b.height
        ));
    }

    if result.watermark.detected {
        for sig in &result.watermark.signatures {
            lines.push(format!(
                "  透かし: {} / {} ({:.0}%)",
                sig.provider, sig.kind, sig.confidence
            ));
        }
        if result.watermark.signatures.is_empty() {
            lines.push("  透かし: 検出".to_string());
        }
    }

    if let Some(video) = result.media.video() {
        lines.push(format!("  時間的一貫性: {:.1}", video.temporal_consistency));
        for anomaly in &video.frame_anomalies {
            lines.push(format!("    {:>6.1}s {}", anomaly.timestamp, anomaly.description));
        }
    }

    lines.push(format!(
        "  解析日時: {}",
        result.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    lines.join("\n")
}

pub fn print_result(label: &str, result: &AnalysisResult) {
    println!("📄 {}", label);
    println!("{}\n", format_result(result));
}

pub fn format_batch_summary(results: &[BatchAnalysisResult], total: usize) -> String {
    let mut lines = vec![format!("バッチ結果: {}/{}件 成功", results.len(), total)];
    for item in results {
        let mark = if item.result.is_ai_generated { "⚠" } else { "✔" };
        lines.push(format!(
            "  {} {:<32} {:>3.0} {}",
            mark, item.file_name, item.result.confidence_score, item.result.verdict
        ));
    }
    if results.len() < total {
        lines.push(format!("  ({}件はスキップされました)", total - results.len()));
    }
    lines.join("\n")
}

pub fn format_dashboard(stats: &DashboardStats) -> String {
    let mut lines = vec![
        "ダッシュボード".to_string(),
        format!("  総スキャン数: {}", stats.total),
        format!("  生成AI判定:   {}", stats.synthetic),
        format!("  本物判定:     {}", stats.authentic),
        format!("  平均スコア:   {:.1}", stats.average_score),
    ];
    match &stats.top_model {
        Some((name, count)) => lines.push(format!("  最多推定モデル: {} ({}件)", name, count)),
        None => lines.push("  最多推定モデル: -".to_string()),
    }
    lines.join("\n")
}

/// 履歴を新しい順に一覧表示
pub fn print_history(history: &HistoryLedger, limit: usize) {
    if history.is_empty() {
        println!("  履歴はありません");
        return;
    }
    for item in history.newest_first().take(limit) {
        println!(
            "  {} {:>3.0} {:<18} {}",
            item.result.created_at.format("%H:%M:%S"),
            item.result.confidence_score,
            item.result.verdict,
            item.thumbnail
        );
    }
}

pub fn print_settings(config: &Config) {
    println!("設定:");
    println!("  モデル: {}", config.model);
    println!("  APIエンドポイント: {}", config.api_base_url);
    println!("  最大画像サイズ: {}px", config.max_image_dimension);
    println!("  JPEG品質: {}", config.jpeg_quality);
    println!("  タイムアウト: {}秒", config.timeout_seconds);
    println!("  ステータス表示間隔: {}ms", config.status_interval_ms);
    println!(
        "  APIキー: {}",
        if config.get_api_key().is_ok() { "設定済み" } else { "未設定" }
    );
}

/// コントローラの現在の画面に応じた内容を表示
pub fn print_view(controller: &AppController) {
    match controller.view() {
        ViewState::Result => {
            let label = controller
                .current_file()
                .map(|f| f.file_name().to_string())
                .unwrap_or_default();
            if let Some(result) = controller.current_result() {
                print_result(&label, result);
            }
        }
        ViewState::BatchResult => {
            let summary = format_batch_summary(controller.batch_results(), controller.batch_completed());
            println!("{}\n", summary);
        }
        ViewState::Dashboard => {
            println!("{}", format_dashboard(&controller.dashboard_stats()));
            print_history(controller.history(), 10);
            println!();
        }
        ViewState::Home => {
            if let Some(alert) = controller.last_alert() {
                println!("✖ {}\n", alert);
            }
        }
        ViewState::Scanning | ViewState::BatchProcessing | ViewState::Settings => {}
    }
}

/// CLI用の通知先（スキャン中メッセージとバッチ進捗）
#[derive(Default)]
pub struct CliObserver {
    bar: Option<ProgressBar>,
}

impl CliObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ControllerObserver for CliObserver {
    fn view_changed(&mut self, from: ViewState, to: ViewState) {
        log::debug!("view: {} -> {}", from, to);
    }

    fn status_changed(&mut self, status: AnalysisStatus) {
        log::debug!("status: {}", status);
    }

    fn status_text(&mut self, text: &str) {
        println!("  … {}", text);
    }

    fn batch_started(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        self.bar = Some(bar);
    }

    fn batch_progress(&mut self, progress: &BatchProgress) {
        let Some(bar) = &self.bar else {
            return;
        };

        if let ItemOutcome::Skipped(reason) = &progress.outcome {
            bar.println(format!("⚠ スキップ: {} ({})", progress.file_name, reason));
        }
        bar.set_position(progress.completed as u64);
        bar.set_message(progress.file_name.clone());

        if progress.remaining == 0 {
            bar.finish_and_clear();
            self.bar = None;
        }
    }

    fn alert(&mut self, message: &str) {
        eprintln!("✖ {}", message);
    }
}
