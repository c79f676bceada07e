//! 単発スキャン/バッチ/履歴の統合テスト
//!
//! 解析サービスは `MediaAnalyzer` のスクリプト実装で置き換える。

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use deepscan::analyzer::{finalize_response, AnalysisResult, MediaAnalyzer};
use deepscan::batch::BatchProgress;
use deepscan::controller::{
    AnalysisStatus, AppController, ControllerObserver, ControllerSettings, Destination, ScanRoute,
    ViewState, STATUS_MESSAGES,
};
use deepscan::error::{DeepScanError, Result};
use deepscan::scanner::{self, MediaFile};
use image::{GenericImageView, ImageBuffer, Rgb};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

const VERDICT: &str = r#"{
    "isAiGenerated": true,
    "confidenceScore": 88,
    "verdict": "AI Generated",
    "reasoning": "Inconsistent shadows.",
    "technicalDetails": ["Periodic upsampling pattern"],
    "modelSignature": {"name": "DALL-E 3", "confidence": 64},
    "forensicMetrics": {"noiseConsistency": 22, "compressionArtifacts": 35, "frequencyAnomalies": 81, "lightingPhysics": 30},
    "perceptionMetrics": {"anatomicalAccuracy": 40, "textureRealism": 33, "backgroundCoherence": 52, "semanticLogic": 47},
    "suspiciousRegions": [],
    "watermark": {"detected": false, "signatures": []}
}"#;

/// 呼び出し回数を数え、指定番目の呼び出しだけ失敗する解析器
struct ScriptedAnalyzer {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    delay: Option<Duration>,
    mime_types: Mutex<Vec<String>>,
    payloads: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    fn new(fail_on: Vec<usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
            delay: None,
            mime_types: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, payload: &str, mime_type: &str) -> Result<AnalysisResult> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.mime_types.lock().unwrap().push(mime_type.to_string());
        self.payloads.lock().unwrap().push(payload.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on.contains(&index) {
            return Err(DeepScanError::AnalysisRequest(format!("scripted failure #{}", index)));
        }
        finalize_response(Some(VERDICT))
    }
}

/// 通知を文字列で記録する
#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ControllerObserver for Recorder {
    fn view_changed(&mut self, from: ViewState, to: ViewState) {
        self.push(format!("view:{}->{}", from, to));
    }

    fn status_text(&mut self, text: &str) {
        self.push(format!("text:{}", text));
    }

    fn batch_progress(&mut self, progress: &BatchProgress) {
        self.push(format!("progress:{}/{}", progress.completed, progress.total()));
    }

    fn alert(&mut self, message: &str) {
        self.push(format!("alert:{}", message));
    }
}

fn controller_with(analyzer: Arc<ScriptedAnalyzer>) -> (AppController, Recorder) {
    let recorder = Recorder::default();
    let controller = AppController::new(analyzer, ControllerSettings::default())
        .with_observer(recorder.clone());
    (controller, recorder)
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> MediaFile {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
    });
    let path = dir.join(name);
    img.save(&path).expect("PNG保存失敗");
    MediaFile::from_path(&path).expect("MediaFile作成失敗")
}

fn video(name: &str) -> MediaFile {
    MediaFile::from_bytes(name, "video/mp4", name.as_bytes().to_vec())
}

/// 小さい画像 → 縮小なしのJPEG → 結果画面 → 履歴+1
#[tokio::test]
async fn test_single_scan_end_to_end() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = write_png(dir.path(), "small.png", 800, 600);

    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
    let (mut controller, recorder) = controller_with(Arc::clone(&analyzer));

    let route = controller.select_files(vec![file]).await;
    assert_eq!(route, ScanRoute::Single);
    assert_eq!(analyzer.calls(), 1);

    assert_eq!(controller.view(), ViewState::Result);
    assert_eq!(controller.status(), AnalysisStatus::Complete);
    assert_eq!(
        recorder.with_prefix("view:"),
        vec!["home->scanning", "scanning->result"]
    );

    let data = controller.current_file().expect("FileDataがない");
    assert_eq!(data.mime_type, "image/jpeg");
    assert!(!data.is_placeholder());
    assert_eq!(analyzer.mime_types.lock().unwrap().as_slice(), ["image/jpeg"]);

    let bytes = general_purpose::STANDARD.decode(&data.payload).unwrap();
    let decoded = image::load_from_memory(&bytes).expect("JPEGとして読めない");
    assert_eq!(decoded.dimensions(), (800, 600));

    let result = controller.current_result().expect("結果がない");
    assert_eq!(result.confidence_score, 88.0);

    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.history().items()[0].thumbnail, data.preview);
}

/// 大きい画像は長辺が1024に縮小されて送信される
#[tokio::test]
async fn test_single_scan_downscales_large_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = write_png(dir.path(), "large.png", 2048, 1000);

    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
    let (mut controller, _) = controller_with(Arc::clone(&analyzer));
    controller.select_files(vec![file]).await;

    let payload = analyzer.payloads.lock().unwrap()[0].clone();
    let bytes = general_purpose::STANDARD.decode(payload).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (1024, 500));
}

#[tokio::test]
async fn test_zero_files_no_transition() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
    let (mut controller, recorder) = controller_with(Arc::clone(&analyzer));

    assert_eq!(controller.select_files(Vec::new()).await, ScanRoute::Ignored);
    assert_eq!(controller.view(), ViewState::Home);
    assert_eq!(controller.status(), AnalysisStatus::Idle);
    assert_eq!(analyzer.calls(), 0);
    assert!(recorder.events().is_empty());
}

/// N件中k件失敗しても全件処理され、成功分だけが残る
#[tokio::test]
async fn test_batch_tolerates_failures() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![1, 3]));
    let (mut controller, recorder) = controller_with(Arc::clone(&analyzer));

    let files = vec![video("a.mp4"), video("b.mp4"), video("c.mp4"), video("d.mp4")];
    let route = controller.select_files(files).await;

    assert_eq!(route, ScanRoute::Batch(4));
    assert_eq!(analyzer.calls(), 4);
    assert_eq!(
        recorder.with_prefix("progress:"),
        vec!["1/4", "2/4", "3/4", "4/4"]
    );

    let names: Vec<&str> = controller
        .batch_results()
        .iter()
        .map(|r| r.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["a.mp4", "c.mp4"]);
    assert_eq!(controller.history().len(), 2);
    assert_eq!(controller.pending_batch(), 0);
    assert_eq!(controller.batch_completed(), 4);

    assert_eq!(controller.view(), ViewState::BatchResult);
    assert_eq!(controller.status(), AnalysisStatus::Complete);
    assert_eq!(
        recorder.with_prefix("view:"),
        vec!["home->batch-processing", "batch-processing->batch-result"]
    );
    assert!(recorder.with_prefix("alert:").is_empty());
}

/// 全件失敗してもバッチは完了する
#[tokio::test]
async fn test_batch_all_failed_still_completes() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![0, 1]));
    let (mut controller, _) = controller_with(Arc::clone(&analyzer));

    controller.select_files(vec![video("a.mp4"), video("b.mp4")]).await;
    assert!(controller.batch_results().is_empty());
    assert!(controller.history().is_empty());
    assert_eq!(controller.view(), ViewState::BatchResult);
    assert_eq!(controller.status(), AnalysisStatus::Complete);
}

#[tokio::test]
async fn test_single_failure_returns_home_with_alert() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![0]));
    let (mut controller, recorder) = controller_with(Arc::clone(&analyzer));

    controller.select_files(vec![video("clip.mp4")]).await;

    assert_eq!(controller.view(), ViewState::Home);
    assert_eq!(controller.status(), AnalysisStatus::Error);
    assert!(controller.current_result().is_none());
    assert!(controller.history().is_empty());

    let alerts = recorder.with_prefix("alert:");
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("scripted failure #0"));
    assert_eq!(controller.last_alert(), Some(alerts[0].as_str()));
    assert_eq!(analyzer.calls(), 1);
}

/// 単発+1、バッチ+N、ブリッジ+1 の合計になる
#[tokio::test]
async fn test_history_accumulates_across_sources() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
    let (mut controller, recorder) = controller_with(Arc::clone(&analyzer));

    controller.select_files(vec![video("one.mp4")]).await;
    assert_eq!(controller.history().len(), 1);

    // 結果画面からの選択はホームを経由する
    controller
        .select_files(vec![video("a.mp4"), video("b.mp4"), video("c.mp4")])
        .await;
    assert_eq!(controller.history().len(), 4);
    assert!(recorder.events().contains(&"view:result->home".to_string()));

    let external = finalize_response(Some(VERDICT)).unwrap();
    controller.inject_external(external);
    assert_eq!(controller.history().len(), 5);
    assert_eq!(controller.view(), ViewState::Result);

    let stats = controller.dashboard_stats();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.synthetic, 5);
    assert_eq!(stats.top_model, Some(("DALL-E 3".to_string(), 5)));
}

#[tokio::test]
async fn test_reset_keeps_history() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
    let (mut controller, _) = controller_with(Arc::clone(&analyzer));

    controller.select_files(vec![video("a.mp4"), video("b.mp4")]).await;
    assert_eq!(controller.batch_results().len(), 2);

    controller.reset();
    assert_eq!(controller.view(), ViewState::Home);
    assert_eq!(controller.status(), AnalysisStatus::Idle);
    assert!(controller.batch_results().is_empty());
    assert!(controller.current_file().is_none());
    assert!(controller.current_result().is_none());
    assert_eq!(controller.history().len(), 2);
}

#[tokio::test]
async fn test_dashboard_reachable_after_scan() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
    let (mut controller, _) = controller_with(Arc::clone(&analyzer));

    controller.select_files(vec![video("a.mp4")]).await;
    controller.navigate(Destination::Dashboard);
    assert_eq!(controller.view(), ViewState::Dashboard);
    controller.navigate(Destination::Settings);
    assert_eq!(controller.view(), ViewState::Settings);

    // 設定画面からでもスキャンできる
    controller.select_files(vec![video("b.mp4")]).await;
    assert_eq!(controller.view(), ViewState::Result);
    assert_eq!(controller.history().len(), 2);
}

/// スキャン中はメッセージが順に切り替わり、終了時にカーソルが戻る
#[tokio::test]
async fn test_status_texts_cycle_while_scanning() {
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]).with_delay(Duration::from_millis(200)));
    let recorder = Recorder::default();
    let settings = ControllerSettings {
        status_interval: Duration::from_millis(10),
        ..ControllerSettings::default()
    };
    let mut controller =
        AppController::new(analyzer, settings).with_observer(recorder.clone());

    controller.select_files(vec![video("slow.mp4")]).await;

    let texts = recorder.with_prefix("text:");
    assert!(texts.len() >= 3, "メッセージが切り替わっていない: {:?}", texts);
    for (i, text) in texts.iter().enumerate() {
        assert_eq!(text, STATUS_MESSAGES[i % STATUS_MESSAGES.len()]);
    }
    assert_eq!(controller.view(), ViewState::Result);
    assert_eq!(controller.status_cursor(), 0);
}

#[tokio::test]
async fn test_folder_selection_routes_to_batch() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_png(dir.path(), "b.png", 64, 64);
    write_png(dir.path(), "a.png", 32, 16);
    std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

    let files = scanner::scan_paths(&[dir.path().to_path_buf()], false).unwrap();
    assert_eq!(files.len(), 2);

    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
    let (mut controller, _) = controller_with(Arc::clone(&analyzer));
    assert_eq!(controller.select_files(files).await, ScanRoute::Batch(2));

    let names: Vec<&str> = controller
        .batch_results()
        .iter()
        .map(|r| r.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["a.png", "b.png"]);
}
