//! バッチ解析
//!
//! キューの先頭から1件ずつ（並列なし）前処理→解析を行う。
//! 失敗したファイルはログに残してスキップし、残りの処理を続ける。

use crate::analyzer::MediaAnalyzer;
use crate::history::HistoryLedger;
use crate::pipeline;
use crate::preprocess::PreprocessOptions;
use crate::scanner::MediaFile;
use deepscan_common::BatchAnalysisResult;
use std::collections::VecDeque;

/// 1件処理した結果
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Recorded,
    Skipped(String),
}

/// 1件処理するごとの進捗
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub file_name: String,
    pub completed: usize,
    pub remaining: usize,
    pub outcome: ItemOutcome,
}

impl BatchProgress {
    pub fn total(&self) -> usize {
        self.completed + self.remaining
    }

    /// completed / (completed + remaining)
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            1.0
        } else {
            self.completed as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchRunner {
    queue: VecDeque<MediaFile>,
    results: Vec<BatchAnalysisResult>,
    completed: usize,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しいバッチを読み込む（前回の結果は破棄）
    pub fn load(&mut self, files: Vec<MediaFile>) {
        self.queue = files.into();
        self.results.clear();
        self.completed = 0;
    }

    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn results(&self) -> &[BatchAnalysisResult] {
        &self.results
    }

    /// キューの先頭を1件処理する
    ///
    /// 成功時はバッチ結果と履歴に1件ずつ追加する。成否に関わらず
    /// 処理後にキューから外し、完了数を進める。キューが空なら None。
    pub async fn step(
        &mut self,
        analyzer: &dyn MediaAnalyzer,
        options: PreprocessOptions,
        history: &mut HistoryLedger,
    ) -> Option<BatchProgress> {
        let file = self.queue.front()?.clone();

        let outcome = match pipeline::scan_file(analyzer, &file, options).await {
            Ok((data, result)) => {
                history.record(&result, &data.preview);
                self.results.push(BatchAnalysisResult {
                    file_name: file.file_name.clone(),
                    thumbnail: data.preview,
                    result,
                });
                ItemOutcome::Recorded
            }
            Err(e) => {
                log::warn!("バッチ解析失敗のためスキップ: {}: {}", file.file_name, e);
                ItemOutcome::Skipped(e.to_string())
            }
        };

        self.queue.pop_front();
        self.completed += 1;

        Some(BatchProgress {
            file_name: file.file_name,
            completed: self.completed,
            remaining: self.queue.len(),
            outcome,
        })
    }

    /// キューが空になるまで処理する
    pub async fn run_to_completion(
        &mut self,
        analyzer: &dyn MediaAnalyzer,
        options: PreprocessOptions,
        history: &mut HistoryLedger,
        mut on_progress: impl FnMut(&BatchProgress),
    ) -> usize {
        while let Some(progress) = self.step(analyzer, options, history).await {
            on_progress(&progress);
        }
        self.results.len()
    }
}
