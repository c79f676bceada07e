//! DeepScan Common Library
//!
//! CLIと将来のフロントエンドで共有される型とユーティリティ

pub mod error;
pub mod parser;
pub mod prompts;
pub mod types;

pub use error::{Error, Result};
pub use parser::{extract_json, parse_verdict_response};
pub use prompts::{build_analysis_prompt, verdict_response_schema, SYSTEM_INSTRUCTION};
pub use types::{
    AnalysisResult, BatchAnalysisResult, BoundingBox, ForensicMetrics, FrameAnomaly, HistoryItem,
    MediaAnalysis, ModelSignature, PerceptionMetrics, SuspiciousRegion, VerdictPayload,
    VideoAnalysis, WatermarkReport, WatermarkSignature,
};
