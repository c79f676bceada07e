use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deepscan")]
#[command(about = "生成AIメディアのフォレンジック解析ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像/動画を解析（1件は単発、2件以上はバッチ）
    Scan {
        /// ファイルまたはフォルダのパス
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 標準入力からホストの解析結果を受け取る（1行1件）
    Bridge {
        /// 受け取った結果の履歴JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 対話モード
    Interactive,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 使用するモデルを設定
        #[arg(long)]
        set_model: Option<String>,

        /// リクエストのタイムアウト（秒）を設定
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
