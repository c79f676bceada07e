use anyhow::Context;
use clap::Parser;
use deepscan::analyzer::{analyzer_from_config, UnconfiguredAnalyzer};
use deepscan::bridge::{BridgeInput, CallbackRegistry, NativeBridge, NATIVE_CALLBACK_NAME};
use deepscan::cli::{Cli, Commands};
use deepscan::config::Config;
use deepscan::controller::{AnalysisStatus, AppController, ControllerSettings, ScanRoute};
use deepscan::display::{self, CliObserver};
use deepscan::error::DeepScanError;
use deepscan::{export, interactive, scanner};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_level));

    let config = Config::load()?;

    match cli.command {
        Commands::Scan { paths, output, recursive } => {
            println!("🔍 deepscan - メディア解析\n");

            // 1. ファイル収集
            println!("[1/3] ファイルをスキャン中...");
            let files = scanner::scan_paths(&paths, recursive)?;
            if files.is_empty() {
                let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                return Err(DeepScanError::NoMediaFound(joined.join(", ")).into());
            }
            println!("✔ {}件のメディアを検出\n", files.len());

            // 2. 解析
            println!("[2/3] 解析中...");
            let analyzer = analyzer_from_config(&config)?;
            let mut controller =
                AppController::new(analyzer, ControllerSettings::from_config(&config))
                    .with_observer(CliObserver::new());
            let route = controller.select_files(files).await;
            println!();

            // 3. 結果
            println!("[3/3] 結果");
            display::print_view(&controller);

            if let Some(output) = output {
                let written = match route {
                    ScanRoute::Single => controller
                        .current_result()
                        .map(|result| export::write_result_json(result, &output))
                        .transpose(),
                    ScanRoute::Batch(_) => {
                        export::write_batch_json(controller.batch_results(), &output).map(Some)
                    }
                    ScanRoute::Ignored => Ok(None),
                }
                .with_context(|| format!("write {}", output.display()))?;

                if let Some(path) = written {
                    println!("✔ 結果を保存: {}", path.display());
                }
            }

            if controller.status() == AnalysisStatus::Error {
                std::process::exit(1);
            }
        }

        Commands::Bridge { output } => {
            println!("🔌 deepscan - ネイティブブリッジ（1行1件、EOFで終了）\n");

            let mut controller = AppController::new(
                Arc::new(UnconfiguredAnalyzer),
                ControllerSettings::from_config(&config),
            )
            .with_observer(CliObserver::new());

            let registry = Arc::new(CallbackRegistry::new());
            let mut bridge = NativeBridge::install(Arc::clone(&registry), controller.bridge_sender());

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }

                let input = BridgeInput::from_host_line(&line);
                if let Err(e) = registry.invoke(NATIVE_CALLBACK_NAME, &input) {
                    log::warn!("ブリッジ入力を処理できません: {}", e);
                    continue;
                }

                controller.pump_bridge();
                display::print_view(&controller);
            }

            bridge.teardown();
            println!("✔ {}件の結果を受信", controller.history().len());

            if let Some(output) = output {
                let path = export::write_history_json(controller.history().newest_first(), &output)
                    .with_context(|| format!("write {}", output.display()))?;
                println!("✔ 履歴を保存: {}", path.display());
            }
        }

        Commands::Interactive => {
            let analyzer = analyzer_from_config(&config)?;
            let mut controller =
                AppController::new(analyzer, ControllerSettings::from_config(&config))
                    .with_observer(CliObserver::new());
            interactive::run_interactive(&mut controller, &config).await?;
        }

        Commands::Config { set_api_key, set_model, set_timeout, show } => {
            let mut config = config;
            let nothing_requested =
                set_api_key.is_none() && set_model.is_none() && set_timeout.is_none();
            let mut changed = false;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(model) = set_model {
                println!("✔ モデルを設定しました: {}", model);
                config.model = model;
                changed = true;
            }

            if let Some(seconds) = set_timeout {
                config.timeout_seconds = seconds.max(1);
                changed = true;
                println!("✔ タイムアウトを設定しました: {}秒", config.timeout_seconds);
            }

            if changed {
                config.save()?;
            }

            if show || nothing_requested {
                display::print_settings(&config);
            }
        }
    }

    Ok(())
}
