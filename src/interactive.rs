//! 対話モード
//!
//! 1つのコントローラを使い回すので、履歴とダッシュボードはセッション中に蓄積される。

use crate::config::Config;
use crate::controller::{AppController, Destination};
use crate::display;
use crate::error::{DeepScanError, Result};
use crate::export;
use crate::scanner;
use dialoguer::{Input, Select};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Scan,
    Home,
    Dashboard,
    Settings,
    Reset,
    Export,
    Quit,
}

const MENU: &[(MenuAction, &str)] = &[
    (MenuAction::Scan, "ファイルを解析"),
    (MenuAction::Home, "ホーム"),
    (MenuAction::Dashboard, "ダッシュボード"),
    (MenuAction::Settings, "設定"),
    (MenuAction::Reset, "リセット"),
    (MenuAction::Export, "履歴をJSONに出力"),
    (MenuAction::Quit, "終了"),
];

pub async fn run_interactive(controller: &mut AppController, config: &Config) -> Result<()> {
    println!("🔍 deepscan - 対話モード\n");

    loop {
        let action = prompt_menu(controller)?;

        match action {
            MenuAction::Scan => {
                let paths = prompt_paths()?;
                if paths.is_empty() {
                    continue;
                }
                match scanner::scan_paths(&paths, false) {
                    Ok(files) if files.is_empty() => println!("解析対象のメディアが見つかりません\n"),
                    Ok(files) => {
                        controller.select_files(files).await;
                        display::print_view(controller);
                    }
                    Err(e) => println!("✖ {}\n", e),
                }
            }
            MenuAction::Home => controller.navigate(Destination::Home),
            MenuAction::Dashboard => {
                controller.navigate(Destination::Dashboard);
                display::print_view(controller);
            }
            MenuAction::Settings => {
                controller.navigate(Destination::Settings);
                display::print_settings(config);
                println!();
            }
            MenuAction::Reset => {
                controller.reset();
                println!("✔ リセットしました（履歴は保持されます）\n");
            }
            MenuAction::Export => {
                let output: String = Input::new()
                    .with_prompt("出力先")
                    .default(format!("{}.json", export::DEFAULT_HISTORY_NAME))
                    .interact_text()
                    .map_err(|e| DeepScanError::CliExecution(e.to_string()))?;
                match export_history(controller, &PathBuf::from(output.trim())) {
                    Ok(path) => println!("✔ 履歴を保存: {}\n", path.display()),
                    Err(e) => println!("✖ {}\n", e),
                }
            }
            MenuAction::Quit => break,
        }
    }

    Ok(())
}

fn prompt_menu(controller: &AppController) -> Result<MenuAction> {
    let items: Vec<&str> = MENU.iter().map(|(_, label)| *label).collect();
    let prompt = format!(
        "[{}] 履歴 {}件",
        controller.view(),
        controller.history().len()
    );

    let index = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| DeepScanError::CliExecution(e.to_string()))?;

    Ok(MENU.get(index).map(|(action, _)| *action).unwrap_or(MenuAction::Quit))
}

fn export_history(controller: &AppController, output: &Path) -> Result<PathBuf> {
    export::write_history_json(controller.history().newest_first(), output)
}

/// 空白区切りのパスを入力
fn prompt_paths() -> Result<Vec<PathBuf>> {
    let input: String = Input::new()
        .with_prompt("ファイル/フォルダ（空白区切り）")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| DeepScanError::CliExecution(e.to_string()))?;

    Ok(parse_paths(&input))
}

fn parse_paths(input: &str) -> Vec<PathBuf> {
    input.split_whitespace().map(PathBuf::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        assert_eq!(
            parse_paths("  a.jpg   photos/ "),
            vec![PathBuf::from("a.jpg"), PathBuf::from("photos/")]
        );
        assert!(parse_paths("   ").is_empty());
    }

    #[test]
    fn test_export_failure_is_returned_not_fatal() {
        use crate::analyzer::UnconfiguredAnalyzer;
        use crate::controller::ControllerSettings;
        use std::sync::Arc;

        let controller =
            AppController::new(Arc::new(UnconfiguredAnalyzer), ControllerSettings::default());
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        // 親がファイルなので書き込めない
        let result = export_history(&controller, &blocker.join("history.json"));
        assert!(result.is_err());

        let path = export_history(&controller, &dir.path().join("history.json")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_menu_covers_quit() {
        assert_eq!(MENU.last().map(|(a, _)| *a), Some(MenuAction::Quit));
    }
}
