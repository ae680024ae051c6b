//! 対話セッション
//!
//! 画面ごとにメニューを表示し、オペレーターの選択をワークフロー操作に変換する。

use crate::error::{LavageError, Result};
use crate::render;
use crate::workflow::Workflow;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use lavage_common::{PhotoRole, Screen, WashOption, WashSelection, WashType};
use std::time::Duration;

/// 確認画面の操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Capture(PhotoRole),
    Retake(PhotoRole),
    SetWashType(WashType),
    ToggleOption(WashOption),
    Submit,
    History,
    Restart,
    Quit,
}

impl ReviewAction {
    pub fn label(&self) -> String {
        match self {
            ReviewAction::Capture(role) => format!("📷 Photo {}", role.label()),
            ReviewAction::Retake(role) => format!("↺ Reprendre {}", role.label()),
            ReviewAction::SetWashType(t) => format!("Lavage: {}", t.label()),
            ReviewAction::ToggleOption(o) => format!("Option: {}", o.label()),
            ReviewAction::Submit => "Envoyer".into(),
            ReviewAction::History => "Historique".into(),
            ReviewAction::Restart => "Redémarrer".into(),
            ReviewAction::Quit => "Quitter".into(),
        }
    }
}

/// 確認画面で選べる操作（送信は準備完了時のみ）
pub fn review_actions(workflow: &Workflow) -> Vec<ReviewAction> {
    let session = workflow.session();
    let mut actions: Vec<ReviewAction> = session
        .layout()
        .roles()
        .iter()
        .map(|role| {
            if session.has_photo(*role) {
                ReviewAction::Retake(*role)
            } else {
                ReviewAction::Capture(*role)
            }
        })
        .collect();

    match session.selection() {
        WashSelection::Single(_) => {
            actions.extend(WashType::ALL.iter().map(|t| ReviewAction::SetWashType(*t)))
        }
        WashSelection::Multi(_) => {
            actions.extend(WashOption::ALL.iter().map(|o| ReviewAction::ToggleOption(*o)))
        }
    }

    if workflow.can_submit() {
        actions.push(ReviewAction::Submit);
    }
    actions.extend([ReviewAction::History, ReviewAction::Restart, ReviewAction::Quit]);
    actions
}

fn select(prompt: &str, items: &[String]) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(|e| LavageError::Prompt(e.to_string()))
}

fn print_status(workflow: &Workflow) {
    if let Some(status) = workflow.session().status() {
        println!("{}", render::status_line(status));
    }
}

/// 対話セッションを実行（Quit で終了）
pub async fn run_session(workflow: &mut Workflow) -> Result<()> {
    println!("🚗 Alketeb Lavage\n");

    loop {
        match workflow.screen() {
            Screen::Reviewing => {
                println!("{}", render::review(workflow.session()));
                print_status(workflow);

                let actions = review_actions(workflow);
                let labels: Vec<String> = actions.iter().map(ReviewAction::label).collect();
                let action = actions[select("Action", &labels)?];

                match action {
                    ReviewAction::Capture(role) => capture_interactive(workflow, role, false)?,
                    ReviewAction::Retake(role) => capture_interactive(workflow, role, true)?,
                    ReviewAction::SetWashType(t) => workflow.set_wash_type(Some(t))?,
                    ReviewAction::ToggleOption(o) => workflow.toggle_wash_option(o)?,
                    ReviewAction::Submit => submit_with_spinner(workflow).await?,
                    ReviewAction::History => workflow.open_history().await?,
                    ReviewAction::Restart => workflow.hard_restart(),
                    ReviewAction::Quit => break,
                }
            }
            Screen::ResultSuccess => {
                if let Some(record) = workflow.session().current_result() {
                    println!("{}", render::result_card(record, workflow.currency()));
                }
                print_status(workflow);

                let labels = vec!["✔ Valider".to_string(), "Recommencer".to_string()];
                match select("Résultat", &labels)? {
                    0 => {
                        // 失敗時はステータスを表示して結果画面に留まる
                        if let Err(e) = workflow.approve().await {
                            tracing::debug!(error = %e, "approve failed");
                        }
                    }
                    _ => workflow.restart()?,
                }
            }
            Screen::ResultError => {
                if let Some(status) = workflow.session().status() {
                    println!("{}", render::error_card(&status.text));
                }
                let labels = vec!["Recommencer".to_string()];
                select("Erreur", &labels)?;
                workflow.restart()?;
            }
            Screen::History => history_interactive(workflow).await?,
            Screen::Capturing(_) | Screen::Submitting => {
                // 操作の途中で抜けた場合は確認画面へ戻す
                workflow.close_camera();
                if workflow.screen() == Screen::Submitting {
                    workflow.hard_restart();
                }
            }
        }
    }

    println!("\n✅ Session terminée");
    Ok(())
}

fn capture_interactive(workflow: &mut Workflow, role: PhotoRole, retake: bool) -> Result<()> {
    let opened = if retake { workflow.retake(role) } else { workflow.open_camera(role) };
    if let Err(e) = opened {
        tracing::debug!(error = %e, "camera open failed");
        return Ok(());
    }

    println!("📷 {}", role.camera_hint());
    let labels = vec!["Capturer".to_string(), "Annuler".to_string()];
    match select("Caméra", &labels)? {
        0 => {
            if let Err(e) = workflow.take_photo() {
                tracing::debug!(error = %e, "capture failed");
            }
        }
        _ => workflow.close_camera(),
    }
    Ok(())
}

async fn submit_with_spinner(workflow: &mut Workflow) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Analyse en cours...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = workflow.submit().await;
    spinner.finish_and_clear();

    match result {
        Ok(_) => Ok(()),
        // 入力不足はステータスに表示済み
        Err(LavageError::Validation(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

async fn history_interactive(workflow: &mut Workflow) -> Result<()> {
    let mut term = String::new();

    loop {
        println!("\n📋 Historique");
        println!("{}", render::history_table(&workflow.history_view(&term), workflow.currency()));
        print_status(workflow);

        let labels = vec![
            "Rechercher".to_string(),
            "Supprimer".to_string(),
            "Actualiser".to_string(),
            "Retour".to_string(),
        ];
        match select("Historique", &labels)? {
            0 => {
                term = Input::new()
                    .with_prompt("Recherche")
                    .allow_empty(true)
                    .interact_text()
                    .map_err(|e| LavageError::Prompt(e.to_string()))?;
            }
            1 => {
                let count = workflow.history_view(&term).len();
                if count == 0 {
                    continue;
                }
                let index: usize = Input::new()
                    .with_prompt(format!("Numéro (0-{})", count - 1))
                    .interact_text()
                    .map_err(|e| LavageError::Prompt(e.to_string()))?;
                match workflow.delete_history(&term, index).await {
                    Ok(item) => println!("✔ Supprimé: {}", item.plate()),
                    Err(e) => tracing::debug!(error = %e, "delete failed"),
                }
            }
            2 => {
                workflow.refresh_history().await;
            }
            _ => {
                workflow.close_history()?;
                return Ok(());
            }
        }
    }
}
