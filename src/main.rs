use anyhow::Context;
use clap::Parser;
use lavage_capture::camera::{SpoolCamera, StillCamera};
use lavage_capture::{cli, config, error, interactive, render, workflow};
use cli::{Cli, Commands};
use config::Config;
use error::LavageError;
use lavage_common::{WashMode, WebhookOutcome};
use workflow::Workflow;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "lavage_capture=debug,info" } else { "lavage_capture=info,warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Session { camera_dir, layout, wash_mode } => {
            if let Some(layout) = layout {
                config.layout = layout;
            }
            if let Some(mode) = wash_mode {
                config.wash_mode = mode;
            }
            let dir = camera_dir
                .or_else(|| config.camera_dir.clone())
                .ok_or_else(|| LavageError::Config("カメラフォルダが指定されていません (--camera-dir)".into()))?;

            tracing::info!(dir = %dir.display(), layout = ?config.layout, "starting session");
            let mut workflow = Workflow::new(&config, Box::new(SpoolCamera::new(dir)))?;
            interactive::run_session(&mut workflow).await?;
        }

        Commands::Submit { photos, wash_type, options, layout, approve } => {
            println!("🚗 lavage-capture - 送信\n");

            if let Some(layout) = layout {
                config.layout = layout;
            }
            config.wash_mode = if options.is_empty() { WashMode::Single } else { WashMode::Multi };

            let mut camera = StillCamera::new();
            for (role, path) in &photos {
                camera.insert(*role, path);
            }
            let mut workflow = Workflow::new(&config, Box::new(camera))?;

            // 1. 撮影
            println!("[1/3] 画像を読み込み中...");
            for (role, _) in &photos {
                workflow.capture(*role)?;
            }
            if !options.is_empty() {
                for option in &options {
                    workflow.toggle_wash_option(*option)?;
                }
            } else {
                workflow.set_wash_type(wash_type)?;
            }
            println!("✔ {}枚の写真を準備\n", photos.len());

            // 2. 送信
            println!("[2/3] 送信中...");
            let outcome = workflow.submit().await?;
            let record = match outcome {
                WebhookOutcome::Structured(record) => record,
                other => {
                    let message = other.error_message().unwrap_or_default();
                    println!("{}", render::error_card(&message));
                    return Err(LavageError::ServerRejection(message).into());
                }
            };
            println!("{}\n", render::result_card(&record, workflow.currency()));

            // 3. 承認
            if approve {
                println!("[3/3] 承認中...");
                workflow.approve().await?;
                if let Some(status) = workflow.session().status() {
                    println!("{}", render::status_line(status));
                }
            }

            println!("\n✅ 完了");
        }

        Commands::History { filter, delete } => {
            let mut workflow = Workflow::new(&config, Box::new(StillCamera::new()))?;
            workflow.open_history().await?;

            if let Some(index) = delete {
                let item = workflow.delete_history(&filter, index).await?;
                println!("✔ 削除しました: {}\n", item.plate());
            }

            println!("{}", render::history_table(&workflow.history_view(&filter), workflow.currency()));
        }

        Commands::Config { set_submit_url, set_approve_url, set_history_url, set_webhook_url, show } => {
            let mut config = Config::load_file()?;
            let mut changed = false;

            if let Some(url) = set_webhook_url {
                config.submit_url = Some(url.clone());
                config.approve_url = Some(url.clone());
                config.history_url = Some(url);
                changed = true;
            }
            if let Some(url) = set_submit_url {
                config.submit_url = Some(url);
                changed = true;
            }
            if let Some(url) = set_approve_url {
                config.approve_url = Some(url);
                changed = true;
            }
            if let Some(url) = set_history_url {
                config.history_url = Some(url);
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                let show_url = |url: &Option<String>| url.clone().unwrap_or_else(|| "未設定".into());
                println!("設定:");
                println!("  送信URL: {}", show_url(&config.submit_url));
                println!("  承認URL: {}", show_url(&config.approve_url));
                println!("  履歴URL: {}", show_url(&config.history_url));
                println!("  レイアウト: {:?}", config.layout);
                println!("  洗車選択: {:?}", config.wash_mode);
                println!("  通貨: {}", config.currency);
                println!(
                    "  カメラフォルダ: {}",
                    config.camera_dir.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "未設定".into())
                );
            }
        }
    }

    Ok(())
}
