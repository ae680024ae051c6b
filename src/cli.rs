use clap::{Parser, Subcommand};
use lavage_common::{CaptureLayout, PhotoRole, WashMode, WashOption, WashType};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lavage-capture")]
#[command(about = "洗車受付 撮影・Webhook送信ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 対話セッション（撮影 → 確認 → 送信 → 承認）
    Session {
        /// スナップショットが書き込まれるフォルダ（カメラ）
        #[arg(short, long)]
        camera_dir: Option<PathBuf>,

        /// 撮影レイアウト (vehicle-plate/front-rear-plate)
        #[arg(long)]
        layout: Option<CaptureLayout>,

        /// 洗車選択モード (single/multi)
        #[arg(long)]
        wash_mode: Option<WashMode>,
    },

    /// 画像ファイルを指定して1回送信
    Submit {
        /// 役割=パス（例: vehicle=car.jpg plate=plate.jpg）
        #[arg(short, long = "photo", value_parser = parse_photo_arg, required = true)]
        photos: Vec<(PhotoRole, PathBuf)>,

        /// 洗車タイプ (exterieur/interieur/complet)
        #[arg(short, long, conflicts_with = "options")]
        wash_type: Option<WashType>,

        /// 洗車オプション（複数指定可: exterior/interior/wax）
        #[arg(short = 'o', long = "option")]
        options: Vec<WashOption>,

        /// 撮影レイアウト (vehicle-plate/front-rear-plate)
        #[arg(long)]
        layout: Option<CaptureLayout>,

        /// 解析結果をそのまま承認
        #[arg(long)]
        approve: bool,
    },

    /// 洗車履歴を表示/削除
    History {
        /// 絞り込み（ナンバー・カテゴリ・洗車タイプ）
        #[arg(short, long, default_value = "")]
        filter: String,

        /// 絞り込み結果の番号を削除
        #[arg(long)]
        delete: Option<usize>,
    },

    /// 設定を表示/編集
    Config {
        /// 送信Webhook URLを設定
        #[arg(long)]
        set_submit_url: Option<String>,

        /// 承認Webhook URLを設定
        #[arg(long)]
        set_approve_url: Option<String>,

        /// 履歴Webhook URLを設定
        #[arg(long)]
        set_history_url: Option<String>,

        /// 3つのWebhookを同じURLに設定
        #[arg(long)]
        set_webhook_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// `role=path` 形式の引数をパース
pub fn parse_photo_arg(s: &str) -> Result<(PhotoRole, PathBuf), String> {
    let (role, path) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid photo: {}. Use ROLE=PATH (e.g. plate=plate.jpg)", s))?;
    let role: PhotoRole = role.parse()?;
    if path.trim().is_empty() {
        return Err(format!("Missing path for photo role: {}", role));
    }
    Ok((role, PathBuf::from(path.trim())))
}
