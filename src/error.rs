use crate::camera::CameraError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LavageError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("Webhook URLが設定されていません ({0})。`lavage-capture config --set-{0}-url URL` で設定してください")]
    MissingEndpoint(&'static str),

    #[error("カメラエラー: {0}")]
    CameraAccess(#[from] CameraError),

    #[error("入力不足: {0}")]
    Validation(String),

    #[error("通信エラー: {0}")]
    Transport(String),

    #[error("サーバーがエラーを返しました (HTTP {0})")]
    HttpStatus(u16),

    #[error("サーバーが送信を拒否しました: {0}")]
    ServerRejection(String),

    #[error("履歴の削除に失敗: {0}")]
    DeleteFailure(String),

    #[error("画像エラー: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力プロンプトエラー: {0}")]
    Prompt(String),

    #[error(transparent)]
    Common(#[from] lavage_common::Error),
}

pub type Result<T> = std::result::Result<T, LavageError>;
