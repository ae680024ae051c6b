//! エラー型定義

use crate::screen::Screen;
use crate::types::PhotoRole;
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 送信前チェックに失敗（メッセージはそのままオペレーターに表示する）
    #[error("{0}")]
    Validation(String),

    #[error("Invalid transition: cannot {action} from {screen}")]
    InvalidTransition { screen: Screen, action: &'static str },

    #[error("Role {0} is not part of the capture layout")]
    RoleNotInLayout(PhotoRole),

    #[error("Wash mode error: {0}")]
    WashMode(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
