//! Lavage Common Library
//!
//! 撮影フロントエンド（CLI・コンソール等）で共有される型と状態遷移。
//! IOを持たない純粋なロジックのみを置く。

pub mod error;
pub mod history;
pub mod response;
pub mod screen;
pub mod session;
pub mod types;

pub use error::{Error, Result};
pub use history::{parse_history_body, HistoryList};
pub use response::{classify_response, SchemaPolicy, WebhookOutcome};
pub use screen::{Screen, ScreenController};
pub use session::{SessionState, SubmissionPayload};
pub use types::{
    CaptureLayout, HistoryItem, HistoryKey, PhotoData, PhotoRole, ResultRecord, StatusKind,
    StatusMessage, WashMode, WashOption, WashOptions, WashSelection, WashType,
};
