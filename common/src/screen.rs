//! 画面遷移ステートマシン
//!
//! 撮影 → 確認 → 送信中 → 結果（成功/エラー）→ 確認 のサイクルと履歴画面を管理する。
//! 許可されていない遷移は InvalidTransition を返し、状態は変更しない。

use crate::error::{Error, Result};
use crate::response::WebhookOutcome;
use crate::session::SessionState;
use crate::types::PhotoRole;
use std::fmt;

/// 表示中の画面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    Capturing(PhotoRole),
    #[default]
    Reviewing,
    Submitting,
    ResultSuccess,
    ResultError,
    History,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Capturing(role) => write!(f, "capturing({})", role),
            Screen::Reviewing => f.write_str("reviewing"),
            Screen::Submitting => f.write_str("submitting"),
            Screen::ResultSuccess => f.write_str("result-success"),
            Screen::ResultError => f.write_str("result-error"),
            Screen::History => f.write_str("history"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenController {
    screen: Screen,
}

impl ScreenController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Screen {
        self.screen
    }

    fn reject<T>(&self, action: &'static str) -> Result<T> {
        Err(Error::InvalidTransition { screen: self.screen, action })
    }

    /// 確認画面からカメラ撮影へ
    pub fn begin_capture(&mut self, role: PhotoRole) -> Result<()> {
        match self.screen {
            Screen::Reviewing => {
                self.screen = Screen::Capturing(role);
                Ok(())
            }
            _ => self.reject("begin capture"),
        }
    }

    /// 撮影完了で確認画面へ戻る
    pub fn finish_capture(&mut self) -> Result<PhotoRole> {
        match self.screen {
            Screen::Capturing(role) => {
                self.screen = Screen::Reviewing;
                Ok(role)
            }
            _ => self.reject("finish capture"),
        }
    }

    /// 撮影キャンセルで確認画面へ戻る
    pub fn cancel_capture(&mut self) -> Result<()> {
        match self.screen {
            Screen::Capturing(_) => {
                self.screen = Screen::Reviewing;
                Ok(())
            }
            _ => self.reject("cancel capture"),
        }
    }

    /// 送信可能か（確認画面かつセッションが揃っている）
    pub fn can_submit(&self, session: &SessionState) -> bool {
        self.screen == Screen::Reviewing && session.is_ready_to_submit()
    }

    /// 送信開始。未完成のセッションは Validation エラーで遷移しない
    pub fn begin_submit(&mut self, session: &SessionState) -> Result<()> {
        if self.screen != Screen::Reviewing {
            return self.reject("submit");
        }
        session.validate()?;
        self.screen = Screen::Submitting;
        Ok(())
    }

    /// 送信結果に応じて結果画面へ
    pub fn complete_submit(&mut self, outcome: &WebhookOutcome) -> Result<Screen> {
        if self.screen != Screen::Submitting {
            return self.reject("complete submit");
        }
        self.screen = match outcome {
            WebhookOutcome::Structured(_) => Screen::ResultSuccess,
            WebhookOutcome::ServerMessage(_)
            | WebhookOutcome::UnexpectedShape
            | WebhookOutcome::HttpStatus(_)
            | WebhookOutcome::TransportFailure(_) => Screen::ResultError,
        };
        Ok(self.screen)
    }

    /// 承認成功で確認画面へ
    pub fn approve_succeeded(&mut self) -> Result<()> {
        match self.screen {
            Screen::ResultSuccess => {
                self.screen = Screen::Reviewing;
                Ok(())
            }
            _ => self.reject("approve"),
        }
    }

    /// 結果画面から「やり直し」
    pub fn restart(&mut self) -> Result<()> {
        match self.screen {
            Screen::ResultSuccess | Screen::ResultError => {
                self.screen = Screen::Reviewing;
                Ok(())
            }
            _ => self.reject("restart"),
        }
    }

    /// どの画面からでも確認画面へ（セッションのクリアは呼び出し側）
    pub fn hard_restart(&mut self) {
        self.screen = Screen::Reviewing;
    }

    pub fn open_history(&mut self) -> Result<()> {
        match self.screen {
            Screen::Reviewing => {
                self.screen = Screen::History;
                Ok(())
            }
            _ => self.reject("open history"),
        }
    }

    pub fn close_history(&mut self) -> Result<()> {
        match self.screen {
            Screen::History => {
                self.screen = Screen::Reviewing;
                Ok(())
            }
            _ => self.reject("close history"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CaptureLayout, PhotoData, ResultRecord, WashMode, WashType};

    fn ready_session() -> SessionState {
        let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        let photo = PhotoData::from_jpeg(&[1, 2, 3]);
        session.set_photo(PhotoRole::Vehicle, photo.clone()).unwrap();
        session.set_photo(PhotoRole::Plate, photo).unwrap();
        session.set_wash_type(Some(WashType::Exterieur)).unwrap();
        session
    }

    fn structured() -> WebhookOutcome {
        WebhookOutcome::Structured(serde_json::from_str::<ResultRecord>(r#"{"Categorie":"SUV"}"#).unwrap())
    }

    #[test]
    fn test_initial_state_is_reviewing() {
        assert_eq!(ScreenController::new().current(), Screen::Reviewing);
    }

    #[test]
    fn test_capture_cycle() {
        let mut screen = ScreenController::new();
        screen.begin_capture(PhotoRole::Plate).unwrap();
        assert_eq!(screen.current(), Screen::Capturing(PhotoRole::Plate));

        // 撮影中に別の撮影は開始できない
        assert!(screen.begin_capture(PhotoRole::Vehicle).is_err());
        assert_eq!(screen.current(), Screen::Capturing(PhotoRole::Plate));

        assert_eq!(screen.finish_capture().unwrap(), PhotoRole::Plate);
        assert_eq!(screen.current(), Screen::Reviewing);

        screen.begin_capture(PhotoRole::Vehicle).unwrap();
        screen.cancel_capture().unwrap();
        assert_eq!(screen.current(), Screen::Reviewing);
        assert!(screen.cancel_capture().is_err());
    }

    #[test]
    fn test_submit_rejected_when_not_ready() {
        let mut screen = ScreenController::new();
        let session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);

        assert!(!screen.can_submit(&session));
        let result = screen.begin_submit(&session);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(screen.current(), Screen::Reviewing);
    }

    #[test]
    fn test_submit_success_then_approve() {
        let mut screen = ScreenController::new();
        let session = ready_session();

        assert!(screen.can_submit(&session));
        screen.begin_submit(&session).unwrap();
        assert_eq!(screen.current(), Screen::Submitting);
        assert!(!screen.can_submit(&session));

        assert_eq!(screen.complete_submit(&structured()).unwrap(), Screen::ResultSuccess);
        screen.approve_succeeded().unwrap();
        assert_eq!(screen.current(), Screen::Reviewing);
    }

    #[test]
    fn test_submit_failures_lead_to_error_screen() {
        let outcomes = vec![
            WebhookOutcome::ServerMessage("Vehicule non reconnu".into()),
            WebhookOutcome::UnexpectedShape,
            WebhookOutcome::HttpStatus(500),
            WebhookOutcome::TransportFailure("connection refused".into()),
        ];

        for outcome in outcomes {
            let mut screen = ScreenController::new();
            screen.begin_submit(&ready_session()).unwrap();
            assert_eq!(screen.complete_submit(&outcome).unwrap(), Screen::ResultError);

            // エラー画面からは承認できず、やり直しのみ
            assert!(screen.approve_succeeded().is_err());
            screen.restart().unwrap();
            assert_eq!(screen.current(), Screen::Reviewing);
        }
    }

    #[test]
    fn test_complete_submit_requires_submitting() {
        let mut screen = ScreenController::new();
        assert!(screen.complete_submit(&structured()).is_err());
        assert_eq!(screen.current(), Screen::Reviewing);
    }

    #[test]
    fn test_hard_restart_from_any_state() {
        let mut screen = ScreenController::new();
        screen.begin_capture(PhotoRole::Vehicle).unwrap();
        screen.hard_restart();
        assert_eq!(screen.current(), Screen::Reviewing);

        screen.begin_submit(&ready_session()).unwrap();
        screen.hard_restart();
        assert_eq!(screen.current(), Screen::Reviewing);
    }

    #[test]
    fn test_history_screen() {
        let mut screen = ScreenController::new();
        screen.open_history().unwrap();
        assert_eq!(screen.current(), Screen::History);
        assert!(screen.begin_capture(PhotoRole::Vehicle).is_err());
        screen.close_history().unwrap();
        assert_eq!(screen.current(), Screen::Reviewing);
        assert!(screen.close_history().is_err());
    }
}
