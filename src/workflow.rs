//! 受付ワークフロー
//!
//! セッション状態・画面遷移・カメラ・Webhook・履歴を1つにまとめ、
//! オペレーター操作（撮影、送信、承認、やり直し、履歴操作）を提供する。
//! どの操作も失敗後は操作可能な画面に戻る。

use crate::camera::{CameraDevice, CaptureSurface, MSG_CAMERA_ACCESS};
use crate::config::Config;
use crate::error::{LavageError, Result};
use crate::gateway::{Endpoint, WebhookGateway};
use chrono::{SecondsFormat, Utc};
use lavage_common::history::{MSG_DELETE_FAILED, MSG_EMPTY_HISTORY};
use lavage_common::response::{MSG_HTTP, MSG_TRANSPORT};
use lavage_common::{
    HistoryItem, HistoryList, PhotoRole, Screen, ScreenController, SessionState, StatusMessage,
    WashOption, WashType, WebhookOutcome,
};

pub const MSG_APPROVED: &str = "Lavage validé avec succès!";
pub const MSG_RESTARTED: &str = "Application redémarrée";

pub struct Workflow {
    session: SessionState,
    screen: ScreenController,
    surface: CaptureSurface,
    gateway: WebhookGateway,
    history: HistoryList,
    currency: String,
}

impl Workflow {
    pub fn new(config: &Config, device: Box<dyn CameraDevice>) -> Result<Self> {
        Ok(Self {
            session: SessionState::new(config.layout, config.wash_mode),
            screen: ScreenController::new(),
            surface: CaptureSurface::new(device),
            gateway: WebhookGateway::new(config)?,
            history: HistoryList::new(),
            currency: config.currency.clone(),
        })
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn screen(&self) -> Screen {
        self.screen.current()
    }

    pub fn history(&self) -> &HistoryList {
        &self.history
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn camera_open(&self) -> bool {
        self.surface.is_open()
    }

    pub fn can_submit(&self) -> bool {
        self.screen.can_submit(&self.session)
    }

    // =============================================
    // 撮影
    // =============================================

    /// カメラを開いて撮影画面へ。失敗時はカメラを閉じて確認画面のまま
    pub fn open_camera(&mut self, role: PhotoRole) -> Result<()> {
        if !self.session.layout().contains(role) {
            return Err(lavage_common::Error::RoleNotInLayout(role).into());
        }
        self.screen.begin_capture(role)?;

        if let Err(e) = self.surface.open(role) {
            tracing::warn!(%role, error = %e, "camera access failed");
            self.surface.close();
            self.screen.cancel_capture()?;
            self.session.set_status(StatusMessage::error(MSG_CAMERA_ACCESS));
            return Err(e.into());
        }
        Ok(())
    }

    /// 現在のフレームを撮影してスロットに保存し、カメラを閉じる
    ///
    /// カメラが開いていなければ何もしない（None）
    pub fn take_photo(&mut self) -> Result<Option<PhotoRole>> {
        let captured = match self.surface.capture() {
            Ok(captured) => captured,
            Err(e) => {
                tracing::warn!(error = %e, "frame capture failed");
                self.close_camera();
                self.session.set_status(StatusMessage::error(MSG_CAMERA_ACCESS));
                return Err(e.into());
            }
        };

        let Some((role, photo)) = captured else {
            return Ok(None);
        };

        if let Err(e) = self.session.set_photo(role, photo) {
            self.close_camera();
            return Err(e.into());
        }
        self.surface.close();
        self.screen.finish_capture()?;
        tracing::info!(%role, "photo captured");
        Ok(Some(role))
    }

    /// カメラを閉じて確認画面へ（何度呼んでもよい）
    pub fn close_camera(&mut self) {
        self.surface.close();
        if matches!(self.screen.current(), Screen::Capturing(_)) {
            // Capturing からの cancel は常に成功する
            let _ = self.screen.cancel_capture();
        }
    }

    /// カメラを開いて即撮影
    pub fn capture(&mut self, role: PhotoRole) -> Result<()> {
        self.open_camera(role)?;
        self.take_photo()?;
        Ok(())
    }

    /// 写真を破棄して撮り直し用にカメラを開く
    pub fn retake(&mut self, role: PhotoRole) -> Result<()> {
        self.session.clear_photo(role);
        self.open_camera(role)
    }

    // =============================================
    // 洗車選択
    // =============================================

    pub fn set_wash_type(&mut self, wash_type: Option<WashType>) -> Result<()> {
        Ok(self.session.set_wash_type(wash_type)?)
    }

    pub fn toggle_wash_option(&mut self, option: WashOption) -> Result<()> {
        Ok(self.session.toggle_wash_option(option)?)
    }

    // =============================================
    // 送信・承認
    // =============================================

    /// 写真と洗車選択を送信し、結果画面へ遷移
    ///
    /// 入力不足は Validation エラー（遷移なし）。
    /// サーバー側の失敗は Ok(outcome) で返し、画面は ResultError になる
    pub async fn submit(&mut self) -> Result<WebhookOutcome> {
        if let Err(e) = self.session.validate() {
            let message = e.to_string();
            self.session.set_status(StatusMessage::error(message.clone()));
            return Err(LavageError::Validation(message));
        }
        self.gateway.url(Endpoint::Submit)?;

        self.screen.begin_submit(&self.session)?;
        self.session.clear_status();

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let payload = self.session.build_payload(timestamp)?;
        tracing::info!(wash_type = payload.wash_type(), "submitting photos");

        let outcome = match self.gateway.submit(&payload).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // 送信前に確認済みのため通常は到達しない
                self.screen.hard_restart();
                return Err(e);
            }
        };

        self.screen.complete_submit(&outcome)?;
        match &outcome {
            WebhookOutcome::Structured(record) => {
                tracing::info!(category = %record.category(), plate = %record.plate(), "submission accepted");
                self.session.set_result(record.clone());
            }
            WebhookOutcome::ServerMessage(_)
            | WebhookOutcome::UnexpectedShape
            | WebhookOutcome::HttpStatus(_)
            | WebhookOutcome::TransportFailure(_) => {
                if let Some(message) = outcome.error_message() {
                    tracing::warn!(%message, "submission rejected");
                    self.session.set_status(StatusMessage::error(message));
                }
            }
        }
        Ok(outcome)
    }

    /// 現在の解析結果を承認
    ///
    /// 成功時はセッションをリセットして確認画面へ戻り、履歴を再取得する。
    /// 失敗時は結果画面に留まる
    pub async fn approve(&mut self) -> Result<()> {
        if self.screen.current() != Screen::ResultSuccess {
            return Err(lavage_common::Error::InvalidTransition {
                screen: self.screen.current(),
                action: "approve",
            }
            .into());
        }
        let Some(record) = self.session.current_result().cloned() else {
            return Err(LavageError::Validation("aucun résultat à valider".into()));
        };

        match self.gateway.approve(&record).await {
            Ok(()) => {
                tracing::info!(plate = %record.plate(), "result approved");
                self.session.reset();
                self.screen.approve_succeeded()?;
                self.session.set_status(StatusMessage::success(MSG_APPROVED));
                self.refresh_history().await;
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    LavageError::Transport(_) => MSG_TRANSPORT,
                    _ => MSG_HTTP,
                };
                tracing::warn!(error = %e, "approval failed");
                self.session.set_status(StatusMessage::error(message));
                Err(e)
            }
        }
    }

    /// 結果画面から確認画面へ（写真・選択・結果を破棄）
    pub fn restart(&mut self) -> Result<()> {
        self.screen.restart()?;
        self.session.reset();
        Ok(())
    }

    /// どの画面からでも初期状態へ
    pub fn hard_restart(&mut self) {
        self.surface.close();
        self.session.full_restart();
        self.screen.hard_restart();
        self.session.set_status(StatusMessage::success(MSG_RESTARTED));
    }

    // =============================================
    // 履歴
    // =============================================

    /// 履歴を取得し直す。失敗時は空リスト（エラー表示はしない）
    pub async fn refresh_history(&mut self) -> usize {
        match self.gateway.fetch_history().await {
            Ok(items) => {
                tracing::debug!(count = items.len(), "history fetched");
                self.history.replace(items);
            }
            Err(e) => {
                tracing::warn!(error = %e, "history fetch failed; showing {}", MSG_EMPTY_HISTORY);
                self.history.clear();
            }
        }
        self.history.len()
    }

    pub async fn open_history(&mut self) -> Result<()> {
        self.screen.open_history()?;
        self.refresh_history().await;
        Ok(())
    }

    pub fn close_history(&mut self) -> Result<()> {
        Ok(self.screen.close_history()?)
    }

    pub fn history_view(&self, term: &str) -> Vec<&HistoryItem> {
        self.history.filter(term)
    }

    /// 絞り込み結果の index 番目を削除
    ///
    /// リモートが成功を返した場合のみ、同定キーでローカルからも取り除く
    pub async fn delete_history(&mut self, term: &str, index: usize) -> Result<HistoryItem> {
        let item = self
            .history
            .filter(term)
            .get(index)
            .map(|item| (*item).clone())
            .ok_or_else(|| LavageError::Validation(format!("index {} hors de la liste", index)))?;

        match self.gateway.delete_history(&item).await {
            Ok(()) => {
                self.history.remove(&item.key());
                tracing::info!(key = %item.key(), "history item deleted");
                Ok(item)
            }
            Err(e) => {
                tracing::warn!(error = %e, "history delete failed");
                self.session.set_status(StatusMessage::error(MSG_DELETE_FAILED));
                Err(match e {
                    LavageError::DeleteFailure(_) => e,
                    other => LavageError::DeleteFailure(other.to_string()),
                })
            }
        }
    }
}
