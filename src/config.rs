use crate::error::{LavageError, Result};
use lavage_common::{CaptureLayout, SchemaPolicy, WashMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_SUBMIT_URL: &str = "LAVAGE_SUBMIT_URL";
pub const ENV_APPROVE_URL: &str = "LAVAGE_APPROVE_URL";
pub const ENV_HISTORY_URL: &str = "LAVAGE_HISTORY_URL";

/// 履歴取得のHTTPメソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFetch {
    #[default]
    Get,
    /// `POST {"action":"fetch"}`
    Post,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub submit_url: Option<String>,
    pub approve_url: Option<String>,
    pub history_url: Option<String>,
    pub layout: CaptureLayout,
    pub wash_mode: WashMode,
    pub history_fetch: HistoryFetch,
    pub schema_policy: SchemaPolicy,
    /// 価格表示の通貨記号
    pub currency: String,
    /// HTTPタイムアウト（未設定ならクライアント既定）
    pub timeout_seconds: Option<u64>,
    /// スプールカメラの監視フォルダ
    pub camera_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            submit_url: None,
            approve_url: None,
            history_url: None,
            layout: CaptureLayout::default(),
            wash_mode: WashMode::default(),
            history_fetch: HistoryFetch::default(),
            schema_policy: SchemaPolicy::default(),
            currency: "DT".into(),
            timeout_seconds: None,
            camera_dir: None,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書き
    pub fn load() -> Result<Self> {
        Ok(Self::load_file()?.with_env_overrides())
    }

    /// 設定ファイルのみ（保存用。環境変数は反映しない）
    pub fn load_file() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LavageError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("lavage").join("config.json"))
    }

    /// 環境変数を優先
    pub fn with_env_overrides(mut self) -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(url) = read(ENV_SUBMIT_URL) {
            self.submit_url = Some(url);
        }
        if let Some(url) = read(ENV_APPROVE_URL) {
            self.approve_url = Some(url);
        }
        if let Some(url) = read(ENV_HISTORY_URL) {
            self.history_url = Some(url);
        }
        self
    }

    /// 3つのWebhookを同じURLにまとめた設定（単一Webhook運用向け）
    pub fn with_single_webhook(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            submit_url: Some(url.clone()),
            approve_url: Some(url.clone()),
            history_url: Some(url),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.currency, "DT");
        assert_eq!(config.layout, CaptureLayout::VehiclePlate);
        assert_eq!(config.wash_mode, WashMode::Single);
        assert_eq!(config.history_fetch, HistoryFetch::Get);
        assert!(config.timeout_seconds.is_none());
        assert!(config.submit_url.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"submit_url":"http://localhost/webhook","layout":"front-rear-plate","wash_mode":"multi"}"#,
        )
        .unwrap();
        assert_eq!(config.submit_url.as_deref(), Some("http://localhost/webhook"));
        assert_eq!(config.layout, CaptureLayout::FrontRearPlate);
        assert_eq!(config.wash_mode, WashMode::Multi);
        assert_eq!(config.currency, "DT");
    }

    #[test]
    fn test_single_webhook() {
        let config = Config::with_single_webhook("http://127.0.0.1:1/hook");
        assert_eq!(config.submit_url, config.approve_url);
        assert_eq!(config.approve_url, config.history_url);
    }
}
