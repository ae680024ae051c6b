//! Webhook連携モジュール
//!
//! 送信・承認・履歴の3つのエンドポイントへJSONをPOSTする唯一のネットワーク境界。
//! リトライはしない。レスポンスの判定は lavage_common::classify_response に任せる。

use crate::config::{Config, HistoryFetch};
use crate::error::{LavageError, Result};
use lavage_common::{
    classify_response, parse_history_body, HistoryItem, ResultRecord, SchemaPolicy,
    SubmissionPayload, WebhookOutcome,
};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// 送信先エンドポイント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Submit,
    Approve,
    History,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Submit => "submit",
            Endpoint::Approve => "approve",
            Endpoint::History => "history",
        }
    }
}

/// HTTP応答（ステータスと本文）
#[derive(Debug, Clone)]
struct RawReply {
    status: u16,
    body: String,
}

#[derive(Debug, Clone)]
pub struct WebhookGateway {
    client: Client,
    submit_url: Option<String>,
    approve_url: Option<String>,
    history_url: Option<String>,
    history_fetch: HistoryFetch,
    schema_policy: SchemaPolicy,
}

impl WebhookGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LavageError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            client,
            submit_url: config.submit_url.clone(),
            approve_url: config.approve_url.clone(),
            history_url: config.history_url.clone(),
            history_fetch: config.history_fetch,
            schema_policy: config.schema_policy,
        })
    }

    /// エンドポイントのURL（未設定なら MissingEndpoint）
    pub fn url(&self, endpoint: Endpoint) -> Result<&str> {
        let url = match endpoint {
            Endpoint::Submit => &self.submit_url,
            Endpoint::Approve => &self.approve_url,
            Endpoint::History => &self.history_url,
        };
        url.as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(LavageError::MissingEndpoint(endpoint.name()))
    }

    /// JSONをPOSTしてステータスと本文を返す（通信失敗は Transport）
    async fn post_raw<B: Serialize + ?Sized>(&self, endpoint: Endpoint, body: &B) -> Result<RawReply> {
        let url = self.url(endpoint)?;
        tracing::debug!(endpoint = endpoint.name(), %url, "POST webhook");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| LavageError::Transport(e.to_string()))?;

        read_reply(endpoint, response).await
    }

    async fn get_raw(&self, endpoint: Endpoint) -> Result<RawReply> {
        let url = self.url(endpoint)?;
        tracing::debug!(endpoint = endpoint.name(), %url, "GET webhook");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LavageError::Transport(e.to_string()))?;

        read_reply(endpoint, response).await
    }

    /// 1回POSTしてレスポンスを正規化
    ///
    /// エンドポイント未設定のみ Err。通信失敗・HTTPエラーは WebhookOutcome で返す
    pub async fn send<B: Serialize + ?Sized>(&self, endpoint: Endpoint, payload: &B) -> Result<WebhookOutcome> {
        match self.post_raw(endpoint, payload).await {
            Ok(reply) => {
                let outcome = classify_response(reply.status, &reply.body, self.schema_policy);
                tracing::debug!(endpoint = endpoint.name(), status = reply.status, ?outcome, "webhook classified");
                Ok(outcome)
            }
            Err(LavageError::Transport(reason)) => {
                tracing::warn!(endpoint = endpoint.name(), %reason, "webhook transport failure");
                Ok(WebhookOutcome::TransportFailure(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// 写真と洗車選択を送信
    pub async fn submit(&self, payload: &SubmissionPayload) -> Result<WebhookOutcome> {
        self.send(Endpoint::Submit, payload).await
    }

    /// 解析結果をそのまま送り返して承認（2xxなら成功、本文は無視）
    pub async fn approve(&self, record: &ResultRecord) -> Result<()> {
        let reply = self.post_raw(Endpoint::Approve, record).await?;
        ensure_success(&reply)
    }

    /// 履歴を全件取得
    pub async fn fetch_history(&self) -> Result<Vec<HistoryItem>> {
        let reply = match self.history_fetch {
            HistoryFetch::Get => self.get_raw(Endpoint::History).await?,
            HistoryFetch::Post => {
                self.post_raw(Endpoint::History, &json!({ "action": "fetch" })).await?
            }
        };
        ensure_success(&reply)?;
        Ok(parse_history_body(&reply.body)?)
    }

    /// 履歴1件の削除を依頼（2xxなら成功）
    pub async fn delete_history(&self, item: &HistoryItem) -> Result<()> {
        let body = json!({ "action": "delete", "item": item });
        match self.post_raw(Endpoint::History, &body).await {
            Ok(reply) => ensure_success(&reply)
                .map_err(|_| LavageError::DeleteFailure(format!("HTTP {}", reply.status))),
            Err(LavageError::Transport(reason)) => Err(LavageError::DeleteFailure(reason)),
            Err(e) => Err(e),
        }
    }
}

async fn read_reply(endpoint: Endpoint, response: reqwest::Response) -> Result<RawReply> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| LavageError::Transport(e.to_string()))?;
    tracing::debug!(endpoint = endpoint.name(), status, bytes = body.len(), "webhook replied");
    Ok(RawReply { status, body })
}

fn ensure_success(reply: &RawReply) -> Result<()> {
    if (200..300).contains(&reply.status) {
        Ok(())
    } else {
        Err(LavageError::HttpStatus(reply.status))
    }
}
