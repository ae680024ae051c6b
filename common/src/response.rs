//! Webhookレスポンスの正規化
//!
//! 送信先サービスは JSON配列 / JSONオブジェクト / プレーンテキスト を返しうる。
//! ここで一度だけ判定し、呼び出し側は WebhookOutcome を網羅的に match する。

use crate::types::ResultRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MSG_UNEXPECTED_RESPONSE: &str = "Réponse inattendue du serveur.";
pub const MSG_TRANSPORT: &str = "Erreur de connexion. Veuillez réessayer.";
pub const MSG_HTTP: &str = "Erreur d'envoi. Veuillez réessayer.";

/// 構造化レコードに付与されるスキーマタグ
pub const RESULT_SCHEMA_TAG: &str = "lavage.result/v1";
const SCHEMA_FIELD: &str = "schema";

/// 構造化レコードの判定ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaPolicy {
    /// カテゴリが空でなければ構造化レコードとみなす
    #[default]
    Lenient,
    /// カテゴリに加えて `schema` タグを必須とする
    RequireTag,
}

/// 送信結果
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// 解析結果レコード
    Structured(ResultRecord),
    /// サーバーからのテキストメッセージ（そのまま表示）
    ServerMessage(String),
    /// 想定外のJSON形状
    UnexpectedShape,
    /// 2xx以外のステータス
    HttpStatus(u16),
    /// 通信失敗
    TransportFailure(String),
}

impl WebhookOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WebhookOutcome::Structured(_))
    }

    pub fn record(&self) -> Option<&ResultRecord> {
        match self {
            WebhookOutcome::Structured(record) => Some(record),
            _ => None,
        }
    }

    /// エラー画面に表示するメッセージ（成功時はNone）
    pub fn error_message(&self) -> Option<String> {
        match self {
            WebhookOutcome::Structured(_) => None,
            WebhookOutcome::ServerMessage(text) => Some(text.clone()),
            WebhookOutcome::UnexpectedShape => Some(MSG_UNEXPECTED_RESPONSE.to_string()),
            WebhookOutcome::HttpStatus(_) => Some(MSG_HTTP.to_string()),
            WebhookOutcome::TransportFailure(_) => Some(MSG_TRANSPORT.to_string()),
        }
    }
}

/// HTTPステータスとレスポンス本文から WebhookOutcome を判定
///
/// 判定順:
/// 1. 2xx以外 → HttpStatus
/// 2. JSONとして読めない本文 → 本文そのままの ServerMessage（空本文は UnexpectedShape）
/// 3. JSON文字列 → ServerMessage
/// 4. 先頭要素がカテゴリ付きオブジェクトの配列 → Structured
/// 5. それ以外のJSON → UnexpectedShape
///
/// 通信失敗（TransportFailure）はHTTPクライアント側で判定する
pub fn classify_response(status: u16, body: &str, policy: SchemaPolicy) -> WebhookOutcome {
    if !(200..300).contains(&status) {
        return WebhookOutcome::HttpStatus(status);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return WebhookOutcome::UnexpectedShape;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return WebhookOutcome::ServerMessage(body.to_string()),
    };

    match value {
        Value::String(text) => WebhookOutcome::ServerMessage(text),
        Value::Array(mut items) if !items.is_empty() => match items.swap_remove(0) {
            Value::Object(map) => {
                if !schema_accepted(map.get(SCHEMA_FIELD), policy) {
                    return WebhookOutcome::UnexpectedShape;
                }
                ResultRecord::from_object(map)
                    .map(WebhookOutcome::Structured)
                    .unwrap_or(WebhookOutcome::UnexpectedShape)
            }
            _ => WebhookOutcome::UnexpectedShape,
        },
        _ => WebhookOutcome::UnexpectedShape,
    }
}

fn schema_accepted(tag: Option<&Value>, policy: SchemaPolicy) -> bool {
    match (tag, policy) {
        (Some(Value::String(t)), _) => t == RESULT_SCHEMA_TAG,
        (Some(_), _) => false,
        (None, SchemaPolicy::Lenient) => true,
        (None, SchemaPolicy::RequireTag) => false,
    }
}
