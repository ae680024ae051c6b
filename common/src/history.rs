//! 洗車履歴リスト
//!
//! リモートから取得した履歴の全件コピーを保持し、
//! 絞り込み（部分一致）と同定キーによる削除を提供する。

use crate::error::{Error, Result};
use crate::types::{HistoryItem, HistoryKey};
use serde_json::Value;

pub const MSG_EMPTY_HISTORY: &str = "Aucun historique";
pub const MSG_DELETE_FAILED: &str = "Erreur lors de la suppression. Veuillez réessayer.";

#[derive(Debug, Clone, Default)]
pub struct HistoryList {
    items: Vec<HistoryItem>,
}

impl HistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得結果で全件置き換え
    pub fn replace(&mut self, items: Vec<HistoryItem>) {
        self.items = items;
    }

    /// 取得失敗時は空にする
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 大文字小文字を区別しない部分一致（ナンバー・カテゴリ・洗車タイプ）
    ///
    /// 空文字は全件を返す。保持しているリストは変更しない
    pub fn filter(&self, term: &str) -> Vec<&HistoryItem> {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return self.items.iter().collect();
        }
        self.items
            .iter()
            .filter(|item| {
                [item.plate(), item.category(), item.wash_type()]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn position(&self, key: &HistoryKey) -> Option<usize> {
        self.items.iter().position(|item| &item.key() == key)
    }

    /// キーが一致する最初の1件を削除（残りの順序は維持）
    pub fn remove(&mut self, key: &HistoryKey) -> Option<HistoryItem> {
        self.position(key).map(|index| self.items.remove(index))
    }
}

/// 履歴レスポンスをパース
///
/// 受け付ける形状:
/// - `[ {...}, ... ]`
/// - `{ "data": [ {...}, ... ] }`
///
/// オブジェクト以外の要素は読み飛ばす
pub fn parse_history_body(body: &str) -> Result<Vec<HistoryItem>> {
    let value: Value = serde_json::from_str(body.trim())?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(Error::Parse("history object has no data array".into())),
        },
        _ => return Err(Error::Parse("history response is neither array nor object".into())),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(HistoryItem::new(map)),
            _ => None,
        })
        .collect())
}
