//! コンソール表示
//!
//! 各画面の内容を文字列として組み立てる。出力は呼び出し側が行う。

use lavage_common::history::MSG_EMPTY_HISTORY;
use lavage_common::types::format_price;
use lavage_common::{
    HistoryItem, ResultRecord, SessionState, StatusKind, StatusMessage, WashOption, WashSelection,
};
use std::fmt::Write;

/// 確認画面（撮影状況と洗車選択）
pub fn review(session: &SessionState) -> String {
    let mut out = String::new();

    for role in session.layout().roles() {
        let mark = if session.has_photo(*role) { "✔" } else { "·" };
        let _ = writeln!(out, "  {} {:<10} {}", mark, role.label(), role.camera_hint());
    }

    let _ = writeln!(out);
    match session.selection() {
        WashSelection::Single(wash_type) => {
            let label = wash_type.map(|t| t.label()).unwrap_or("(non sélectionné)");
            let _ = writeln!(out, "  Type de lavage: {}", label);
        }
        WashSelection::Multi(options) => {
            let flags: Vec<String> = WashOption::ALL
                .iter()
                .map(|o| format!("[{}] {}", if options.is_set(*o) { "x" } else { " " }, o.label()))
                .collect();
            let _ = writeln!(out, "  Options: {}", flags.join("  "));
        }
    }

    out
}

/// 解析結果カード
pub fn result_card(record: &ResultRecord, currency: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "┌ Résultat");
    let _ = writeln!(out, "│ Catégorie      : {}", record.category());
    let _ = writeln!(out, "│ Type de lavage : {}", record.wash_type());
    let _ = writeln!(out, "│ Matricule      : {}", record.plate());
    let _ = writeln!(out, "│ Prix           : {}", record.price_with_currency(currency));
    let _ = write!(out, "└");
    out
}

/// エラーカード
pub fn error_card(message: &str) -> String {
    format!("✖ {}", message)
}

/// 履歴一覧（0件なら空表示）
pub fn history_table(items: &[&HistoryItem], currency: &str) -> String {
    if items.is_empty() {
        return format!("  {}", MSG_EMPTY_HISTORY);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:>3}  {:<14} {:<12} {:<22} {}",
        "#", "Matricule", "Catégorie", "Type de Lavage", "Prix"
    );
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}  {:<14} {:<12} {:<22} {}",
            i,
            item.plate(),
            item.category(),
            item.wash_type(),
            format_price(&item.price(), currency)
        );
    }
    out.trim_end().to_string()
}

/// ステータス行
pub fn status_line(status: &StatusMessage) -> String {
    match status.kind {
        StatusKind::Success => format!("✅ {}", status.text),
        StatusKind::Error => format!("⚠ {}", status.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavage_common::{CaptureLayout, PhotoData, PhotoRole, WashMode, WashType};
    use serde_json::json;

    #[test]
    fn test_result_card_appends_currency() {
        let record: ResultRecord =
            serde_json::from_value(json!({"Categorie":"SUV","LavageType":"Complet","Plate":"123 TU 4567","Prix":15}))
                .unwrap();
        let card = result_card(&record, "DT");
        assert!(card.contains("SUV"));
        assert!(card.contains("123 TU 4567"));
        assert!(card.contains("15 DT"));
    }

    #[test]
    fn test_result_card_missing_fields_are_blank() {
        let record: ResultRecord = serde_json::from_value(json!({"Categorie":"Berline"})).unwrap();
        let card = result_card(&record, "DT");
        assert!(card.contains("Berline"));
        assert!(!card.contains("DT"));
    }

    #[test]
    fn test_empty_history() {
        assert!(history_table(&[], "DT").contains(MSG_EMPTY_HISTORY));
    }

    #[test]
    fn test_history_rows_are_indexed() {
        let a = HistoryItem::new(json!({"Matricule":"111 TU 1"}).as_object().unwrap().clone());
        let b = HistoryItem::new(json!({"Matricule":"222 TU 2","Prix":"20"}).as_object().unwrap().clone());
        let table = history_table(&[&a, &b], "DT");
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("111 TU 1"));
        assert!(lines[2].contains("20 DT"));
    }

    #[test]
    fn test_review_marks_taken_photos() {
        let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        session.set_photo(PhotoRole::Plate, PhotoData::from_jpeg(&[1])).unwrap();
        session.set_wash_type(Some(WashType::Interieur)).unwrap();

        let text = review(&session);
        assert!(text.contains("✔ Matricule"));
        assert!(text.contains("· Voiture"));
        assert!(text.contains("Intérieur"));
    }

    #[test]
    fn test_status_line() {
        assert!(status_line(&StatusMessage::error("x")).starts_with('⚠'));
        assert!(status_line(&StatusMessage::success("y")).starts_with('✅'));
    }
}
