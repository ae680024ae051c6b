//! セッション状態
//!
//! 撮影済み写真・洗車選択・直近の解析結果・ステータスを保持する。
//! 送信可否は保持せず、問い合わせのたびに再計算する。

use crate::error::{Error, Result};
use crate::types::{
    CaptureLayout, PhotoData, PhotoRole, ResultRecord, StatusMessage, WashMode, WashOption,
    WashSelection, WashType,
};
use serde::Serialize;
use std::collections::BTreeMap;

pub const MSG_MISSING_TWO_PHOTOS: &str = "Veuillez prendre les deux photos";
pub const MSG_MISSING_PHOTOS: &str = "Veuillez prendre toutes les photos";
pub const MSG_MISSING_WASH: &str = "Veuillez sélectionner le type de lavage";

/// 1回の撮影〜送信サイクルの状態
#[derive(Debug, Clone)]
pub struct SessionState {
    layout: CaptureLayout,
    photos: BTreeMap<PhotoRole, PhotoData>,
    selection: WashSelection,
    current_result: Option<ResultRecord>,
    status: Option<StatusMessage>,
}

impl SessionState {
    pub fn new(layout: CaptureLayout, mode: WashMode) -> Self {
        Self {
            layout,
            photos: BTreeMap::new(),
            selection: WashSelection::new(mode),
            current_result: None,
            status: None,
        }
    }

    pub fn layout(&self) -> CaptureLayout {
        self.layout
    }

    // ---------- 写真 ----------

    pub fn photo(&self, role: PhotoRole) -> Option<&PhotoData> {
        self.photos.get(&role)
    }

    pub fn has_photo(&self, role: PhotoRole) -> bool {
        self.photos.contains_key(&role)
    }

    /// スロットを上書き
    pub fn set_photo(&mut self, role: PhotoRole, photo: PhotoData) -> Result<()> {
        if !self.layout.contains(role) {
            return Err(Error::RoleNotInLayout(role));
        }
        self.photos.insert(role, photo);
        Ok(())
    }

    pub fn clear_photo(&mut self, role: PhotoRole) {
        self.photos.remove(&role);
    }

    /// 未撮影の役割（レイアウト順）
    pub fn missing_roles(&self) -> Vec<PhotoRole> {
        self.layout
            .roles()
            .iter()
            .copied()
            .filter(|r| !self.photos.contains_key(r))
            .collect()
    }

    // ---------- 洗車選択 ----------

    pub fn selection(&self) -> &WashSelection {
        &self.selection
    }

    /// 複数選択モードでフラグを反転
    pub fn toggle_wash_option(&mut self, option: WashOption) -> Result<()> {
        match &mut self.selection {
            WashSelection::Multi(options) => {
                options.toggle(option);
                Ok(())
            }
            WashSelection::Single(_) => Err(Error::WashMode(
                "wash options can only be toggled in multi mode".into(),
            )),
        }
    }

    /// 単一選択モードで洗車タイプを上書き（Noneで未選択に戻す）
    pub fn set_wash_type(&mut self, wash_type: Option<WashType>) -> Result<()> {
        match &mut self.selection {
            WashSelection::Single(current) => {
                *current = wash_type;
                Ok(())
            }
            WashSelection::Multi(_) => Err(Error::WashMode(
                "wash type can only be set in single mode".into(),
            )),
        }
    }

    // ---------- 送信可否 ----------

    /// 全スロット撮影済みかつ洗車ラベルが空でないこと
    pub fn is_ready_to_submit(&self) -> bool {
        self.validate().is_ok()
    }

    /// 最初に見つかった不足をメッセージとして返す
    pub fn validate(&self) -> Result<()> {
        if !self.missing_roles().is_empty() {
            let message = if self.layout.roles().len() == 2 {
                MSG_MISSING_TWO_PHOTOS
            } else {
                MSG_MISSING_PHOTOS
            };
            return Err(Error::Validation(message.to_string()));
        }
        if self.selection.label().trim().is_empty() {
            return Err(Error::Validation(MSG_MISSING_WASH.to_string()));
        }
        Ok(())
    }

    /// 送信ペイロードを構築（未完成なら Validation エラー）
    pub fn build_payload(&self, timestamp: impl Into<String>) -> Result<SubmissionPayload> {
        self.validate()?;

        let photos = self
            .photos
            .iter()
            .filter_map(|(role, photo)| {
                self.layout
                    .field_name(*role)
                    .map(|field| (field.to_string(), photo.data_url().to_string()))
            })
            .collect();

        Ok(SubmissionPayload {
            photos,
            wash_type: self.selection.label(),
            wash_options: self.selection.options().copied(),
            timestamp: timestamp.into(),
        })
    }

    // ---------- 解析結果 ----------

    pub fn current_result(&self) -> Option<&ResultRecord> {
        self.current_result.as_ref()
    }

    pub fn set_result(&mut self, record: ResultRecord) {
        self.current_result = Some(record);
    }

    pub fn clear_result(&mut self) {
        self.current_result = None;
    }

    // ---------- ステータス ----------

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    // ---------- リセット ----------

    /// 写真・選択・解析結果をクリア
    pub fn reset(&mut self) {
        self.photos.clear();
        self.selection.clear();
        self.current_result = None;
    }

    /// reset() に加えてステータスもクリア
    pub fn full_restart(&mut self) {
        self.reset();
        self.status = None;
    }
}

/// Webhook送信ペイロード（構築後は不変）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[serde(flatten)]
    photos: BTreeMap<String, String>,
    wash_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    wash_options: Option<crate::types::WashOptions>,
    timestamp: String,
}

impl SubmissionPayload {
    pub fn photo_field(&self, field: &str) -> Option<&str> {
        self.photos.get(field).map(String::as_str)
    }

    pub fn wash_type(&self) -> &str {
        &self.wash_type
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> PhotoData {
        PhotoData::from_jpeg(&[0xFF, 0xD8, 0xFF, 0xD9])
    }

    #[test]
    fn test_ready_requires_all_slots_and_label_single() {
        // 写真の有無 × 洗車選択の有無 の全組み合わせ
        for vehicle in [false, true] {
            for plate in [false, true] {
                for wash in [None, Some(WashType::Exterieur)] {
                    let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
                    if vehicle {
                        session.set_photo(PhotoRole::Vehicle, photo()).unwrap();
                    }
                    if plate {
                        session.set_photo(PhotoRole::Plate, photo()).unwrap();
                    }
                    session.set_wash_type(wash).unwrap();

                    let expected = vehicle && plate && wash.is_some();
                    assert_eq!(
                        session.is_ready_to_submit(),
                        expected,
                        "vehicle={} plate={} wash={:?}",
                        vehicle,
                        plate,
                        wash
                    );
                }
            }
        }
    }

    #[test]
    fn test_ready_requires_all_slots_and_label_multi() {
        let roles = CaptureLayout::FrontRearPlate.roles();
        for mask in 0u8..8 {
            for flags in 0u8..8 {
                let mut session = SessionState::new(CaptureLayout::FrontRearPlate, WashMode::Multi);
                for (i, role) in roles.iter().enumerate() {
                    if mask & (1 << i) != 0 {
                        session.set_photo(*role, photo()).unwrap();
                    }
                }
                for (i, option) in WashOption::ALL.iter().enumerate() {
                    if flags & (1 << i) != 0 {
                        session.toggle_wash_option(*option).unwrap();
                    }
                }

                let expected = mask == 0b111 && flags != 0;
                assert_eq!(session.is_ready_to_submit(), expected, "mask={:03b} flags={:03b}", mask, flags);
            }
        }
    }

    #[test]
    fn test_readiness_recomputed_after_mutation() {
        let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        session.set_photo(PhotoRole::Vehicle, photo()).unwrap();
        session.set_photo(PhotoRole::Plate, photo()).unwrap();
        session.set_wash_type(Some(WashType::Complet)).unwrap();
        assert!(session.is_ready_to_submit());

        session.clear_photo(PhotoRole::Plate);
        assert!(!session.is_ready_to_submit());

        session.set_photo(PhotoRole::Plate, photo()).unwrap();
        session.set_wash_type(None).unwrap();
        assert!(!session.is_ready_to_submit());
    }

    #[test]
    fn test_validation_messages() {
        let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        match session.validate() {
            Err(Error::Validation(msg)) => assert_eq!(msg, MSG_MISSING_TWO_PHOTOS),
            other => panic!("unexpected: {:?}", other),
        }

        session.set_photo(PhotoRole::Vehicle, photo()).unwrap();
        session.set_photo(PhotoRole::Plate, photo()).unwrap();
        match session.validate() {
            Err(Error::Validation(msg)) => assert_eq!(msg, MSG_MISSING_WASH),
            other => panic!("unexpected: {:?}", other),
        }

        let session = SessionState::new(CaptureLayout::FrontRearPlate, WashMode::Single);
        match session.validate() {
            Err(Error::Validation(msg)) => assert_eq!(msg, MSG_MISSING_PHOTOS),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_set_photo_rejects_foreign_role() {
        let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        let result = session.set_photo(PhotoRole::Rear, photo());
        assert!(matches!(result, Err(Error::RoleNotInLayout(PhotoRole::Rear))));
        assert!(!session.has_photo(PhotoRole::Rear));
    }

    #[test]
    fn test_wash_mode_mismatch() {
        let mut single = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        assert!(matches!(single.toggle_wash_option(WashOption::Wax), Err(Error::WashMode(_))));

        let mut multi = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Multi);
        assert!(matches!(multi.set_wash_type(Some(WashType::Complet)), Err(Error::WashMode(_))));
    }

    #[test]
    fn test_build_payload_single() {
        let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        session.set_photo(PhotoRole::Vehicle, photo()).unwrap();
        session.set_photo(PhotoRole::Plate, photo()).unwrap();
        session.set_wash_type(Some(WashType::Exterieur)).unwrap();

        let payload = session.build_payload("2026-01-18T10:00:00.000Z").unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["washType"], "Extérieur");
        assert_eq!(json["timestamp"], "2026-01-18T10:00:00.000Z");
        assert!(json["image1"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
        assert!(json["image2"].is_string());
        assert!(json.get("washOptions").is_none());
    }

    #[test]
    fn test_build_payload_multi_includes_options() {
        let mut session = SessionState::new(CaptureLayout::FrontRearPlate, WashMode::Multi);
        for role in CaptureLayout::FrontRearPlate.roles() {
            session.set_photo(*role, photo()).unwrap();
        }
        session.toggle_wash_option(WashOption::Interior).unwrap();
        session.toggle_wash_option(WashOption::Wax).unwrap();

        let payload = session.build_payload("t").unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["washType"], "Intérieur + Cire");
        assert_eq!(json["washOptions"]["interior"], true);
        assert_eq!(json["washOptions"]["exterior"], false);
        assert!(json["photoFront"].is_string());
        assert!(json["photoRear"].is_string());
        assert!(json["photoPlate"].is_string());
    }

    #[test]
    fn test_build_payload_rejected_when_incomplete() {
        let session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Single);
        assert!(matches!(session.build_payload("t"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_reset_clears_everything_but_status() {
        let mut session = SessionState::new(CaptureLayout::VehiclePlate, WashMode::Multi);
        session.set_photo(PhotoRole::Vehicle, photo()).unwrap();
        session.set_photo(PhotoRole::Plate, photo()).unwrap();
        session.toggle_wash_option(WashOption::Exterior).unwrap();
        let record = serde_json::from_str::<ResultRecord>(r#"{"Categorie":"SUV"}"#).unwrap();
        session.set_result(record);
        session.set_status(StatusMessage::error("x"));

        session.reset();
        assert!(session.photo(PhotoRole::Vehicle).is_none());
        assert!(session.photo(PhotoRole::Plate).is_none());
        assert_eq!(session.selection().label(), "");
        assert!(session.current_result().is_none());
        assert!(!session.is_ready_to_submit());
        assert!(session.status().is_some());

        session.full_restart();
        assert!(session.status().is_none());
    }
}
