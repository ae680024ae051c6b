//! 撮影・洗車データの型定義
//!
//! CLIと他のフロントエンドで共有される型:
//! - PhotoRole / CaptureLayout: 写真スロットと送信フィールド名
//! - PhotoData: JPEG画像（Data URL形式）
//! - WashSelection: 洗車タイプ（単一選択）またはオプション（複数選択）
//! - ResultRecord / HistoryItem: Webhookから返されるレコード

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// =============================================
// 写真スロット
// =============================================

/// 写真スロットの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoRole {
    Vehicle,
    Front,
    Rear,
    Plate,
}

impl PhotoRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoRole::Vehicle => "vehicle",
            PhotoRole::Front => "front",
            PhotoRole::Rear => "rear",
            PhotoRole::Plate => "plate",
        }
    }

    /// 画面表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            PhotoRole::Vehicle => "Voiture",
            PhotoRole::Front => "Avant",
            PhotoRole::Rear => "Arrière",
            PhotoRole::Plate => "Matricule",
        }
    }

    /// カメラ起動時にオペレーターへ表示するヒント
    pub fn camera_hint(&self) -> &'static str {
        match self {
            PhotoRole::Vehicle => "Prenez une photo de la voiture",
            PhotoRole::Front => "Prenez une photo de l'avant du véhicule",
            PhotoRole::Rear => "Prenez une photo de l'arrière du véhicule",
            PhotoRole::Plate => "Prenez une photo de la plaque d'immatriculation",
        }
    }
}

impl fmt::Display for PhotoRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vehicle" | "voiture" => Ok(PhotoRole::Vehicle),
            "front" | "avant" => Ok(PhotoRole::Front),
            "rear" | "arriere" | "arrière" => Ok(PhotoRole::Rear),
            "plate" | "matricule" => Ok(PhotoRole::Plate),
            _ => Err(format!("Unknown photo role: {}. Use vehicle, front, rear, or plate", s)),
        }
    }
}

/// 撮影レイアウト（必要な写真スロットと送信フィールド名の組み合わせ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureLayout {
    /// 車両 + ナンバープレート（image1 / image2）
    #[default]
    VehiclePlate,
    /// 前面 + 背面 + ナンバープレート
    FrontRearPlate,
}

impl CaptureLayout {
    /// 送信に必要な役割（表示順）
    pub fn roles(&self) -> &'static [PhotoRole] {
        match self {
            CaptureLayout::VehiclePlate => &[PhotoRole::Vehicle, PhotoRole::Plate],
            CaptureLayout::FrontRearPlate => &[PhotoRole::Front, PhotoRole::Rear, PhotoRole::Plate],
        }
    }

    pub fn contains(&self, role: PhotoRole) -> bool {
        self.roles().contains(&role)
    }

    /// Webhookペイロード上のフィールド名
    pub fn field_name(&self, role: PhotoRole) -> Option<&'static str> {
        match (self, role) {
            (CaptureLayout::VehiclePlate, PhotoRole::Vehicle) => Some("image1"),
            (CaptureLayout::VehiclePlate, PhotoRole::Plate) => Some("image2"),
            (CaptureLayout::FrontRearPlate, PhotoRole::Front) => Some("photoFront"),
            (CaptureLayout::FrontRearPlate, PhotoRole::Rear) => Some("photoRear"),
            (CaptureLayout::FrontRearPlate, PhotoRole::Plate) => Some("photoPlate"),
            _ => None,
        }
    }
}

impl FromStr for CaptureLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vehicle-plate" | "vp" => Ok(CaptureLayout::VehiclePlate),
            "front-rear-plate" | "frp" => Ok(CaptureLayout::FrontRearPlate),
            _ => Err(format!("Unknown layout: {}. Use vehicle-plate or front-rear-plate", s)),
        }
    }
}

/// 撮影済みJPEG画像（`data:image/jpeg;base64,...` 形式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoData {
    data_url: String,
}

impl PhotoData {
    const PREFIX: &'static str = "data:image/jpeg;base64,";

    /// JPEGバイト列からData URLを生成
    pub fn from_jpeg(bytes: &[u8]) -> Self {
        Self {
            data_url: format!("{}{}", Self::PREFIX, STANDARD.encode(bytes)),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Base64部分のみ
    pub fn base64(&self) -> &str {
        &self.data_url[Self::PREFIX.len()..]
    }

    /// デコード後のJPEGバイト列
    pub fn to_jpeg_bytes(&self) -> Vec<u8> {
        STANDARD.decode(self.base64()).unwrap_or_default()
    }
}

// =============================================
// 洗車タイプ・オプション
// =============================================

/// 洗車タイプ（単一選択）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WashType {
    Exterieur,
    Interieur,
    Complet,
}

impl WashType {
    pub const ALL: [WashType; 3] = [WashType::Exterieur, WashType::Interieur, WashType::Complet];

    pub fn label(&self) -> &'static str {
        match self {
            WashType::Exterieur => "Extérieur",
            WashType::Interieur => "Intérieur",
            WashType::Complet => "Complet",
        }
    }
}

impl fmt::Display for WashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WashType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exterieur" | "extérieur" | "exterior" => Ok(WashType::Exterieur),
            "interieur" | "intérieur" | "interior" => Ok(WashType::Interieur),
            "complet" | "full" => Ok(WashType::Complet),
            _ => Err(format!("Unknown wash type: {}. Use exterieur, interieur, or complet", s)),
        }
    }
}

/// 洗車オプション（複数選択の各フラグ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WashOption {
    Exterior,
    Interior,
    Wax,
}

impl WashOption {
    pub const ALL: [WashOption; 3] = [WashOption::Exterior, WashOption::Interior, WashOption::Wax];

    pub fn label(&self) -> &'static str {
        match self {
            WashOption::Exterior => "Extérieur",
            WashOption::Interior => "Intérieur",
            WashOption::Wax => "Cire",
        }
    }
}

impl FromStr for WashOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exterior" | "exterieur" | "extérieur" => Ok(WashOption::Exterior),
            "interior" | "interieur" | "intérieur" => Ok(WashOption::Interior),
            "wax" | "cire" => Ok(WashOption::Wax),
            _ => Err(format!("Unknown wash option: {}. Use exterior, interior, or wax", s)),
        }
    }
}

/// 複数選択時のフラグ一式（`washOptions` としてそのまま送信）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WashOptions {
    pub exterior: bool,
    pub interior: bool,
    pub wax: bool,
}

impl WashOptions {
    pub fn is_set(&self, option: WashOption) -> bool {
        match option {
            WashOption::Exterior => self.exterior,
            WashOption::Interior => self.interior,
            WashOption::Wax => self.wax,
        }
    }

    pub fn toggle(&mut self, option: WashOption) {
        let flag = match option {
            WashOption::Exterior => &mut self.exterior,
            WashOption::Interior => &mut self.interior,
            WashOption::Wax => &mut self.wax,
        };
        *flag = !*flag;
    }

    /// 選択中フラグのラベルを固定順で連結（未選択なら空文字）
    pub fn label(&self) -> String {
        WashOption::ALL
            .iter()
            .filter(|o| self.is_set(**o))
            .map(|o| o.label())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// 洗車選択モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WashMode {
    #[default]
    Single,
    Multi,
}

impl FromStr for WashMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(WashMode::Single),
            "multi" => Ok(WashMode::Multi),
            _ => Err(format!("Unknown wash mode: {}. Use single or multi", s)),
        }
    }
}

/// 洗車の選択状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WashSelection {
    Single(Option<WashType>),
    Multi(WashOptions),
}

impl WashSelection {
    pub fn new(mode: WashMode) -> Self {
        match mode {
            WashMode::Single => WashSelection::Single(None),
            WashMode::Multi => WashSelection::Multi(WashOptions::default()),
        }
    }

    pub fn mode(&self) -> WashMode {
        match self {
            WashSelection::Single(_) => WashMode::Single,
            WashSelection::Multi(_) => WashMode::Multi,
        }
    }

    /// `washType` として送信するラベル（未選択なら空文字）
    pub fn label(&self) -> String {
        match self {
            WashSelection::Single(Some(t)) => t.label().to_string(),
            WashSelection::Single(None) => String::new(),
            WashSelection::Multi(options) => options.label(),
        }
    }

    pub fn options(&self) -> Option<&WashOptions> {
        match self {
            WashSelection::Multi(options) => Some(options),
            WashSelection::Single(_) => None,
        }
    }

    pub fn clear(&mut self) {
        *self = WashSelection::new(self.mode());
    }
}

// =============================================
// Webhookレコード
// =============================================

/// 自由形式のフィールド値を表示用文字列に変換
///
/// 文字列はそのまま、数値・真偽値は文字列化、null/欠落は空文字
pub fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// 解析結果レコード（リモートのオブジェクトを丸ごと保持）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord {
    raw: Map<String, Value>,
}

impl ResultRecord {
    pub const CATEGORY: &'static str = "Categorie";
    pub const WASH_TYPE: &'static str = "LavageType";
    pub const PLATE: &'static str = "Plate";
    pub const PRICE: &'static str = "Prix";

    /// カテゴリが空でないオブジェクトのみ構造化レコードとして受け付ける
    pub fn from_object(raw: Map<String, Value>) -> Option<Self> {
        let record = Self { raw };
        if record.category().trim().is_empty() {
            None
        } else {
            Some(record)
        }
    }

    pub fn category(&self) -> String {
        field_text(self.raw.get(Self::CATEGORY))
    }

    pub fn wash_type(&self) -> String {
        field_text(self.raw.get(Self::WASH_TYPE))
    }

    pub fn plate(&self) -> String {
        field_text(self.raw.get(Self::PLATE))
    }

    pub fn price(&self) -> String {
        field_text(self.raw.get(Self::PRICE))
    }

    /// 通貨記号付きの価格（例: "15 DT"）
    pub fn price_with_currency(&self, currency: &str) -> String {
        format_price(&self.price(), currency)
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// 価格に通貨記号を付与（価格が空なら空文字のまま）
pub fn format_price(price: &str, currency: &str) -> String {
    if price.is_empty() || currency.is_empty() {
        price.to_string()
    } else {
        format!("{} {}", price, currency)
    }
}

/// 洗車履歴の1件（リモートのオブジェクトを丸ごと保持）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryItem {
    raw: Map<String, Value>,
}

impl HistoryItem {
    pub const PLATE: &'static str = "Matricule";
    pub const CATEGORY: &'static str = "Categorie";
    pub const WASH_TYPE: &'static str = "Type de Lavage";
    pub const PRICE: &'static str = "Prix";

    /// 安定キーとして扱うフィールド（優先順）
    const ID_FIELDS: [&'static str; 3] = ["id", "_id", "row_number"];

    pub fn new(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn plate(&self) -> String {
        field_text(self.raw.get(Self::PLATE))
    }

    pub fn category(&self) -> String {
        field_text(self.raw.get(Self::CATEGORY))
    }

    pub fn wash_type(&self) -> String {
        field_text(self.raw.get(Self::WASH_TYPE))
    }

    pub fn price(&self) -> String {
        field_text(self.raw.get(Self::PRICE))
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// 削除時の同定に使う安定キー
    ///
    /// リモートのID系フィールドがあればそれを、なければレコード全体の
    /// SHA-256フィンガープリントを使う
    pub fn key(&self) -> HistoryKey {
        for field in Self::ID_FIELDS {
            match self.raw.get(field) {
                Some(Value::Null) | None => continue,
                Some(value) => return HistoryKey(format!("{}:{}", field, field_text(Some(value)))),
            }
        }
        HistoryKey::fingerprint(&self.raw)
    }
}

/// 履歴レコードの安定キー
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey(String);

impl HistoryKey {
    fn fingerprint(raw: &Map<String, Value>) -> Self {
        use sha2::{Digest, Sha256};

        // serde_json::Map はキー順にシリアライズされるため正規形になる
        let canonical = Value::Object(raw.clone()).to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        HistoryKey(format!("sha256:{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================
// ステータス表示
// =============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// 一時的なステータスメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Error, text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn test_layout_field_names() {
        let layout = CaptureLayout::VehiclePlate;
        assert_eq!(layout.field_name(PhotoRole::Vehicle), Some("image1"));
        assert_eq!(layout.field_name(PhotoRole::Plate), Some("image2"));
        assert_eq!(layout.field_name(PhotoRole::Front), None);

        let layout = CaptureLayout::FrontRearPlate;
        assert_eq!(layout.roles().len(), 3);
        assert_eq!(layout.field_name(PhotoRole::Rear), Some("photoRear"));
    }

    #[test]
    fn test_photo_role_from_str() {
        assert_eq!("voiture".parse::<PhotoRole>().unwrap(), PhotoRole::Vehicle);
        assert_eq!("Matricule".parse::<PhotoRole>().unwrap(), PhotoRole::Plate);
        assert!("roof".parse::<PhotoRole>().is_err());
    }

    #[test]
    fn test_photo_data_url() {
        let photo = PhotoData::from_jpeg(&[0xFF, 0xD8, 0xFF]);
        assert!(photo.data_url().starts_with("data:image/jpeg;base64,"));
        assert_eq!(photo.base64(), "/9j/");
        assert_eq!(photo.to_jpeg_bytes(), vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_wash_options_label_fixed_order() {
        let mut options = WashOptions::default();
        assert_eq!(options.label(), "");

        options.toggle(WashOption::Wax);
        options.toggle(WashOption::Exterior);
        assert_eq!(options.label(), "Extérieur + Cire");

        options.toggle(WashOption::Wax);
        assert_eq!(options.label(), "Extérieur");
    }

    #[test]
    fn test_wash_selection_label() {
        assert_eq!(WashSelection::new(WashMode::Single).label(), "");
        assert_eq!(WashSelection::Single(Some(WashType::Complet)).label(), "Complet");

        let mut selection = WashSelection::Single(Some(WashType::Interieur));
        selection.clear();
        assert_eq!(selection, WashSelection::Single(None));
    }

    #[test]
    fn test_wash_type_from_str() {
        assert_eq!("Extérieur".parse::<WashType>().unwrap(), WashType::Exterieur);
        assert_eq!("complet".parse::<WashType>().unwrap(), WashType::Complet);
        assert!("premium".parse::<WashType>().is_err());
    }

    #[test]
    fn test_result_record_requires_category() {
        let record = ResultRecord::from_object(object(json!({
            "Categorie": "SUV", "LavageType": "Exterieur", "Plate": "123TUN456", "Prix": 15
        })))
        .expect("構造化レコードのはず");
        assert_eq!(record.category(), "SUV");
        assert_eq!(record.plate(), "123TUN456");
        assert_eq!(record.price(), "15");
        assert_eq!(record.price_with_currency("DT"), "15 DT");

        assert!(ResultRecord::from_object(object(json!({"Categorie": ""}))).is_none());
        assert!(ResultRecord::from_object(object(json!({"Plate": "1"}))).is_none());
    }

    #[test]
    fn test_result_record_serializes_verbatim() {
        let raw = object(json!({"Categorie": "Berline", "Prix": "12.5", "extra": [1, 2]}));
        let record = ResultRecord::from_object(raw.clone()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, Value::Object(raw));
    }

    #[test]
    fn test_history_key_prefers_remote_id() {
        let item = HistoryItem::new(object(json!({"row_number": 7, "Matricule": "1TUN2"})));
        assert_eq!(item.key().as_str(), "row_number:7");
    }

    #[test]
    fn test_history_key_fingerprint_stable() {
        let a = HistoryItem::new(object(json!({"Matricule": "1TUN2", "Prix": 10})));
        let b = HistoryItem::new(object(json!({"Prix": 10, "Matricule": "1TUN2"})));
        let c = HistoryItem::new(object(json!({"Matricule": "1TUN3", "Prix": 10})));

        assert!(a.key().as_str().starts_with("sha256:"));
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_field_text() {
        assert_eq!(field_text(Some(&json!("abc"))), "abc");
        assert_eq!(field_text(Some(&json!(15))), "15");
        assert_eq!(field_text(Some(&Value::Null)), "");
        assert_eq!(field_text(None), "");
    }
}
