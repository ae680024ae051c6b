//! カメラ撮影モジュール
//!
//! カメラデバイスから排他的なキャプチャ権限（VideoTrack）を取得し、
//! 現在のフレームをJPEG（品質85）でエンコードして PhotoData を返す。
//! 同時に開ける権限は1つだけで、開いている間の再オープンは拒否する。

mod spool;
mod still;

pub use spool::SpoolCamera;
pub use still::StillCamera;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use lavage_common::{PhotoData, PhotoRole};
use thiserror::Error;

/// JPEG品質 (0-100)
pub const JPEG_QUALITY: u8 = 85;

pub const MSG_CAMERA_ACCESS: &str = "Impossible d'accéder à la caméra. Veuillez autoriser l'accès.";

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("カメラへのアクセスが拒否されました: {0}")]
    PermissionDenied(String),

    #[error("カメラが見つかりません: {0}")]
    Unavailable(String),

    #[error("カメラは既に使用中です ({0})")]
    AlreadyOpen(PhotoRole),

    #[error("フレーム取得エラー: {0}")]
    Frame(String),

    #[error("JPEGエンコードエラー: {0}")]
    Encode(String),
}

/// カメラの向き
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// 背面カメラ
    Environment,
    /// 前面カメラ
    User,
}

/// キャプチャ要求（理想値）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
            audio: false,
        }
    }
}

/// カメラデバイス
pub trait CameraDevice: Send {
    /// キャプチャ権限を取得
    fn acquire(
        &self,
        role: PhotoRole,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoTrack>, CameraError>;
}

/// 取得済みの映像トラック
pub trait VideoTrack: Send {
    fn current_frame(&mut self) -> Result<DynamicImage, CameraError>;

    /// トラックを停止（以降のフレーム取得は失敗する）
    fn stop(&mut self);
}

struct OpenCapability {
    role: PhotoRole,
    track: Box<dyn VideoTrack>,
}

/// 撮影面。キャプチャ権限のライフサイクルを管理する
pub struct CaptureSurface {
    device: Box<dyn CameraDevice>,
    constraints: CaptureConstraints,
    open: Option<OpenCapability>,
}

impl CaptureSurface {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self { device, constraints: CaptureConstraints::default(), open: None }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn active_role(&self) -> Option<PhotoRole> {
        self.open.as_ref().map(|c| c.role)
    }

    /// 指定した役割でカメラを開く。既に開いている場合は拒否（既存の権限はそのまま）
    pub fn open(&mut self, role: PhotoRole) -> Result<(), CameraError> {
        if let Some(current) = &self.open {
            return Err(CameraError::AlreadyOpen(current.role));
        }

        let track = self.device.acquire(role, &self.constraints)?;
        tracing::debug!(%role, "camera capability acquired");
        self.open = Some(OpenCapability { role, track });
        Ok(())
    }

    /// 現在のフレームをJPEG化。カメラが開いていなければ何もしない（None）
    pub fn capture(&mut self) -> Result<Option<(PhotoRole, PhotoData)>, CameraError> {
        let Some(capability) = self.open.as_mut() else {
            return Ok(None);
        };

        let frame = capability.track.current_frame()?;
        let frame = fit_to_constraints(frame, &self.constraints);
        let jpeg = encode_jpeg(&frame, JPEG_QUALITY)?;
        tracing::debug!(
            role = %capability.role,
            width = frame.width(),
            height = frame.height(),
            bytes = jpeg.len(),
            "frame captured"
        );

        Ok(Some((capability.role, PhotoData::from_jpeg(&jpeg))))
    }

    /// カメラを閉じる（全トラック停止）。何度呼んでもよい
    pub fn close(&mut self) {
        if let Some(mut capability) = self.open.take() {
            capability.track.stop();
            tracing::debug!(role = %capability.role, "camera capability released");
        }
    }
}

impl Drop for CaptureSurface {
    fn drop(&mut self) {
        self.close();
    }
}

/// 理想解像度を超えるフレームをアスペクト比を保って縮小
pub fn fit_to_constraints(frame: DynamicImage, constraints: &CaptureConstraints) -> DynamicImage {
    if frame.width() <= constraints.ideal_width && frame.height() <= constraints.ideal_height {
        return frame;
    }
    frame.resize(constraints.ideal_width, constraints.ideal_height, FilterType::Triangle)
}

/// フレームをJPEGエンコード
pub fn encode_jpeg(frame: &DynamicImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let rgb = frame.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&rgb)
        .map_err(|e| CameraError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// 対応する画像拡張子か
pub(crate) fn is_image_extension(ext: &str) -> bool {
    matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png")
}
