//! 静止画カメラ
//!
//! 役割ごとに固定の画像ファイルをフレームとして返す。
//! ワンショット送信（`submit` コマンド）で使う。

use super::{CameraDevice, CameraError, CaptureConstraints, VideoTrack};
use image::DynamicImage;
use lavage_common::PhotoRole;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct StillCamera {
    frames: HashMap<PhotoRole, PathBuf>,
}

impl StillCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(mut self, role: PhotoRole, path: impl Into<PathBuf>) -> Self {
        self.frames.insert(role, path.into());
        self
    }

    pub fn insert(&mut self, role: PhotoRole, path: impl Into<PathBuf>) {
        self.frames.insert(role, path.into());
    }
}

impl CameraDevice for StillCamera {
    fn acquire(
        &self,
        role: PhotoRole,
        _constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoTrack>, CameraError> {
        let path = self
            .frames
            .get(&role)
            .ok_or_else(|| CameraError::Unavailable(format!("{} の画像が指定されていません", role)))?;

        if !path.is_file() {
            return Err(CameraError::Unavailable(path.display().to_string()));
        }

        Ok(Box::new(StillTrack { path: path.clone(), stopped: false }))
    }
}

struct StillTrack {
    path: PathBuf,
    stopped: bool,
}

impl VideoTrack for StillTrack {
    fn current_frame(&mut self) -> Result<DynamicImage, CameraError> {
        if self.stopped {
            return Err(CameraError::Frame("track stopped".into()));
        }
        image::open(&self.path).map_err(|e| CameraError::Frame(format!("{}: {}", self.path.display(), e)))
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
