//! スプールフォルダ型カメラ
//!
//! IPカメラやテザリングツールがスナップショットを書き込むフォルダを監視し、
//! 最も新しい画像を「現在のフレーム」として扱う。

use super::{is_image_extension, CameraDevice, CameraError, CaptureConstraints, VideoTrack};
use image::DynamicImage;
use lavage_common::PhotoRole;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct SpoolCamera {
    dir: PathBuf,
}

impl SpoolCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CameraDevice for SpoolCamera {
    fn acquire(
        &self,
        role: PhotoRole,
        _constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoTrack>, CameraError> {
        if let Err(e) = std::fs::read_dir(&self.dir) {
            return Err(match e.kind() {
                ErrorKind::PermissionDenied => {
                    CameraError::PermissionDenied(self.dir.display().to_string())
                }
                _ => CameraError::Unavailable(format!("{}: {}", self.dir.display(), e)),
            });
        }

        tracing::debug!(%role, dir = %self.dir.display(), "spool camera opened");
        Ok(Box::new(SpoolTrack { dir: self.dir.clone(), stopped: false }))
    }
}

struct SpoolTrack {
    dir: PathBuf,
    stopped: bool,
}

impl VideoTrack for SpoolTrack {
    fn current_frame(&mut self) -> Result<DynamicImage, CameraError> {
        if self.stopped {
            return Err(CameraError::Frame("track stopped".into()));
        }

        let latest = latest_image(&self.dir)
            .ok_or_else(|| CameraError::Frame(format!("画像がありません: {}", self.dir.display())))?;

        image::open(&latest).map_err(|e| CameraError::Frame(format!("{}: {}", latest.display(), e)))
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// フォルダ直下で最も更新日時が新しい画像
pub fn latest_image(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .max_depth(1) // 直下のみ
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, e.into_path()))
        })
        // 同時刻ならファイル名が大きい方
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
}
