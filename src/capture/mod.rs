//! カメラ撮影
//!
//! ライブストリームの取得・1フレーム撮影・解放を管理する。
//! ストリームは同時に1本まで。撮影に成功したらすぐ解放する。

mod snapshot;

pub use snapshot::HttpSnapshotCamera;

use crate::config::Config;
use crate::error::{CropCareError, Result};
use crate::source::CapturedImage;
use async_trait::async_trait;
use image::RgbaImage;
use tracing::{debug, info, warn};

/// カメラの向き（既定は背面）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    #[default]
    Environment,
    User,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

/// 取得済みのライブストリーム
#[async_trait]
pub trait MediaStream: Send {
    /// ネイティブ解像度
    fn resolution(&self) -> (u32, u32);

    async fn grab_frame(&mut self) -> Result<RgbaImage>;

    /// デバイスを解放する（複数回呼んでもよい）
    fn stop(&mut self);
}

/// カメラデバイスの取得口
#[async_trait]
pub trait CameraBackend: Send + Sync {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>>;
}

/// カメラ未設定
pub struct NoCamera;

#[async_trait]
impl CameraBackend for NoCamera {
    async fn acquire(&self, _facing: FacingMode) -> Result<Box<dyn MediaStream>> {
        Err(CropCareError::CaptureUnavailable(
            "カメラURLが設定されていません".to_string(),
        ))
    }
}

/// 設定からバックエンドを選ぶ
pub fn backend_from_config(config: &Config) -> Result<Box<dyn CameraBackend>> {
    match &config.camera_url {
        Some(url) => Ok(Box::new(HttpSnapshotCamera::new(url, config.timeout_seconds)?)),
        None => Ok(Box::new(NoCamera)),
    }
}

/// 撮影セッション
pub struct CaptureSession {
    backend: Box<dyn CameraBackend>,
    facing: FacingMode,
    stream: Option<Box<dyn MediaStream>>,
}

impl CaptureSession {
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            backend,
            facing: FacingMode::default(),
            stream: None,
        }
    }

    pub fn with_facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// ストリームを開く（既に開いていれば何もしない）
    pub async fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            debug!("カメラは既に起動しています");
            return Ok(());
        }

        let stream = self.backend.acquire(self.facing).await.map_err(|e| {
            warn!("カメラの取得に失敗: {}", e);
            match e {
                CropCareError::CaptureUnavailable(_) => e,
                other => CropCareError::CaptureUnavailable(other.to_string()),
            }
        })?;

        let (width, height) = stream.resolution();
        info!(facing = self.facing.as_str(), width, height, "カメラを起動");
        self.stream = Some(stream);
        Ok(())
    }

    /// 現在のフレームを撮影してPNGで返す
    ///
    /// 成功したらストリームを解放する。失敗時はストリームを残す。
    pub async fn capture_frame(&mut self) -> Result<CapturedImage> {
        let stream = self.stream.as_mut().ok_or(CropCareError::NoActiveStream)?;
        let frame = stream.grab_frame().await?;
        let image = CapturedImage::from_frame(&frame)?;
        debug!(width = image.width, height = image.height, "フレームを撮影");
        self.close();
        Ok(image)
    }

    /// ストリームを解放する（冪等）
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("カメラを解放");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
