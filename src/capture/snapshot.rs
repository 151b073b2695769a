//! HTTPスナップショットカメラ
//!
//! GETで1枚のJPEG/PNGを返すネットワークカメラ（IPカメラ、スマホのカメラアプリ等）。

use super::{CameraBackend, FacingMode, MediaStream};
use crate::error::{CropCareError, Result};
use async_trait::async_trait;
use image::RgbaImage;
use std::time::Duration;
use tracing::debug;

pub struct HttpSnapshotCamera {
    client: reqwest::Client,
    url: String,
}

impl HttpSnapshotCamera {
    pub fn new(url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CropCareError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

async fn fetch_frame(client: &reqwest::Client, url: &str) -> Result<RgbaImage> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CropCareError::CaptureUnavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CropCareError::CaptureUnavailable(format!("HTTP {}", status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CropCareError::CaptureUnavailable(e.to_string()))?;
    let frame = image::load_from_memory(&bytes)
        .map_err(|e| CropCareError::CaptureUnavailable(format!("フレームを解析できません: {}", e)))?;
    Ok(frame.to_rgba8())
}

#[async_trait]
impl CameraBackend for HttpSnapshotCamera {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>> {
        debug!(url = %self.url, facing = facing.as_str(), "スナップショットカメラを確認");
        // 疎通確認を兼ねて1枚取得し、解像度を得る
        let first = fetch_frame(&self.client, &self.url).await?;
        Ok(Box::new(SnapshotStream {
            client: self.client.clone(),
            url: self.url.clone(),
            resolution: first.dimensions(),
            stopped: false,
        }))
    }
}

struct SnapshotStream {
    client: reqwest::Client,
    url: String,
    resolution: (u32, u32),
    stopped: bool,
}

#[async_trait]
impl MediaStream for SnapshotStream {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    async fn grab_frame(&mut self) -> Result<RgbaImage> {
        if self.stopped {
            return Err(CropCareError::NoActiveStream);
        }
        let frame = fetch_frame(&self.client, &self.url).await?;
        self.resolution = frame.dimensions();
        Ok(frame)
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
