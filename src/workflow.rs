//! 撮影ビューのフロー
//!
//! 画像選択 → 予測 → ScanResult 組み立て → 引き継ぎ書き込み。
//! 予測に失敗しても選択中の画像は残り、そのまま再試行できる。

use crate::capture::CaptureSession;
use crate::error::{CropCareError, Result};
use crate::predictor::Predictor;
use crate::session::{SessionStore, SCAN_RESULT_KEY};
use crate::source::{ImageSlot, ImageSource, ResolvedImage};
use chrono::Utc;
use cropcare_common::ScanResult;
use tracing::{info, warn};

pub struct ScanWorkflow {
    slot: ImageSlot,
    predictor: Box<dyn Predictor>,
    session: SessionStore,
}

impl ScanWorkflow {
    pub fn new(predictor: Box<dyn Predictor>, session: SessionStore) -> Self {
        Self {
            slot: ImageSlot::new(),
            predictor,
            session,
        }
    }

    /// ファイルまたは撮影画像を選択する
    pub fn select(&mut self, source: ImageSource) -> Result<&ResolvedImage> {
        self.slot.select(source)
    }

    /// カメラで1枚撮影して選択する（撮影後カメラは解放される）
    pub async fn capture(&mut self, camera: &mut CaptureSession) -> Result<&ResolvedImage> {
        camera.open().await?;
        let image = camera.capture_frame().await?;
        self.slot.select(ImageSource::Captured(image))
    }

    pub fn current_image(&self) -> Option<&ResolvedImage> {
        self.slot.current()
    }

    pub fn predictor_name(&self) -> &'static str {
        self.predictor.name()
    }

    /// 選択中の画像をスキャンし、引き継ぎレコードを書き込む
    pub async fn scan(&mut self) -> Result<ScanResult> {
        let image = self.slot.current().ok_or(CropCareError::NoImageSelected)?;
        let prediction = self.predictor.predict(image).await?;

        let scan = ScanResult::assemble(prediction, image.data_uri.clone(), Utc::now().to_rfc3339());
        // 書き込みに失敗しても画像は選択されたまま
        self.session.set(SCAN_RESULT_KEY, &scan).map_err(|e| {
            warn!("引き継ぎレコードを書き込めません: {}", e);
            CropCareError::HandoffWriteFailed(e.to_string())
        })?;
        info!(
            crop = %scan.record.crop,
            disease = %scan.record.disease,
            confidence = scan.confidence,
            state = scan.state().label(),
            "スキャン結果を保存"
        );
        Ok(scan)
    }
}
