//! 予測クライアント
//!
//! 正規化済み画像を予測サービスに送り、型付きの PredictionResult を返す。
//! 1回の呼び出しで1回だけ送信する（自動リトライなし）。

mod http;
mod simulated;

pub use http::HttpPredictor;
pub use simulated::SimulatedPredictor;

use crate::config::Config;
use crate::error::{CropCareError, Result};
use crate::source::ResolvedImage;
use async_trait::async_trait;
use cropcare_common::PredictionResult;

#[async_trait]
pub trait Predictor: Send + Sync {
    /// ログ表示用
    fn name(&self) -> &'static str;

    async fn predict(&self, image: &ResolvedImage) -> Result<PredictionResult>;
}

/// 空の画像は送信前に弾く
pub(crate) fn ensure_not_empty(image: &ResolvedImage) -> Result<()> {
    if image.bytes().is_empty() {
        return Err(CropCareError::EmptyImage);
    }
    Ok(())
}

/// 設定に応じて予測器を選ぶ（`simulate` はこの実行だけの上書き）
pub fn from_config(config: &Config, simulate: bool) -> Result<Box<dyn Predictor>> {
    if simulate || config.simulate {
        Ok(Box::new(SimulatedPredictor::new(config.simulate_delay_ms)))
    } else {
        Ok(Box::new(HttpPredictor::new(&config.endpoint, config.timeout_seconds)?))
    }
}
