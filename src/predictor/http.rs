use super::{ensure_not_empty, Predictor};
use crate::error::{CropCareError, Result};
use crate::source::{ImageEncoding, ResolvedImage};
use async_trait::async_trait;
use cropcare_common::{parse_prediction_response, PredictionResult};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

/// multipart で画像を送るフィールド名
pub const IMAGE_FIELD: &str = "image";

/// 送信時のファイル名
pub const UPLOAD_FILE_NAME: &str = "upload.png";

/// HTTP予測サービス
pub struct HttpPredictor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CropCareError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn predict(&self, image: &ResolvedImage) -> Result<PredictionResult> {
        ensure_not_empty(image)?;

        // サービスはPNGのみ受け付ける
        let png = image.to_png()?;
        let part = Part::bytes(png.into_owned())
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(ImageEncoding::Png.mime_type())
            .map_err(|e| CropCareError::ServiceUnavailable(e.to_string()))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        info!(endpoint = %self.endpoint, bytes = image.bytes().len(), "予測リクエスト送信");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("予測サービスに接続できません: {}", e);
                CropCareError::ServiceUnavailable(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CropCareError::ServiceUnavailable(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "予測レスポンス受信");

        if !status.is_success() {
            warn!("予測サービスがエラーを返しました: HTTP {}", status);
            let detail = match parse_prediction_response(&body) {
                Err(cropcare_common::Error::Service(message)) => message,
                _ => body.chars().take(200).collect(),
            };
            return Err(CropCareError::ServiceUnavailable(format!("HTTP {}: {}", status, detail)));
        }

        parse_prediction_response(&body).map_err(|e| {
            warn!("予測レスポンスを解釈できません: {}", e);
            CropCareError::ServiceUnavailable(e.to_string())
        })
    }
}
