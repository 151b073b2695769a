//! 予測クライアントの統合テスト
//!
//! エフェメラルポートで起動した axum サーバーを予測サービスの代わりに使う

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use cropcare_common::{ConfidenceState, LowConfidenceReason};
use cropcare_rust::error::CropCareError;
use cropcare_rust::predictor::{HttpPredictor, Predictor};
use cropcare_rust::session::SessionStore;
use cropcare_rust::source::{CapturedImage, ImageEncoding, ImageSource, ResolvedImage};
use cropcare_rust::view;
use cropcare_rust::workflow::ScanWorkflow;
use image::{Rgba, RgbaImage};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<AtomicUsize>,
    fields: Arc<Mutex<Vec<String>>>,
}

async fn record_fields(seen: &Seen, mut multipart: Multipart) {
    seen.requests.fetch_add(1, Ordering::SeqCst);
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        let magic = if bytes.starts_with(&[0x89, b'P', b'N', b'G']) { "png" } else { "other" };
        seen.fields
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}:{}", name, file_name, content_type, magic));
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/predict", addr)
}

async fn server_returning(status: StatusCode, body: Value) -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route(
            "/api/predict",
            post(move |State(seen): State<Seen>, multipart: Multipart| {
                let body = body.clone();
                async move {
                    record_fields(&seen, multipart).await;
                    (status, Json(body))
                }
            }),
        )
        .with_state(seen.clone());
    (serve(app).await, seen)
}

fn leaf_image() -> ResolvedImage {
    let frame = RgbaImage::from_pixel(12, 12, Rgba([30, 140, 50, 255]));
    let image = CapturedImage::from_frame(&frame).unwrap();
    cropcare_rust::source::resolve(ImageSource::Captured(image)).unwrap()
}

fn late_blight_body() -> Value {
    json!({
        "id": "9f2c",
        "filename": "9f2c_upload.png",
        "label": "Potato___Late_blight",
        "confidence": 88.2,
        "alternatives": [
            {"label": "Potato___Late_blight", "confidence": 88.2},
            {"label": "Potato___Early_blight", "confidence": 6.1}
        ],
        "report": {"crop": "Potato", "disease": "Late blight", "status": "diseased"},
        "image_url": "/uploads/9f2c_upload.png"
    })
}

#[tokio::test]
async fn test_predict_sends_single_image_field() {
    let (endpoint, seen) = server_returning(StatusCode::OK, late_blight_body()).await;
    let predictor = HttpPredictor::new(&endpoint, 5).unwrap();

    let prediction = predictor.predict(&leaf_image()).await.unwrap();

    assert_eq!(prediction.label, "Potato___Late_blight");
    assert_eq!(prediction.confidence, 88.2);
    assert_eq!(prediction.alternatives.len(), 2);
    let fields = seen.fields.lock().unwrap().clone();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0], "image:upload.png:image/png:png");
}

#[tokio::test]
async fn test_jpeg_upload_is_sent_as_png() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("leaf.jpg");
    image::RgbImage::from_pixel(10, 8, image::Rgb([60, 120, 40]))
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .unwrap();
    let jpeg = cropcare_rust::source::resolve(ImageSource::File(path)).unwrap();
    assert_eq!(jpeg.encoding(), ImageEncoding::Jpeg);

    let (endpoint, seen) = server_returning(StatusCode::OK, late_blight_body()).await;
    let predictor = HttpPredictor::new(&endpoint, 5).unwrap();
    predictor.predict(&jpeg).await.unwrap();

    let fields = seen.fields.lock().unwrap().clone();
    assert_eq!(fields, vec!["image:upload.png:image/png:png".to_string()]);
}

#[tokio::test]
async fn test_server_error_is_service_unavailable_without_retry() {
    let (endpoint, seen) = server_returning(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "model not loaded"}),
    )
    .await;
    let predictor = HttpPredictor::new(&endpoint, 5).unwrap();

    let result = predictor.predict(&leaf_image()).await;

    match result {
        Err(CropCareError::ServiceUnavailable(message)) => assert!(message.contains("model not loaded")),
        other => panic!("ServiceUnavailable ではない: {:?}", other),
    }
    assert_eq!(seen.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_body_is_service_unavailable() {
    let (endpoint, _seen) = server_returning(StatusCode::OK, json!({"unexpected": true})).await;
    let predictor = HttpPredictor::new(&endpoint, 5).unwrap();

    let result = predictor.predict(&leaf_image()).await;
    assert!(matches!(result, Err(CropCareError::ServiceUnavailable(_))));
}

#[tokio::test]
async fn test_connection_refused_is_service_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let predictor = HttpPredictor::new(&format!("http://{}/api/predict", addr), 2).unwrap();
    let result = predictor.predict(&leaf_image()).await;
    assert!(matches!(result, Err(CropCareError::ServiceUnavailable(_))));
}

#[tokio::test]
async fn test_empty_image_is_rejected_before_sending() {
    let (endpoint, seen) = server_returning(StatusCode::OK, late_blight_body()).await;
    let predictor = HttpPredictor::new(&endpoint, 5).unwrap();
    let empty = ResolvedImage {
        file_name: "empty.png".to_string(),
        image: CapturedImage {
            bytes: vec![],
            encoding: ImageEncoding::Png,
            width: 0,
            height: 0,
        },
        data_uri: String::new(),
    };

    let result = predictor.predict(&empty).await;
    assert!(matches!(result, Err(CropCareError::EmptyImage)));
    assert_eq!(seen.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_scan_keeps_image_and_writes_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let (endpoint, _seen) = server_returning(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": "busy"}),
    )
    .await;
    let session = SessionStore::new(dir.path());
    let mut workflow = ScanWorkflow::new(
        Box::new(HttpPredictor::new(&endpoint, 5).unwrap()),
        session.clone(),
    );
    let frame = RgbaImage::from_pixel(6, 6, Rgba([1, 2, 3, 255]));
    workflow
        .select(ImageSource::Captured(CapturedImage::from_frame(&frame).unwrap()))
        .unwrap();

    let result = workflow.scan().await;

    assert!(matches!(result, Err(CropCareError::ServiceUnavailable(_))));
    assert_eq!(workflow.current_image().map(|i| i.image.width), Some(6));
    assert!(matches!(view::load(&session), Err(CropCareError::MissingHandoffState)));
}

#[tokio::test]
async fn test_scan_without_image_is_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut workflow = ScanWorkflow::new(
        Box::new(HttpPredictor::new("http://127.0.0.1:9/api/predict", 1).unwrap()),
        SessionStore::new(dir.path()),
    );
    assert!(matches!(workflow.scan().await, Err(CropCareError::NoImageSelected)));
}

#[tokio::test]
async fn test_low_confidence_response_reaches_view_gated() {
    let dir = tempdir().expect("Failed to create temp dir");
    let (endpoint, _seen) = server_returning(
        StatusCode::OK,
        json!({
            "label": "Tomato___Leaf_Mold",
            "confidence": 42.0,
            "alternatives": [
                {"label": "Tomato___Leaf_Mold", "confidence": 42.0},
                {"label": "Tomato___Septoria_leaf_spot", "confidence": 38.5}
            ],
            "report": {
                "crop": "Tomato",
                "disease": "Leaf Mold",
                "low_confidence_warning": true,
                "low_confidence_reason": "top_prediction_low",
                "ambiguous": true
            }
        }),
    )
    .await;
    let session = SessionStore::new(dir.path());
    let mut workflow = ScanWorkflow::new(
        Box::new(HttpPredictor::new(&endpoint, 5).unwrap()),
        session.clone(),
    );
    workflow.select(ImageSource::Captured(leaf_image().image)).unwrap();

    let scan = workflow.scan().await.unwrap();
    assert_eq!(
        scan.state(),
        ConfidenceState::LowConfidence(Some(LowConfidenceReason::TopPredictionLow))
    );
    assert!(scan.image.starts_with("data:image/png;base64,"));

    let handed_off = view::load(&session).unwrap();
    assert_eq!(handed_off.record, scan.record);
    assert_eq!(handed_off.image, scan.image);
    let result_view = cropcare_common::present(&handed_off, 0);
    assert!(result_view.gate.is_some());
    assert!(result_view.ambiguous_panels.is_none());
}
