//! 予測APIレスポンスパーサー
//!
//! 予測サービスの緩い型付けJSONを、境界で一度だけ厳密な型に変換する。
//! 以降のコンポーネントは既定値解決済みの PredictionResult だけを扱う。

use crate::error::{Error, Result};
use crate::types::{
    split_label, AmbiguousCandidate, AmbiguousDetail, Alternative, Chemical, ConfidenceQuality,
    CropStatus, LowConfidenceReason, PredictionReport, PredictionResult, ReportDetails,
};
use serde::Deserialize;

/// ワイヤ上のレスポンス（すべて省略可能）
///
/// `filename` / `image_url` / `temperature` / `alternative_reports` は読み捨てる
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WirePrediction {
    id: Option<String>,
    label: Option<String>,
    confidence: Option<f64>,
    alternatives: Option<Vec<WireAlternative>>,
    report: Option<WireReport>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireAlternative {
    label: Option<String>,
    confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireReport {
    crop: Option<String>,
    disease: Option<String>,
    status: Option<String>,
    ambiguous: Option<bool>,
    ambiguous_candidates: Option<Vec<AmbiguousCandidate>>,
    ambiguous_details: Option<Vec<AmbiguousDetail>>,
    low_confidence_warning: Option<bool>,
    low_confidence_reason: Option<String>,
    confidence_quality: Option<String>,
    error: Option<String>,
    #[serde(alias = "scientificName")]
    scientific_name: Option<String>,
    severity: Option<String>,
    #[serde(alias = "affectedArea")]
    affected_area: Option<String>,
    symptoms: Option<Vec<String>>,
    remedy: Option<String>,
    prevention: Option<String>,
    chemicals: Option<Vec<Chemical>>,
    fertilizer: Option<String>,
    #[serde(alias = "organicTreatment")]
    organic_treatment: Option<String>,
    #[serde(alias = "estimatedRecovery")]
    estimated_recovery: Option<String>,
    #[serde(alias = "spreadRisk")]
    spread_risk: Option<String>,
}

/// 信頼度を 0〜100 に丸める（NaN は 0）
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// トップ信頼度を決定する
///
/// `confidence` が正の値ならそれを、無ければ先頭候補の値を、どちらも無ければ 0
pub fn top_confidence(confidence: Option<f64>, alternatives: &[Alternative]) -> f64 {
    confidence
        .filter(|c| c.is_finite() && *c > 0.0)
        .or_else(|| alternatives.first().map(|a| a.confidence))
        .map(clamp_confidence)
        .unwrap_or(0.0)
}

/// 予測レスポンスをパース
///
/// # Returns
/// * `Ok(PredictionResult)` - パース成功（既定値解決済み）
/// * `Err(Error::Service)` - サーバーがエラーを報告した
/// * `Err(Error::Parse)` - JSONとして不正、またはラベルもレポートも無い
///
/// # Examples
/// ```
/// use cropcare_common::parse_prediction_response;
///
/// let body = r#"{"id": "a1", "label": "Tomato___Early_blight", "confidence": 91.5}"#;
/// let prediction = parse_prediction_response(body).unwrap();
/// assert_eq!(prediction.report.crop, "Tomato");
/// assert!(!prediction.report.ambiguous);
/// ```
pub fn parse_prediction_response(body: &str) -> Result<PredictionResult> {
    let wire: WirePrediction = serde_json::from_str(body.trim())
        .map_err(|e| Error::Parse(format!("prediction JSON: {}", e)))?;

    let reported_error = wire
        .error
        .clone()
        .or_else(|| wire.report.as_ref().and_then(|r| r.error.clone()));
    if let Some(message) = reported_error {
        return Err(Error::Service(message));
    }

    let alternatives: Vec<Alternative> = wire
        .alternatives
        .unwrap_or_default()
        .into_iter()
        .filter_map(|alt| {
            let label = alt.label.filter(|l| !l.trim().is_empty())?;
            Some(Alternative {
                label,
                confidence: clamp_confidence(alt.confidence.unwrap_or(0.0)),
            })
        })
        .collect();

    let confidence = top_confidence(wire.confidence, &alternatives);
    let label = wire
        .label
        .filter(|l| !l.trim().is_empty())
        .or_else(|| alternatives.first().map(|a| a.label.clone()))
        .unwrap_or_default();

    if label.is_empty() && wire.report.is_none() {
        return Err(Error::Parse("prediction carries neither label nor report".into()));
    }

    let report = resolve_report(wire.report.unwrap_or_default(), &label);

    Ok(PredictionResult {
        id: wire.id.filter(|id| !id.is_empty()),
        label,
        confidence,
        alternatives,
        report,
    })
}

fn resolve_report(wire: WireReport, label: &str) -> PredictionReport {
    let (label_crop, label_disease) = split_label(label);
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let crop = non_empty(wire.crop).unwrap_or(label_crop);
    let disease = non_empty(wire.disease).unwrap_or(label_disease);
    let status = CropStatus::resolve(wire.status.as_deref(), &format!("{} {}", label, disease));

    let low_confidence_reason = wire
        .low_confidence_reason
        .as_deref()
        .and_then(LowConfidenceReason::from_wire);

    PredictionReport {
        crop,
        disease,
        status,
        ambiguous: wire.ambiguous.unwrap_or(false),
        ambiguous_candidates: wire.ambiguous_candidates.unwrap_or_default(),
        ambiguous_details: wire.ambiguous_details.unwrap_or_default(),
        low_confidence_warning: wire.low_confidence_warning.unwrap_or(false),
        low_confidence_reason,
        confidence_quality: wire
            .confidence_quality
            .as_deref()
            .and_then(ConfidenceQuality::from_wire),
        details: ReportDetails {
            scientific_name: wire.scientific_name,
            severity: wire.severity,
            affected_area: wire.affected_area,
            symptoms: wire.symptoms.unwrap_or_default(),
            remedy: wire.remedy,
            prevention: wire.prevention,
            chemicals: wire.chemicals.unwrap_or_default(),
            fertilizer: wire.fertilizer,
            organic_treatment: wire.organic_treatment,
            estimated_recovery: wire.estimated_recovery,
            spread_risk: wire.spread_risk,
        },
    }
}
