//! 信頼度分類
//!
//! 予測結果を表示状態（Certain / Uncertain / LowConfidence / Ambiguous）に分類する。
//!
//! 判定は以下の優先順（最初に一致したもの）:
//! 1. サーバーの `low_confidence_warning` → LowConfidence
//! 2. サーバーの `ambiguous` → Ambiguous
//! 3. トップ信頼度 < [`UNCERTAIN_THRESHOLD`] → Uncertain
//! 4. それ以外 → Certain
//!
//! 低信頼度が曖昧より優先される順序は運用上の方針であり、導出された不変条件ではない。

use crate::types::{Alternative, LowConfidenceReason, PredictionResult, ScanResult};
use serde::{Deserialize, Serialize};

/// これ未満のトップ信頼度は Uncertain（固定値、設定不可）
pub const UNCERTAIN_THRESHOLD: f64 = 60.0;

pub const TOP_PREDICTION_LOW_MESSAGE: &str =
    "Confidence below threshold, recommend re-scan or manual review of alternatives.";
pub const TOP_2_TOO_CLOSE_MESSAGE: &str =
    "Top two predictions insufficiently separated, recommend re-scan from different angle.";
pub const LOW_CONFIDENCE_MESSAGE: &str =
    "Low confidence prediction, recommend re-scan or manual review of alternatives.";
pub const AMBIGUOUS_MESSAGE: &str =
    "Multiple diseases of the same crop are plausible, presenting all candidates.";
pub const UNCERTAIN_MESSAGE: &str = "Model is uncertain, showing alternatives.";

/// 表示状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ConfidenceState {
    Certain,
    Uncertain,
    LowConfidence(Option<LowConfidenceReason>),
    Ambiguous,
}

impl ConfidenceState {
    /// 利用者に提示する警告文（Certain は None）
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ConfidenceState::Certain => None,
            ConfidenceState::Uncertain => Some(UNCERTAIN_MESSAGE),
            ConfidenceState::Ambiguous => Some(AMBIGUOUS_MESSAGE),
            ConfidenceState::LowConfidence(reason) => Some(match reason {
                Some(LowConfidenceReason::TopPredictionLow) => TOP_PREDICTION_LOW_MESSAGE,
                Some(LowConfidenceReason::Top2TooClose) => TOP_2_TOO_CLOSE_MESSAGE,
                None => LOW_CONFIDENCE_MESSAGE,
            }),
        }
    }

    /// 治療推奨を確定表示する前に確認ゲートが必要か
    pub fn requires_acknowledgment(&self) -> bool {
        !matches!(self, ConfidenceState::Certain)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceState::Certain => "certain",
            ConfidenceState::Uncertain => "uncertain",
            ConfidenceState::LowConfidence(_) => "low-confidence",
            ConfidenceState::Ambiguous => "ambiguous",
        }
    }
}

/// 分類器への入力
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierInput<'a> {
    /// 0〜100。None は 0 として扱う
    pub top_confidence: Option<f64>,
    pub alternatives: &'a [Alternative],
    pub ambiguous: bool,
    pub low_confidence_warning: bool,
    pub low_confidence_reason: Option<LowConfidenceReason>,
}

impl<'a> ClassifierInput<'a> {
    pub fn from_prediction(prediction: &'a PredictionResult) -> Self {
        Self {
            top_confidence: Some(prediction.confidence),
            alternatives: &prediction.alternatives,
            ambiguous: prediction.report.ambiguous,
            low_confidence_warning: prediction.report.low_confidence_warning,
            low_confidence_reason: prediction.report.low_confidence_reason,
        }
    }

    pub fn from_scan(scan: &'a ScanResult) -> Self {
        Self {
            top_confidence: Some(scan.confidence),
            alternatives: &scan.alternatives,
            ambiguous: scan.ambiguous,
            low_confidence_warning: scan.report.low_confidence_warning,
            low_confidence_reason: scan.report.low_confidence_reason,
        }
    }
}

/// 表示状態を決定する
pub fn classify(input: &ClassifierInput<'_>) -> ConfidenceState {
    if input.low_confidence_warning {
        return ConfidenceState::LowConfidence(input.low_confidence_reason);
    }
    if input.ambiguous {
        return ConfidenceState::Ambiguous;
    }
    if is_uncertain(input.top_confidence.unwrap_or(0.0)) {
        return ConfidenceState::Uncertain;
    }
    ConfidenceState::Certain
}

/// トップ信頼度が閾値未満か
pub fn is_uncertain(top_confidence: f64) -> bool {
    top_confidence < UNCERTAIN_THRESHOLD
}
