//! 予測候補の品質判定
//!
//! 予測サービス側と同じ固定ルールで、トップ候補列から
//! 低信頼度・曖昧フラグを導出する（シミュレーション予測で使用）。

use crate::types::{Alternative, AmbiguousCandidate, ConfidenceQuality, LowConfidenceReason, PredictionReport};

/// これ未満のトップ信頼度は低信頼度
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 50.0;
/// トップ2の差がこれ未満なら低信頼度
pub const CLOSE_CONFIDENCE_GAP: f64 = 15.0;
/// 同一作物のトップ2の差がこれ以下なら曖昧
pub const AMBIGUITY_GAP: f64 = 8.0;
/// これ以上なら品質 good
pub const GOOD_CONFIDENCE: f64 = 70.0;

/// 判定結果
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub low_confidence_reason: Option<LowConfidenceReason>,
    pub quality: ConfidenceQuality,
    /// 曖昧な場合のみ2件
    pub ambiguous_candidates: Vec<AmbiguousCandidate>,
}

impl Assessment {
    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguous_candidates.is_empty()
    }

    /// レポートにフラグを書き込む
    ///
    /// 曖昧な場合は表示用の病名を "A / B" にする
    pub fn apply(self, report: &mut PredictionReport) {
        report.low_confidence_warning = self.low_confidence_reason.is_some();
        report.low_confidence_reason = self.low_confidence_reason;
        report.confidence_quality = Some(self.quality);

        if self.is_ambiguous() {
            report.disease = self
                .ambiguous_candidates
                .iter()
                .map(|c| c.disease.as_str())
                .collect::<Vec<_>>()
                .join(" / ");
            report.ambiguous = true;
            report.ambiguous_candidates = self.ambiguous_candidates;
        }
    }
}

/// 信頼度降順の候補列を判定する
pub fn assess(alternatives: &[Alternative]) -> Assessment {
    let top = alternatives.first().map(|a| a.confidence).unwrap_or(0.0);
    let second = alternatives.get(1);

    let low_confidence_reason = if top < LOW_CONFIDENCE_THRESHOLD {
        Some(LowConfidenceReason::TopPredictionLow)
    } else if second.is_some_and(|s| top - s.confidence < CLOSE_CONFIDENCE_GAP) {
        Some(LowConfidenceReason::Top2TooClose)
    } else {
        None
    };

    let quality = if low_confidence_reason.is_some() {
        ConfidenceQuality::Poor
    } else if top >= GOOD_CONFIDENCE {
        ConfidenceQuality::Good
    } else {
        ConfidenceQuality::Moderate
    };

    let ambiguous_candidates = match (alternatives.first(), second) {
        (Some(first), Some(second))
            if first.crop() == second.crop()
                && (first.confidence - second.confidence).abs() <= AMBIGUITY_GAP =>
        {
            [first, second]
                .iter()
                .map(|alt| AmbiguousCandidate {
                    label: alt.label.clone(),
                    disease: alt.disease(),
                    confidence: alt.confidence,
                })
                .collect()
        }
        _ => Vec::new(),
    };

    Assessment {
        low_confidence_reason,
        quality,
        ambiguous_candidates,
    }
}
