//! 引き継ぎレコードの組み立て
//!
//! 予測結果 + 解決済み病害レコード + 画像 + 日時 + 派生フラグを
//! 1つの自己完結した ScanResult にまとめる。

use crate::catalog::resolve_record;
use crate::classifier::{classify, is_uncertain, ClassifierInput, ConfidenceState};
use crate::types::{PredictionResult, ScanResult};

impl ScanResult {
    /// 予測結果から引き継ぎレコードを作る
    ///
    /// 作物名・病名はレポートの表示名を優先する（曖昧時の "A / B" を保持するため）
    pub fn assemble(prediction: PredictionResult, image_uri: String, scan_date: String) -> Self {
        let mut record = resolve_record(&prediction);
        if !prediction.report.crop.is_empty() {
            record.crop = prediction.report.crop.clone();
        }
        if !prediction.report.disease.is_empty() {
            record.disease = prediction.report.disease.clone();
        }

        ScanResult {
            id: prediction.id,
            confidence: prediction.confidence,
            uncertain: is_uncertain(prediction.confidence),
            ambiguous: prediction.report.ambiguous,
            record,
            report: prediction.report,
            alternatives: prediction.alternatives,
            image: image_uri,
            scan_date,
        }
    }

    /// 表示状態
    pub fn state(&self) -> ConfidenceState {
        classify(&ClassifierInput::from_scan(self))
    }
}
