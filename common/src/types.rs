//! 診断結果の型定義
//!
//! CLIと結果ビュー（端末表示・PDF出力）で共有される型:
//! - DiseaseRecord: 参照用の病害レコード（固定カタログ）
//! - PredictionResult: 予測サービスの出力（境界で型付け済み）
//! - ScanResult: 撮影ビューから結果ビューへ引き継ぐ唯一のレコード

use serde::{Deserialize, Serialize};

/// モデルラベルの作物/病名区切り（例: `Tomato___Early_blight`）
pub const LABEL_SEPARATOR: &str = "___";

/// 欠損フィールドの表示文言
pub const NOT_AVAILABLE: &str = "Not available";

/// 作物の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStatus {
    Healthy,
    #[default]
    Diseased,
}

impl CropStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, CropStatus::Healthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CropStatus::Healthy => "healthy",
            CropStatus::Diseased => "diseased",
        }
    }

    /// ワイヤ上のstatus文字列を解決する
    ///
    /// 未指定・不明値の場合はラベル/病名に "healthy" を含むかで判定
    pub fn resolve(status: Option<&str>, hint: &str) -> Self {
        match status.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("healthy") => CropStatus::Healthy,
            Some("diseased") => CropStatus::Diseased,
            _ if hint.to_lowercase().contains("healthy") => CropStatus::Healthy,
            _ => CropStatus::Diseased,
        }
    }
}

/// 推奨薬剤
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chemical {
    pub name: String,
    pub dosage: String,
    pub application: String,
}

/// 病害レコード（参照データ、生成後は変更しない）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiseaseRecord {
    /// カタログ上のID（サーバーレポートから合成したレコードはNone）
    pub catalog_id: Option<u32>,
    pub crop: String,
    pub disease: String,
    pub scientific_name: String,
    pub status: CropStatus,
    pub severity: String,
    pub affected_area: String,
    pub symptoms: Vec<String>,
    pub remedy: String,
    pub prevention: String,
    pub chemicals: Vec<Chemical>,
    pub fertilizer: String,
    pub organic_treatment: String,
    pub estimated_recovery: String,
    pub spread_risk: String,
}

impl DiseaseRecord {
    /// healthy ⇒ 薬剤なし・重症度 "None"
    pub fn is_consistent(&self) -> bool {
        !self.status.is_healthy() || (self.chemicals.is_empty() && self.severity == "None")
    }

    /// 健全レコードの不変条件を強制する
    pub fn with_invariants(mut self) -> Self {
        if self.status.is_healthy() {
            self.chemicals.clear();
            self.severity = "None".to_string();
        }
        self
    }
}

/// 予測候補（`label` はモデル形式 `Crop___Disease`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alternative {
    pub label: String,
    pub confidence: f64,
}

impl Alternative {
    pub fn crop(&self) -> String {
        split_label(&self.label).0
    }

    pub fn disease(&self) -> String {
        split_label(&self.label).1
    }
}

/// 曖昧判定時の候補
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbiguousCandidate {
    pub label: String,
    pub disease: String,
    pub confidence: f64,
}

/// 曖昧判定時の候補ごとの詳細（各テキストは欠損しうる）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbiguousDetail {
    pub label: String,
    pub disease: String,
    pub confidence: f64,
    pub symptoms: Vec<String>,
    pub remedy: Option<String>,
    pub prevention: Option<String>,
    pub estimated_recovery: Option<String>,
    pub organic_treatment: Option<String>,
}

/// 低信頼度の理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LowConfidenceReason {
    #[serde(rename = "top_prediction_low")]
    TopPredictionLow,
    #[serde(rename = "top_2_too_close")]
    Top2TooClose,
}

impl LowConfidenceReason {
    /// 未知の理由文字列は None（理由なし扱い）
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim() {
            "top_prediction_low" => Some(Self::TopPredictionLow),
            "top_2_too_close" => Some(Self::Top2TooClose),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopPredictionLow => "top_prediction_low",
            Self::Top2TooClose => "top_2_too_close",
        }
    }
}

/// サーバーが付与する信頼度の品質区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceQuality {
    Good,
    Moderate,
    Poor,
}

impl ConfidenceQuality {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "good" => Some(Self::Good),
            "moderate" => Some(Self::Moderate),
            "poor" => Some(Self::Poor),
            _ => None,
        }
    }
}

/// レポートに付随する詳細テキスト（サーバーが持っていれば）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDetails {
    pub scientific_name: Option<String>,
    pub severity: Option<String>,
    pub affected_area: Option<String>,
    pub symptoms: Vec<String>,
    pub remedy: Option<String>,
    pub prevention: Option<String>,
    pub chemicals: Vec<Chemical>,
    pub fertilizer: Option<String>,
    pub organic_treatment: Option<String>,
    pub estimated_recovery: Option<String>,
    pub spread_risk: Option<String>,
}

/// 予測レポート（フラグはすべて既定値解決済み）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionReport {
    pub crop: String,
    pub disease: String,
    pub status: CropStatus,
    pub ambiguous: bool,
    pub ambiguous_candidates: Vec<AmbiguousCandidate>,
    pub ambiguous_details: Vec<AmbiguousDetail>,
    pub low_confidence_warning: bool,
    pub low_confidence_reason: Option<LowConfidenceReason>,
    pub confidence_quality: Option<ConfidenceQuality>,
    #[serde(flatten)]
    pub details: ReportDetails,
}

/// 予測サービスの出力（1スキャンごとに生成される一時データ）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionResult {
    pub id: Option<String>,
    pub label: String,
    /// トップ候補の信頼度（0〜100）
    pub confidence: f64,
    pub alternatives: Vec<Alternative>,
    pub report: PredictionReport,
}

/// 結果ビューへの引き継ぎレコード
///
/// 自己完結していること（表示にネットワーク呼び出しを必要としない）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanResult {
    pub id: Option<String>,
    pub confidence: f64,
    #[serde(flatten)]
    pub record: DiseaseRecord,
    pub report: PredictionReport,
    pub alternatives: Vec<Alternative>,
    pub uncertain: bool,
    pub ambiguous: bool,
    /// プレビュー用の data URI
    pub image: String,
    /// RFC 3339
    pub scan_date: String,
}

/// モデルラベルを (作物, 病名) に分解する
///
/// # Examples
/// ```
/// use cropcare_common::split_label;
///
/// let (crop, disease) = split_label("Tomato___Early_blight");
/// assert_eq!(crop, "Tomato");
/// assert_eq!(disease, "Early blight");
/// ```
pub fn split_label(label: &str) -> (String, String) {
    match label.split_once(LABEL_SEPARATOR) {
        Some((crop, disease)) => (humanize(crop), humanize(disease)),
        None => {
            let disease = if label.to_lowercase().contains("healthy") { "healthy" } else { "unknown" };
            (humanize(label), disease.to_string())
        }
    }
}

/// 表示名からモデルラベルを組み立てる（`split_label` の逆）
pub fn join_label(crop: &str, disease: &str) -> String {
    format!(
        "{}{}{}",
        crop.trim().replace(' ', "_"),
        LABEL_SEPARATOR,
        disease.trim().replace(' ', "_")
    )
}

fn humanize(part: &str) -> String {
    part.replace('_', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_label_with_separator() {
        let (crop, disease) = split_label("Pepper,_bell___Bacterial_spot");
        assert_eq!(crop, "Pepper, bell");
        assert_eq!(disease, "Bacterial spot");
    }

    #[test]
    fn test_split_label_without_separator() {
        assert_eq!(split_label("Corn_healthy").1, "healthy");
        assert_eq!(split_label("mystery").1, "unknown");
    }

    #[test]
    fn test_join_label() {
        assert_eq!(join_label("Rice", "Bacterial Leaf Blight"), "Rice___Bacterial_Leaf_Blight");
    }

    #[test]
    fn test_crop_status_resolve() {
        assert_eq!(CropStatus::resolve(Some("healthy"), ""), CropStatus::Healthy);
        assert_eq!(CropStatus::resolve(Some("DISEASED"), "healthy"), CropStatus::Diseased);
        assert_eq!(CropStatus::resolve(None, "Corn___healthy"), CropStatus::Healthy);
        assert_eq!(CropStatus::resolve(Some("???"), "Tomato___Leaf_Mold"), CropStatus::Diseased);
    }

    #[test]
    fn test_low_confidence_reason_wire() {
        assert_eq!(
            LowConfidenceReason::from_wire("top_2_too_close"),
            Some(LowConfidenceReason::Top2TooClose)
        );
        assert_eq!(LowConfidenceReason::from_wire("weird"), None);

        let json = serde_json::to_string(&LowConfidenceReason::TopPredictionLow).unwrap();
        assert_eq!(json, "\"top_prediction_low\"");
    }

    #[test]
    fn test_healthy_invariant_enforced() {
        let record = DiseaseRecord {
            status: CropStatus::Healthy,
            severity: "Severe".to_string(),
            chemicals: vec![Chemical::default()],
            ..Default::default()
        };
        assert!(!record.is_consistent());

        let fixed = record.with_invariants();
        assert!(fixed.is_consistent());
        assert!(fixed.chemicals.is_empty());
        assert_eq!(fixed.severity, "None");
    }

    #[test]
    fn test_scan_result_serialize_camel_case() {
        let scan = ScanResult {
            id: Some("abc".to_string()),
            confidence: 94.0,
            record: DiseaseRecord {
                crop: "Tomato".to_string(),
                organic_treatment: "Neem oil".to_string(),
                ..Default::default()
            },
            scan_date: "2026-10-19T00:00:00Z".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&scan).expect("シリアライズ失敗");
        assert!(json.contains("\"crop\":\"Tomato\""));
        assert!(json.contains("\"organicTreatment\":\"Neem oil\""));
        assert!(json.contains("\"scanDate\":\"2026-10-19T00:00:00Z\""));

        let restored: ScanResult = serde_json::from_str(&json).expect("デシリアライズ失敗");
        assert_eq!(restored.record.crop, "Tomato");
        assert_eq!(restored.id.as_deref(), Some("abc"));
    }
}
