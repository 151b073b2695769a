//! 結果プレゼンター
//!
//! 分類済みの ScanResult を表示領域ごとに分解する:
//! - 識別（作物・病名・学名・信頼度・状態バッジ）
//! - 症状（順序そのまま）
//! - 治療（救済・有機・肥料・予防、自由テキスト）
//! - 薬剤（空なら領域ごと非表示）
//! - 代替候補（空なら非表示）
//! - 曖昧候補の詳細（Ambiguous かつ詳細ありのときのみ）
//!
//! Certain 以外では3択の確認ゲートを付ける。

use crate::classifier::ConfidenceState;
use crate::types::{AmbiguousDetail, Alternative, Chemical, CropStatus, ScanResult, NOT_AVAILABLE};
use serde::Serialize;

/// 状態バッジ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusBadge {
    Healthy,
    DiseaseDetected,
}

impl StatusBadge {
    pub fn label(&self) -> &'static str {
        match self {
            StatusBadge::Healthy => "Healthy Crop",
            StatusBadge::DiseaseDetected => "Disease Detected",
        }
    }
}

/// 重症度の区分（表示色の選択用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeverityLevel {
    None,
    Moderate,
    Severe,
}

impl SeverityLevel {
    pub fn from_text(severity: &str) -> Self {
        if severity.trim() == "None" {
            SeverityLevel::None
        } else if severity.contains("Moderate") {
            SeverityLevel::Moderate
        } else {
            SeverityLevel::Severe
        }
    }
}

/// 識別領域
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub crop: String,
    pub disease: String,
    pub scientific_name: String,
    pub confidence: f64,
    pub status: CropStatus,
    pub badge: StatusBadge,
    /// Certain 以外（不確実・低信頼度・曖昧）
    pub flagged: bool,
    pub ambiguous: bool,
    pub affected_area: String,
    pub estimated_recovery: String,
}

/// クイック統計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStats {
    pub confidence: String,
    pub severity: String,
    pub severity_level: SeverityLevel,
    pub spread_risk: String,
    pub recovery: String,
    pub scan_date: String,
    pub report_id: String,
}

/// 治療領域
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Treatment {
    pub remedy: String,
    pub organic_treatment: String,
    pub fertilizer: String,
    pub prevention: String,
}

/// 曖昧候補1件分の詳細パネル
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidatePanel {
    pub disease: String,
    pub confidence: f64,
    pub symptoms: Vec<String>,
    pub remedy: String,
    pub prevention: String,
    pub estimated_recovery: String,
    pub organic_treatment: String,
}

impl CandidatePanel {
    fn from_detail(detail: &AmbiguousDetail) -> Self {
        Self {
            disease: detail.disease.clone(),
            confidence: detail.confidence,
            symptoms: detail.symptoms.clone(),
            remedy: or_not_available(&detail.remedy),
            prevention: or_not_available(&detail.prevention),
            estimated_recovery: or_not_available(&detail.estimated_recovery),
            organic_treatment: or_not_available(&detail.organic_treatment),
        }
    }
}

fn or_not_available(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// 確認ゲートの選択肢
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateAction {
    Rescan,
    UploadDifferent,
    ViewAnyway,
}

impl GateAction {
    pub const ALL: [GateAction; 3] = [GateAction::Rescan, GateAction::UploadDifferent, GateAction::ViewAnyway];

    pub fn label(&self) -> &'static str {
        match self {
            GateAction::Rescan => "Re-scan",
            GateAction::UploadDifferent => "Upload a different image",
            GateAction::ViewAnyway => "View anyway",
        }
    }

    /// 選択後の遷移先
    pub fn navigation(&self) -> Navigation {
        match self {
            GateAction::Rescan => Navigation::Capture(CaptureMode::Camera),
            GateAction::UploadDifferent => Navigation::Capture(CaptureMode::Upload),
            GateAction::ViewAnyway => Navigation::ShowResult,
        }
    }
}

/// 撮影ビューへの戻り方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Camera,
    Upload,
}

/// 結果ビューからの遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    ShowResult,
    Capture(CaptureMode),
}

/// 確認ゲート（ブロッキング）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcknowledgmentGate {
    pub message: String,
    pub actions: [GateAction; 3],
}

/// 表示領域に分解された結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub state: ConfidenceState,
    pub image: String,
    pub identification: Identification,
    pub stats: QuickStats,
    /// 状態に応じた警告文
    pub warning: Option<String>,
    pub symptoms: Vec<String>,
    pub treatment: Treatment,
    /// None は領域ごと非表示
    pub chemicals: Option<Vec<Chemical>>,
    pub alternatives: Option<Vec<Alternative>>,
    pub ambiguous_panels: Option<Vec<CandidatePanel>>,
    pub gate: Option<AcknowledgmentGate>,
}

impl ResultView {
    /// 治療推奨を確定として表示してよいか
    pub fn recommendations_final(&self, acknowledged: Option<GateAction>) -> bool {
        self.gate.is_none() || acknowledged == Some(GateAction::ViewAnyway)
    }
}

/// ScanResult を表示領域に分解する
///
/// `viewed_at_millis` はレポートIDの接尾辞に使う（表示時刻）
pub fn present(scan: &ScanResult, viewed_at_millis: i64) -> ResultView {
    let state = scan.state();
    let record = &scan.record;
    let flagged = state.requires_acknowledgment();

    let badge = if record.status.is_healthy() {
        StatusBadge::Healthy
    } else {
        StatusBadge::DiseaseDetected
    };

    let identification = Identification {
        crop: record.crop.clone(),
        disease: record.disease.clone(),
        scientific_name: record.scientific_name.clone(),
        confidence: scan.confidence,
        status: record.status,
        badge,
        flagged,
        ambiguous: matches!(state, ConfidenceState::Ambiguous),
        affected_area: record.affected_area.clone(),
        estimated_recovery: record.estimated_recovery.clone(),
    };

    let stats = QuickStats {
        confidence: format_confidence(scan.confidence),
        severity: record.severity.clone(),
        severity_level: SeverityLevel::from_text(&record.severity),
        spread_risk: short_spread_risk(&record.spread_risk),
        recovery: short_recovery(&record.estimated_recovery),
        scan_date: scan.scan_date.clone(),
        report_id: format!("{}-{}", scan.id.as_deref().unwrap_or("local"), viewed_at_millis),
    };

    let ambiguous_panels = match state {
        ConfidenceState::Ambiguous if !scan.report.ambiguous_details.is_empty() => Some(
            scan.report
                .ambiguous_details
                .iter()
                .map(CandidatePanel::from_detail)
                .collect(),
        ),
        _ => None,
    };

    let warning = state.message().map(str::to_string);
    let gate = warning.as_ref().filter(|_| flagged).map(|message| AcknowledgmentGate {
        message: message.clone(),
        actions: GateAction::ALL,
    });

    ResultView {
        state,
        image: scan.image.clone(),
        identification,
        stats,
        warning,
        symptoms: record.symptoms.clone(),
        treatment: Treatment {
            remedy: record.remedy.clone(),
            organic_treatment: record.organic_treatment.clone(),
            fertilizer: record.fertilizer.clone(),
            prevention: record.prevention.clone(),
        },
        chemicals: Some(record.chemicals.clone()).filter(|c| !c.is_empty()),
        alternatives: Some(scan.alternatives.clone()).filter(|a| !a.is_empty()),
        ambiguous_panels,
        gate,
    }
}

/// 信頼度の表示（小数1桁、整数なら整数表示）
pub fn format_confidence(confidence: f64) -> String {
    if confidence.fract() == 0.0 {
        format!("{:.0}%", confidence)
    } else {
        format!("{:.1}%", confidence)
    }
}

/// "High - can spread rapidly" → "High"
fn short_spread_risk(spread_risk: &str) -> String {
    spread_risk.split('-').next().unwrap_or_default().trim().to_string()
}

/// "3-4 weeks, may require replanting" → "3-4 weeks"
fn short_recovery(recovery: &str) -> String {
    recovery.split(',').next().unwrap_or_default().trim().to_string()
}
