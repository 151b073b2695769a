//! レポート本文の組み立て
//!
//! ResultView を見出し付きのテキスト行に展開する。端末表示とPDF出力で共用。

use crate::presenter::{format_confidence, ResultView};

/// セクション種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Identification,
    Warning,
    Alternatives,
    AmbiguousCandidates,
    Symptoms,
    Treatment,
    Chemicals,
}

impl SectionKind {
    /// 治療推奨（確認ゲートを通過するまで確定表示しない）
    pub fn is_recommendation(&self) -> bool {
        matches!(
            self,
            SectionKind::Treatment | SectionKind::Chemicals | SectionKind::AmbiguousCandidates
        )
    }
}

/// 見出し + 行
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub kind: SectionKind,
    pub title: &'static str,
    pub lines: Vec<String>,
}

/// 表示順にセクションを組み立てる（非表示の領域は含めない）
pub fn build_sections(view: &ResultView) -> Vec<ReportSection> {
    let mut sections = Vec::new();
    let id = &view.identification;
    let stats = &view.stats;

    let mut badge = id.badge.label().to_string();
    if id.flagged {
        badge.push_str(" (flagged)");
    }
    sections.push(ReportSection {
        kind: SectionKind::Identification,
        title: "Disease Identification",
        lines: vec![
            format!("Crop: {}", id.crop),
            format!("Disease: {}", id.disease),
            format!("Scientific name: {}", id.scientific_name),
            format!("Status: {}", badge),
            format!("Confidence: {}", stats.confidence),
            format!("Severity: {}", stats.severity),
            format!("Spread risk: {}", stats.spread_risk),
            format!("Affected area: {}", id.affected_area),
            format!("Estimated recovery: {}", id.estimated_recovery),
            format!("Scanned: {}", stats.scan_date),
            format!("Report ID: {}", stats.report_id),
        ],
    });

    if let Some(warning) = &view.warning {
        sections.push(ReportSection {
            kind: SectionKind::Warning,
            title: "Warning",
            lines: vec![warning.clone()],
        });
    }

    if let Some(alternatives) = &view.alternatives {
        sections.push(ReportSection {
            kind: SectionKind::Alternatives,
            title: "Alternatives",
            lines: alternatives
                .iter()
                .map(|alt| format!("{}: {}", alt.label, format_confidence(alt.confidence)))
                .collect(),
        });
    }

    if let Some(panels) = &view.ambiguous_panels {
        let mut lines = Vec::new();
        for (index, panel) in panels.iter().enumerate() {
            if index > 0 {
                lines.push(String::new());
            }
            lines.push(format!("{} ({})", panel.disease, format_confidence(panel.confidence)));
            lines.push("Symptoms:".to_string());
            lines.extend(panel.symptoms.iter().map(|s| format!("  - {}", s)));
            lines.push(format!("Remedy: {}", panel.remedy));
            lines.push(format!("Prevention: {}", panel.prevention));
            lines.push(format!("Estimated recovery: {}", panel.estimated_recovery));
            lines.push(format!("Organic options: {}", panel.organic_treatment));
        }
        sections.push(ReportSection {
            kind: SectionKind::AmbiguousCandidates,
            title: "Candidate Diseases",
            lines,
        });
    }

    sections.push(ReportSection {
        kind: SectionKind::Symptoms,
        title: "Symptoms",
        lines: view.symptoms.iter().map(|s| format!("- {}", s)).collect(),
    });

    let treatment = &view.treatment;
    sections.push(ReportSection {
        kind: SectionKind::Treatment,
        title: "Treatment",
        lines: vec![
            format!("Remedy: {}", treatment.remedy),
            format!("Organic treatment: {}", treatment.organic_treatment),
            format!("Fertilizer: {}", treatment.fertilizer),
            format!("Prevention: {}", treatment.prevention),
        ],
    });

    if let Some(chemicals) = &view.chemicals {
        sections.push(ReportSection {
            kind: SectionKind::Chemicals,
            title: "Recommended Chemicals",
            lines: chemicals
                .iter()
                .map(|c| format!("{}: {} ({})", c.name, c.dosage, c.application))
                .collect(),
        });
    }

    sections
}

/// 長い行を指定幅で折り返す（単語単位）
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width || width == 0 {
        return vec![line.to_string()];
    }

    let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let mut wrapped = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + 1;
        if !current.is_empty() && needed > width {
            wrapped.push(std::mem::take(&mut current));
        }
        if current.is_empty() {
            current.push_str(if wrapped.is_empty() { indent.as_str() } else { "    " });
        } else {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        wrapped.push(current);
    }
    wrapped
}
