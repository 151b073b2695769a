//! 結果ビュー（端末表示）
//!
//! 引き継ぎレコードを1回だけ取り出し、表示領域ごとに出力する。
//! Certain 以外では治療推奨の前に確認ゲートを出す。

use crate::error::{CropCareError, Result};
use crate::session::{SessionStore, SCAN_RESULT_KEY};
use cropcare_common::presenter::StatusBadge;
use cropcare_common::{
    build_sections, AcknowledgmentGate, GateAction, Navigation, ReportSection, ResultView,
    ScanResult,
};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::io::Write;
use tracing::{debug, warn};

/// 引き継ぎレコードを消費する
///
/// 無ければ撮影ビューへ誘導するガード（MissingHandoffState）
pub fn load(session: &SessionStore) -> Result<ScanResult> {
    match session.take::<ScanResult>(SCAN_RESULT_KEY) {
        Ok(Some(scan)) => Ok(scan),
        Ok(None) => Err(CropCareError::MissingHandoffState),
        Err(e) => {
            warn!("引き継ぎレコードを読み出せません: {}", e);
            Err(CropCareError::MissingHandoffState)
        }
    }
}

/// 確認ゲートの選択
pub trait GatePrompt {
    fn choose(&mut self, gate: &AcknowledgmentGate) -> Result<GateAction>;
}

/// 対話選択
pub struct InteractivePrompt;

impl GatePrompt for InteractivePrompt {
    fn choose(&mut self, gate: &AcknowledgmentGate) -> Result<GateAction> {
        let labels: Vec<&str> = gate.actions.iter().map(GateAction::label).collect();
        let index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(gate.message.as_str())
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|e| CropCareError::Prompt(e.to_string()))?;
        gate.actions
            .get(index)
            .copied()
            .ok_or_else(|| CropCareError::Prompt(format!("不正な選択: {}", index)))
    }
}

/// 常に「View anyway」（--accept）
pub struct AcceptPrompt;

impl GatePrompt for AcceptPrompt {
    fn choose(&mut self, _gate: &AcknowledgmentGate) -> Result<GateAction> {
        Ok(GateAction::ViewAnyway)
    }
}

/// 表示してよいセクション
///
/// 治療推奨はゲートを通過した場合のみ含める
pub fn visible_sections(view: &ResultView, acknowledged: Option<GateAction>) -> Vec<ReportSection> {
    let show_recommendations = view.recommendations_final(acknowledged);
    build_sections(view)
        .into_iter()
        .filter(|s| show_recommendations || !s.kind.is_recommendation())
        .collect()
}

fn write_section(out: &mut dyn Write, section: &ReportSection) -> Result<()> {
    writeln!(out, "\n== {} ==", section.title)?;
    for line in &section.lines {
        writeln!(out, "  {}", line)?;
    }
    Ok(())
}

/// ビューの表示結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shown {
    pub navigation: Navigation,
    pub acknowledged: Option<GateAction>,
}

/// 結果を表示する
///
/// 推奨以外のセクション → （必要なら）確認ゲート → 推奨セクション の順
pub fn show(view: &ResultView, prompt: &mut dyn GatePrompt, out: &mut dyn Write) -> Result<Shown> {
    let sections = build_sections(view);
    let marker = match view.identification.badge {
        StatusBadge::Healthy => "✔",
        StatusBadge::DiseaseDetected => "⚠",
    };
    writeln!(
        out,
        "{} {} - {}",
        marker, view.identification.crop, view.identification.disease
    )?;

    for section in sections.iter().filter(|s| !s.kind.is_recommendation()) {
        write_section(out, section)?;
    }

    let mut acknowledged = None;
    if let Some(gate) = &view.gate {
        out.flush()?;
        let action = prompt.choose(gate)?;
        debug!(action = action.label(), state = view.state.label(), "確認ゲート");
        acknowledged = Some(action);
        if action != GateAction::ViewAnyway {
            return Ok(Shown {
                navigation: action.navigation(),
                acknowledged,
            });
        }
    }

    for section in sections.iter().filter(|s| s.kind.is_recommendation()) {
        write_section(out, section)?;
    }

    Ok(Shown {
        navigation: Navigation::ShowResult,
        acknowledged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropcare_common::{catalog, present, CaptureMode, SectionKind};

    struct Scripted(GateAction, usize);

    impl GatePrompt for Scripted {
        fn choose(&mut self, _gate: &AcknowledgmentGate) -> Result<GateAction> {
            self.1 += 1;
            Ok(self.0)
        }
    }

    fn uncertain_view() -> ResultView {
        let mut scan = ScanResult::assemble(catalog::entries()[0].to_prediction(), String::new(), String::new());
        scan.confidence = 35.0;
        present(&scan, 0)
    }

    #[test]
    fn test_certain_view_prints_treatment_without_prompt() {
        let scan = ScanResult::assemble(catalog::entries()[1].to_prediction(), String::new(), String::new());
        let view = present(&scan, 0);
        let mut prompt = Scripted(GateAction::Rescan, 0);
        let mut out = Vec::new();

        let shown = show(&view, &mut prompt, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(prompt.1, 0);
        assert_eq!(shown.navigation, Navigation::ShowResult);
        assert!(text.contains("== Treatment =="));
        assert!(text.contains("== Recommended Chemicals =="));
    }

    #[test]
    fn test_gate_withholds_treatment_on_rescan() {
        let view = uncertain_view();
        let mut prompt = Scripted(GateAction::Rescan, 0);
        let mut out = Vec::new();

        let shown = show(&view, &mut prompt, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(prompt.1, 1);
        assert_eq!(shown.navigation, Navigation::Capture(CaptureMode::Camera));
        assert!(text.contains("== Warning =="));
        assert!(!text.contains("== Treatment =="));
    }

    #[test]
    fn test_view_anyway_reveals_treatment() {
        let view = uncertain_view();
        let mut out = Vec::new();

        let shown = show(&view, &mut AcceptPrompt, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(shown.acknowledged, Some(GateAction::ViewAnyway));
        assert!(text.contains("== Treatment =="));
    }

    #[test]
    fn test_visible_sections_follow_acknowledgment() {
        let view = uncertain_view();
        let hidden = visible_sections(&view, None);
        assert!(hidden.iter().all(|s| s.kind != SectionKind::Treatment));

        let shown = visible_sections(&view, Some(GateAction::ViewAnyway));
        assert!(shown.iter().any(|s| s.kind == SectionKind::Treatment));
    }
}
