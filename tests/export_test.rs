//! PDF出力の統合テスト

use cropcare_common::{catalog, present, GateAction, ReportSection, ResultView, ScanResult};
use cropcare_rust::error::{CropCareError, Result};
use cropcare_rust::export::{export_view, DocumentRenderer, PdfRenderer};
use tempfile::tempdir;

fn view_for(index: usize, confidence: Option<f64>) -> ResultView {
    let mut scan = ScanResult::assemble(
        catalog::entries()[index].to_prediction(),
        "data:image/png;base64,AAAA".to_string(),
        "2026-10-19T08:00:00+00:00".to_string(),
    );
    if let Some(confidence) = confidence {
        scan.confidence = confidence;
    }
    present(&scan, 1_760_000_000_000)
}

/// 描画された見出しを記録するだけのレンダラー
struct TitleRecorder(std::cell::RefCell<Vec<String>>);

impl DocumentRenderer for TitleRecorder {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, _title: &str, sections: &[ReportSection]) -> Result<Vec<u8>> {
        let titles: Vec<String> = sections.iter().map(|s| s.title.to_string()).collect();
        *self.0.borrow_mut() = titles.clone();
        Ok(titles.join("\n").into_bytes())
    }
}

struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, _title: &str, _sections: &[ReportSection]) -> Result<Vec<u8>> {
        Err(CropCareError::Io(std::io::Error::new(std::io::ErrorKind::Other, "canvas unavailable")))
    }
}

#[test]
fn test_pdf_export_writes_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("report.pdf");
    let view = view_for(1, None);

    let path = export_view(&view, None, &PdfRenderer::new(), &output).unwrap();

    assert_eq!(path, output);
    let bytes = std::fs::read(&path).expect("PDFが読めない");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_export_to_directory_uses_report_id() {
    let dir = tempdir().expect("Failed to create temp dir");
    let view = view_for(2, None);

    let path = export_view(&view, None, &PdfRenderer::new(), dir.path()).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(name, "crop-report-mock-3-1760000000000.pdf");
    assert!(path.exists());
}

#[test]
fn test_failed_render_writes_nothing_and_keeps_view() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("report.pdf");
    let view = view_for(0, None);
    let before = view.clone();

    let result = export_view(&view, None, &FailingRenderer, &output);

    assert!(matches!(result, Err(CropCareError::ExportFailed(_))));
    assert!(!output.exists());
    assert_eq!(view, before);
}

#[test]
fn test_unacknowledged_export_omits_recommendations() {
    let dir = tempdir().expect("Failed to create temp dir");
    let view = view_for(0, Some(30.0));
    let recorder = TitleRecorder(std::cell::RefCell::new(Vec::new()));

    export_view(&view, None, &recorder, &dir.path().join("a.txt")).unwrap();
    assert!(recorder.0.borrow().iter().all(|t| t != "Treatment"));
    assert!(recorder.0.borrow().iter().any(|t| t == "Warning"));

    export_view(&view, Some(GateAction::ViewAnyway), &recorder, &dir.path().join("b.txt")).unwrap();
    assert!(recorder.0.borrow().iter().any(|t| t == "Treatment"));
}
