use super::DocumentRenderer;
use crate::error::{CropCareError, Result};
use cropcare_common::report::wrap_line;
use cropcare_common::ReportSection;
use printpdf::*;
use tracing::debug;

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 5.5;
const HEADING_GAP_MM: f32 = 4.0;
const BODY_INDENT_MM: f32 = 2.0;

/// Helvetica 10pt で本文幅に収まる文字数
const WRAP_COLUMNS: usize = 95;

/// A4・組み込みHelveticaの1ページPDF
///
/// 収まらない場合は文字サイズと行間を縮小する
#[derive(Debug, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    text: String,
    style: Style,
    size: f32,
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct PageLayout {
    scale: f32,
    lines: Vec<PlacedLine>,
}

/// 拡大率1での行（見出し前の空きを含む）
fn wrapped_lines(title: &str, sections: &[ReportSection], columns: usize) -> Vec<(Style, String)> {
    let mut lines = vec![(Style::Title, title.to_string())];
    for section in sections {
        lines.push((Style::Heading, section.title.to_string()));
        for line in &section.lines {
            lines.extend(wrap_line(line, columns).into_iter().map(|w| (Style::Body, w)));
        }
    }
    lines
}

fn height_of(lines: &[(Style, String)]) -> f32 {
    lines
        .iter()
        .map(|(style, _)| match style {
            Style::Title => LINE_HEIGHT_MM + HEADING_GAP_MM,
            Style::Heading => HEADING_GAP_MM + LINE_HEIGHT_MM,
            Style::Body => LINE_HEIGHT_MM,
        })
        .sum()
}

/// 1ページに収まるよう配置する
///
/// 縮小時は桁数を広げて折り返し直すので、行数は増えない
fn layout(title: &str, sections: &[ReportSection]) -> PageLayout {
    let available = A4_HEIGHT_MM - MARGIN_MM * 2.0;
    let mut lines = wrapped_lines(title, sections, WRAP_COLUMNS);
    let height = height_of(&lines);

    let scale = if height > available { available / height } else { 1.0 };
    if scale < 1.0 {
        let columns = (WRAP_COLUMNS as f32 / scale).floor() as usize;
        lines = wrapped_lines(title, sections, columns);
    }

    let mut y = A4_HEIGHT_MM - MARGIN_MM;
    let placed = lines
        .into_iter()
        .map(|(style, text)| {
            let (size, x) = match style {
                Style::Title => (TITLE_SIZE, MARGIN_MM),
                Style::Heading => {
                    y -= HEADING_GAP_MM * scale;
                    (HEADING_SIZE, MARGIN_MM)
                }
                Style::Body => (BODY_SIZE, MARGIN_MM + BODY_INDENT_MM),
            };
            y -= LINE_HEIGHT_MM * scale;
            let line = PlacedLine { text, style, size: size * scale, x, y };
            if style == Style::Title {
                y -= HEADING_GAP_MM * scale;
            }
            line
        })
        .collect();

    PageLayout { scale, lines: placed }
}

impl DocumentRenderer for PdfRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, title: &str, sections: &[ReportSection]) -> Result<Vec<u8>> {
        let (doc, page1, layer1) = PdfDocument::new(
            title,
            Mm(A4_WIDTH_MM),
            Mm(A4_HEIGHT_MM),
            "Layer 1",
        );

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| CropCareError::ExportFailed(format!("フォント追加エラー: {:?}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| CropCareError::ExportFailed(format!("フォント追加エラー: {:?}", e)))?;

        let page = layout(title, sections);
        if page.scale < 1.0 {
            debug!(scale = page.scale, lines = page.lines.len(), "1ページに縮小");
        }

        let layer = doc.get_page(page1).get_layer(layer1);
        for line in &page.lines {
            let face = if line.style == Style::Body { &font } else { &bold };
            layer.use_text(line.text.as_str(), line.size, Mm(line.x), Mm(line.y), face);
        }

        doc.save_to_bytes()
            .map_err(|e| CropCareError::ExportFailed(format!("PDF保存エラー: {:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropcare_common::SectionKind;

    fn section(lines: usize) -> ReportSection {
        ReportSection {
            kind: SectionKind::Symptoms,
            title: "Symptoms",
            lines: (0..lines).map(|i| format!("- symptom line {}", i)).collect(),
        }
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = PdfRenderer::new().render("Report", &[section(3)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_short_report_is_not_scaled() {
        let page = layout("Report", &[section(3)]);
        assert_eq!(page.scale, 1.0);
        assert_eq!(page.lines.len(), 5);
        assert_eq!(page.lines[0].size, TITLE_SIZE);
        assert_eq!(page.lines[0].y, A4_HEIGHT_MM - MARGIN_MM - LINE_HEIGHT_MM);
    }

    #[test]
    fn test_long_report_fits_one_page() {
        let page = layout("Report", &[section(200), section(40)]);
        assert!(page.scale < 1.0);
        assert!(page.lines.iter().all(|l| l.y >= MARGIN_MM - 0.01));
        assert!(page.lines.iter().all(|l| l.y <= A4_HEIGHT_MM - MARGIN_MM));
        let body = page.lines.iter().find(|l| l.style == Style::Body).unwrap();
        assert!(body.size < BODY_SIZE);

        let bytes = PdfRenderer::new().render("Report", &[section(200)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_scaled_layout_keeps_every_line() {
        let long = "- ".to_string() + &"wide ".repeat(60);
        let sections = [ReportSection {
            kind: SectionKind::Symptoms,
            title: "Symptoms",
            lines: vec![long.clone(); 80],
        }];
        let page = layout("Report", &sections);
        let words: usize = page
            .lines
            .iter()
            .filter(|l| l.style == Style::Body)
            .map(|l| l.text.matches("wide").count())
            .sum();
        assert_eq!(words, 60 * 80);
    }
}
