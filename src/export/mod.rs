//! レポート出力
//!
//! 表示中の結果を1つの文書（PDF）にする。メモリ上で生成してから書き込むため、
//! 生成に失敗した場合はファイルを作らない。

pub mod pdf;

pub use pdf::PdfRenderer;

use crate::error::{CropCareError, Result};
use crate::view::visible_sections;
use cropcare_common::{GateAction, ReportSection, ResultView};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 文書タイトル
pub const REPORT_TITLE: &str = "Crop Disease Report";

/// 文書の生成器
pub trait DocumentRenderer {
    /// 拡張子（"pdf" など）
    fn extension(&self) -> &'static str;

    fn render(&self, title: &str, sections: &[ReportSection]) -> Result<Vec<u8>>;
}

/// 出力パスを決める（ディレクトリまたは拡張子なしなら既定ファイル名を付ける）
pub fn output_path_for(output: &Path, view: &ResultView, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("crop-report-{}.{}", view.stats.report_id, extension))
    } else {
        output.to_path_buf()
    }
}

/// 表示中の結果を書き出す
///
/// ビューは借用のみで変更しない
pub fn export_view(
    view: &ResultView,
    acknowledged: Option<GateAction>,
    renderer: &dyn DocumentRenderer,
    output: &Path,
) -> Result<PathBuf> {
    let sections = visible_sections(view, acknowledged);
    let bytes = renderer.render(REPORT_TITLE, &sections).map_err(|e| {
        warn!("レポート生成に失敗: {}", e);
        match e {
            CropCareError::ExportFailed(_) => e,
            other => CropCareError::ExportFailed(other.to_string()),
        }
    })?;

    let path = output_path_for(output, view, renderer.extension());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CropCareError::ExportFailed(format!("{}: {}", parent.display(), e)))?;
    }
    std::fs::write(&path, &bytes)
        .map_err(|e| CropCareError::ExportFailed(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), bytes = bytes.len(), "レポートを出力");
    Ok(path)
}
