//! CropCare Common Library
//!
//! CLIと結果ビュー（端末・PDF）で共有される型と判定ロジック。IOを持たない。

pub mod types;
pub mod error;
pub mod catalog;
pub mod parser;
pub mod assessment;
pub mod classifier;
pub mod scan;
pub mod presenter;
pub mod report;

pub use types::{
    join_label, split_label, Alternative, AmbiguousCandidate, AmbiguousDetail, Chemical,
    ConfidenceQuality, CropStatus, DiseaseRecord, LowConfidenceReason, PredictionReport,
    PredictionResult, ReportDetails, ScanResult, NOT_AVAILABLE,
};
pub use error::{Error, Result};
pub use catalog::{CatalogEntry, resolve_record};
pub use parser::parse_prediction_response;
pub use assessment::{assess, Assessment};
pub use classifier::{classify, ClassifierInput, ConfidenceState, UNCERTAIN_THRESHOLD};
pub use presenter::{
    present, AcknowledgmentGate, CandidatePanel, CaptureMode, GateAction, Navigation, ResultView,
};
pub use report::{build_sections, ReportSection, SectionKind};
