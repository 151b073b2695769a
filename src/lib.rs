//! CropCare
//!
//! 植物の葉の画像（ファイルまたはカメラ）を予測サービスに送り、
//! 信頼度に応じた確認ゲート付きで診断結果を表示・PDF出力する。

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod predictor;
pub mod session;
pub mod source;
pub mod telemetry;
pub mod view;
pub mod workflow;
