//! エラー型定義

use thiserror::Error;

/// 予測レスポンスの解釈エラー
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    /// レスポンスが期待する形をしていない
    #[error("Parse error: {0}")]
    Parse(String),

    /// サービス自身がエラーを返した
    #[error("Service error: {0}")]
    Service(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
