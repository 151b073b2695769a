use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropCareError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("カメラを利用できません: {0}。画像ファイルをアップロードしてください")]
    CaptureUnavailable(String),

    #[error("カメラが起動していません")]
    NoActiveStream,

    #[error("画像を読み込めません: {0}")]
    UnreadableFile(String),

    #[error("画像データが空です")]
    EmptyImage,

    #[error("画像が選択されていません。アップロードまたは撮影してください")]
    NoImageSelected,

    #[error("予測サービスに接続できません: {0}")]
    ServiceUnavailable(String),

    #[error("スキャン結果がありません。先に `cropcare scan` または `cropcare capture` を実行してください")]
    MissingHandoffState,

    #[error("スキャン結果を保存できません: {0}。もう一度診断してください")]
    HandoffWriteFailed(String),

    #[error("レポート出力に失敗しました: {0}")]
    ExportFailed(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] cropcare_common::Error),
}

impl CropCareError {
    /// 利用者がその場で再試行できるエラーか（プロセスを終了させない）
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CropCareError::CaptureUnavailable(_)
                | CropCareError::NoActiveStream
                | CropCareError::UnreadableFile(_)
                | CropCareError::EmptyImage
                | CropCareError::NoImageSelected
                | CropCareError::ServiceUnavailable(_)
                | CropCareError::MissingHandoffState
                | CropCareError::HandoffWriteFailed(_)
                | CropCareError::ExportFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CropCareError>;
