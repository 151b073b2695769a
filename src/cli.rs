use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cropcare")]
#[command(about = "植物の葉の写真から病害を診断し、結果を表示・PDF出力するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 予測サービスの代わりにカタログからシミュレーションする
    #[arg(long, global = true)]
    pub simulate: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像ファイルをアップロードして診断
    Scan {
        /// 画像ファイル（PNG/JPEG、その他の形式はPNGに変換）
        #[arg(required = true)]
        file: PathBuf,

        /// 引き継ぎレコードを書いたら結果ビューを開かずに終了
        #[arg(long)]
        no_view: bool,
    },

    /// カメラで撮影して診断
    Capture {
        /// 前面カメラを使う（既定は背面）
        #[arg(long)]
        front: bool,

        /// 引き継ぎレコードを書いたら結果ビューを開かずに終了
        #[arg(long)]
        no_view: bool,
    },

    /// 直前のスキャン結果を表示（1回だけ）
    Results {
        /// 表示した結果をPDFに出力
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// 確認ゲートで「View anyway」を選んだ扱いにする
        #[arg(long)]
        accept: bool,
    },

    /// 病害カタログを表示
    Catalog,

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 予測サービスのURLを設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// スナップショットカメラのURLを設定
        #[arg(long)]
        set_camera_url: Option<String>,

        /// シミュレーションを既定にする (on/off)
        #[arg(long = "set-simulate", value_enum)]
        set_simulate: Option<Toggle>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(&self) -> bool {
        matches!(self, Toggle::On)
    }
}
