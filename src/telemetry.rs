//! ログ初期化
//!
//! プロセス起動時に一度だけ呼ぶ。二度目以降の呼び出しは何もしない。

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// tracing-subscriber を初期化する
///
/// `RUST_LOG` が設定されていればそれを優先し、無ければ `info`（`verbose` なら `debug`）
pub fn init(verbose: bool) {
    INITIALIZED.get_or_init(|| {
        let default_level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("cropcare_rust={0},cropcare_common={0},warn", default_level)));

        // テストハーネス等で既にグローバルサブスクライバがある場合は無視
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
