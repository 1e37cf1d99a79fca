//! ロギング初期化ユーティリティ
//!
//! 標準出力へのfmtレイヤーと、`BACKOFFICE_LOG_DIR`が設定されていれば
//! 日次ローテーションするJSONファイルレイヤーを組み合わせる。

use crate::config::{get_env_with_fallback, get_env_with_fallback_or};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// ログファイル名のプレフィックス
pub const LOG_FILE_PREFIX: &str = "backoffice.log";

/// `RUST_LOG`を優先し、無ければ`BACKOFFICE_LOG_LEVEL`（既定: info）からフィルタを作る
pub fn build_filter() -> EnvFilter {
    let level = get_env_with_fallback_or("BACKOFFICE_LOG_LEVEL", "LOG_LEVEL", "info");
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

/// グローバルsubscriberを初期化する
///
/// ファイル出力を有効にした場合は`WorkerGuard`を返す。
/// 呼び出し側はプロセス終了まで保持すること（dropでバッファがflushされる）。
pub fn init() -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match get_env_with_fallback("BACKOFFICE_LOG_DIR", "LOG_DIR") {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter())
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn build_filter_uses_level_env_when_rust_log_unset() {
        std::env::remove_var("RUST_LOG");
        std::env::set_var("BACKOFFICE_LOG_LEVEL", "debug");
        assert_eq!(build_filter().to_string(), "debug");
        std::env::remove_var("BACKOFFICE_LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn build_filter_prefers_rust_log() {
        std::env::set_var("RUST_LOG", "warn");
        std::env::set_var("BACKOFFICE_LOG_LEVEL", "debug");
        assert_eq!(build_filter().to_string(), "warn");
        std::env::remove_var("RUST_LOG");
        std::env::remove_var("BACKOFFICE_LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn init_creates_log_dir_and_returns_guard() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("logs");
        std::env::set_var("BACKOFFICE_LOG_DIR", &dir);

        let guard = init().unwrap();
        std::env::remove_var("BACKOFFICE_LOG_DIR");

        assert!(guard.is_some());
        assert!(dir.is_dir());
    }
}
