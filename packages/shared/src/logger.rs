//! Logging setup utilities for the Hiroba chat client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the library crates and the binary log at `default_log_level` unless the
/// `RUST_LOG` environment variable says otherwise. Output goes to stderr so the
/// rendered views on stdout stay readable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hiroba")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the fallback filter directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    ["hiroba_shared", "hiroba_core", "hiroba_client", binary_name]
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_all_crates_and_binary() {
        // テスト項目: 既定のフィルタが全クレートとバイナリを対象にする
        // given (前提条件):
        let binary_name = "hiroba";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert!(filter.contains("hiroba_core=debug"));
        assert!(filter.contains("hiroba_client=debug"));
        assert!(filter.contains("hiroba_shared=debug"));
        assert!(filter.ends_with("hiroba=debug"));
    }

    #[test]
    fn test_default_filter_normalizes_hyphens() {
        // テスト項目: バイナリ名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let binary_name = "hiroba-dev";

        // when (操作):
        let filter = default_filter(binary_name, "info");

        // then (期待する結果):
        assert!(filter.contains("hiroba_dev=info"));
        assert!(!filter.contains("hiroba-dev"));
    }
}
