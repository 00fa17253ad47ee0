/// ログ基盤モジュール
///
/// CloudWatch Logsに流すJSON構造化ログと、1回の呼び出しを囲むspanを用意する。
use std::sync::Once;

use tracing::{Span, field};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 呼び出しspanの名前
pub const REQUEST_SPAN_NAME: &str = "import_stock_prices";

/// `RUST_LOG`未設定時のフィルタ
///
/// SDKとHTTPスタックは再試行のたびにinfoを出すのでwarn以上に絞る。
pub const DEFAULT_DIRECTIVES: &str =
    "info,aws_config=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,hyper=warn,rustls=warn";

static INIT: Once = Once::new();

/// `RUST_LOG`があればそれを、無ければ`default`を使うフィルタ
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Lambda環境向けのログサブスクライバーを初期化する
///
/// イベントのフィールドはトップレベルに展開し、現在のspan（`request_id`と
/// `status_code`）だけを`span`キーに載せる。2回目以降の呼び出しは何もしない。
pub fn init_logging() {
    INIT.call_once(|| {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false);

        tracing_subscriber::registry()
            .with(env_filter(DEFAULT_DIRECTIVES))
            .with(json_layer)
            .init();
    });
}

/// 1回の呼び出しを囲むspanを作成
///
/// `status_code`は空で作り、レスポンス確定時に[`record_status_code`]で埋める。
pub fn request_span(request_id: &str) -> Span {
    tracing::info_span!(
        REQUEST_SPAN_NAME,
        request_id = %request_id,
        status_code = field::Empty,
    )
}

/// 現在のspanにレスポンスのステータスコードを記録する
pub fn record_status_code(status_code: u16) {
    Span::current().record("status_code", status_code);
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter("debug"))
            .with(fmt_layer)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVES).is_ok());
    }

    #[test]
    fn test_request_span_fields() {
        init_test_logging();

        let span = request_span("req-123");

        let metadata = span.metadata().unwrap();
        assert_eq!(metadata.name(), REQUEST_SPAN_NAME);
        assert!(span.field("request_id").is_some());
        assert!(span.field("status_code").is_some());
    }

    /// span外で呼んでもパニックしない
    #[test]
    fn test_record_status_code_outside_span() {
        init_test_logging();

        record_status_code(200);
    }

    #[test]
    fn test_log_within_request_span() {
        init_test_logging();

        let span = request_span("req-456");
        let _guard = span.enter();

        tracing::info!(body = "[]", "リクエストボディ受信");
        record_status_code(400);
        tracing::error!(written = 0, total = 3, "Wrote 0 of 3");
    }
}
