// アプリケーション層モジュール
pub mod import_handler;
pub mod request_parser;

// 再エクスポート
pub use import_handler::{ImportHandler, ImportHandlerError};
pub use request_parser::{ParseError, RequestParser};
