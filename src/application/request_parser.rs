/// リクエストパーサー
///
/// Lambdaイベントからボディ文字列を取り出し、株価レコードのJSON配列として
/// デコード・検証する。
use std::borrow::Cow;

use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ApiResponse, ItemValidationError, StockPriceItem};

/// 問題箇所を特定できないエラーで使う`content`
const UNKNOWN_CONTENT: &str = "''";

/// リクエスト解析エラー
///
/// どの種類も呼び出し元には400として返す。
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// `body`キーが無い、またはnull
    #[error("empty body")]
    EmptyBody,

    /// `body`が文字列でない
    #[error("body must be a string")]
    BodyNotString,

    /// base64デコードまたはUTF-8変換に失敗
    #[error("invalid body encoding: {0}")]
    InvalidEncoding(String),

    /// JSONとしてデコードできない
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// JSON配列でない
    #[error("body must be a JSON array")]
    NotArray,

    /// 必須フィールドの欠落
    #[error("`{field}` not found")]
    MissingField { field: &'static str, item: Value },
}

impl ParseError {
    /// エラーの原因となった入力の表現
    ///
    /// 欠落フィールドの場合は該当要素のJSON文字列、それ以外は`''`。
    pub fn content(&self) -> String {
        match self {
            ParseError::MissingField { item, .. } => item.to_string(),
            _ => UNKNOWN_CONTENT.to_string(),
        }
    }

    /// 400レスポンスに変換
    pub fn to_response(&self) -> ApiResponse {
        ApiResponse::bad_request(self, &self.content())
    }
}

impl From<ItemValidationError> for ParseError {
    fn from(err: ItemValidationError) -> Self {
        match err {
            ItemValidationError::MissingField { field, item } => {
                ParseError::MissingField { field, item }
            }
        }
    }
}

/// リクエストパーサー
pub struct RequestParser;

impl RequestParser {
    /// イベントからボディ文字列を取り出す
    ///
    /// `isBase64Encoded`がtrueの場合はbase64デコードしてからUTF-8として解釈する。
    ///
    /// # 戻り値
    /// * `Ok(Cow<str>)` - ボディ文字列（デコード不要ならイベントを借用）
    /// * `Err(ParseError)` - ボディが無い、または文字列として取り出せない
    pub fn extract_body(event: &Value) -> Result<Cow<'_, str>, ParseError> {
        let body = match event.get("body") {
            None | Some(Value::Null) => return Err(ParseError::EmptyBody),
            Some(Value::String(body)) => body,
            Some(_) => return Err(ParseError::BodyNotString),
        };

        let is_base64_encoded = event
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if !is_base64_encoded {
            return Ok(Cow::Borrowed(body.as_str()));
        }

        let bytes = general_purpose::STANDARD
            .decode(body)
            .map_err(|e| ParseError::InvalidEncoding(e.to_string()))?;

        String::from_utf8(bytes)
            .map(Cow::Owned)
            .map_err(|e| ParseError::InvalidEncoding(e.to_string()))
    }

    /// ボディ文字列を株価レコードの列に変換
    ///
    /// 要素は先頭から順に検証し、最初に必須フィールドを欠いた要素でエラーを返す。
    /// 成功時はデコード結果をそのまま（正規化せず）返す。
    ///
    /// # 例
    /// ```
    /// use stock_price_importer::application::RequestParser;
    ///
    /// let items = RequestParser::parse_items(r#"[{"symbol":"AAPL","time":1,"prices":[1,2]}]"#);
    /// assert_eq!(items.unwrap().len(), 1);
    /// ```
    pub fn parse_items(body: &str) -> Result<Vec<StockPriceItem>, ParseError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let Value::Array(elements) = value else {
            return Err(ParseError::NotArray);
        };

        elements
            .into_iter()
            .map(|element| StockPriceItem::try_from(element).map_err(ParseError::from))
            .collect()
    }
}
