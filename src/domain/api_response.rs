/// Lambdaプロキシ統合形式のレスポンス
///
/// `{"statusCode": <u16>, "body": <String>}`としてシリアライズされる。
use serde::Serialize;
use std::fmt::Display;

/// 成功時のステータスコード
pub const STATUS_OK: u16 = 200;

/// リクエスト不正時のステータスコード
pub const STATUS_BAD_REQUEST: u16 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
}

impl ApiResponse {
    /// 取り込み成功レスポンスを作成
    ///
    /// ボディは`{"added": <件数>}`（コロンの後に空白1つ）。既存クライアントが
    /// 文字列比較しているため、serde_jsonのコンパクト出力は使わない。
    pub fn added(count: usize) -> Self {
        Self {
            status_code: STATUS_OK,
            body: format!("{{\"added\": {}}}", count),
        }
    }

    /// 解析失敗レスポンスを作成
    ///
    /// # 引数
    /// * `message` - エラー内容
    /// * `content` - 問題のあった入力（特定できない場合は`''`）
    pub fn bad_request(message: impl Display, content: &str) -> Self {
        Self {
            status_code: STATUS_BAD_REQUEST,
            body: format!("Error parsing request {} in {}", message, content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_added_body() {
        let response = ApiResponse::added(3);

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"added": 3}"#);
    }

    /// ボディは有効なJSONであること
    #[test]
    fn test_added_body_is_json() {
        let response = ApiResponse::added(0);

        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"added": 0}));
    }

    #[test]
    fn test_bad_request_body() {
        let response = ApiResponse::bad_request("empty body", "''");

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, "Error parsing request empty body in ''");
    }

    #[test]
    fn test_serialize_camel_case() {
        let response = ApiResponse::added(1);

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(
            value,
            json!({
                "statusCode": 200,
                "body": "{\"added\": 1}"
            })
        );
    }
}
