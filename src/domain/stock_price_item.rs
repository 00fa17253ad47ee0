/// 株価レコード
///
/// `symbol`・`time`・`prices`を必須キーとするJSONオブジェクト。
/// 必須キー以外のフィールドは検証せず、そのまま保存先へ渡す。
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// 必須フィールド（検証はこの順序で行う）
pub const REQUIRED_FIELDS: [&str; 3] = ["symbol", "time", "prices"];

/// 株価レコード検証のエラー型
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ItemValidationError {
    /// 必須フィールドが欠落（問題のあった要素をそのまま保持する）
    #[error("`{field}` not found")]
    MissingField { field: &'static str, item: Value },
}

/// 検証済みの株価レコード
///
/// 値の正規化や型変換は行わず、デコードされたオブジェクトを保持するだけ。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StockPriceItem(Map<String, Value>);

#[cfg(test)]
impl StockPriceItem {
    pub fn symbol(&self) -> Option<&str> {
        self.0.get("symbol").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for StockPriceItem {
    type Error = ItemValidationError;

    /// JSON値を検証して株価レコードに変換
    ///
    /// オブジェクトでない値はすべての必須フィールドを欠いているものとして扱い、
    /// 先頭の`symbol`欠落として報告する。
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ItemValidationError::MissingField {
                    field: REQUIRED_FIELDS[0],
                    item: other,
                });
            }
        };

        let missing = REQUIRED_FIELDS
            .iter()
            .copied()
            .find(|field| !object.contains_key(*field));

        match missing {
            Some(field) => Err(ItemValidationError::MissingField {
                field,
                item: Value::Object(object),
            }),
            None => Ok(Self(object)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_item() {
        let value = json!({"symbol": "AAPL", "time": 1, "prices": [1, 2]});

        let item = StockPriceItem::try_from(value.clone()).unwrap();

        assert_eq!(item.symbol(), Some("AAPL"));
        assert_eq!(item.get("time"), Some(&json!(1)));
        assert_eq!(item.into_value(), value);
    }

    /// 必須キー以外のフィールドはそのまま保持される
    #[test]
    fn test_extra_fields_pass_through() {
        let value = json!({
            "symbol": "MSFT",
            "time": "2022-01-01T00:00:00Z",
            "prices": {"open": 1.5, "close": 2.5},
            "exchange": "NASDAQ"
        });

        let item = StockPriceItem::try_from(value).unwrap();

        assert_eq!(item.clone().into_value().as_object().map(|o| o.len()), Some(4));
        assert_eq!(item.get("exchange"), Some(&json!("NASDAQ")));
    }

    /// 値の型は検証しない
    #[test]
    fn test_field_types_not_checked() {
        let value = json!({"symbol": 42, "time": null, "prices": "n/a"});

        let item = StockPriceItem::try_from(value).unwrap();

        assert_eq!(item.symbol(), None);
        assert_eq!(item.get("time"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_symbol() {
        let value = json!({"time": 1, "prices": [1, 2]});

        let result = StockPriceItem::try_from(value.clone());

        assert_eq!(
            result,
            Err(ItemValidationError::MissingField {
                field: "symbol",
                item: value
            })
        );
    }

    #[test]
    fn test_missing_time() {
        let value = json!({"symbol": "AAPL", "prices": [1, 2]});

        let err = StockPriceItem::try_from(value).unwrap_err();

        assert_eq!(err.to_string(), "`time` not found");
    }

    #[test]
    fn test_missing_prices() {
        let value = json!({"symbol": "AAPL", "time": 1});

        let err = StockPriceItem::try_from(value).unwrap_err();

        assert_eq!(err.to_string(), "`prices` not found");
    }

    /// 複数欠落している場合はREQUIRED_FIELDSの順で最初のものを報告
    #[test]
    fn test_reports_first_missing_field() {
        let value = json!({"prices": [1]});

        let err = StockPriceItem::try_from(value).unwrap_err();

        assert_eq!(err.to_string(), "`symbol` not found");
    }

    #[test]
    fn test_non_object_reported_as_missing_symbol() {
        for value in [json!("AAPL"), json!(1), json!(null), json!([1, 2])] {
            let err = StockPriceItem::try_from(value.clone()).unwrap_err();
            assert_eq!(
                err,
                ItemValidationError::MissingField {
                    field: "symbol",
                    item: value
                }
            );
        }
    }

    #[test]
    fn test_serialize_transparent() {
        let value = json!({"symbol": "AAPL", "time": 1, "prices": [1, 2]});
        let item = StockPriceItem::try_from(value.clone()).unwrap();

        assert_eq!(serde_json::to_value(&item).unwrap(), value);
    }
}
