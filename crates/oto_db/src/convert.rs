//! JSON ↔ SQLite value mapping.
//!
//! Parameters accept only scalars; a query with an array or object
//! parameter fails before it reaches the driver. Column values always map
//! to JSON, with BLOB columns carried as standard base64 text.

use base64::Engine;
use oto_env::QueryError;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::Value;

/// Bind-side mapping. Booleans become 0/1 integers, matching how the
/// schema stores them.
pub fn sql_param(value: &Value) -> Result<SqlValue, QueryError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if n.is_u64() {
                // no exact INTEGER form past i64::MAX
                Err(QueryError::UnsupportedParam("out-of-range integer"))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(QueryError::UnsupportedParam("number"))
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) => Err(QueryError::UnsupportedParam("array")),
        Value::Object(_) => Err(QueryError::UnsupportedParam("object")),
    }
}

/// Column-side mapping. Non-finite REALs have no JSON form and come
/// through as null.
pub fn json_column(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_bind_directly() {
        assert_eq!(sql_param(&Value::Null).unwrap(), SqlValue::Null);
        assert_eq!(sql_param(&json!(true)).unwrap(), SqlValue::Integer(1));
        assert_eq!(sql_param(&json!(42)).unwrap(), SqlValue::Integer(42));
        assert_eq!(sql_param(&json!(1.5)).unwrap(), SqlValue::Real(1.5));
        assert_eq!(
            sql_param(&json!("猫")).unwrap(),
            SqlValue::Text("猫".into())
        );
    }

    #[test]
    fn composite_params_are_rejected() {
        assert!(matches!(
            sql_param(&json!([1, 2])),
            Err(QueryError::UnsupportedParam("array"))
        ));
        assert!(matches!(
            sql_param(&json!({"a": 1})),
            Err(QueryError::UnsupportedParam("object"))
        ));
    }

    #[test]
    fn u64_beyond_i64_is_rejected() {
        assert!(matches!(
            sql_param(&json!(u64::MAX)),
            Err(QueryError::UnsupportedParam(_))
        ));
    }

    #[test]
    fn blob_columns_come_back_as_base64() {
        let value = json_column(ValueRef::Blob(&[0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(value, json!("3q2+7w=="));
    }
}
