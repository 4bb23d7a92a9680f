// Lenient decoding for free-form JSON object fields
//
// The marketplace sometimes ships `params`/`args` as a JSON-encoded string
// instead of a nested object. Both forms decode to the same value.

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::{Map, Value};

pub fn json_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(D::Error::custom(format!(
                "expected a JSON object, found {}",
                kind_of(&other)
            ))),
            Err(e) => Err(D::Error::custom(format!("invalid JSON object string: {}", e))),
        },
        other => Err(D::Error::custom(format!(
            "expected a JSON object, found {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "json_object")]
        params: Map<String, Value>,
    }

    #[test]
    fn test_accepts_nested_object() {
        let holder: Holder = serde_json::from_value(json!({"params": {"city": "Tokyo"}})).unwrap();
        assert_eq!(holder.params["city"], "Tokyo");
    }

    #[test]
    fn test_accepts_encoded_string() {
        let holder: Holder =
            serde_json::from_value(json!({"params": "{\"city\": \"Tokyo\"}"})).unwrap();
        assert_eq!(holder.params["city"], "Tokyo");
    }

    #[test]
    fn test_rejects_non_object() {
        let err = serde_json::from_value::<Holder>(json!({"params": "[1, 2]"})).unwrap_err();
        assert!(err.to_string().contains("an array"));

        assert!(serde_json::from_value::<Holder>(json!({"params": 3})).is_err());
    }
}
