//! Conversion between plain JSON and Firestore's typed value encoding.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A document as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    /// Document id: the last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Fields decoded back into plain JSON.
    pub fn to_json(&self) -> Value {
        Value::Object(decode_fields(&self.fields))
    }
}

pub fn encode_fields(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Encode a document's top-level fields. A field named in `timestamp_fields`
/// whose value is RFC 3339 text is written as a `timestampValue`; anything
/// else goes through [`encode_value`].
pub fn encode_document(object: &Map<String, Value>, timestamp_fields: &[String]) -> Map<String, Value> {
    object
        .iter()
        .map(|(key, value)| {
            let encoded = match value.as_str() {
                Some(text)
                    if timestamp_fields.iter().any(|f| f == key)
                        && DateTime::parse_from_rfc3339(text).is_ok() =>
                {
                    serde_json::json!({ "timestampValue": text })
                }
                _ => encode_value(value),
            };
            (key.clone(), encoded)
        })
        .collect()
}

pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => serde_json::json!({ "nullValue": null }),
        Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // int64 travels as a decimal string
                serde_json::json!({ "integerValue": i.to_string() })
            } else {
                serde_json::json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => serde_json::json!({ "stringValue": s }),
        Value::Array(items) => serde_json::json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => serde_json::json!({
            "mapValue": { "fields": encode_fields(map) }
        }),
    }
}

pub fn decode_value(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return Value::Null;
    };

    if let Some(s) = map.get("stringValue") {
        return s.clone();
    }
    if let Some(b) = map.get("booleanValue") {
        return b.clone();
    }
    if let Some(i) = map.get("integerValue") {
        return match i {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        };
    }
    if let Some(d) = map.get("doubleValue") {
        return d.clone();
    }
    if let Some(t) = map.get("timestampValue") {
        return t.clone();
    }
    if let Some(r) = map.get("referenceValue") {
        return r.clone();
    }
    if let Some(array) = map.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(inner) = map.get("mapValue") {
        let fields = inner
            .get("fields")
            .and_then(|f| f.as_object())
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }

    Value::Null
}
