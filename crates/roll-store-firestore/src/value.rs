//! Translation between plain JSON and Firestore's typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type, e.g.
//! `{"stringValue": "Math"}` or `{"integerValue": "3"}`. 64-bit integers
//! travel as decimal strings.

use roll_core::store::Fields;
use serde_json::{Map, Number, Value, json};

use crate::{Error, Result};

// ─── Encode ──────────────────────────────────────────────────────────────────

/// Encode a plain JSON value as a Firestore `Value`.
pub fn encode_value(value: &Value) -> Value {
  match value {
    Value::Null => json!({ "nullValue": null }),
    Value::Bool(b) => json!({ "booleanValue": b }),
    Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        json!({ "integerValue": i.to_string() })
      } else if let Some(u) = n.as_u64() {
        json!({ "integerValue": u.to_string() })
      } else {
        json!({ "doubleValue": n.as_f64() })
      }
    }
    Value::String(s) => json!({ "stringValue": s }),
    Value::Array(items) => {
      let values: Vec<Value> = items.iter().map(encode_value).collect();
      json!({ "arrayValue": { "values": values } })
    }
    Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
  }
}

/// Encode a document body as a Firestore `fields` map.
pub fn encode_fields(fields: &Fields) -> Value {
  Value::Object(
    fields
      .iter()
      .map(|(k, v)| (k.clone(), encode_value(v)))
      .collect(),
  )
}

// ─── Decode ──────────────────────────────────────────────────────────────────

/// Decode a Firestore `Value` into plain JSON.
///
/// Timestamps and references come back as strings.
pub fn decode_value(value: &Value) -> Result<Value> {
  let Some((kind, inner)) = value.as_object().and_then(|m| {
    if m.len() == 1 { m.iter().next() } else { None }
  }) else {
    return Err(Error::Codec(format!("expected a single-key typed value, got {value}")));
  };

  match kind.as_str() {
    "nullValue" => Ok(Value::Null),
    "booleanValue" => inner
      .as_bool()
      .map(Value::Bool)
      .ok_or_else(|| Error::Codec(format!("bad booleanValue {inner}"))),
    "integerValue" => decode_integer(inner),
    "doubleValue" => inner
      .as_f64()
      .and_then(Number::from_f64)
      .map(Value::Number)
      .ok_or_else(|| Error::Codec(format!("bad doubleValue {inner}"))),
    "stringValue" | "timestampValue" | "referenceValue" => inner
      .as_str()
      .map(|s| Value::String(s.to_owned()))
      .ok_or_else(|| Error::Codec(format!("bad {kind} {inner}"))),
    "arrayValue" => {
      // An empty array is sent as `{"arrayValue": {}}`.
      let items = match inner.get("values") {
        Some(Value::Array(items)) => items.iter().map(decode_value).collect::<Result<Vec<_>>>()?,
        Some(other) => return Err(Error::Codec(format!("bad arrayValue {other}"))),
        None => Vec::new(),
      };
      Ok(Value::Array(items))
    }
    "mapValue" => match inner.get("fields") {
      Some(Value::Object(fields)) => Ok(Value::Object(decode_fields(fields)?)),
      Some(other) => Err(Error::Codec(format!("bad mapValue {other}"))),
      None => Ok(Value::Object(Map::new())),
    },
    other => Err(Error::Codec(format!("unsupported value type {other:?}"))),
  }
}

fn decode_integer(inner: &Value) -> Result<Value> {
  let parsed = match inner {
    Value::String(s) => s.parse::<i64>().ok(),
    Value::Number(n) => n.as_i64(),
    _ => None,
  };
  parsed
    .map(|i| Value::Number(i.into()))
    .ok_or_else(|| Error::Codec(format!("bad integerValue {inner}")))
}

/// Decode a Firestore `fields` map into a document body.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields> {
  fields
    .iter()
    .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subject_document_wire_shape() {
    let body = json!({
      "name": "Math",
      "schedule": [{"day": "Monday", "startTime": "09:00", "endTime": "10:00"}],
      "totalClasses": 0,
      "attendedClasses": 0
    });
    let Value::Object(fields) = body else { unreachable!() };

    let encoded = encode_fields(&fields);
    assert_eq!(encoded["name"], json!({"stringValue": "Math"}));
    assert_eq!(encoded["totalClasses"], json!({"integerValue": "0"}));
    assert_eq!(
      encoded["schedule"]["arrayValue"]["values"][0]["mapValue"]["fields"]["day"],
      json!({"stringValue": "Monday"})
    );
  }

  #[test]
  fn decodes_server_response_fields() {
    let raw = json!({
      "subjectId": {"stringValue": "abc"},
      "attended": {"booleanValue": true},
      "timestamp": {"integerValue": "1760860800000"},
      "date": {"timestampValue": "2025-10-19T08:00:00Z"},
      "score": {"doubleValue": 0.5},
      "tags": {"arrayValue": {}},
      "extra": {"mapValue": {}},
      "gone": {"nullValue": null}
    });
    let Value::Object(raw) = raw else { unreachable!() };

    let fields = decode_fields(&raw).unwrap();
    assert_eq!(fields["subjectId"], "abc");
    assert_eq!(fields["attended"], true);
    assert_eq!(fields["timestamp"], 1_760_860_800_000_i64);
    assert_eq!(fields["date"], "2025-10-19T08:00:00Z");
    assert_eq!(fields["score"], 0.5);
    assert_eq!(fields["tags"], json!([]));
    assert_eq!(fields["extra"], json!({}));
    assert!(fields["gone"].is_null());
  }

  #[test]
  fn rejects_unknown_and_malformed_values() {
    assert!(decode_value(&json!({"geoPointValue": {"latitude": 1.0}})).is_err());
    assert!(decode_value(&json!({"integerValue": "three"})).is_err());
    assert!(decode_value(&json!("bare string")).is_err());
    assert!(decode_value(&json!({"stringValue": "a", "booleanValue": true})).is_err());
  }

  #[test]
  fn large_unsigned_integers_stay_integers() {
    let encoded = encode_value(&json!(u64::MAX));
    assert_eq!(encoded, json!({"integerValue": u64::MAX.to_string()}));
  }
}
