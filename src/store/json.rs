// BSON <-> JSON conversion for API payloads
//
// Identifiers leave the API as plain hex strings and dates as RFC 3339 with
// millisecond precision, the shape web clients already expect.

use bson::{Bson, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => Value::String(format_datetime(dt)),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Double(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_to_json(document: Document) -> Value {
    let map: Map<String, Value> = document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();
    Value::Object(map)
}

pub fn documents_to_json(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(document_to_json).collect())
}

/// Convert a JSON object received from a client into a document
pub fn json_to_document(object: &Map<String, Value>) -> Result<Document, bson::ser::Error> {
    bson::to_document(object)
}

fn format_datetime(dt: bson::DateTime) -> String {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).map_or_else(
        || dt.to_string(),
        |t| t.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_object_id_as_hex() {
        let id = ObjectId::new();
        let value = document_to_json(doc! { "_id": id, "name": "MIT" });
        assert_eq!(value, json!({ "_id": id.to_hex(), "name": "MIT" }));
    }

    #[test]
    fn test_datetime_as_rfc3339() {
        let dt = bson::DateTime::from_millis(1_700_000_000_123);
        let value = bson_to_json(Bson::DateTime(dt));
        assert_eq!(value, json!("2023-11-14T22:13:20.123Z"));
    }

    #[test]
    fn test_nested_values() {
        let value = document_to_json(doc! {
            "rating": 4.5,
            "researchCount": 12_i64,
            "events": ["fest", "expo"],
            "meta": { "open": true, "note": Bson::Null },
        });
        assert_eq!(
            value,
            json!({
                "rating": 4.5,
                "researchCount": 12,
                "events": ["fest", "expo"],
                "meta": { "open": true, "note": null },
            })
        );
    }

    #[test]
    fn test_json_object_to_document() {
        let body = json!({ "userEmail": "a@b.c", "gpa": 3.9, "subjects": ["math"] });
        let document = json_to_document(body.as_object().unwrap()).unwrap();
        assert_eq!(document.get_str("userEmail").unwrap(), "a@b.c");
        assert_eq!(document.get_f64("gpa").unwrap(), 3.9);
        assert_eq!(document.get_array("subjects").unwrap().len(), 1);
    }
}
