//! Response envelope normalization
//!
//! One raw HTTP body becomes one [`Envelope`]: a paged record set with
//! pagination metadata, a single record, or raw text. The parser is
//! deliberately lenient: malformed or unexpected payloads are coerced rather
//! than rejected, and callers must tolerate non-list records downstream.

use crate::types::{JsonObject, JsonValue};
use serde_json::Value;

/// Pagination metadata carried alongside a page of records.
///
/// The wire fields `from` and `next` are lifted into typed fields here, so
/// their reserved-word collisions in other client languages cannot arise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    /// Total matching records across all pages (not just the current page)
    pub total: Option<u64>,
    /// Opaque continuation cursor for search-after pagination
    pub next: Option<String>,
    /// Page size hint declared by the server
    pub size: Option<u64>,
    /// Offset of the current page
    pub from: Option<u64>,
    /// Remaining top-level fields of the envelope
    pub extra: JsonObject,
}

impl Meta {
    fn from_object(mut obj: JsonObject) -> Self {
        let total = obj.remove("total").as_ref().and_then(as_count);
        let size = obj.remove("size").as_ref().and_then(as_count);
        let from = obj.remove("from").as_ref().and_then(as_count);
        let next = obj.remove("next").map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        });

        Self {
            total,
            next,
            size,
            from,
            extra: obj,
        }
    }
}

/// Counts can arrive as integers or floats depending on the server's
/// serializer; both collapse to u64.
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_f64().map(|f| f as u64))
}

/// Normalized result of one HTTP call
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Structured response with a `data` key: records plus metadata
    Paged {
        records: Vec<JsonValue>,
        meta: Meta,
    },
    /// Structured response without `data`: the whole value is one record
    Single(JsonValue),
    /// Anything that did not parse as JSON
    Raw(String),
}

impl Envelope {
    /// Parse a raw body into an envelope. Pure and infallible.
    pub fn parse(body: &str) -> Self {
        let Ok(parsed) = serde_json::from_str::<Value>(body) else {
            return Envelope::Raw(body.to_string());
        };

        match parsed {
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(records)) => Envelope::Paged {
                    records,
                    meta: Meta::from_object(obj),
                },
                // A single object under `data` is wrapped into a
                // one-element page
                Some(single) => Envelope::Paged {
                    records: vec![single],
                    meta: Meta::from_object(obj),
                },
                None => Envelope::Single(Value::Object(obj)),
            },
            Value::Array(records) => Envelope::Paged {
                records,
                meta: Meta::default(),
            },
            scalar => Envelope::Single(scalar),
        }
    }

    /// Decompose into records plus metadata for uniform consumption by the
    /// iteration engine.
    pub fn into_parts(self) -> (Vec<JsonValue>, Meta) {
        match self {
            Envelope::Paged { records, meta } => (records, meta),
            Envelope::Single(record) => (vec![record], Meta::default()),
            Envelope::Raw(text) => (vec![Value::String(text)], Meta::default()),
        }
    }

    /// Scalar payload as text, for endpoints like ping and version that
    /// answer with a bare value
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Envelope::Raw(text) => Some(text.clone()),
            Envelope::Single(Value::String(s)) => Some(s.clone()),
            Envelope::Single(Value::Number(n)) => Some(n.to_string()),
            Envelope::Single(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Number of records in this envelope
    pub fn record_count(&self) -> usize {
        match self {
            Envelope::Paged { records, .. } => records.len(),
            Envelope::Single(_) | Envelope::Raw(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_paged() {
        let body = r#"{"data":[{"id":1},{"id":2}],"total":5,"next":"abc","size":2,"from":0}"#;
        let envelope = Envelope::parse(body);

        let Envelope::Paged { records, meta } = envelope else {
            panic!("expected Paged");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(meta.total, Some(5));
        assert_eq!(meta.next.as_deref(), Some("abc"));
        assert_eq!(meta.size, Some(2));
        assert_eq!(meta.from, Some(0));
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_parse_paged_extra_fields() {
        let body = r#"{"data":[],"total":0,"took":12}"#;
        let Envelope::Paged { meta, .. } = Envelope::parse(body) else {
            panic!("expected Paged");
        };
        assert_eq!(meta.extra.get("took"), Some(&json!(12)));
    }

    #[test]
    fn test_parse_single_object_data_wraps() {
        let body = r#"{"data":{"id":1},"total":1}"#;
        let Envelope::Paged { records, meta } = Envelope::parse(body) else {
            panic!("expected Paged");
        };
        assert_eq!(records, vec![json!({"id": 1})]);
        assert_eq!(meta.total, Some(1));
    }

    #[test]
    fn test_parse_object_without_data() {
        let body = r#"{"id":"ENSG000001","approvedSymbol":"BRAF"}"#;
        let envelope = Envelope::parse(body);
        assert_eq!(
            envelope,
            Envelope::Single(json!({"id":"ENSG000001","approvedSymbol":"BRAF"}))
        );
        assert_eq!(envelope.record_count(), 1);
    }

    #[test]
    fn test_parse_top_level_array() {
        let body = r#"[{"id":1},{"id":2}]"#;
        let Envelope::Paged { records, meta } = Envelope::parse(body) else {
            panic!("expected Paged");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(meta, Meta::default());
    }

    #[test]
    fn test_parse_raw_text() {
        let envelope = Envelope::parse("pong");
        assert_eq!(envelope, Envelope::Raw("pong".to_string()));
        assert_eq!(envelope.scalar_text().as_deref(), Some("pong"));
    }

    #[test]
    fn test_parse_json_scalar() {
        // Servers that skip content-type negotiation can answer with a bare
        // number; version strings arrive this way.
        let envelope = Envelope::parse("3.1");
        assert_eq!(envelope.scalar_text().as_deref(), Some("3.1"));

        let envelope = Envelope::parse("\"pong\"");
        assert_eq!(envelope.scalar_text().as_deref(), Some("pong"));
    }

    #[test]
    fn test_into_parts_uniform() {
        let (records, meta) = Envelope::parse(r#"{"data":[{"id":1}],"total":9}"#).into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(meta.total, Some(9));

        let (records, meta) = Envelope::parse(r#"{"id":1}"#).into_parts();
        assert_eq!(records, vec![json!({"id": 1})]);
        assert_eq!(meta, Meta::default());

        let (records, _) = Envelope::parse("not json at all").into_parts();
        assert_eq!(records, vec![json!("not json at all")]);
    }

    #[test]
    fn test_meta_next_non_string_token() {
        let body = r#"{"data":[],"next":[123,"abc"]}"#;
        let Envelope::Paged { meta, .. } = Envelope::parse(body) else {
            panic!("expected Paged");
        };
        assert_eq!(meta.next.as_deref(), Some("[123,\"abc\"]"));
    }

    #[test]
    fn test_meta_float_total() {
        let body = r#"{"data":[],"total":5.0}"#;
        let Envelope::Paged { meta, .. } = Envelope::parse(body) else {
            panic!("expected Paged");
        };
        assert_eq!(meta.total, Some(5));
    }
}
