//! JSON bodies exchanged with clients and peers.
//!
//! Every response carries an `ok` flag. Request bodies are lenient about
//! missing fields (they default) so the node can answer with its own
//! validation errors instead of a deserializer message.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::clock::Timestamp;
use crate::store::Entry;

/// Body of `POST /put`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PutRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// Body of `POST /replicate`, also what a node sends to each peer.
///
/// `ts` is read leniently: a missing, negative, fractional or otherwise
/// non-integer timestamp becomes 0 and is rejected by validation rather
/// than by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicateRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub ts: Timestamp,
    #[serde(default)]
    pub origin: String,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_u64().unwrap_or(0))
}

/// Query string of `GET /get`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetParams {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutResponse {
    pub ok: bool,
    pub node: String,
    pub key: String,
    pub value: Value,
    pub ts: Timestamp,
    pub lamport: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    pub ok: bool,
    pub key: String,
    pub value: Value,
    pub ts: Timestamp,
    pub origin: String,
    pub lamport: Timestamp,
}

/// Acknowledgement returned by `POST /replicate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateResponse {
    pub ok: bool,
    pub node: String,
    pub lamport: Timestamp,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub node: String,
    pub lamport: Timestamp,
    pub peers: Vec<String>,
    pub store: BTreeMap<String, Entry>,
}

/// Failure body. `lamport` is only reported for lookups of absent keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lamport: Option<Timestamp>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            lamport: None,
        }
    }

    pub fn with_lamport(mut self, lamport: Timestamp) -> Self {
        self.lamport = Some(lamport);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_parses_to_defaults() {
        let put: PutRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(put, PutRequest::default());

        let replicate: ReplicateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(replicate.ts, 0);
        assert!(replicate.origin.is_empty());
        assert_eq!(replicate.value, Value::Null);
    }

    #[test]
    fn replicate_timestamp_parses_leniently() {
        let parse = |body: &str| serde_json::from_str::<ReplicateRequest>(body).unwrap().ts;

        assert_eq!(parse(r#"{"ts": 3}"#), 3);
        assert_eq!(parse(r#"{"ts": 18446744073709551614}"#), u64::MAX - 1);
        assert_eq!(parse(r#"{"ts": -1}"#), 0);
        assert_eq!(parse(r#"{"ts": 2.5}"#), 0);
        assert_eq!(parse(r#"{"ts": "7"}"#), 0);
        assert_eq!(parse(r#"{"ts": null}"#), 0);
    }

    #[test]
    fn large_timestamp_survives_the_wire() {
        let request = ReplicateRequest {
            key: "x".into(),
            value: Value::Null,
            ts: i64::MAX as Timestamp + 2,
            origin: "A".into(),
        };
        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: ReplicateRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn error_body_omits_lamport_unless_set() {
        let plain = serde_json::to_value(ErrorResponse::new("key required")).unwrap();
        assert_eq!(plain, json!({"ok": false, "error": "key required"}));

        let with_clock =
            serde_json::to_value(ErrorResponse::new("key not found").with_lamport(4)).unwrap();
        assert_eq!(
            with_clock,
            json!({"ok": false, "error": "key not found", "lamport": 4})
        );
    }

    #[test]
    fn status_store_uses_nested_entry_objects() {
        let mut store = BTreeMap::new();
        store.insert("x".to_string(), Entry::new(json!("a"), 1, "A"));
        let status = StatusResponse {
            ok: true,
            node: "A".into(),
            lamport: 1,
            peers: vec!["http://127.0.0.1:8002".into()],
            store,
        };

        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({
                "ok": true,
                "node": "A",
                "lamport": 1,
                "peers": ["http://127.0.0.1:8002"],
                "store": {"x": {"value": "a", "ts": 1, "origin": "A"}},
            })
        );
    }
}
