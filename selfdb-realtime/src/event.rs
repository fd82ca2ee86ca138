//! The Change Event wire shape (§4.4, §6.3).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

/// A single row change, as delivered by a Postgres `NOTIFY` payload.
///
/// `channel` is the Postgres channel name (`<table>_changes`) the payload
/// arrived on; `table` is carried inside the JSON payload itself so it
/// survives independent of the channel it happened to be delivered on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub channel: String,
    pub operation: Operation,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_data: Option<Value>,
}

impl ChangeEvent {
    /// Parses the JSON payload pg_notify delivers, pairing it with the
    /// channel name it arrived on (the payload itself doesn't repeat it).
    pub fn from_notify_payload(channel: &str, payload: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct RawPayload {
            operation: Operation,
            table: String,
            #[serde(default)]
            data: Option<Value>,
            #[serde(default)]
            old_data: Option<Value>,
        }
        let raw: RawPayload = serde_json::from_str(payload)?;
        Ok(ChangeEvent {
            channel: channel.to_string(),
            operation: raw.operation,
            table: raw.table,
            data: raw.data,
            old_data: raw.old_data,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parses_insert_payload() {
        let payload = r#"{"operation":"INSERT","table":"buckets","data":{"id":"x"}}"#;
        let event = ChangeEvent::from_notify_payload("buckets_changes", payload).unwrap();
        assert_eq!(event.channel, "buckets_changes");
        assert_eq!(event.operation, Operation::Insert);
        assert!(event.old_data.is_none());
    }

    #[test]
    fn test_parses_delete_payload_with_old_data() {
        let payload = r#"{"operation":"DELETE","table":"files","old_data":{"id":"y"}}"#;
        let event = ChangeEvent::from_notify_payload("files_changes", payload).unwrap();
        assert_eq!(event.operation, Operation::Delete);
        assert!(event.data.is_none());
        assert!(event.old_data.is_some());
    }
}
