//! Inbound Linear webhook payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a Linear webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// `create`, `update` or `remove`.
    pub action: String,
    /// Entity type: `Issue`, `Comment`, `Project`, `Cycle`, ...
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Serialized entity.
    pub data: Value,
    /// When the event happened.
    pub created_at: String,
    /// Sending workspace.
    pub organization_id: String,
    /// Webhook that delivered the event.
    pub webhook_id: String,
    /// Milliseconds since the epoch at which Linear sent the delivery.
    pub webhook_timestamp: i64,
    /// Link to the affected entity, when Linear sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Previous values of changed fields on `update` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_from: Option<Value>,
}

impl WebhookPayload {
    /// Routing key in `Type.action` form, e.g. `Issue.create`.
    pub fn event_key(&self) -> String {
        format!("{}.{}", self.entity_type, self.action)
    }

    /// Read a string field from `data`.
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_deserialization() {
        let json = r#"{
            "action": "create",
            "type": "Issue",
            "data": {"id": "abc", "identifier": "ENG-1", "title": "Broken"},
            "createdAt": "2024-01-15T10:30:00.000Z",
            "organizationId": "org-1",
            "webhookId": "hook-1",
            "webhookTimestamp": 1705314600000
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.event_key(), "Issue.create");
        assert_eq!(payload.data_str("identifier"), Some("ENG-1"));
        assert_eq!(payload.webhook_timestamp, 1_705_314_600_000);
        assert!(payload.url.is_none());
    }

    #[test]
    fn test_payload_missing_type_is_rejected() {
        let json = r#"{"action": "create", "data": {}}"#;
        assert!(serde_json::from_str::<WebhookPayload>(json).is_err());
    }
}
