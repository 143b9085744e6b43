use crate::models::Person;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record-mutation webhook payload - can be single object or array
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MutationPayload {
    Single(MutationEvent),
    Batch(Vec<MutationEvent>),
}

impl MutationPayload {
    /// Convert to a vec of events for uniform processing
    pub fn into_events(self) -> Vec<MutationEvent> {
        match self {
            MutationPayload::Single(event) => vec![event],
            MutationPayload::Batch(events) => events,
        }
    }
}

/// Individual mutation event from the system of record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MutationEvent {
    /// Hook action type (e.g., "person.created", "person.updated")
    #[serde(default)]
    pub hook_action: Option<String>,

    /// The affected record, as the system of record saw it after the
    /// mutation.
    pub record: Person,

    /// Raw data for any additional fields
    #[serde(flatten)]
    pub raw: Value,
}

impl MutationEvent {
    pub fn is_create(&self) -> bool {
        self.hook_action.as_deref() == Some("person.created")
    }

    pub fn is_update(&self) -> bool {
        self.hook_action.as_deref() == Some("person.updated")
    }
}

/// Response sent back to the mutation-event source
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub received: usize,
    pub scheduled: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_event() {
        let json = r#"
        {
            "hook_action": "person.created",
            "record": {
                "id": "9b40fbb4-6c51-4c0e-a3c8-7e9b1b2f1a11",
                "external_id": "42",
                "first_name": "Test",
                "last_name": "User"
            }
        }
        "#;

        let payload: MutationPayload = serde_json::from_str(json).unwrap();
        match payload {
            MutationPayload::Single(event) => {
                assert!(event.is_create());
                assert_eq!(event.record.external_id.as_deref(), Some("42"));
                assert!(event.record.email.is_none());
            }
            _ => panic!("Expected single event"),
        }
    }

    #[test]
    fn test_parse_batch_events() {
        let json = r#"
        [
            {
                "hook_action": "person.updated",
                "record": {"id": "9b40fbb4-6c51-4c0e-a3c8-7e9b1b2f1a11", "external_id": "150"}
            },
            {
                "hook_action": "person.updated",
                "record": {"id": "1c6a2f9e-0d1b-4f3a-9a51-52f0330bb4aa", "external_id": "100"}
            }
        ]
        "#;

        let payload: MutationPayload = serde_json::from_str(json).unwrap();
        match payload {
            MutationPayload::Batch(events) => {
                assert_eq!(events.len(), 2);
                assert!(events.iter().all(|e| e.is_update()));
            }
            _ => panic!("Expected batch events"),
        }
    }
}
