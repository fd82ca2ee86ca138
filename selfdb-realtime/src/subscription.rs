//! Subscription matching (§4.5): decides whether an incoming `Change Event`
//! should be delivered to a given subscription.

use serde::{Deserialize, Serialize};

use crate::event::ChangeEvent;

pub const WILDCARD_SUBSCRIPTION_ID: &str = "tables_changes";

const CHANNEL_ALIASES: &[&str] = &["buckets_changes", "functions_changes"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub table: Option<String>,
}

impl Subscription {
    /// §4.5 matching rule: a subscription matches an event if its table
    /// filter agrees, its id names the channel directly, it's the
    /// cross-table wildcard, or it's one of the known channel aliases.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if let Some(table) = &self.table {
            if table == &event.table {
                return true;
            }
        }
        if self.id == event.channel {
            return true;
        }
        if self.id == WILDCARD_SUBSCRIPTION_ID {
            return true;
        }
        if CHANNEL_ALIASES.contains(&self.id.as_str()) && self.id == event.channel {
            return true;
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::Operation;

    fn event(channel: &str, table: &str) -> ChangeEvent {
        ChangeEvent {
            channel: channel.to_string(),
            operation: Operation::Insert,
            table: table.to_string(),
            data: None,
            old_data: None,
        }
    }

    #[test]
    fn test_table_filter_matches() {
        let sub = Subscription {
            id: "sub-1".into(),
            table: Some("files".into()),
        };
        assert!(sub.matches(&event("files_changes", "files")));
        assert!(!sub.matches(&event("buckets_changes", "buckets")));
    }

    #[test]
    fn test_channel_named_subscription_matches() {
        let sub = Subscription {
            id: "files_changes".into(),
            table: None,
        };
        assert!(sub.matches(&event("files_changes", "files")));
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let sub = Subscription {
            id: WILDCARD_SUBSCRIPTION_ID.into(),
            table: None,
        };
        assert!(sub.matches(&event("files_changes", "files")));
        assert!(sub.matches(&event("users_changes", "users")));
    }

    #[test]
    fn test_unrelated_subscription_does_not_match() {
        let sub = Subscription {
            id: "sub-2".into(),
            table: Some("users".into()),
        };
        assert!(!sub.matches(&event("files_changes", "files")));
    }
}
