//! Identity key generator for notification deduplication
//!
//! Two deliveries of the same logical event must map to the same key, so the
//! key is derived only from fields the producer assigns once: the raw wire
//! type tag, the producer timestamp, and the recipient id. Display fields
//! (title, message, data) are intentionally excluded — the producer may
//! re-render those on redelivery.
//!
//! NOTE: the timestamp joins the key as the raw ISO-8601 string. Parsing and
//! re-serializing it could change the byte form (fraction digits, offset
//! style) and silently split one logical event into two identities.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::event::Notification;

/// Generate a deterministic identity key for a notification
///
/// The key is a hash of `type|timestamp|userId`, ensuring:
/// - Same logical event → same key, regardless of display fields
/// - Different events → different keys
/// - Distinct unknown type tags stay distinct (the raw tag is hashed,
///   not the classified kind)
pub fn identity_key(notification: &Notification) -> String {
    let composite = format!(
        "{}|{}|{}",
        notification.event_type, notification.timestamp, notification.user_id
    );
    format!("{:016x}", hash_content(&composite))
}

/// Hash content using DefaultHasher
pub fn hash_content(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::event::Notification;

    fn notification(event_type: &str, timestamp: &str, user_id: &str) -> Notification {
        Notification {
            event_type: event_type.to_string(),
            title: "Title".to_string(),
            message: "Message".to_string(),
            data: serde_json::Map::new(),
            timestamp: timestamp.to_string(),
            user_id: user_id.to_string(),
        }
    }

    #[test]
    fn test_same_identity_same_key() {
        let a = notification("new_message", "2024-01-01T00:00:00Z", "u1");
        let b = notification("new_message", "2024-01-01T00:00:00Z", "u1");
        assert_eq!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn test_display_fields_do_not_change_key() {
        let a = notification("new_message", "2024-01-01T00:00:00Z", "u1");
        let mut b = a.clone();
        b.title = "Re-rendered title".to_string();
        b.message = "Re-rendered body".to_string();
        assert_eq!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn test_different_type_different_key() {
        let a = notification("new_message", "2024-01-01T00:00:00Z", "u1");
        let b = notification("lead_alert", "2024-01-01T00:00:00Z", "u1");
        assert_ne!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn test_different_timestamp_different_key() {
        let a = notification("new_message", "2024-01-01T00:00:00Z", "u1");
        let b = notification("new_message", "2024-01-01T00:00:01Z", "u1");
        assert_ne!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn test_different_recipient_different_key() {
        let a = notification("new_message", "2024-01-01T00:00:00Z", "u1");
        let b = notification("new_message", "2024-01-01T00:00:00Z", "u2");
        assert_ne!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn test_key_format() {
        let key = identity_key(&notification("broadcast", "2024-01-01T00:00:00Z", "u1"));
        assert_eq!(key.len(), 16); // 16 hex chars
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_unknown_tags_stay_distinct() {
        // Both classify as Unknown for policy purposes, but their identities
        // must not collide.
        let a = notification("mystery_one", "2024-01-01T00:00:00Z", "u1");
        let b = notification("mystery_two", "2024-01-01T00:00:00Z", "u1");
        assert_ne!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn test_hash_content_deterministic() {
        assert_eq!(hash_content("estate"), hash_content("estate"));
        assert_ne!(hash_content("estate a"), hash_content("estate b"));
    }
}
