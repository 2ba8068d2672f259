//! Message record and field validation

use crate::error::{Error, Result};

/// Maximum sender/receiver length in bytes
pub const MAX_PARTY_LEN: usize = 99;

/// Maximum content length in bytes
pub const MAX_CONTENT_LEN: usize = 1023;

/// A single message as stored in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier, also the cache key
    pub id: u64,
    /// Send time in milliseconds since the Unix epoch
    pub time_sent: i64,
    /// Sender name
    pub sender: String,
    /// Receiver name
    pub receiver: String,
    /// Message body
    pub content: String,
    /// Whether the message has been delivered
    pub delivered: bool,
}

impl Message {
    /// Build a validated message stamped with the current time
    ///
    /// # Arguments
    /// * `id` - Unique message identifier
    /// * `sender` - Sender name (no whitespace, max 99 bytes)
    /// * `receiver` - Receiver name (no whitespace, max 99 bytes)
    /// * `content` - Body (no whitespace, max 1023 bytes)
    /// * `delivered` - Delivery flag
    pub fn new(
        id: u64,
        sender: &str,
        receiver: &str,
        content: &str,
        delivered: bool,
    ) -> Result<Self> {
        validate_field("sender", sender, MAX_PARTY_LEN)?;
        validate_field("receiver", receiver, MAX_PARTY_LEN)?;
        validate_field("content", content, MAX_CONTENT_LEN)?;

        Ok(Self {
            id,
            time_sent: chrono::Utc::now().timestamp_millis(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            content: content.to_string(),
            delivered,
        })
    }

    /// Override the send timestamp
    pub fn with_time_sent(mut self, time_sent: i64) -> Self {
        self.time_sent = time_sent;
        self
    }
}

// Fields are whitespace-delimited on disk, so an empty or spaced value would
// shift every column after it.
fn validate_field(field: &'static str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if value.len() > max_len {
        return Err(Error::InvalidField {
            field,
            reason: format!("{} bytes exceeds maximum of {}", value.len(), max_len),
        });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidField {
            field,
            reason: "must not contain whitespace".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message() {
        let msg = Message::new(7, "alice", "bob", "hello", false).unwrap();

        assert_eq!(msg.id, 7);
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.receiver, "bob");
        assert_eq!(msg.content, "hello");
        assert!(!msg.delivered);
        assert!(msg.time_sent > 0);
    }

    #[test]
    fn test_with_time_sent() {
        let msg = Message::new(1, "a", "b", "c", true)
            .unwrap()
            .with_time_sent(42);
        assert_eq!(msg.time_sent, 42);
    }

    #[test]
    fn test_content_too_long() {
        let content = "x".repeat(MAX_CONTENT_LEN + 1);
        let result = Message::new(1, "a", "b", &content, false);
        assert!(matches!(
            result,
            Err(Error::InvalidField { field: "content", .. })
        ));
    }

    #[test]
    fn test_content_at_limit() {
        let content = "x".repeat(MAX_CONTENT_LEN);
        assert!(Message::new(1, "a", "b", &content, false).is_ok());
    }

    #[test]
    fn test_sender_too_long() {
        let sender = "s".repeat(MAX_PARTY_LEN + 1);
        let result = Message::new(1, &sender, "b", "c", false);
        assert!(matches!(
            result,
            Err(Error::InvalidField { field: "sender", .. })
        ));
    }

    #[test]
    fn test_whitespace_rejected() {
        let result = Message::new(1, "a", "b", "two words", false);
        assert!(matches!(
            result,
            Err(Error::InvalidField { field: "content", .. })
        ));
    }

    #[test]
    fn test_empty_receiver_rejected() {
        let result = Message::new(1, "a", "", "c", false);
        assert!(matches!(
            result,
            Err(Error::InvalidField { field: "receiver", .. })
        ));
    }
}
