//! # msglog
//!
//! Append-only flat-file store for messages.
//!
//! ## Layout
//! - One message per line in `messages.txt`
//! - Fields: `identifier time_sent sender receiver content delivered`
//! - Lookups are linear scans; the first matching line wins
//! - No index, no compaction

#![warn(missing_docs)]

mod error;
mod message;
mod parser;
mod storage;

pub use error::{Error, Result};
pub use message::{Message, MAX_CONTENT_LEN, MAX_PARTY_LEN};
pub use parser::{format_message, parse_identifier, parse_message};
pub use storage::{MessageLog, LOG_FILE_NAME};
