//! Message log implementation
//!
//! File layout:
//! - `messages.txt`: one message per line, appended in arrival order
//!
//! Every read is a linear scan from the start of the file.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::message::Message;
use crate::parser::{format_message, parse_identifier, parse_message};

/// File name of the log inside its directory
pub const LOG_FILE_NAME: &str = "messages.txt";

/// MessageLog is the handle to an append-only message file
#[derive(Debug)]
pub struct MessageLog {
    /// Path to the log file
    path: PathBuf,

    /// Log file handle, opened for read + append
    file: RwLock<File>,

    /// Is the log closed?
    closed: RwLock<bool>,
}

impl MessageLog {
    /// Open or create a message log in the given directory
    ///
    /// # Arguments
    /// * `dir` - Directory holding `messages.txt`
    ///
    /// # Returns
    /// * `Result<MessageLog>` - Log handle
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let path = dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        debug!(path = %path.display(), "opened message log");

        Ok(MessageLog {
            path,
            file: RwLock::new(file),
            closed: RwLock::new(false),
        })
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the first well-formed message with the given identifier
    ///
    /// Lines whose identifier matches but whose remaining fields are
    /// malformed are skipped with a warning.
    pub fn scan_for_key(&self, key: u64) -> Result<Option<Message>> {
        self.scan(|line_no, line| {
            match parse_identifier(line) {
                Some(id) if id == key => {}
                Some(_) => return None,
                None => {
                    warn!(line = line_no, path = %self.path.display(), "skipping line without identifier");
                    return None;
                }
            }

            match parse_message(line) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    warn!(line = line_no, key, error = %e, "skipping malformed line");
                    None
                }
            }
        })
    }

    /// Check whether any line starts with the given identifier
    pub fn exists_key(&self, key: u64) -> Result<bool> {
        let found = self.scan(|_, line| (parse_identifier(line) == Some(key)).then_some(()))?;
        Ok(found.is_some())
    }

    /// Append a message unless its identifier is already present
    ///
    /// A trailing line left without its newline is terminated first so the
    /// new record always starts on its own line.
    ///
    /// # Returns
    /// * `Result<bool>` - `true` if a line was written
    pub fn append(&self, msg: &Message) -> Result<bool> {
        if self.exists_key(msg.id)? {
            debug!(key = msg.id, "message already in log, not appending");
            return Ok(false);
        }

        let mut file = self.file.write();
        let mut line = String::new();
        if ends_mid_line(&mut file)? {
            warn!(path = %self.path.display(), "log ends without newline, terminating last line");
            line.push('\n');
        }
        line.push_str(&format_message(msg));
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!(key = msg.id, "appended message to log");
        Ok(true)
    }

    /// Count well-formed messages in the log
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        let _: Option<()> = self.scan(|_, line| {
            if parse_message(line).is_ok() {
                count += 1;
            }
            None
        })?;
        Ok(count)
    }

    /// Check if the log holds no well-formed messages
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Close the log and fsync pending writes
    pub fn close(&mut self) -> Result<()> {
        if *self.closed.read() {
            return Ok(());
        }

        let mut file = self.file.write();
        file.flush()?;
        file.sync_all()?;

        *self.closed.write() = true;

        Ok(())
    }

    /// Visit every line from the start of the file until `visit` returns a value
    fn scan<T>(&self, mut visit: impl FnMut(usize, &str) -> Option<T>) -> Result<Option<T>> {
        if *self.closed.read() {
            return Err(Error::Closed);
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(0))?;

        let reader = BufReader::new(&mut *file);
        for (idx, raw) in reader.split(b'\n').enumerate() {
            let raw = raw?;
            let line_no = idx + 1;

            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim_end_matches('\r'),
                Err(_) => {
                    warn!(line = line_no, "skipping non UTF-8 line");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            if let Some(found) = visit(line_no, line) {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }
}

/// Whether the file is non-empty and its last byte is not a newline
fn ends_mid_line(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl Drop for MessageLog {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn message(id: u64, content: &str) -> Message {
        Message::new(id, "Sender", "Receiver", content, false)
            .unwrap()
            .with_time_sent(1_000 + id as i64)
    }

    #[test]
    fn test_open_creates_file() {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path().join("nested")).unwrap();

        assert!(log.path().exists());
        assert_eq!(log.len().unwrap(), 0);
        assert!(log.is_empty().unwrap());
    }

    #[test]
    fn test_append_and_scan() {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();

        let msg = message(3, "hello");
        assert!(log.append(&msg).unwrap());

        assert_eq!(log.scan_for_key(3).unwrap(), Some(msg));
        assert_eq!(log.scan_for_key(4).unwrap(), None);
        assert_eq!(log.len().unwrap(), 1);
    }

    #[test]
    fn test_append_skips_existing_key() {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();

        assert!(log.append(&message(1, "first")).unwrap());
        assert!(!log.append(&message(1, "second")).unwrap());

        assert_eq!(log.len().unwrap(), 1);
        assert_eq!(log.scan_for_key(1).unwrap().unwrap().content, "first");
    }

    #[test]
    fn test_exists_key() {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();

        log.append(&message(10, "a")).unwrap();
        log.append(&message(11, "b")).unwrap();

        assert!(log.exists_key(10).unwrap());
        assert!(log.exists_key(11).unwrap());
        assert!(!log.exists_key(1).unwrap());
    }

    #[test]
    fn test_first_match_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LOG_FILE_NAME),
            "5 1 a b first 0\n5 2 a b second 1\n",
        )
        .unwrap();

        let log = MessageLog::open(dir.path()).unwrap();
        assert_eq!(log.scan_for_key(5).unwrap().unwrap().content, "first");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LOG_FILE_NAME),
            "garbage line\n7 1 a b\n\n7 2 a b good 1\n8 3 a b other 0\n",
        )
        .unwrap();

        let log = MessageLog::open(dir.path()).unwrap();

        let found = log.scan_for_key(7).unwrap().unwrap();
        assert_eq!(found.content, "good");
        assert_eq!(found.time_sent, 2);
        assert_eq!(log.len().unwrap(), 2);
    }

    #[test]
    fn test_append_after_unterminated_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        std::fs::write(&path, "3 1 a b old 0").unwrap();

        let log = MessageLog::open(dir.path()).unwrap();
        let msg = message(5, "new");
        assert!(log.append(&msg).unwrap());

        assert_eq!(log.scan_for_key(3).unwrap().unwrap().content, "old");
        assert_eq!(log.scan_for_key(5).unwrap(), Some(msg));
        assert_eq!(log.len().unwrap(), 2);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("3 1 a b old 0\n5 "));
        assert!(raw.ends_with('\n'));
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn test_exists_uses_leading_identifier_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LOG_FILE_NAME), "9 broken\n").unwrap();

        let log = MessageLog::open(dir.path()).unwrap();
        assert!(log.exists_key(9).unwrap());
        assert_eq!(log.scan_for_key(9).unwrap(), None);
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();

        {
            let mut log = MessageLog::open(dir.path()).unwrap();
            log.append(&message(1, "one")).unwrap();
            log.append(&message(2, "two")).unwrap();
            log.close().unwrap();
        }

        {
            let log = MessageLog::open(dir.path()).unwrap();
            assert_eq!(log.len().unwrap(), 2);
            assert_eq!(log.scan_for_key(2).unwrap().unwrap().content, "two");

            log.append(&message(3, "three")).unwrap();
            assert_eq!(log.len().unwrap(), 3);
        }
    }

    #[test]
    fn test_close_twice() {
        let dir = TempDir::new().unwrap();
        let mut log = MessageLog::open(dir.path()).unwrap();

        log.close().unwrap();
        log.close().unwrap();
    }

    #[test]
    fn test_ops_after_close() {
        let dir = TempDir::new().unwrap();
        let mut log = MessageLog::open(dir.path()).unwrap();

        log.close().unwrap();

        assert!(matches!(log.scan_for_key(1), Err(Error::Closed)));
        assert!(matches!(log.exists_key(1), Err(Error::Closed)));
        assert!(matches!(log.append(&message(1, "x")), Err(Error::Closed)));
    }
}
