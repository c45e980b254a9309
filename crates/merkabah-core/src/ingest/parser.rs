//! Line-oriented chat export parsing.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    /// `[HH:MM, DD/MM/YYYY] Sender: Body`
    static ref MESSAGE_LINE: Regex = Regex::new(
        r"^\[(\d{2}:\d{2}),\s*(\d{2}/\d{2}/\d{4})\]\s*([^:]+):\s*(.*)"
    ).unwrap();
}

/// Errors from ingesting a chat export.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    ParseFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No messages extracted")]
    NoMessages,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// `DD/MM/YYYY HH:MM`
    pub timestamp: String,

    pub sender: String,

    pub body: String,

    /// Body length in characters
    pub length: usize,

    /// Whitespace-delimited tokens in the body
    pub word_count: usize,
}

impl Message {
    /// Parse a single export line. Returns `None` for continuation lines,
    /// system notices, lines with a blank sender and anything else that does
    /// not match.
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = MESSAGE_LINE.captures(line)?;
        let sender = caps[3].trim();
        if sender.is_empty() {
            return None;
        }
        let body = caps[4].trim().to_string();

        Some(Self {
            timestamp: format!("{} {}", &caps[2], &caps[1]),
            sender: sender.to_string(),
            length: body.chars().count(),
            word_count: body.split_whitespace().count(),
            body,
        })
    }
}

/// Lazy, one-shot iterator of messages over a source of lines.
pub struct Messages<I> {
    lines: I,
    skipped: usize,
}

impl<I> Messages<I> {
    /// Lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<I, S> Iterator for Messages<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        for line in self.lines.by_ref() {
            match Message::parse_line(line.as_ref()) {
                Some(message) => return Some(message),
                None => self.skipped += 1,
            }
        }
        None
    }
}

/// Parses chat exports into [`Message`] records.
pub struct MessageIngester;

impl MessageIngester {
    /// Parse lines lazily. Non-matching lines are skipped silently.
    pub fn parse<I, S>(lines: I) -> Messages<I::IntoIter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Messages {
            lines: lines.into_iter(),
            skipped: 0,
        }
    }

    /// Read a UTF-8 export file and parse every message in it.
    pub fn ingest_file(path: impl AsRef<Path>) -> Result<Vec<Message>, IngestError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => IngestError::FileNotFound(path.to_path_buf()),
            _ => IngestError::ParseFailure {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let mut parsed = Self::parse(contents.lines());
        let messages: Vec<Message> = parsed.by_ref().collect();

        tracing::info!(
            path = %path.display(),
            messages = messages.len(),
            skipped = parsed.skipped(),
            "Ingested chat export"
        );

        Ok(messages)
    }
}
