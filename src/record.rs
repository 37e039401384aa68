use crate::throwable::ThrowableChain;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use tracing::Level;

/// Structured record describing a single logging call.
///
/// Resolvers only ever read from it.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub logger_name: String,
    /// Fully-qualified name of the logging call site, when known.
    pub logger_fqcn: Option<String>,
    pub message: Message,
    pub thread: ThreadInfo,
    /// Mapped diagnostic context.
    pub mdc: BTreeMap<String, serde_json::Value>,
    /// Nested diagnostic context, outermost entry first.
    pub ndc: Vec<String>,
    pub thrown: Option<ThrowableChain>,
    pub source: Option<SourceLocation>,
}

impl LogEvent {
    pub fn new(level: Level, logger_name: impl Into<String>, message: impl Into<Message>) -> Self {
        LogEvent {
            timestamp: Utc::now(),
            level,
            logger_name: logger_name.into(),
            logger_fqcn: None,
            message: message.into(),
            thread: ThreadInfo::default(),
            mdc: BTreeMap::new(),
            ndc: Vec::new(),
            thrown: None,
            source: None,
        }
    }
}

/// Payload of a [`LogEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    /// Key/value message, rendered as a JSON object unless the map formatter
    /// is ignored.
    Map(BTreeMap<String, serde_json::Value>),
}

impl Message {
    pub fn is_empty(&self) -> bool {
        match self {
            Message::Text(text) => text.is_empty(),
            Message::Map(map) => map.is_empty(),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<BTreeMap<String, serde_json::Value>> for Message {
    fn from(map: BTreeMap<String, serde_json::Value>) -> Self {
        Message::Map(map)
    }
}

/// Formats map messages as `key1="value1" key2="value2"`.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(text),
            Message::Map(map) => {
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    match value {
                        serde_json::Value::String(s) => write!(f, "{}=\"{}\"", key, s)?,
                        other => write!(f, "{}=\"{}\"", key, other)?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: u64,
    pub name: Option<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub class_name: Option<String>,
    pub method_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
}
