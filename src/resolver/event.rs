use crate::context::{EventTimeZone, ResolverContext};
use crate::error::ConfigError;
use crate::record::{LogEvent, Message};
use crate::template::Resolve;
use crate::writer::JsonWriter;
use chrono::Locale;
use std::fmt::Write;
use tracing::Level;

/// `timestamp`, `timestamp:millis`, `timestamp:nanos`.
#[derive(Debug, Clone)]
pub enum TimestampResolver {
    Formatted {
        time_zone: EventTimeZone,
        locale: Locale,
        pattern: String,
    },
    EpochMillis,
    EpochNanos,
}

impl TimestampResolver {
    pub fn create(context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        match key {
            None => Ok(TimestampResolver::Formatted {
                time_zone: context.time_zone(),
                locale: context.locale(),
                pattern: context.timestamp_pattern().to_string(),
            }),
            Some("millis") => Ok(TimestampResolver::EpochMillis),
            Some("nanos") => Ok(TimestampResolver::EpochNanos),
            Some(_) => Err(ConfigError::invalid_key("timestamp", key)),
        }
    }
}

impl Resolve<LogEvent> for TimestampResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        match self {
            TimestampResolver::Formatted { time_zone, locale, pattern } => {
                let local = event.timestamp.with_timezone(&time_zone.offset_at(&event.timestamp));
                let mut text = String::with_capacity(pattern.len() + 16);
                match write!(text, "{}", local.format_localized(pattern, *locale)) {
                    Ok(()) => writer.write_string(&text),
                    Err(_) => writer.write_null(),
                }
            }
            TimestampResolver::EpochMillis => writer.write_i64(event.timestamp.timestamp_millis()),
            TimestampResolver::EpochNanos => match event.timestamp.timestamp_nanos_opt() {
                Some(nanos) => writer.write_i64(nanos),
                None => writer.write_null(),
            },
        }
    }
}

/// `level`, `level:severity`, `level:severity:code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelResolver {
    Name,
    SeverityKeyword,
    SeverityCode,
}

impl LevelResolver {
    pub fn create(_context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        match key {
            None => Ok(LevelResolver::Name),
            Some("severity") => Ok(LevelResolver::SeverityKeyword),
            Some("severity:code") => Ok(LevelResolver::SeverityCode),
            Some(_) => Err(ConfigError::invalid_key("level", key)),
        }
    }
}

/// Syslog severity for a level.
fn severity(level: Level) -> (&'static str, u64) {
    if level == Level::ERROR {
        ("ERROR", 3)
    } else if level == Level::WARN {
        ("WARNING", 4)
    } else if level == Level::INFO {
        ("INFO", 6)
    } else {
        ("DEBUG", 7)
    }
}

impl Resolve<LogEvent> for LevelResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        match self {
            LevelResolver::Name => writer.write_string(event.level.as_str()),
            LevelResolver::SeverityKeyword => writer.write_string(severity(event.level).0),
            LevelResolver::SeverityCode => writer.write_u64(severity(event.level).1),
        }
    }
}

/// `logger:name`, `logger:fqcn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerResolver {
    Name,
    Fqcn,
}

impl LoggerResolver {
    pub fn create(_context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        match key {
            Some("name") => Ok(LoggerResolver::Name),
            Some("fqcn") => Ok(LoggerResolver::Fqcn),
            _ => Err(ConfigError::invalid_key("logger", key)),
        }
    }
}

impl Resolve<LogEvent> for LoggerResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        match self {
            LoggerResolver::Name => writer.write_string(&event.logger_name),
            LoggerResolver::Fqcn => match &event.logger_fqcn {
                Some(fqcn) => writer.write_string(fqcn),
                None => writer.write_null(),
            },
        }
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        match self {
            LoggerResolver::Name => !event.logger_name.is_empty(),
            LoggerResolver::Fqcn => event.logger_fqcn.as_deref().is_some_and(|f| !f.is_empty()),
        }
    }
}

/// `message`.
///
/// Map messages are written as JSON objects unless the map message formatter
/// is ignored, in which case their `key="value"` text form is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageResolver {
    exclude_empty: bool,
    map_formatter_ignored: bool,
}

impl MessageResolver {
    pub fn create(context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        if key.is_some() {
            return Err(ConfigError::invalid_key("message", key));
        }
        Ok(MessageResolver {
            exclude_empty: context.is_empty_property_exclusion_enabled(),
            map_formatter_ignored: context.is_map_message_formatter_ignored(),
        })
    }
}

impl Resolve<LogEvent> for MessageResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        if self.exclude_empty && event.message.is_empty() {
            writer.write_null();
            return;
        }
        match &event.message {
            Message::Text(text) => writer.write_string(text),
            Message::Map(_) if self.map_formatter_ignored => {
                let mut text = String::new();
                match write!(text, "{}", event.message) {
                    Ok(()) => writer.write_string(&text),
                    Err(_) => writer.write_null(),
                }
            }
            Message::Map(map) => {
                writer.start_object();
                for (key, value) in map {
                    writer.write_field_name(key);
                    writer.write_value(value);
                }
                writer.end_object();
            }
        }
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        !event.message.is_empty()
    }
}

/// `thread:name`, `thread:id`, `thread:priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadResolver {
    Name,
    Id,
    Priority,
}

impl ThreadResolver {
    pub fn create(_context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        match key {
            Some("name") => Ok(ThreadResolver::Name),
            Some("id") => Ok(ThreadResolver::Id),
            Some("priority") => Ok(ThreadResolver::Priority),
            _ => Err(ConfigError::invalid_key("thread", key)),
        }
    }
}

impl Resolve<LogEvent> for ThreadResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        match self {
            ThreadResolver::Name => match &event.thread.name {
                Some(name) => writer.write_string(name),
                None => writer.write_null(),
            },
            ThreadResolver::Id => writer.write_u64(event.thread.id),
            ThreadResolver::Priority => writer.write_i64(i64::from(event.thread.priority)),
        }
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        match self {
            ThreadResolver::Name => event.thread.name.as_deref().is_some_and(|n| !n.is_empty()),
            ThreadResolver::Id | ThreadResolver::Priority => true,
        }
    }
}
