use crate::context::ResolverContext;
use crate::error::ConfigError;
use crate::record::LogEvent;
use crate::template::Resolve;
use crate::writer::JsonWriter;
use regex::Regex;
use serde_json::Value;

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// `mdc` writes the mapped diagnostic context as an object, restricted to
/// keys fully matching the configured pattern; `mdc:<key>` writes one value.
///
/// A `mdc:<key>` whose key the pattern rejects is decided at compile time and
/// always writes `null`. With empty-property exclusion, empty values are
/// written as `null` as well.
#[derive(Debug, Clone)]
pub enum MdcResolver {
    All {
        key_pattern: Option<Regex>,
        exclude_empty: bool,
    },
    Key {
        key: String,
        exclude_empty: bool,
    },
    FilteredKey,
}

impl MdcResolver {
    pub fn create(context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        let exclude_empty = context.is_empty_property_exclusion_enabled();
        Ok(match key {
            Some(key) if context.mdc_key_pattern().is_some_and(|p| !p.is_match(key)) => {
                tracing::debug!(key, "mdc key rejected by key pattern, field will always resolve to null");
                MdcResolver::FilteredKey
            }
            Some(key) => MdcResolver::Key { key: key.to_string(), exclude_empty },
            None => MdcResolver::All {
                key_pattern: context.mdc_key_pattern().cloned(),
                exclude_empty,
            },
        })
    }

    fn entries<'a>(
        event: &'a LogEvent,
        key_pattern: &'a Option<Regex>,
        exclude_empty: bool,
    ) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
        event.mdc.iter().filter(move |(key, value)| {
            key_pattern.as_ref().map_or(true, |p| p.is_match(key)) && !(exclude_empty && is_empty_value(value))
        })
    }
}

impl Resolve<LogEvent> for MdcResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        match self {
            MdcResolver::All { key_pattern, exclude_empty } => {
                writer.start_object();
                for (key, value) in Self::entries(event, key_pattern, *exclude_empty) {
                    writer.write_field_name(key);
                    writer.write_value(value);
                }
                writer.end_object();
            }
            MdcResolver::Key { key, exclude_empty } => match event.mdc.get(key) {
                Some(value) if !(*exclude_empty && is_empty_value(value)) => writer.write_value(value),
                _ => writer.write_null(),
            },
            MdcResolver::FilteredKey => writer.write_null(),
        }
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        match self {
            MdcResolver::All { key_pattern, .. } => Self::entries(event, key_pattern, true).next().is_some(),
            MdcResolver::Key { key, .. } => event.mdc.get(key).is_some_and(|v| !is_empty_value(v)),
            MdcResolver::FilteredKey => false,
        }
    }
}

/// `ndc` writes the nested diagnostic context as an array, keeping entries
/// that fully match the configured pattern. Writes `null` when the context
/// stack is empty.
#[derive(Debug, Clone)]
pub struct NdcResolver {
    pattern: Option<Regex>,
}

impl NdcResolver {
    pub fn create(context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        if key.is_some() {
            return Err(ConfigError::invalid_key("ndc", key));
        }
        Ok(NdcResolver { pattern: context.ndc_pattern().cloned() })
    }

    fn entries<'a>(&'a self, event: &'a LogEvent) -> impl Iterator<Item = &'a String> + 'a {
        event
            .ndc
            .iter()
            .filter(move |entry| self.pattern.as_ref().map_or(true, |p| p.is_match(entry)))
    }
}

impl Resolve<LogEvent> for NdcResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        if event.ndc.is_empty() {
            writer.write_null();
            return;
        }
        writer.start_array();
        for entry in self.entries(event) {
            writer.write_string(entry);
        }
        writer.end_array();
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        self.entries(event).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::BufferedJsonWriter;
    use chrono::{FixedOffset, Locale};
    use serde_json::json;
    use tracing::Level;

    fn context(mdc: Option<&str>, ndc: Option<&str>, exclude_empty: bool) -> ResolverContext {
        let mut builder = ResolverContext::builder()
            .writer_capacity(64)
            .time_zone(FixedOffset::east_opt(0).unwrap())
            .locale(Locale::en_US)
            .timestamp_pattern("%s")
            .empty_property_exclusion_enabled(exclude_empty);
        if let Some(p) = mdc {
            builder = builder.mdc_key_pattern(p);
        }
        if let Some(p) = ndc {
            builder = builder.ndc_pattern(p);
        }
        builder.build().unwrap()
    }

    fn render<R: Resolve<LogEvent>>(resolver: &R, event: &LogEvent) -> Value {
        let mut w = BufferedJsonWriter::default();
        resolver.resolve(event, &mut w);
        serde_json::from_str(&w.into_string()).unwrap()
    }

    fn event() -> LogEvent {
        let mut event = LogEvent::new(Level::INFO, "app", "m");
        event.mdc.insert("user.id".to_string(), json!(42));
        event.mdc.insert("user.name".to_string(), json!(""));
        event.mdc.insert("trace".to_string(), json!("abc"));
        event.ndc = vec!["request".to_string(), "db".to_string(), "retry-1".to_string()];
        event
    }

    #[test]
    fn test_mdc_all_with_pattern() {
        let resolver = MdcResolver::create(&context(Some("user\\..*"), None, false), None).unwrap();
        assert_eq!(render(&resolver, &event()), json!({"user.id": 42, "user.name": ""}));

        let resolver = MdcResolver::create(&context(Some("user\\..*"), None, true), None).unwrap();
        assert_eq!(render(&resolver, &event()), json!({"user.id": 42}));
    }

    #[test]
    fn test_mdc_pattern_is_full_match() {
        let resolver = MdcResolver::create(&context(Some("race"), None, false), None).unwrap();
        assert_eq!(render(&resolver, &event()), json!({}));
        assert!(!resolver.is_resolvable(&event()));
    }

    #[test]
    fn test_mdc_single_key() {
        let ctx = context(None, None, false);
        let resolver = MdcResolver::create(&ctx, Some("trace")).unwrap();
        assert_eq!(render(&resolver, &event()), json!("abc"));
        let missing = MdcResolver::create(&ctx, Some("absent")).unwrap();
        assert_eq!(render(&missing, &event()), Value::Null);
        assert!(!missing.is_resolvable(&event()));
    }

    #[test]
    fn test_mdc_single_key_empty_value() {
        let resolver = MdcResolver::create(&context(None, None, true), Some("user.name")).unwrap();
        assert_eq!(render(&resolver, &event()), Value::Null);
        assert!(!resolver.is_resolvable(&event()));

        let resolver = MdcResolver::create(&context(None, None, false), Some("user.name")).unwrap();
        assert_eq!(render(&resolver, &event()), json!(""));
    }

    #[test]
    fn test_mdc_single_key_respects_pattern() {
        let ctx = context(Some("user\\..*"), None, false);
        let allowed = MdcResolver::create(&ctx, Some("user.id")).unwrap();
        assert_eq!(render(&allowed, &event()), json!(42));

        let rejected = MdcResolver::create(&ctx, Some("trace")).unwrap();
        assert!(matches!(rejected, MdcResolver::FilteredKey));
        assert_eq!(render(&rejected, &event()), Value::Null);
        assert!(!rejected.is_resolvable(&event()));
    }

    #[test]
    fn test_ndc() {
        let resolver = NdcResolver::create(&context(None, None, false), None).unwrap();
        assert_eq!(render(&resolver, &event()), json!(["request", "db", "retry-1"]));

        let resolver = NdcResolver::create(&context(None, Some("retry-\\d+"), false), None).unwrap();
        assert_eq!(render(&resolver, &event()), json!(["retry-1"]));

        let empty = LogEvent::new(Level::INFO, "app", "m");
        assert_eq!(render(&resolver, &empty), Value::Null);
        assert!(!resolver.is_resolvable(&empty));

        assert!(NdcResolver::create(&context(None, None, false), Some("x")).is_err());
    }
}
