use crate::error::ConfigError;
use crate::resolver::frame::FrameResolver;
use crate::resolver::stack_trace_object::StackTraceObjectFormatter;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Locale, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

/// Static key/value pair appended to every rendered event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValuePair { key: key.into(), value: value.into() }
    }
}

/// Zone timestamps are rendered in: an IANA zone, which follows daylight
/// saving changes, or a fixed offset from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTimeZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl EventTimeZone {
    /// Offset from UTC in effect at `instant`.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match self {
            EventTimeZone::Named(tz) => tz.offset_from_utc_datetime(&instant.naive_utc()).fix(),
            EventTimeZone::Fixed(offset) => *offset,
        }
    }
}

impl From<Tz> for EventTimeZone {
    fn from(tz: Tz) -> Self {
        EventTimeZone::Named(tz)
    }
}

impl From<FixedOffset> for EventTimeZone {
    fn from(offset: FixedOffset) -> Self {
        EventTimeZone::Fixed(offset)
    }
}

/// Immutable configuration shared by every resolver of one layout.
///
/// Only obtainable through [`ResolverContextBuilder::build`], which validates
/// all required fields, so an existing context is always complete. It is
/// `Send + Sync` and intended to be shared behind an [`Arc`].
#[derive(Debug)]
pub struct ResolverContext {
    writer_capacity: usize,
    time_zone: EventTimeZone,
    locale: Locale,
    timestamp_pattern: String,
    location_info_enabled: bool,
    stack_trace_enabled: bool,
    empty_property_exclusion_enabled: bool,
    map_message_formatter_ignored: bool,
    mdc_key_pattern: Option<Regex>,
    ndc_pattern: Option<Regex>,
    additional_fields: Vec<KeyValuePair>,
    stack_trace_object_formatter: Option<Arc<StackTraceObjectFormatter>>,
}

impl ResolverContext {
    pub fn builder() -> ResolverContextBuilder {
        ResolverContextBuilder::default()
    }

    pub fn writer_capacity(&self) -> usize {
        self.writer_capacity
    }

    pub fn time_zone(&self) -> EventTimeZone {
        self.time_zone
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn timestamp_pattern(&self) -> &str {
        &self.timestamp_pattern
    }

    pub fn is_location_info_enabled(&self) -> bool {
        self.location_info_enabled
    }

    pub fn is_stack_trace_enabled(&self) -> bool {
        self.stack_trace_enabled
    }

    pub fn is_empty_property_exclusion_enabled(&self) -> bool {
        self.empty_property_exclusion_enabled
    }

    pub fn is_map_message_formatter_ignored(&self) -> bool {
        self.map_message_formatter_ignored
    }

    pub fn mdc_key_pattern(&self) -> Option<&Regex> {
        self.mdc_key_pattern.as_ref()
    }

    pub fn ndc_pattern(&self) -> Option<&Regex> {
        self.ndc_pattern.as_ref()
    }

    pub fn additional_fields(&self) -> &[KeyValuePair] {
        &self.additional_fields
    }

    /// Present exactly when stack traces are enabled.
    pub fn stack_trace_object_formatter(&self) -> Option<&Arc<StackTraceObjectFormatter>> {
        self.stack_trace_object_formatter.as_ref()
    }
}

/// Collects [`ResolverContext`] settings; nothing is validated until
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ResolverContextBuilder {
    writer_capacity: usize,
    time_zone: Option<EventTimeZone>,
    locale: Option<Locale>,
    timestamp_pattern: Option<String>,
    location_info_enabled: bool,
    stack_trace_enabled: bool,
    empty_property_exclusion_enabled: bool,
    map_message_formatter_ignored: bool,
    mdc_key_pattern: Option<String>,
    ndc_pattern: Option<String>,
    additional_fields: Vec<KeyValuePair>,
    frame_resolver: Option<FrameResolver>,
}

impl ResolverContextBuilder {
    pub fn writer_capacity(mut self, writer_capacity: usize) -> Self {
        self.writer_capacity = writer_capacity;
        self
    }

    pub fn time_zone(mut self, time_zone: impl Into<EventTimeZone>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// chrono strftime pattern, e.g. `%Y-%m-%dT%H:%M:%S%.3f%:z`.
    pub fn timestamp_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.timestamp_pattern = Some(pattern.into());
        self
    }

    pub fn location_info_enabled(mut self, enabled: bool) -> Self {
        self.location_info_enabled = enabled;
        self
    }

    pub fn stack_trace_enabled(mut self, enabled: bool) -> Self {
        self.stack_trace_enabled = enabled;
        self
    }

    pub fn empty_property_exclusion_enabled(mut self, enabled: bool) -> Self {
        self.empty_property_exclusion_enabled = enabled;
        self
    }

    pub fn map_message_formatter_ignored(mut self, ignored: bool) -> Self {
        self.map_message_formatter_ignored = ignored;
        self
    }

    /// Regex an MDC key must fully match to be emitted.
    pub fn mdc_key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.mdc_key_pattern = Some(pattern.into());
        self
    }

    /// Regex an NDC entry must fully match to be emitted.
    pub fn ndc_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.ndc_pattern = Some(pattern.into());
        self
    }

    pub fn additional_fields(mut self, fields: Vec<KeyValuePair>) -> Self {
        self.additional_fields = fields;
        self
    }

    /// Resolver applied to each stack frame of structured stack traces.
    /// Required when stack traces are enabled.
    pub fn frame_resolver(mut self, frame_resolver: FrameResolver) -> Self {
        self.frame_resolver = Some(frame_resolver);
        self
    }

    /// Validate the collected settings and freeze them.
    ///
    /// **Returns**
    /// - `Ok(ResolverContext)` when every required field is present and valid.
    /// - `Err(ConfigError)` naming the first offending field otherwise.
    pub fn build(self) -> Result<ResolverContext, ConfigError> {
        if self.writer_capacity == 0 {
            return Err(ConfigError::InvalidWriterCapacity(0));
        }
        let time_zone = self.time_zone.ok_or(ConfigError::MissingField("timeZone"))?;
        let locale = self.locale.ok_or(ConfigError::MissingField("locale"))?;
        let timestamp_pattern = self
            .timestamp_pattern
            .ok_or(ConfigError::MissingField("timestampPattern"))?;
        validate_timestamp_pattern(&timestamp_pattern)?;

        let stack_trace_object_formatter = if self.stack_trace_enabled {
            let frame_resolver = self
                .frame_resolver
                .ok_or(ConfigError::MissingField("stackTraceElementResolver"))?;
            Some(Arc::new(StackTraceObjectFormatter::new(
                frame_resolver,
                self.empty_property_exclusion_enabled,
            )))
        } else {
            None
        };

        let mdc_key_pattern = compile_full_match("mdcKeyPattern", self.mdc_key_pattern.as_deref())?;
        let ndc_pattern = compile_full_match("ndcPattern", self.ndc_pattern.as_deref())?;

        Ok(ResolverContext {
            writer_capacity: self.writer_capacity,
            time_zone,
            locale,
            timestamp_pattern,
            location_info_enabled: self.location_info_enabled,
            stack_trace_enabled: self.stack_trace_enabled,
            empty_property_exclusion_enabled: self.empty_property_exclusion_enabled,
            map_message_formatter_ignored: self.map_message_formatter_ignored,
            mdc_key_pattern,
            ndc_pattern,
            additional_fields: self.additional_fields,
            stack_trace_object_formatter,
        })
    }
}

fn validate_timestamp_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimestampPattern(pattern.to_string()));
    }
    Ok(())
}

fn compile_full_match(field: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    pattern
        .map(|p| {
            Regex::new(&format!("^(?:{})$", p))
                .map_err(|source| ConfigError::InvalidPattern { field, source })
        })
        .transpose()
}

/// Parse an IANA zone name (`Europe/Amsterdam`, `UTC`), `Z`, or a UTC
/// offset such as `+02:00` or `-0530`.
pub fn parse_time_zone(text: &str) -> Result<EventTimeZone, ConfigError> {
    let trimmed = text.trim();
    if trimmed == "Z" || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(EventTimeZone::Named(Tz::UTC));
    }
    if let Ok(tz) = trimmed.parse::<Tz>() {
        return Ok(EventTimeZone::Named(tz));
    }
    trimmed
        .parse::<FixedOffset>()
        .map(EventTimeZone::Fixed)
        .map_err(|_| ConfigError::InvalidTimeZone(text.to_string()))
}

/// Parse a POSIX locale tag such as `en_US` or `fr_BE`.
pub fn parse_locale(tag: &str) -> Result<Locale, ConfigError> {
    Locale::try_from(tag.trim()).map_err(|_| ConfigError::InvalidLocale(tag.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ResolverContextBuilder {
        ResolverContext::builder()
            .writer_capacity(1024)
            .time_zone(FixedOffset::east_opt(0).unwrap())
            .locale(Locale::en_US)
            .timestamp_pattern("%Y-%m-%d")
            .stack_trace_enabled(true)
            .frame_resolver(FrameResolver::default_layout())
    }

    #[test]
    fn test_build_complete_context() {
        let ctx = complete().mdc_key_pattern("user\\..*").build().unwrap();
        assert_eq!(ctx.writer_capacity(), 1024);
        assert!(ctx.is_stack_trace_enabled());
        assert!(ctx.stack_trace_object_formatter().is_some());
        let pattern = ctx.mdc_key_pattern().unwrap();
        assert!(pattern.is_match("user.id"));
        assert!(!pattern.is_match("x.user.id"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = complete().writer_capacity(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWriterCapacity(0)));
        assert!(err.to_string().contains("writerCapacity"));
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = ResolverContext::builder().writer_capacity(1).build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("timeZone")));

        let err = ResolverContext::builder()
            .writer_capacity(1)
            .time_zone(FixedOffset::east_opt(0).unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("locale")));

        let err = ResolverContext::builder()
            .writer_capacity(1)
            .time_zone(FixedOffset::east_opt(0).unwrap())
            .locale(Locale::en_US)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("timestampPattern")));
    }

    #[test]
    fn test_frame_resolver_required_only_with_stack_traces() {
        let base = || {
            ResolverContext::builder()
                .writer_capacity(1)
                .time_zone(FixedOffset::east_opt(0).unwrap())
                .locale(Locale::en_US)
                .timestamp_pattern("%s")
        };
        let err = base().stack_trace_enabled(true).build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("stackTraceElementResolver")));

        let ctx = base().stack_trace_enabled(false).build().unwrap();
        assert!(ctx.stack_trace_object_formatter().is_none());
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let err = complete().ndc_pattern("(").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { field: "ndcPattern", .. }));

        let err = complete().timestamp_pattern("%Q").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimestampPattern(_)));
    }

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(parse_time_zone("UTC").unwrap(), EventTimeZone::Named(Tz::UTC));
        assert_eq!(parse_time_zone("Z").unwrap(), EventTimeZone::Named(Tz::UTC));
        assert_eq!(
            parse_time_zone("Europe/Amsterdam").unwrap(),
            EventTimeZone::Named(Tz::Europe__Amsterdam)
        );
        assert_eq!(
            parse_time_zone("+02:00").unwrap(),
            EventTimeZone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert_eq!(
            parse_time_zone("-0530").unwrap(),
            EventTimeZone::Fixed(FixedOffset::west_opt(19800).unwrap())
        );
        assert!(matches!(parse_time_zone("Europe/Nowhere"), Err(ConfigError::InvalidTimeZone(_))));
        assert!(parse_time_zone("+01:75").is_err());
        assert!(parse_time_zone("").is_err());
    }

    #[test]
    fn test_named_zone_follows_daylight_saving() {
        let amsterdam = parse_time_zone("Europe/Amsterdam").unwrap();
        let winter = Utc.with_ymd_and_hms(2021, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2021, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(amsterdam.offset_at(&winter).local_minus_utc(), 3600);
        assert_eq!(amsterdam.offset_at(&summer).local_minus_utc(), 7200);

        let fixed = parse_time_zone("+01:00").unwrap();
        assert_eq!(fixed.offset_at(&summer).local_minus_utc(), 3600);
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!(parse_locale("fr_BE").unwrap(), Locale::fr_BE);
        assert!(matches!(parse_locale("xx_YY"), Err(ConfigError::InvalidLocale(_))));
    }
}
