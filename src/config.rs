use crate::context::{parse_locale, parse_time_zone, KeyValuePair, ResolverContext};
use crate::env::*;
use crate::error::ConfigError;
use crate::layout::{JsonTemplateLayout, LOGSTASH_EVENT_TEMPLATE};
use crate::resolver::frame::FrameResolver;
use serde::Deserialize;
use std::sync::Arc;

/// Declarative layout configuration.
///
/// Deserializable from any serde format; every field has a default, so an
/// empty document yields the bundled Logstash-style layout.
///
/// **Fields**
/// - `writer_capacity`: initial size of writer and stack trace buffers.
///   Must be positive.
/// - `time_zone`, `locale`, `timestamp_pattern`: rendering of the
///   `timestamp` resolver.
/// - `location_info_enabled`: enables the `source` resolver.
/// - `stack_trace_enabled`: enables `stackTrace:*` exception keys.
/// - `empty_property_exclusion_enabled`: drop null and empty values.
/// - `map_message_formatter_ignored`: render map messages as text rather
///   than as JSON objects.
/// - `mdc_key_pattern`, `ndc_pattern`: optional full-match filters.
/// - `additional_fields`: static pairs appended to every event.
/// - `event_template`, `stack_trace_element_template`: inline JSON
///   templates; `None` selects the bundled ones.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub writer_capacity: i64,
    pub time_zone: String,
    pub locale: String,
    pub timestamp_pattern: String,
    pub location_info_enabled: bool,
    pub stack_trace_enabled: bool,
    pub empty_property_exclusion_enabled: bool,
    pub map_message_formatter_ignored: bool,
    pub mdc_key_pattern: Option<String>,
    pub ndc_pattern: Option<String>,
    pub additional_fields: Vec<KeyValuePair>,
    pub event_template: Option<String>,
    pub stack_trace_element_template: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            writer_capacity: 16 * 1024,
            time_zone: "UTC".to_string(),
            locale: "en_US".to_string(),
            timestamp_pattern: "%Y-%m-%dT%H:%M:%S%.3f%:z".to_string(),
            location_info_enabled: false,
            stack_trace_enabled: true,
            empty_property_exclusion_enabled: true,
            map_message_formatter_ignored: true,
            mdc_key_pattern: None,
            ndc_pattern: None,
            additional_fields: Vec::new(),
            event_template: None,
            stack_trace_element_template: None,
        }
    }
}

impl LayoutConfig {
    /// Defaults overlaid with any `JSON_LAYOUT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            writer_capacity: parse_env(JSON_LAYOUT_WRITER_CAPACITY_ENV, defaults.writer_capacity)?,
            time_zone: env_or(JSON_LAYOUT_TIME_ZONE_ENV, &defaults.time_zone),
            locale: env_or(JSON_LAYOUT_LOCALE_ENV, &defaults.locale),
            timestamp_pattern: env_or(JSON_LAYOUT_TIMESTAMP_PATTERN_ENV, &defaults.timestamp_pattern),
            location_info_enabled: parse_env(
                JSON_LAYOUT_LOCATION_INFO_ENABLED_ENV,
                defaults.location_info_enabled,
            )?,
            stack_trace_enabled: parse_env(JSON_LAYOUT_STACK_TRACE_ENABLED_ENV, defaults.stack_trace_enabled)?,
            empty_property_exclusion_enabled: parse_env(
                JSON_LAYOUT_EMPTY_PROPERTY_EXCLUSION_ENABLED_ENV,
                defaults.empty_property_exclusion_enabled,
            )?,
            mdc_key_pattern: env_opt(JSON_LAYOUT_MDC_KEY_PATTERN_ENV),
            ndc_pattern: env_opt(JSON_LAYOUT_NDC_PATTERN_ENV),
            event_template: env_opt(JSON_LAYOUT_EVENT_TEMPLATE_ENV),
            ..defaults
        })
    }

    /// Validate this configuration into a [`ResolverContext`].
    pub fn build_context(&self) -> Result<ResolverContext, ConfigError> {
        let writer_capacity = usize::try_from(self.writer_capacity)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(ConfigError::InvalidWriterCapacity(self.writer_capacity))?;

        let mut builder = ResolverContext::builder()
            .writer_capacity(writer_capacity)
            .time_zone(parse_time_zone(&self.time_zone)?)
            .locale(parse_locale(&self.locale)?)
            .timestamp_pattern(self.timestamp_pattern.clone())
            .location_info_enabled(self.location_info_enabled)
            .stack_trace_enabled(self.stack_trace_enabled)
            .empty_property_exclusion_enabled(self.empty_property_exclusion_enabled)
            .map_message_formatter_ignored(self.map_message_formatter_ignored)
            .additional_fields(self.additional_fields.clone());
        if let Some(pattern) = &self.mdc_key_pattern {
            builder = builder.mdc_key_pattern(pattern.clone());
        }
        if let Some(pattern) = &self.ndc_pattern {
            builder = builder.ndc_pattern(pattern.clone());
        }
        if self.stack_trace_enabled {
            let frame_resolver = match &self.stack_trace_element_template {
                Some(template) => FrameResolver::from_json(template)?,
                None => FrameResolver::default_layout(),
            };
            builder = builder.frame_resolver(frame_resolver);
        }
        builder.build()
    }

    /// Build the context and compile the event template against it.
    ///
    /// **Returns**
    /// - `Ok(JsonTemplateLayout)` ready to be shared across threads.
    /// - `Err(ConfigError)` describing the first invalid setting.
    pub fn build_layout(&self) -> Result<JsonTemplateLayout, ConfigError> {
        let context = Arc::new(self.build_context()?);
        let template = self.event_template.as_deref().unwrap_or(LOGSTASH_EVENT_TEMPLATE);
        let layout = JsonTemplateLayout::from_json(context, template)?;
        tracing::debug!(
            writer_capacity = self.writer_capacity,
            stack_trace_enabled = self.stack_trace_enabled,
            custom_template = self.event_template.is_some(),
            "json template layout configured"
        );
        Ok(layout)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_opt(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnvValue { key, value }),
    }
}
