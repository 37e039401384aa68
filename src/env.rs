//! Environment variable names read by [`LayoutConfig::from_env`].
//!
//! These are purely helpers; the context and layout types never read the
//! environment themselves.
//!
//! [`LayoutConfig::from_env`]: crate::config::LayoutConfig::from_env

/// Writer buffer capacity in bytes, e.g. `16384`.
pub const JSON_LAYOUT_WRITER_CAPACITY_ENV: &str = "JSON_LAYOUT_WRITER_CAPACITY";

/// IANA zone or UTC offset: `Europe/Amsterdam`, `UTC`, `+02:00`, `-0530`.
pub const JSON_LAYOUT_TIME_ZONE_ENV: &str = "JSON_LAYOUT_TIME_ZONE";

/// POSIX locale tag, e.g. `en_US`.
pub const JSON_LAYOUT_LOCALE_ENV: &str = "JSON_LAYOUT_LOCALE";

/// chrono strftime pattern for the `timestamp` resolver.
pub const JSON_LAYOUT_TIMESTAMP_PATTERN_ENV: &str = "JSON_LAYOUT_TIMESTAMP_PATTERN";

/// `true`/`false`: include source location.
pub const JSON_LAYOUT_LOCATION_INFO_ENABLED_ENV: &str = "JSON_LAYOUT_LOCATION_INFO_ENABLED";

/// `true`/`false`: render stack traces.
pub const JSON_LAYOUT_STACK_TRACE_ENABLED_ENV: &str = "JSON_LAYOUT_STACK_TRACE_ENABLED";

/// `true`/`false`: drop empty values.
pub const JSON_LAYOUT_EMPTY_PROPERTY_EXCLUSION_ENABLED_ENV: &str = "JSON_LAYOUT_EMPTY_PROPERTY_EXCLUSION_ENABLED";

/// Optional MDC key filter regex.
pub const JSON_LAYOUT_MDC_KEY_PATTERN_ENV: &str = "JSON_LAYOUT_MDC_KEY_PATTERN";

/// Optional NDC entry filter regex.
pub const JSON_LAYOUT_NDC_PATTERN_ENV: &str = "JSON_LAYOUT_NDC_PATTERN";

/// Optional event template, inline JSON.
pub const JSON_LAYOUT_EVENT_TEMPLATE_ENV: &str = "JSON_LAYOUT_EVENT_TEMPLATE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional, non-empty environment variable.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
