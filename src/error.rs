/// Error type returned while building a [`ResolverContext`] or compiling a
/// template.
///
/// All variants are configuration-time failures: once a layout has been
/// built, resolving events never produces an error.
///
/// [`ResolverContext`]: crate::context::ResolverContext
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("writerCapacity requires a non-zero positive integer, got {0}")]
    InvalidWriterCapacity(i64),

    #[error("invalid time zone: {0:?}")]
    InvalidTimeZone(String),

    #[error("unknown locale: {0:?}")]
    InvalidLocale(String),

    #[error("invalid timestamp pattern: {0:?}")]
    InvalidTimestampPattern(String),

    #[error("invalid {field} regex")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("unknown resolver: {name:?}")]
    UnknownResolver { name: String },

    #[error("invalid key {key:?} for resolver {resolver:?}")]
    InvalidKey { resolver: String, key: String },

    #[error("malformed placeholder: {0:?}")]
    MalformedPlaceholder(String),

    #[error("invalid value {value:?} for environment variable {key}")]
    InvalidEnvValue { key: &'static str, value: String },

    #[error("invalid JSON template")]
    Template(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid_key(resolver: &str, key: Option<&str>) -> Self {
        ConfigError::InvalidKey {
            resolver: resolver.to_string(),
            key: key.unwrap_or("").to_string(),
        }
    }
}
