//! Template-driven JSON layout for structured log events.
//!
//! A JSON template is compiled once against a validated
//! [`ResolverContext`](context::ResolverContext) into a tree of resolvers;
//! each event is then streamed through that tree onto a
//! [`JsonWriter`](writer::JsonWriter) without building an intermediate
//! document.

pub mod error;
pub mod record;
pub mod throwable;
pub mod writer;
pub mod template;
pub mod context;
pub mod resolver;
pub mod layout;

pub mod config;
pub mod env;

#[cfg(feature = "tracing-format")]
pub mod format;

pub use context::{EventTimeZone, KeyValuePair, ResolverContext, ResolverContextBuilder};
pub use error::ConfigError;
pub use layout::JsonTemplateLayout;
pub use record::LogEvent;
