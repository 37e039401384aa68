//! Field resolvers and the registry mapping placeholder names to them.
//!
//! Each placeholder is looked up exactly once, while a template is compiled.
//! The lookup returns an [`EventResolver`] variant that already carries every
//! decision derived from the placeholder key and the [`ResolverContext`], so
//! resolving an event is a single `match` with no further lookups.

pub mod context_data;
pub mod event;
pub mod exception;
pub mod frame;
pub mod source;
pub mod stack_trace_object;
pub mod stack_trace_text;

use crate::context::ResolverContext;
use crate::error::ConfigError;
use crate::record::LogEvent;
use crate::template::{Placeholder, Resolve};
use crate::writer::JsonWriter;

use context_data::{MdcResolver, NdcResolver};
use event::{LevelResolver, LoggerResolver, MessageResolver, ThreadResolver, TimestampResolver};
use exception::{ExceptionResolver, ExceptionTarget};
use frame::StackFrameResolver;
use source::SourceResolver;

/// Resolver bound to one placeholder of an event template.
#[derive(Debug)]
pub enum EventResolver {
    Timestamp(TimestampResolver),
    Level(LevelResolver),
    Logger(LoggerResolver),
    Message(MessageResolver),
    Thread(ThreadResolver),
    Mdc(MdcResolver),
    Ndc(NdcResolver),
    Source(SourceResolver),
    Exception(ExceptionResolver),
}

type EventResolverFactory = fn(&ResolverContext, Option<&str>) -> Result<EventResolver, ConfigError>;

/// Event resolvers by placeholder name.
pub const EVENT_RESOLVERS: &[(&str, EventResolverFactory)] = &[
    ("timestamp", create_timestamp),
    ("level", create_level),
    ("logger", create_logger),
    ("message", create_message),
    ("thread", create_thread),
    ("mdc", create_mdc),
    ("ndc", create_ndc),
    ("source", create_source),
    ("exception", create_exception),
    ("exceptionRootCause", create_exception_root_cause),
];

fn create_timestamp(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    TimestampResolver::create(ctx, key).map(EventResolver::Timestamp)
}

fn create_level(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    LevelResolver::create(ctx, key).map(EventResolver::Level)
}

fn create_logger(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    LoggerResolver::create(ctx, key).map(EventResolver::Logger)
}

fn create_message(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    MessageResolver::create(ctx, key).map(EventResolver::Message)
}

fn create_thread(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    ThreadResolver::create(ctx, key).map(EventResolver::Thread)
}

fn create_mdc(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    MdcResolver::create(ctx, key).map(EventResolver::Mdc)
}

fn create_ndc(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    NdcResolver::create(ctx, key).map(EventResolver::Ndc)
}

fn create_source(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    SourceResolver::create(ctx, key).map(EventResolver::Source)
}

fn create_exception(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    ExceptionResolver::new(ctx, ExceptionTarget::Thrown, key).map(EventResolver::Exception)
}

fn create_exception_root_cause(ctx: &ResolverContext, key: Option<&str>) -> Result<EventResolver, ConfigError> {
    ExceptionResolver::new(ctx, ExceptionTarget::RootCause, key).map(EventResolver::Exception)
}

/// Build the event resolver a placeholder refers to.
///
/// **Returns**
/// - `Err(ConfigError::UnknownResolver)` if no resolver has that name.
/// - `Err(ConfigError::InvalidKey)` if the resolver rejects the key.
pub fn lookup_event_resolver(
    context: &ResolverContext,
    placeholder: Placeholder<'_>,
) -> Result<EventResolver, ConfigError> {
    let (_, factory) = EVENT_RESOLVERS
        .iter()
        .find(|(name, _)| *name == placeholder.name)
        .ok_or_else(|| ConfigError::UnknownResolver { name: placeholder.name.to_string() })?;
    factory(context, placeholder.key)
}

/// Build the stack frame resolver a placeholder refers to. Only
/// `stackTraceElement` is known inside frame templates.
pub fn lookup_frame_resolver(placeholder: Placeholder<'_>) -> Result<StackFrameResolver, ConfigError> {
    match placeholder.name {
        "stackTraceElement" => StackFrameResolver::create(placeholder.key),
        other => Err(ConfigError::UnknownResolver { name: other.to_string() }),
    }
}

impl Resolve<LogEvent> for EventResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        match self {
            EventResolver::Timestamp(r) => r.resolve(event, writer),
            EventResolver::Level(r) => r.resolve(event, writer),
            EventResolver::Logger(r) => r.resolve(event, writer),
            EventResolver::Message(r) => r.resolve(event, writer),
            EventResolver::Thread(r) => r.resolve(event, writer),
            EventResolver::Mdc(r) => r.resolve(event, writer),
            EventResolver::Ndc(r) => r.resolve(event, writer),
            EventResolver::Source(r) => r.resolve(event, writer),
            EventResolver::Exception(r) => r.resolve(event, writer),
        }
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        match self {
            EventResolver::Timestamp(r) => r.is_resolvable(event),
            EventResolver::Level(r) => r.is_resolvable(event),
            EventResolver::Logger(r) => r.is_resolvable(event),
            EventResolver::Message(r) => r.is_resolvable(event),
            EventResolver::Thread(r) => r.is_resolvable(event),
            EventResolver::Mdc(r) => r.is_resolvable(event),
            EventResolver::Ndc(r) => r.is_resolvable(event),
            EventResolver::Source(r) => r.is_resolvable(event),
            EventResolver::Exception(r) => r.is_resolvable(event),
        }
    }
}
