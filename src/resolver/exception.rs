use crate::context::ResolverContext;
use crate::error::ConfigError;
use crate::record::LogEvent;
use crate::resolver::stack_trace_object::StackTraceObjectFormatter;
use crate::resolver::stack_trace_text::StackTraceTextFormatter;
use crate::template::Resolve;
use crate::throwable::ThrowableRef;
use crate::writer::JsonWriter;
use std::sync::Arc;

/// Which throwable of the event a resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionTarget {
    /// The error attached to the event.
    Thrown,
    /// The last reachable cause of the attached error.
    RootCause,
}

impl ExceptionTarget {
    fn name(self) -> &'static str {
        match self {
            ExceptionTarget::Thrown => "exception",
            ExceptionTarget::RootCause => "exceptionRootCause",
        }
    }

    fn select<'a>(self, event: &'a LogEvent) -> Option<ThrowableRef<'a>> {
        let thrown = event.thrown.as_ref()?.root()?;
        match self {
            ExceptionTarget::Thrown => Some(thrown),
            ExceptionTarget::RootCause => Some(thrown.root_cause()),
        }
    }
}

/// Field written for the selected throwable, fixed when the resolver is
/// created.
#[derive(Debug)]
pub enum ExceptionField {
    ClassName,
    Message { exclude_empty: bool },
    StackTraceText(StackTraceTextFormatter),
    StackTraceObject(Arc<StackTraceObjectFormatter>),
    /// Stack trace requested while stack traces are disabled.
    Disabled,
}

/// `exception:<key>` and `exceptionRootCause:<key>` resolver.
///
/// Keys: `className`, `message`, `stackTrace:text`, `stackTrace:object`.
/// Every key writes `null` when the event carries no error.
#[derive(Debug)]
pub struct ExceptionResolver {
    target: ExceptionTarget,
    field: ExceptionField,
}

impl ExceptionResolver {
    pub fn new(context: &ResolverContext, target: ExceptionTarget, key: Option<&str>) -> Result<Self, ConfigError> {
        let field = match key {
            Some("className") => ExceptionField::ClassName,
            Some("message") => ExceptionField::Message {
                exclude_empty: context.is_empty_property_exclusion_enabled(),
            },
            Some("stackTrace:text") if context.is_stack_trace_enabled() => {
                ExceptionField::StackTraceText(StackTraceTextFormatter::new(context.writer_capacity()))
            }
            Some("stackTrace:object") if context.is_stack_trace_enabled() => {
                match context.stack_trace_object_formatter() {
                    Some(formatter) => ExceptionField::StackTraceObject(Arc::clone(formatter)),
                    None => ExceptionField::Disabled,
                }
            }
            Some("stackTrace:text") | Some("stackTrace:object") => {
                tracing::debug!(
                    resolver = target.name(),
                    key = ?key,
                    "stack traces disabled, field will always resolve to null"
                );
                ExceptionField::Disabled
            }
            _ => return Err(ConfigError::invalid_key(target.name(), key)),
        };
        Ok(ExceptionResolver { target, field })
    }

    pub fn target(&self) -> ExceptionTarget {
        self.target
    }

    pub fn field(&self) -> &ExceptionField {
        &self.field
    }
}

impl Resolve<LogEvent> for ExceptionResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        let Some(throwable) = self.target.select(event) else {
            writer.write_null();
            return;
        };
        match &self.field {
            ExceptionField::ClassName => writer.write_string(throwable.class_name()),
            ExceptionField::Message { exclude_empty } => match throwable.message() {
                Some(message) if !(*exclude_empty && message.is_empty()) => writer.write_string(message),
                _ => writer.write_null(),
            },
            ExceptionField::StackTraceText(formatter) => formatter.format(throwable, writer),
            ExceptionField::StackTraceObject(formatter) => formatter.format(throwable, writer),
            ExceptionField::Disabled => writer.write_null(),
        }
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        let Some(throwable) = self.target.select(event) else {
            return false;
        };
        match &self.field {
            ExceptionField::ClassName => !throwable.class_name().is_empty(),
            ExceptionField::Message { .. } => throwable.message().is_some_and(|m| !m.is_empty()),
            ExceptionField::StackTraceText(_) | ExceptionField::StackTraceObject(_) => true,
            ExceptionField::Disabled => false,
        }
    }
}
