use crate::error::ConfigError;
use crate::resolver::lookup_frame_resolver;
use crate::template::{Resolve, TemplateNode};
use crate::throwable::StackFrame;
use crate::writer::JsonWriter;
use serde_json::Value;

/// Bundled template used when no stack frame template is configured.
pub const STACK_TRACE_ELEMENT_TEMPLATE: &str = include_str!("../../templates/StackTraceElementLayout.json");

/// `stackTraceElement:<key>` resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackFrameResolver {
    ClassName,
    MethodName,
    FileName,
    LineNumber,
}

impl StackFrameResolver {
    pub(crate) fn create(key: Option<&str>) -> Result<Self, ConfigError> {
        match key {
            Some("className") => Ok(StackFrameResolver::ClassName),
            Some("methodName") => Ok(StackFrameResolver::MethodName),
            Some("fileName") => Ok(StackFrameResolver::FileName),
            Some("lineNumber") => Ok(StackFrameResolver::LineNumber),
            _ => Err(ConfigError::invalid_key("stackTraceElement", key)),
        }
    }
}

impl Resolve<StackFrame> for StackFrameResolver {
    fn resolve(&self, frame: &StackFrame, writer: &mut dyn JsonWriter) {
        match self {
            StackFrameResolver::ClassName => writer.write_string(&frame.declaring_class),
            StackFrameResolver::MethodName => writer.write_string(&frame.method_name),
            StackFrameResolver::FileName => match &frame.file_name {
                Some(file) => writer.write_string(file),
                None => writer.write_null(),
            },
            StackFrameResolver::LineNumber => match frame.line_number {
                Some(line) => writer.write_u64(u64::from(line)),
                None => writer.write_null(),
            },
        }
    }

    fn is_resolvable(&self, frame: &StackFrame) -> bool {
        match self {
            StackFrameResolver::ClassName => !frame.declaring_class.is_empty(),
            StackFrameResolver::MethodName => !frame.method_name.is_empty(),
            StackFrameResolver::FileName => frame.file_name.as_deref().is_some_and(|f| !f.is_empty()),
            StackFrameResolver::LineNumber => frame.line_number.is_some(),
        }
    }
}

/// Compiled template rendering a single stack frame.
#[derive(Debug, Clone)]
pub struct FrameResolver {
    template: TemplateNode<StackFrameResolver>,
}

impl FrameResolver {
    pub fn compile(template: &Value) -> Result<Self, ConfigError> {
        let template = TemplateNode::compile(template, &mut lookup_frame_resolver)?;
        Ok(FrameResolver { template })
    }

    pub fn from_json(template: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(template)?;
        Self::compile(&value)
    }

    /// `{"declaringClass", "methodName", "fileName", "lineNumber"}` object,
    /// equivalent to [`STACK_TRACE_ELEMENT_TEMPLATE`].
    pub fn default_layout() -> Self {
        let field = |name: &str, resolver| (name.to_string(), TemplateNode::Resolver(resolver));
        FrameResolver {
            template: TemplateNode::Object(vec![
                field("declaringClass", StackFrameResolver::ClassName),
                field("methodName", StackFrameResolver::MethodName),
                field("fileName", StackFrameResolver::FileName),
                field("lineNumber", StackFrameResolver::LineNumber),
            ]),
        }
    }

    pub fn render(&self, frame: &StackFrame, writer: &mut dyn JsonWriter, exclude_empty: bool) {
        self.template.render(frame, writer, exclude_empty);
    }
}
