use crate::context::ResolverContext;
use crate::error::ConfigError;
use crate::record::LogEvent;
use crate::template::Resolve;
use crate::writer::JsonWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceField {
    ClassName,
    MethodName,
    FileName,
    LineNumber,
}

/// `source:<key>`; always `null` when location info is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceResolver {
    field: Option<SourceField>,
}

impl SourceResolver {
    pub fn create(context: &ResolverContext, key: Option<&str>) -> Result<Self, ConfigError> {
        let field = match key {
            Some("className") => SourceField::ClassName,
            Some("methodName") => SourceField::MethodName,
            Some("fileName") => SourceField::FileName,
            Some("lineNumber") => SourceField::LineNumber,
            _ => return Err(ConfigError::invalid_key("source", key)),
        };
        Ok(SourceResolver { field: context.is_location_info_enabled().then_some(field) })
    }
}

impl Resolve<LogEvent> for SourceResolver {
    fn resolve(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        let (Some(field), Some(source)) = (self.field, event.source.as_ref()) else {
            writer.write_null();
            return;
        };
        let text = match field {
            SourceField::ClassName => source.class_name.as_deref(),
            SourceField::MethodName => source.method_name.as_deref(),
            SourceField::FileName => source.file_name.as_deref(),
            SourceField::LineNumber => {
                match source.line_number {
                    Some(line) => writer.write_u64(u64::from(line)),
                    None => writer.write_null(),
                }
                return;
            }
        };
        match text {
            Some(text) => writer.write_string(text),
            None => writer.write_null(),
        }
    }

    fn is_resolvable(&self, event: &LogEvent) -> bool {
        let (Some(field), Some(source)) = (self.field, event.source.as_ref()) else {
            return false;
        };
        match field {
            SourceField::ClassName => source.class_name.as_deref().is_some_and(|s| !s.is_empty()),
            SourceField::MethodName => source.method_name.as_deref().is_some_and(|s| !s.is_empty()),
            SourceField::FileName => source.file_name.as_deref().is_some_and(|s| !s.is_empty()),
            SourceField::LineNumber => source.line_number.is_some(),
        }
    }
}
