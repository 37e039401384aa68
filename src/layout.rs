use crate::context::ResolverContext;
use crate::error::ConfigError;
use crate::record::LogEvent;
use crate::resolver::{lookup_event_resolver, EventResolver};
use crate::template::{Placeholder, TemplateNode};
use crate::writer::{BufferedJsonWriter, JsonWriter};
use serde_json::Value;
use std::sync::Arc;

/// Logstash `json_event` v1 style template bundled with the crate.
pub const LOGSTASH_EVENT_TEMPLATE: &str = include_str!("../templates/LogstashJsonEventLayoutV1.json");

/// Event template compiled against a [`ResolverContext`].
///
/// Compilation happens once in [`compile`](Self::compile); afterwards the
/// layout is immutable and can be shared across threads, each call to
/// [`encode`](Self::encode) streaming one event onto the supplied writer.
#[derive(Debug)]
pub struct JsonTemplateLayout {
    context: Arc<ResolverContext>,
    template: TemplateNode<EventResolver>,
    exclude_empty: bool,
}

impl JsonTemplateLayout {
    /// Compile `template` against `context`.
    ///
    /// **Returns**
    /// - `Err(ConfigError)` for unknown resolver names, malformed keys or
    ///   malformed placeholders; no layout is produced in that case.
    pub fn compile(context: Arc<ResolverContext>, template: &Value) -> Result<Self, ConfigError> {
        let template = TemplateNode::compile(template, &mut |placeholder: Placeholder<'_>| {
            lookup_event_resolver(&context, placeholder)
        })?;
        if !template.is_object() && !context.additional_fields().is_empty() {
            tracing::warn!(
                count = context.additional_fields().len(),
                "event template root is not an object, additional fields are ignored"
            );
        }
        let exclude_empty = context.is_empty_property_exclusion_enabled();
        Ok(JsonTemplateLayout { context, template, exclude_empty })
    }

    pub fn from_json(context: Arc<ResolverContext>, template: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(template)?;
        Self::compile(context, &value)
    }

    pub fn context(&self) -> &Arc<ResolverContext> {
        &self.context
    }

    /// Stream `event` onto `writer` as one JSON value.
    pub fn encode(&self, event: &LogEvent, writer: &mut dyn JsonWriter) {
        if !self.template.is_object() {
            self.template.render(event, writer, self.exclude_empty);
            return;
        }
        writer.start_object();
        self.template.render_fields(event, writer, self.exclude_empty);
        for field in self.context.additional_fields() {
            if self.exclude_empty && field.value.is_empty() {
                continue;
            }
            writer.write_string_field(&field.key, &field.value);
        }
        writer.end_object();
    }

    /// Render `event` into a fresh string sized by the writer capacity.
    pub fn to_json_string(&self, event: &LogEvent) -> String {
        let mut writer = BufferedJsonWriter::with_capacity(self.context.writer_capacity());
        self.encode(event, &mut writer);
        writer.into_string()
    }
}
