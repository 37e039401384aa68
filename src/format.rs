use crate::layout::JsonTemplateLayout;
use crate::record::{LogEvent, Message, SourceLocation, ThreadInfo};
use crate::throwable::ThrowableChain;
use chrono::Utc;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// `tracing_subscriber` event formatter that renders each event through a
/// [`JsonTemplateLayout`], one JSON document per line.
///
/// The formatter only converts and renders; the subscriber it is installed
/// in owns the output writer:
///
/// ```no_run
/// # use std::sync::Arc;
/// # use json_template_layout::{config::LayoutConfig, format::TemplateEventFormat};
/// let layout = LayoutConfig::default().build_layout().expect("valid layout");
/// tracing_subscriber::fmt()
///     .event_format(TemplateEventFormat::new(Arc::new(layout)))
///     .init();
/// ```
///
/// Event fields become MDC entries except `message`, which becomes the
/// message, and fields recorded as `dyn Error`, the first of which becomes
/// the attached error. The names of the enclosing spans, outermost first,
/// form the NDC.
#[derive(Clone, Debug)]
pub struct TemplateEventFormat {
    layout: Arc<JsonTemplateLayout>,
}

impl TemplateEventFormat {
    pub fn new(layout: Arc<JsonTemplateLayout>) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Arc<JsonTemplateLayout> {
        &self.layout
    }
}

impl<S, N> FormatEvent<S, N> for TemplateEventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'w> FormatFields<'w> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let ndc = ctx
            .event_scope()
            .map(|scope| scope.from_root().map(|span| span.name().to_string()).collect())
            .unwrap_or_default();
        let record = capture_event(event, ndc);
        writer.write_str(&self.layout.to_json_string(&record))?;
        writer.write_char('\n')
    }
}

/// Convert a `tracing` event into a [`LogEvent`].
pub fn capture_event(event: &Event<'_>, ndc: Vec<String>) -> LogEvent {
    let mut fields = BTreeMap::new();
    let mut message: Option<String> = None;
    let mut thrown: Option<ThrowableChain> = None;

    let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message, thrown: &mut thrown };
    event.record(&mut visitor);

    let meta = event.metadata();
    let current = std::thread::current();
    LogEvent {
        timestamp: Utc::now(),
        level: *meta.level(),
        logger_name: meta.target().to_string(),
        logger_fqcn: meta.module_path().map(|s| s.to_string()),
        message: Message::Text(message.unwrap_or_default()),
        thread: ThreadInfo {
            id: THREAD_ID.with(|id| *id),
            name: current.name().map(|s| s.to_string()),
            priority: 0,
        },
        mdc: fields,
        ndc,
        thrown,
        source: Some(SourceLocation {
            class_name: meta.module_path().map(|s| s.to_string()),
            method_name: None,
            file_name: meta.file().map(|s| s.to_string()),
            line_number: meta.line(),
        }),
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
    pub thrown: &'a mut Option<ThrowableChain>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if self.thrown.is_none() {
            *self.thrown = Some(ThrowableChain::from_error(value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
