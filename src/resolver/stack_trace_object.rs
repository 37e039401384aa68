use crate::resolver::frame::FrameResolver;
use crate::throwable::{ThrowableId, ThrowableRef};
use crate::writer::JsonWriter;
use std::collections::HashSet;

/// Renders a throwable as a nested JSON object:
///
/// ```json
/// {
///   "className": "...",
///   "message": "...",
///   "stackTrace": [ { ...frame... } ],
///   "cause": { ...same shape... },
///   "suppressed": [ { ...same shape... } ]
/// }
/// ```
///
/// Links pointing at a throwable already on the current path are treated as
/// terminal. Nesting is tracked on an explicit stack, so chain length is
/// bounded only by memory. With empty-property exclusion, an empty message,
/// a terminal cause and an empty suppressed list are omitted; otherwise they
/// are written as `""`, `null` and `[]`.
#[derive(Debug)]
pub struct StackTraceObjectFormatter {
    frame_resolver: FrameResolver,
    exclude_empty: bool,
}

impl StackTraceObjectFormatter {
    pub fn new(frame_resolver: FrameResolver, exclude_empty: bool) -> Self {
        StackTraceObjectFormatter { frame_resolver, exclude_empty }
    }

    pub fn format(&self, throwable: ThrowableRef<'_>, writer: &mut dyn JsonWriter) {
        let mut path = HashSet::new();
        let mut ops = vec![Op::Open(throwable)];
        while let Some(op) = ops.pop() {
            match op {
                Op::Open(throwable) => self.open(throwable, &mut path, &mut ops, writer),
                Op::FieldName(name) => writer.write_field_name(name),
                Op::Null => writer.write_null(),
                Op::StartArray => writer.start_array(),
                Op::EndArray => writer.end_array(),
                Op::Close(id) => {
                    writer.end_object();
                    path.remove(&id);
                }
            }
        }
    }

    /// Write the leading fields of `throwable` and queue the rest of its
    /// object. Links back into `path`, the throwables currently open, are
    /// terminal.
    fn open<'a>(
        &self,
        throwable: ThrowableRef<'a>,
        path: &mut HashSet<ThrowableId>,
        ops: &mut Vec<Op<'a>>,
        writer: &mut dyn JsonWriter,
    ) {
        path.insert(throwable.id());
        writer.start_object();

        writer.write_string_field("className", throwable.class_name());

        match throwable.message() {
            Some(message) if !(self.exclude_empty && message.is_empty()) => {
                writer.write_string_field("message", message);
            }
            _ if self.exclude_empty => {}
            _ => {
                writer.write_field_name("message");
                writer.write_null();
            }
        }

        writer.write_field_name("stackTrace");
        writer.start_array();
        for frame in throwable.frames() {
            self.frame_resolver.render(frame, writer, self.exclude_empty);
        }
        writer.end_array();

        // Pushed in reverse of output order.
        ops.push(Op::Close(throwable.id()));

        let suppressed: Vec<ThrowableRef<'a>> = throwable
            .suppressed()
            .filter(|s| !path.contains(&s.id()))
            .collect();
        if !(self.exclude_empty && suppressed.is_empty()) {
            ops.push(Op::EndArray);
            ops.extend(suppressed.into_iter().rev().map(Op::Open));
            ops.push(Op::StartArray);
            ops.push(Op::FieldName("suppressed"));
        }

        match throwable.cause().filter(|cause| !path.contains(&cause.id())) {
            Some(cause) => {
                ops.push(Op::Open(cause));
                ops.push(Op::FieldName("cause"));
            }
            None if self.exclude_empty => {}
            None => {
                ops.push(Op::Null);
                ops.push(Op::FieldName("cause"));
            }
        }
    }
}

/// Pending step of [`StackTraceObjectFormatter::format`].
enum Op<'a> {
    Open(ThrowableRef<'a>),
    FieldName(&'static str),
    Null,
    StartArray,
    EndArray,
    Close(ThrowableId),
}
