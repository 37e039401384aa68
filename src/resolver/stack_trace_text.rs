use crate::throwable::{StackFrame, ThrowableRef};
use crate::writer::JsonWriter;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt::{self, Write};

const CAUSE_CAPTION: &str = "Caused by: ";
const SUPPRESSED_CAPTION: &str = "Suppressed: ";

/// Buffers retained for reuse once returned to the pool.
const MAX_POOLED_BUFFERS: usize = 32;

/// Renders throwables in the canonical multi-line stack trace format and
/// writes the result as a single JSON string.
///
/// Text is assembled in a reusable buffer checked out from a pool for the
/// duration of one call. Concurrent callers therefore always format into
/// distinct buffers; the pool mutex is held only while checking a buffer out
/// or returning it, never while formatting.
#[derive(Debug)]
pub struct StackTraceTextFormatter {
    capacity: usize,
    pool: Mutex<Vec<String>>,
}

impl StackTraceTextFormatter {
    pub fn new(capacity: usize) -> Self {
        StackTraceTextFormatter { capacity, pool: Mutex::new(Vec::new()) }
    }

    /// Format `throwable` and write it as one JSON string, or `null` if the
    /// text could not be produced.
    pub fn format(&self, throwable: ThrowableRef<'_>, writer: &mut dyn JsonWriter) {
        let mut buffer = self.acquire();
        match format_stack_trace(throwable, &mut buffer.buffer) {
            Ok(()) => writer.write_string(&buffer.buffer),
            Err(_) => writer.write_null(),
        }
    }

    /// Number of idle buffers currently held by the pool.
    pub fn pooled_buffers(&self) -> usize {
        self.pool.lock().len()
    }

    fn acquire(&self) -> PooledBuffer<'_> {
        let buffer = self
            .pool
            .lock()
            .pop()
            .unwrap_or_else(|| String::with_capacity(self.capacity));
        PooledBuffer { owner: self, buffer }
    }

    fn release(&self, mut buffer: String) {
        buffer.clear();
        if buffer.capacity() > self.capacity {
            buffer.shrink_to(self.capacity);
        }
        let mut pool = self.pool.lock();
        if pool.len() < MAX_POOLED_BUFFERS {
            pool.push(buffer);
        }
    }
}

/// Buffer checked out of a [`StackTraceTextFormatter`]; returned on drop.
struct PooledBuffer<'a> {
    owner: &'a StackTraceTextFormatter,
    buffer: String,
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.owner.release(std::mem::take(&mut self.buffer));
    }
}

/// Pending section of a stack trace dump.
struct Enclosed<'a> {
    throwable: ThrowableRef<'a>,
    enclosing: &'a [StackFrame],
    caption: &'static str,
    indent: usize,
}

/// Write the stack trace dump of `throwable` into `out`.
///
/// Suppressed errors are printed before the cause, indented by one tab.
/// Frames shared with the enclosing trace collapse into `... N more`. A
/// throwable seen earlier in the dump is printed as a circular reference.
/// Sections are walked with an explicit stack, so arbitrarily long chains
/// do not grow the call stack.
pub fn format_stack_trace<W: Write + ?Sized>(throwable: ThrowableRef<'_>, out: &mut W) -> fmt::Result {
    let mut seen = HashSet::new();
    seen.insert(throwable.id());
    writeln!(out, "{}", throwable.throwable())?;
    for frame in throwable.frames() {
        writeln!(out, "\tat {}", frame)?;
    }

    let mut pending = Vec::new();
    push_children(throwable, 0, &mut pending);
    while let Some(section) = pending.pop() {
        let Enclosed { throwable, enclosing, caption, indent } = section;
        if !seen.insert(throwable.id()) {
            write_indent(out, indent)?;
            writeln!(out, "{}[CIRCULAR REFERENCE: {}]", caption, throwable.throwable())?;
            continue;
        }

        let frames = throwable.frames();
        let in_common = frames
            .iter()
            .rev()
            .zip(enclosing.iter().rev())
            .take_while(|(ours, theirs)| ours == theirs)
            .count();

        write_indent(out, indent)?;
        writeln!(out, "{}{}", caption, throwable.throwable())?;
        for frame in &frames[..frames.len() - in_common] {
            write_indent(out, indent)?;
            writeln!(out, "\tat {}", frame)?;
        }
        if in_common != 0 {
            write_indent(out, indent)?;
            writeln!(out, "\t... {} more", in_common)?;
        }
        push_children(throwable, indent, &mut pending);
    }
    Ok(())
}

/// Queue the suppressed errors and the cause of `throwable` so that they pop
/// in dump order: suppressed first, then the cause.
fn push_children<'a>(throwable: ThrowableRef<'a>, indent: usize, pending: &mut Vec<Enclosed<'a>>) {
    let enclosing = throwable.frames();
    if let Some(cause) = throwable.cause().filter(|cause| cause.id() != throwable.id()) {
        pending.push(Enclosed { throwable: cause, enclosing, caption: CAUSE_CAPTION, indent });
    }
    let start = pending.len();
    pending.extend(throwable.suppressed().map(|suppressed| Enclosed {
        throwable: suppressed,
        enclosing,
        caption: SUPPRESSED_CAPTION,
        indent: indent + 1,
    }));
    pending[start..].reverse();
}

fn write_indent<W: Write + ?Sized>(out: &mut W, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        out.write_char('\t')?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throwable::{Throwable, ThrowableChain};
    use crate::writer::BufferedJsonWriter;

    fn frame(method: &str, line: u32) -> StackFrame {
        StackFrame::new("app.Main", method, Some("Main.java"), Some(line))
    }

    fn dump(chain: &ThrowableChain) -> String {
        let mut out = String::new();
        format_stack_trace(chain.root().unwrap(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_single_throwable() {
        let chain = ThrowableChain::new(
            Throwable::new("ExampleError", Some("boom")).with_frames(vec![frame("run", 10), frame("main", 3)]),
        );
        assert_eq!(
            dump(&chain),
            "ExampleError: boom\n\tat app.Main.run(Main.java:10)\n\tat app.Main.main(Main.java:3)\n"
        );
    }

    #[test]
    fn test_cause_with_common_frames_and_suppressed() {
        let mut chain = ThrowableChain::new(
            Throwable::new("java.io.IOException", Some("io")).with_frames(vec![frame("read", 20), frame("main", 3)]),
        );
        let cause = chain.push(
            Throwable::new("java.lang.NullPointerException", None)
                .with_frames(vec![frame("parse", 40), frame("read", 20), frame("main", 3)]),
        );
        let suppressed = chain.push(
            Throwable::new("java.lang.IndexOutOfBoundsException", Some("s1")).with_frames(vec![frame("close", 50), frame("main", 3)]),
        );
        chain.set_cause(chain.root_id(), cause);
        chain.add_suppressed(chain.root_id(), suppressed);

        let expected = "\
java.io.IOException: io
\tat app.Main.read(Main.java:20)
\tat app.Main.main(Main.java:3)
\tSuppressed: java.lang.IndexOutOfBoundsException: s1
\t\tat app.Main.close(Main.java:50)
\t\t... 1 more
Caused by: java.lang.NullPointerException
\tat app.Main.parse(Main.java:40)
\t... 2 more
";
        assert_eq!(dump(&chain), expected);
    }

    #[test]
    fn test_circular_reference() {
        let mut chain = ThrowableChain::new(Throwable::new("A", Some("a")));
        let b = chain.push(Throwable::new("B", Some("b")));
        chain.set_cause(chain.root_id(), b);
        chain.set_cause(b, chain.root_id());

        assert_eq!(dump(&chain), "A: a\nCaused by: B: b\nCaused by: [CIRCULAR REFERENCE: A: a]\n");
    }

    #[test]
    fn test_self_cause_is_not_printed() {
        let mut chain = ThrowableChain::new(Throwable::new("A", None));
        chain.set_cause(chain.root_id(), chain.root_id());
        assert_eq!(dump(&chain), "A\n");
    }

    #[test]
    fn test_nested_suppressed_and_causes_keep_dump_order() {
        let mut chain = ThrowableChain::new(Throwable::new("A", Some("a")));
        let s1 = chain.push(Throwable::new("S1", Some("s1")));
        let s2 = chain.push(Throwable::new("S2", Some("s2")));
        let c1 = chain.push(Throwable::new("C1", Some("c1")));
        let b = chain.push(Throwable::new("B", Some("b")));
        chain.add_suppressed(chain.root_id(), s1);
        chain.add_suppressed(s1, s2);
        chain.set_cause(s1, c1);
        chain.set_cause(chain.root_id(), b);

        let expected = "\
A: a
\tSuppressed: S1: s1
\t\tSuppressed: S2: s2
\tCaused by: C1: c1
Caused by: B: b
";
        assert_eq!(dump(&chain), expected);
    }

    #[test]
    fn test_long_chain_ending_in_cycle() {
        let links = 200_000;
        let mut chain = ThrowableChain::new(Throwable::new("E", Some("0")));
        let mut previous = chain.root_id();
        for i in 1..links {
            let next = chain.push(Throwable::new("E", Some(&i.to_string())));
            chain.set_cause(previous, next);
            previous = next;
        }
        chain.set_cause(previous, chain.root_id());

        let text = dump(&chain);
        assert_eq!(text.lines().count(), links + 1);
        assert!(text.ends_with(&format!("Caused by: E: {}\nCaused by: [CIRCULAR REFERENCE: E: 0]\n", links - 1)));
    }

    #[test]
    fn test_buffers_are_pooled_and_bounded() {
        let formatter = StackTraceTextFormatter::new(8);
        let chain = ThrowableChain::new(
            Throwable::new("E", Some("a message longer than eight bytes")).with_frames(vec![frame("run", 1)]),
        );
        let mut w = BufferedJsonWriter::default();
        formatter.format(chain.root().unwrap(), &mut w);
        assert_eq!(formatter.pooled_buffers(), 1);
        assert!(formatter.pool.lock()[0].capacity() <= 8);
        assert!(formatter.pool.lock()[0].is_empty());

        formatter.format(chain.root().unwrap(), &mut w);
        assert_eq!(formatter.pooled_buffers(), 1);
    }

    #[test]
    fn test_format_writes_json_string() {
        let formatter = StackTraceTextFormatter::new(64);
        let chain = ThrowableChain::new(Throwable::new("E", Some("m")));
        let mut w = BufferedJsonWriter::default();
        formatter.format(chain.root().unwrap(), &mut w);
        assert_eq!(w.into_string(), r#""E: m\n""#);
    }
}
