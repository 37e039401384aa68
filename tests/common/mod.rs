#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use json_template_layout::record::{LogEvent, SourceLocation, ThreadInfo};
use json_template_layout::throwable::{StackFrame, Throwable, ThrowableChain};
use serde_json::json;
use tracing::Level;

pub fn frames(depth: usize) -> Vec<StackFrame> {
    (0..depth)
        .map(|i| StackFrame::new(format!("app.service.Handler{}", i), "handle", Some("Handler.java"), Some(10 + i as u32)))
        .collect()
}

/// IOException caused by a NullPointerException, with two suppressed
/// IndexOutOfBoundsExceptions.
pub fn io_failure(id: &str) -> ThrowableChain {
    let mut chain = ThrowableChain::new(
        Throwable::new("java.io.IOException", Some(&format!("testIOEx-{}", id))).with_frames(frames(3)),
    );
    let cause = chain.push(
        Throwable::new("java.lang.NullPointerException", Some(&format!("testNPEx-{}", id))).with_frames(frames(4)),
    );
    let s1 = chain.push(Throwable::new(
        "java.lang.IndexOutOfBoundsException",
        Some(&format!("I am suppressed exception 1{}", id)),
    ));
    let s2 = chain.push(Throwable::new(
        "java.lang.IndexOutOfBoundsException",
        Some(&format!("I am suppressed exception 2{}", id)),
    ));
    chain.set_cause(chain.root_id(), cause);
    chain.add_suppressed(chain.root_id(), s1);
    chain.add_suppressed(chain.root_id(), s2);
    chain
}

pub fn lite_event(id: usize) -> LogEvent {
    let mut event = LogEvent::new(Level::DEBUG, format!("a.B{}", id), format!("lite LogEvent message {}", id));
    event.timestamp = Utc.timestamp_millis_opt(1_600_000_000_000 + id as i64).unwrap();
    event
}

pub fn full_event(id: usize) -> LogEvent {
    let mut event = lite_event(id);
    event.message = format!("full LogEvent message {}", id).into();
    event.logger_fqcn = Some(format!("f.q.c.n{}", id));
    event.thread = ThreadInfo { id: id as u64, name: Some(format!("MyThreadName{}", id)), priority: (id % 10) as i32 };
    event.mdc.insert(format!("MDC.String.{}", id), json!("String"));
    event.mdc.insert(format!("MDC.Integer.{}", id), json!(10));
    event.mdc.insert(format!("MDC.Long.{}", id), json!(i64::MAX));
    event.ndc = vec![format!("stack_msg1{}", id), format!("stack_msg2{}", id)];
    event.thrown = Some(io_failure(&id.to_string()));
    event.source = Some(SourceLocation {
        class_name: Some("app.service.Handler0".to_string()),
        method_name: Some("handle".to_string()),
        file_name: Some("Handler.java".to_string()),
        line_number: Some(10),
    });
    event
}

/// `E0` caused by `E1` caused by ... `E{links - 1}`, with no cycle.
pub fn deep_chain(links: usize) -> ThrowableChain {
    let mut chain = ThrowableChain::new(Throwable::new("E0", Some("m0")));
    let mut previous = chain.root_id();
    for i in 1..links {
        let next = chain.push(Throwable::new(format!("E{}", i), Some(&format!("m{}", i))));
        chain.set_cause(previous, next);
        previous = next;
    }
    chain
}
