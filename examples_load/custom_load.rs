use std::sync::Arc;
use std::time::Instant;

use json_template_layout::config::LayoutConfig;
use json_template_layout::record::LogEvent;
use json_template_layout::throwable::{StackFrame, Throwable, ThrowableChain};
use json_template_layout::writer::BufferedJsonWriter;
use json_template_layout::KeyValuePair;
use tracing::Level;

const TEMPLATE: &str = r#"{
  "@timestamp": "${json:timestamp}",
  "level": "${json:level}",
  "message": "${json:message}",
  "mdc": "${json:mdc}",
  "error": {
    "class": "${json:exception:className}",
    "trace": "${json:exception:stackTrace:object}"
  }
}"#;

fn event(i: u64) -> LogEvent {
    let frames = (0..8)
        .map(|depth| StackFrame::new(format!("app.worker.Stage{}", depth), "run", Some("Stage.java"), Some(depth + 1)))
        .collect();
    let mut chain = ThrowableChain::new(Throwable::new("app.worker.JobFailed", Some("job failed")).with_frames(frames));
    let cause = chain.push(Throwable::new("java.net.SocketTimeoutException", Some("read timed out")));
    chain.set_cause(chain.root_id(), cause);

    let mut event = LogEvent::new(Level::ERROR, "app.worker", format!("custom load test error {}", i));
    event.mdc.insert("iteration".to_string(), i.into());
    event.thrown = Some(chain);
    event
}

fn main() {
    let config = LayoutConfig {
        writer_capacity: 4 * 1024,
        time_zone: "+02:00".to_string(),
        event_template: Some(TEMPLATE.to_string()),
        additional_fields: vec![KeyValuePair::new("service", "load-test")],
        ..LayoutConfig::default()
    };
    let layout = Arc::new(config.build_layout().expect("custom layout"));
    let events: Vec<LogEvent> = (0..1_000).map(event).collect();

    let n: u64 = 100_000;
    let threads = 4;
    let start = Instant::now();

    std::thread::scope(|scope| {
        for _ in 0..threads {
            let layout = Arc::clone(&layout);
            let events = &events;
            scope.spawn(move || {
                let mut writer = BufferedJsonWriter::with_capacity(layout.context().writer_capacity());
                for i in 0..n / threads {
                    writer.clear();
                    layout.encode(&events[(i % 1_000) as usize], &mut writer);
                    std::hint::black_box(writer.len());
                }
            });
        }
    });

    let elapsed = start.elapsed();
    println!("custom layout: rendered {} events on {} threads in {:?} (~{:.0} ev/s)",
        n,
        threads,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
