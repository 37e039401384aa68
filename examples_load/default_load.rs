use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use json_template_layout::config::LayoutConfig;
use json_template_layout::format::TemplateEventFormat;

fn main() {
    let layout = LayoutConfig::default().build_layout().expect("default layout");
    tracing_subscriber::fmt()
        .event_format(TemplateEventFormat::new(Arc::new(layout)))
        .with_writer(io::sink)
        .init();

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("default layout: rendered {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
