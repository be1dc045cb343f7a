use crate::metrics::snapshot::{Counter, Counters};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders the counters in the line-oriented text exposition format.
pub fn render(counters: &Counters) -> String {
    let mut lines = Vec::with_capacity(Counter::ALL.len() * 3 + 1);
    for counter in Counter::ALL {
        let name = counter.metric_name();
        lines.push(format!("# HELP {} {}", name, counter.help()));
        lines.push(format!("# TYPE {} counter", name));
        lines.push(format!("{} {}", name, counters.get(counter)));
    }
    lines.push(String::new());
    lines.join("\n")
}
