//! Text exposition of a registry (Prometheus text format, version 0.0.4).
//!
//! Names are `{prefix}{name}` with every character outside `[A-Za-z0-9_:]`
//! mapped to `_`. Histograms and timers render as summaries over the
//! reservoir snapshot plus min/max/mean/stddev gauges; meters and timers add
//! one rate gauge per window. Text gauges have no numeric form and are skipped.

use std::fmt::Write;

use statkit_core::MetricsRegistry;

const QUANTILE_LABELS: [&str; 6] = ["0.5", "0.75", "0.95", "0.98", "0.99", "0.999"];

/// Exported metric name for `name` under `prefix`.
pub fn metric_name(prefix: &str, name: &str) -> String {
    let mut out: String = prefix
        .chars()
        .chain(name.chars())
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn render_summary(out: &mut String, name: &str, quantiles: [f64; 6], sum: f64, count: u64) {
    let _ = writeln!(out, "# TYPE {name} summary");
    for (label, v) in QUANTILE_LABELS.iter().zip(quantiles) {
        let _ = writeln!(out, "{name}{{quantile=\"{label}\"}} {v}");
    }
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}

fn render_gauge(out: &mut String, name: &str, v: f64) {
    let _ = writeln!(out, "# TYPE {name} gauge\n{name} {v}");
}

fn render_stats(out: &mut String, name: &str, min: f64, max: f64, mean: f64, stddev: f64) {
    render_gauge(out, &format!("{name}_min"), min);
    render_gauge(out, &format!("{name}_max"), max);
    render_gauge(out, &format!("{name}_mean"), mean);
    render_gauge(out, &format!("{name}_stddev"), stddev);
}

fn render_rates(out: &mut String, name: &str, m1: f64, m5: f64, m15: f64, mean: f64) {
    let _ = writeln!(out, "# TYPE {name}_rate gauge");
    let _ = writeln!(out, "{name}_rate{{window=\"1m\"}} {m1}");
    let _ = writeln!(out, "{name}_rate{{window=\"5m\"}} {m5}");
    let _ = writeln!(out, "{name}_rate{{window=\"15m\"}} {m15}");
    let _ = writeln!(out, "{name}_rate{{window=\"mean\"}} {mean}");
}

/// Render every registered metric, kinds in registry order, names sorted.
pub fn render_text(registry: &MetricsRegistry, prefix: &str) -> String {
    let mut out = String::new();

    for (name, c) in registry.counters() {
        let name = metric_name(prefix, &name);
        let _ = writeln!(out, "# TYPE {name} counter\n{name} {}", c.count());
    }

    for (name, h) in registry.histograms() {
        let name = metric_name(prefix, &name);
        let s = h.summary();
        let quantiles = [s.median, s.p75, s.p95, s.p98, s.p99, s.p999];
        render_summary(&mut out, &name, quantiles, s.sum, s.count);
        render_stats(&mut out, &name, s.min, s.max, s.mean, s.stddev);
    }

    for (name, m) in registry.meters() {
        let name = metric_name(prefix, &name);
        let s = m.summary();
        let _ = writeln!(out, "# TYPE {name}_total counter\n{name}_total {}", s.count);
        render_rates(&mut out, &name, s.m1_rate, s.m5_rate, s.m15_rate, s.mean_rate);
    }

    for (name, t) in registry.timers() {
        let name = metric_name(prefix, &name);
        let s = t.summary();
        let seconds = format!("{name}_seconds");
        let quantiles = [s.median, s.p75, s.p95, s.p98, s.p99, s.p999];
        render_summary(&mut out, &seconds, quantiles, s.sum, s.count);
        render_stats(&mut out, &seconds, s.min, s.max, s.mean, s.stddev);
        render_rates(&mut out, &name, s.m1_rate, s.m5_rate, s.m15_rate, s.mean_rate);
    }

    for (name, g) in registry.gauges() {
        let Some(v) = g.value().as_f64() else {
            continue;
        };
        render_gauge(&mut out, &metric_name(prefix, &name), v);
    }

    out
}
