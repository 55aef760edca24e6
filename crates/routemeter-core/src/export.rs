//! Prometheus text exposition (format 0.0.4) for a [`Snapshot`].

use std::fmt::Write;

use crate::metrics::{FamilySnapshot, SampleValue, Snapshot};

/// Content type scrapers expect for [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn label_pairs(keys: &[String], values: &[String]) -> Vec<String> {
    keys.iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect()
}

fn braces(pairs: &[String]) -> String {
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

fn render_family(fam: &FamilySnapshot, out: &mut String) {
    let _ = writeln!(out, "# HELP {} {}", fam.name, escape_help(&fam.help));
    let _ = writeln!(out, "# TYPE {} {}", fam.name, fam.kind.as_str());

    for sample in &fam.samples {
        let pairs = label_pairs(&fam.label_keys, &sample.label_values);
        match &sample.value {
            SampleValue::Counter(v) => {
                let _ = writeln!(out, "{}{} {}", fam.name, braces(&pairs), v);
            }
            SampleValue::Histogram(h) => {
                for (le, n) in &h.buckets {
                    let mut with_le = pairs.clone();
                    with_le.push(format!("le=\"{le}\""));
                    let _ = writeln!(out, "{}_bucket{} {}", fam.name, braces(&with_le), n);
                }
                let mut inf = pairs.clone();
                inf.push("le=\"+Inf\"".to_string());
                let _ = writeln!(out, "{}_bucket{} {}", fam.name, braces(&inf), h.count);
                let _ = writeln!(out, "{}_sum{} {}", fam.name, braces(&pairs), h.sum);
                let _ = writeln!(out, "{}_count{} {}", fam.name, braces(&pairs), h.count);
            }
        }
    }
}

/// Render every family in snapshot order.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for fam in &snapshot.families {
        render_family(fam, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricDesc, Registry};
    use std::time::Duration;

    #[test]
    fn renders_counters_and_histograms() {
        let r = Registry::new();
        r.register(MetricDesc::counter("response_status", "Status of HTTP response", &["status"]))
            .unwrap();
        r.register(MetricDesc::histogram("rt_seconds", "Duration.", &["path"], &[0.5, 1.0]))
            .unwrap();
        r.counter("response_status", &["404"]).unwrap().add(2);
        r.histogram("rt_seconds", &["/x"])
            .unwrap()
            .observe(Duration::from_millis(750));

        let text = render(&r.snapshot());
        let expected = "\
# HELP response_status Status of HTTP response
# TYPE response_status counter
response_status{status=\"404\"} 2
# HELP rt_seconds Duration.
# TYPE rt_seconds histogram
rt_seconds_bucket{path=\"/x\",le=\"0.5\"} 0
rt_seconds_bucket{path=\"/x\",le=\"1\"} 1
rt_seconds_bucket{path=\"/x\",le=\"+Inf\"} 1
rt_seconds_sum{path=\"/x\"} 0.75
rt_seconds_count{path=\"/x\"} 1
";
        assert_eq!(text, expected);
    }

    #[test]
    fn escapes_label_values() {
        let r = Registry::new();
        r.register(MetricDesc::counter("c", "multi\nline", &["path"]))
            .unwrap();
        r.counter("c", &["/a\"b"]).unwrap().increment();

        let text = render(&r.snapshot());
        assert!(text.contains("# HELP c multi\\nline\n"));
        assert!(text.contains("c{path=\"/a\\\"b\"} 1\n"));
    }
}
