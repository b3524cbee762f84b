use crate::curve_series::CurveSeries;
use crate::durations::{format_duration, TIME_INTERVALS_IN_SECONDS_REDACTED};
use crate::types::MetricKind;

fn unit(metric: MetricKind) -> &'static str {
    match metric {
        MetricKind::Power => "W",
        MetricKind::HeartRate => "bpm",
    }
}

/// Tekst-tabell over det korte utvalget av varigheter, én kolonne per serie.
/// "-" = ingen verdi.
pub fn render_curve_report(series: &[CurveSeries], metric: MetricKind) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- Best {} ---\n", metric));

    let mut header = format!("{:>10}", "Duration");
    for s in series {
        header.push_str(&format!(" | {:>12}", s.label));
    }
    out.push_str(&header);
    out.push('\n');

    for &duration in TIME_INTERVALS_IN_SECONDS_REDACTED {
        let mut line = format!("{:>10}", format_duration(duration));
        for s in series {
            let cell = match s.curve.get(&duration).map(|e| e.value) {
                Some(v) => format!("{} {}", v, unit(metric)),
                None => "-".to_string(),
            };
            line.push_str(&format!(" | {:>12}", cell));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}
