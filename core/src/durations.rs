// core/src/durations.rs

/// Fast katalog av varigheter (sek) som beste snitt beregnes for.
/// Endres katalogen må alle lagrede sett regnes ut på nytt (force).
pub const TIME_INTERVALS_IN_SECONDS_OVERALL: &[u32] = &[
    1, 5, 10, 15, 20, 30, 45, 60, 90, 120, 180, 240, 300, 390, 480, 600, 720, 960, 1200, 1800,
    2400, 3000, 3600, 4500, 5400, 7200, 9000, 10800,
];

/// Utvalg som vises i tabeller/dashboard.
pub const TIME_INTERVALS_IN_SECONDS_REDACTED: &[u32] =
    &[1, 5, 10, 20, 30, 60, 120, 300, 600, 1200, 1800, 3600];

/// Kort visningsform: "5s", "1m", "1m 30s", "1h", "1h 15m".
pub fn format_duration(secs: u32) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    match (h, m, s) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, 0) => format!("{h}h"),
        (h, m, 0) => format!("{h}h {m}m"),
        (h, m, s) => format!("{h}h {m}m {s}s"),
    }
}
