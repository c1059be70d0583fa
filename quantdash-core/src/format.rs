//! Display formatting: money, percentages, dates, and status labels.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::{BacktestStatus, ModelStatus, PromptStatus, Severity};

/// Insert thousands separators into the integer part of a formatted number.
fn group_thousands(int_part: &str) -> String {
    let bytes = int_part.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(b as char);
    }
    out
}

/// `1234567.891` with 2 decimals → `1,234,567.89`. Non-finite values render as `—`.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{}.{f}", group_thousands(int_part)),
        None => format!("{sign}{}", group_thousands(int_part)),
    }
}

/// `-1234.5` → `-$1,234.50`.
pub fn format_currency(value: f64) -> String {
    let body = format_number(value, 2);
    match body.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None if body == "—" => body,
        None => format!("${body}"),
    }
}

/// Compact currency for tight columns: `$950`, `$12.3K`, `$4.56M`, `$1.2B`.
pub fn format_compact_currency(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let (scaled, suffix) = if abs >= 1e12 {
        (abs / 1e12, "T")
    } else if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        return format!("{sign}${abs:.0}");
    };
    let digits = if scaled >= 100.0 { 0 } else if scaled >= 10.0 { 1 } else { 2 };
    format!("{sign}${scaled:.digits$}{suffix}")
}

/// Ratio → percentage: `0.1234` → `12.34%`; with `signed`, positives get `+`.
pub fn format_percent(ratio: f64, decimals: usize, signed: bool) -> String {
    if !ratio.is_finite() {
        return "—".to_string();
    }
    let pct = ratio * 100.0;
    let body = format!("{:.*}%", decimals, pct);
    if signed && pct > 0.0 && !body.starts_with('-') {
        format!("+{body}")
    } else {
        body
    }
}

/// `2024-03-05`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `Mar 5, 2024`.
pub fn format_date_long(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `2024-03-05 14:30 UTC`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Coarse "time ago" label: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - ts;
    if elapsed < Duration::minutes(1) {
        "just now".to_string()
    } else if elapsed < Duration::hours(1) {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed < Duration::days(1) {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

/// `95` seconds → `1m 35s`; hours shown when present.
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

pub fn backtest_status_label(status: BacktestStatus) -> &'static str {
    match status {
        BacktestStatus::Pending => "Pending",
        BacktestStatus::Running => "Running",
        BacktestStatus::Completed => "Completed",
        BacktestStatus::Failed => "Failed",
        BacktestStatus::Cancelled => "Cancelled",
    }
}

pub fn prompt_status_label(status: PromptStatus) -> &'static str {
    match status {
        PromptStatus::Draft => "Draft",
        PromptStatus::InReview => "In Review",
        PromptStatus::Approved => "Approved",
        PromptStatus::Rejected => "Rejected",
    }
}

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "Low",
        Severity::Medium => "Medium",
        Severity::High => "High",
        Severity::Critical => "Critical",
    }
}

pub fn model_status_label(status: ModelStatus) -> &'static str {
    match status {
        ModelStatus::Training => "Training",
        ModelStatus::Ready => "Ready",
        ModelStatus::Failed => "Failed",
        ModelStatus::Archived => "Archived",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn numbers() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(f64::NAN, 2), "—");
    }

    #[test]
    fn currency() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(-1234.5), "-$1,234.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(f64::INFINITY), "—");
    }

    #[test]
    fn compact_currency() {
        assert_eq!(format_compact_currency(950.0), "$950");
        assert_eq!(format_compact_currency(12_345.0), "$12.3K");
        assert_eq!(format_compact_currency(4_560_000.0), "$4.56M");
        assert_eq!(format_compact_currency(-250_000_000.0), "-$250M");
        assert_eq!(format_compact_currency(1.2e9), "$1.20B");
    }

    #[test]
    fn percent() {
        assert_eq!(format_percent(0.1234, 2, false), "12.34%");
        assert_eq!(format_percent(0.1234, 1, true), "+12.3%");
        assert_eq!(format_percent(-0.05, 2, true), "-5.00%");
        assert_eq!(format_percent(0.0, 2, true), "0.00%");
    }

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(d), "2024-03-05");
        assert_eq!(format_date_long(d), "Mar 5, 2024");
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-05 14:30 UTC");
    }

    #[test]
    fn relative() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(format_relative(now - Duration::seconds(10), now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative(now - Duration::days(2), now), "2d ago");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::seconds(95)), "1m 35s");
        assert_eq!(format_duration(Duration::seconds(7260)), "2h 1m");
        assert_eq!(format_duration(Duration::seconds(4)), "4s");
    }

    #[test]
    fn labels() {
        assert_eq!(prompt_status_label(PromptStatus::InReview), "In Review");
        assert_eq!(backtest_status_label(BacktestStatus::Cancelled), "Cancelled");
        assert_eq!(severity_label(Severity::Critical), "Critical");
        assert_eq!(model_status_label(ModelStatus::Ready), "Ready");
    }
}
