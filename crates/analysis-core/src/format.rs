//! Display strings for the presentation layer.

/// Shortened currency string: `1.50B`, `300.00M`, `12.30K`, `9.99`.
/// The suffix is chosen on the magnitude so negatives shorten too.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}

/// Large-number string for market cap, revenue and similar. Absent -> `-`.
pub fn format_big_number(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v >= 1e12 => format!("{:.2}T", v / 1e12),
        Some(v) if v >= 1e9 => format!("{:.2}B", v / 1e9),
        Some(v) if v >= 1e6 => format!("{:.2}M", v / 1e6),
        Some(v) => format!("{:.2}", v),
    }
}

/// Metric cell: `scale` is applied before formatting, so a 0.253 margin with
/// `scale = 100.0, suffix = "%"` renders as `25.30%`. Absent -> `N/A`.
pub fn format_metric(value: Option<f64>, decimals: usize, scale: f64, suffix: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}{}", decimals, v * scale, suffix),
        _ => "N/A".to_string(),
    }
}

/// Signed percentage for upside/downside badges: `+12.34%`.
pub fn format_signed_pct(value: f64) -> String {
    format!("{:+.2}%", value)
}
