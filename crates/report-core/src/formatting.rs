/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    // Handle the sign separately so the thousands grouping works on the
    // absolute value.
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Round to the requested decimal places.
    // Add a tiny epsilon (half ULP at the target precision) before rounding
    // to avoid IEEE 754 binary-representation issues at exact midpoints.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    // Build the thousands-separated integer portion.
    let int_str = integer_part.to_string();
    let grouped = group_thousands(&int_str);

    let result = if decimals == 0 {
        grouped
    } else {
        // Format the fractional part to the exact number of decimals.
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` starts with "0.", e.g. "0.50". Strip the leading "0".
        let decimal_digits = &frac_str[1..]; // ".50"
        format!("{}{}", grouped, decimal_digits)
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a duration in minutes the way the charts' tooltips show it.
///
/// * `< 1` minute → `"45s"`
/// * `< 60` minutes → `"45min"`
/// * otherwise → `"3h 45min"`
/// * non-finite → `"N/A"`
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_duration;
///
/// assert_eq!(format_duration(0.5),   "30s");
/// assert_eq!(format_duration(45.0),  "45min");
/// assert_eq!(format_duration(60.0),  "1h 0min");
/// assert_eq!(format_duration(225.0), "3h 45min");
/// assert_eq!(format_duration(f64::NAN), "N/A");
/// ```
pub fn format_duration(minutes: f64) -> String {
    if !minutes.is_finite() {
        return "N/A".to_string();
    }
    if minutes < 1.0 {
        return format!("{}s", (minutes * 60.0).round() as i64);
    }
    let total_mins = minutes.round() as i64;
    if total_mins < 60 {
        format!("{}min", total_mins)
    } else {
        format!("{}h {}min", total_mins / 60, total_mins % 60)
    }
}

/// Format an optional coefficient of variation as a percentage.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_cv;
///
/// assert_eq!(format_cv(Some(12.345)), "12.35%");
/// assert_eq!(format_cv(None), "N/A");
/// ```
pub fn format_cv(cv: Option<f64>) -> String {
    match cv {
        Some(v) if v.is_finite() => format!("{}%", format_number(v, 2)),
        _ => "N/A".to_string(),
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use report_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
