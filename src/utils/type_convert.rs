/// Parse a text cell as a number
///
/// Surrounding whitespace is ignored. Empty, unparseable, and NaN text all
/// yield `None`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parse a text cell as an integer, accepting only plain integer literals
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Drop NaN so that it is treated the same as an absent value
pub fn finite_or_missing(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Render an optional float for delimited output; missing becomes an empty cell
pub fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
