use super::layout;

/// Split a CSV row into trimmed, unquoted fields.
///
/// The export format carries no embedded commas, so a plain split is
/// sufficient; surrounding quotes from spreadsheet exports are stripped.
pub fn split_row(row: &str) -> Vec<&str> {
    row.split(',').map(strip_quotes).collect()
}

/// Trim whitespace and one pair of surrounding double quotes.
pub fn strip_quotes(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(field)
}

/// Detect a header row: the first field does not parse as a timestamp.
pub fn is_header_row(row: &str) -> bool {
    match split_row(row).first() {
        Some(field) => parse_seconds(field).is_none(),
        None => true,
    }
}

/// Parse a timestamp field in seconds.
pub fn parse_seconds(field: &str) -> Option<f64> {
    let value: f64 = field.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse a data byte field, decimal or 0x-prefixed hex.
pub fn parse_data_byte(field: &str) -> Option<u8> {
    if let Some(hex) = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
    {
        u8::from_str_radix(hex, 16).ok()
    } else {
        field.parse().ok()
    }
}

/// Check a row has at least the required column count.
pub fn has_min_columns(fields: &[&str]) -> bool {
    fields.len() >= layout::MIN_COLUMNS
}
