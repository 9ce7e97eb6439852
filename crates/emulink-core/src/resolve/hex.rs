use tracing::warn;

/// Parse a hex address with an optional `0x`/`0X` prefix.
///
/// Empty or malformed strings yield `None` instead of an error.
pub fn parse_hex(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    if digits.is_empty() {
        warn!("Invalid hex address: empty string");
        return None;
    }

    match u64::from_str_radix(digits, 16) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Invalid hex address '{}': {}", value, e);
            None
        }
    }
}
