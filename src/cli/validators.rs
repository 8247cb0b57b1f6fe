//! CLI argument validators.

/// Parse and validate confidence value (0.0-1.0).
pub fn parse_confidence(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "confidence must be between 0.0 and 1.0, got {value}"
        ));
    }

    Ok(value)
}

/// Parse an identifier prefix for result lookup.
///
/// Prefixes are matched against file names, so path separators are rejected.
pub fn parse_result_prefix(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("result id must not be empty".to_string());
    }
    if trimmed.contains(['/', '\\']) || trimmed.starts_with('.') {
        return Err(format!("'{trimmed}' is not a valid result id"));
    }
    Ok(trimmed.to_string())
}
