use std::sync::LazyLock;

use regex::Regex;

/// Korean phone layout: area or carrier prefix, exchange, line, dashes optional.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2,3}-?\d{3,4}-?\d{4}$").expect("phone pattern compiles"));

static NON_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D").expect("non-digit pattern compiles"));

/// Checks a phone number written with digits and optional dashes and
/// returns it trimmed, otherwise exactly as the caller wrote it.
pub fn validate_phone(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("phone is required".to_string());
    }

    if !PHONE_PATTERN.is_match(trimmed) {
        return Err("phone must be digits with optional dashes, e.g. 010-1234-5678".to_string());
    }

    if !(10..=11).contains(&phone_digits(trimmed).len()) {
        return Err("phone must have 10 or 11 digits".to_string());
    }

    Ok(trimmed.to_string())
}

/// Digits only. Stored phones are compared in this form, which matches the
/// `phone_digits` column on `reservations`.
pub fn phone_digits(phone: &str) -> String {
    NON_DIGITS.replace_all(phone, "").into_owned()
}

/// Trimmed, non-empty text or a message naming the field.
pub fn require_field(value: Option<&str>, field: &str) -> Result<String, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{} is required", field)),
    }
}
