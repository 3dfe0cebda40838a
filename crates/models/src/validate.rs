//! Field validators shared by the entity modules.
//!
//! Text validators return the trimmed value so callers store what they checked.

use crate::errors::ModelError;

/// Lowercased, trimmed address with a single `@` and a dotted domain.
pub fn email(raw: &str) -> Result<String, ModelError> {
    let email = raw.trim().to_lowercase();
    if email.len() > 255 || email.chars().any(char::is_whitespace) {
        return Err(ModelError::validation("invalid email"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ModelError::validation("invalid email"));
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && !domain.contains('@');
    if local.is_empty() || !domain_ok {
        return Err(ModelError::validation("invalid email"));
    }
    Ok(email)
}

/// Trimmed text with a character count in `min..=max`.
pub fn text(field: &str, raw: &str, min: usize, max: usize) -> Result<String, ModelError> {
    let value = raw.trim();
    let n = value.chars().count();
    if n < min {
        return Err(if min <= 1 {
            ModelError::Validation(format!("{field} required"))
        } else {
            ModelError::Validation(format!("{field} must be at least {min} characters"))
        });
    }
    if n > max {
        return Err(ModelError::Validation(format!("{field} must be at most {max} characters")));
    }
    Ok(value.to_string())
}

/// `None` and blank strings both mean "no value".
pub fn optional_text(field: &str, raw: Option<&str>, max: usize) -> Result<Option<String>, ModelError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => text(field, v, 1, max).map(Some),
        None => Ok(None),
    }
}

pub fn url(field: &str, raw: &str) -> Result<String, ModelError> {
    let value = raw.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && value.len() <= 512 => Ok(value.to_string()),
        _ => Err(ModelError::Validation(format!("{field} must be an http(s) url"))),
    }
}

pub fn optional_url(field: &str, raw: Option<&str>) -> Result<Option<String>, ModelError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => url(field, v).map(Some),
        None => Ok(None),
    }
}

/// ISO-4217 style code, uppercased.
pub fn currency(raw: &str) -> Result<String, ModelError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(ModelError::validation("currency must be a 3-letter code"))
    }
}

pub fn slug(raw: &str) -> Result<String, ModelError> {
    let value = raw.trim();
    let canonical = value.len() <= 220
        && !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if canonical {
        Ok(value.to_string())
    } else {
        Err(ModelError::validation("slug must be lowercase letters, digits and single dashes"))
    }
}
