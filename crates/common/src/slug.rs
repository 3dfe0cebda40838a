//! URL slugs for posts, categories and templates.

/// Lowercase ASCII alphanumerics separated by single dashes.
///
/// Returns an empty string when `input` has nothing sluggable; callers
/// treat that as a validation failure.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// `base`, `base-2`, `base-3`, ... for the n-th collision.
pub fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt <= 1 { base.to_string() } else { format!("{base}-{attempt}") }
}

/// True when `s` is already in canonical slug form.
pub fn is_valid(s: &str) -> bool {
    !s.is_empty() && slugify(s) == s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_punctuation_and_spaces() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust   & Axum -- Tips "), "rust-axum-tips");
        assert_eq!(slugify("Landing Page v2.0"), "landing-page-v2-0");
    }

    #[test]
    fn non_ascii_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn suffixes() {
        assert_eq!(with_suffix("post", 1), "post");
        assert_eq!(with_suffix("post", 3), "post-3");
    }

    #[test]
    fn validity() {
        assert!(is_valid("dark-theme"));
        assert!(!is_valid("Dark Theme"));
        assert!(!is_valid("-dark"));
        assert!(!is_valid(""));
    }
}
