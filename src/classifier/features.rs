//! URL-presence feature derivation.
//!
//! The deployed model was fine-tuned on email bodies with a `URL_FLAG_{0,1}`
//! marker prepended, so the exact same rule must run at serving time. A
//! train/serve mismatch here degrades accuracy without producing any error,
//! which is why the rule lives in this one module and nowhere else.

/// Marker prepended when no URL is present.
pub const URL_FLAG_ABSENT: &str = "URL_FLAG_0";

/// Marker prepended when a URL is present.
pub const URL_FLAG_PRESENT: &str = "URL_FLAG_1";

/// Canonical URL rule: case-insensitive substring match on an HTTP or HTTPS
/// scheme prefix. Empty text has no URL.
pub fn has_url(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("http://") || lower.contains("https://")
}

/// Prepends the URL flag marker to an email body, producing the exact text
/// the model expects to tokenize.
pub fn with_url_flag(text: &str) -> String {
    let marker = if has_url(text) {
        URL_FLAG_PRESENT
    } else {
        URL_FLAG_ABSENT
    };
    format!("{} {}", marker, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_set_for_http_and_https() {
        assert!(has_url("click http://example.com now"));
        assert!(has_url("see https://example.com/login"));
        assert!(has_url("https://example.com"));
    }

    #[test]
    fn flag_is_case_insensitive() {
        assert!(has_url("visit HTTP://EXAMPLE.COM"));
        assert!(has_url("visit HtTpS://example.com"));
    }

    #[test]
    fn flag_clear_without_scheme() {
        assert!(!has_url("Did you finish work last week?"));
        assert!(!has_url("go to example.com"));
        assert!(!has_url("the http protocol"));
        assert!(!has_url(""));
    }

    #[test]
    fn marker_prefix_matches_training_format() {
        assert_eq!(
            with_url_flag("Did you finish work last week?"),
            "URL_FLAG_0 Did you finish work last week?"
        );
        assert_eq!(
            with_url_flag("reset here: https://evil.example"),
            "URL_FLAG_1 reset here: https://evil.example"
        );
    }

    #[test]
    fn empty_text_gets_absent_flag() {
        assert_eq!(with_url_flag(""), "URL_FLAG_0 ");
    }
}
