//! Small utility helpers used across modules.

use std::sync::OnceLock;

use regex::Regex;

/// Patterns for personal data that must never reach the logs.
fn pii_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Israeli ID number
            r"\b\d{9}\b",
            // Israeli mobile number
            r"\b05\d-?\d{7}\b",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Replace ID numbers, phone numbers and emails with `[REDACTED]`.
pub fn redact_pii(text: &str) -> String {
    let mut out = text.to_string();
    for re in pii_patterns() {
        out = re.replace_all(&out, "[REDACTED]").into_owned();
    }
    out
}

/// Log-safe truncation for large strings. Cuts on a char boundary.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}… ({total} chars total)")
    }
}

/// What a user-supplied string looks like in a log line.
pub fn log_safe(s: &str) -> String {
    trunc_for_log(&redact_pii(s), 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_ids_phones_and_emails() {
        let raw = "my id 123456789, phone 052-1234567, mail dana@example.co.il";
        assert_eq!(redact_pii(raw), "my id [REDACTED], phone [REDACTED], mail [REDACTED]");
    }

    #[test]
    fn leaves_hebrew_topics_alone() {
        assert_eq!(redact_pii("הַמִּשְׁפָּחָה שֶׁלִּי"), "הַמִּשְׁפָּחָה שֶׁלִּי");
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let s = "שָׁלוֹם".repeat(20);
        let out = trunc_for_log(&s, 5);
        assert!(out.starts_with(&s.chars().take(5).collect::<String>()));
        assert!(out.ends_with("chars total)"));
    }
}
