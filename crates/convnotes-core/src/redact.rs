use std::sync::LazyLock;

use regex::Regex;

/// Replacement text for every redacted match.
pub const PLACEHOLDER: &str = "[REDACTED]";

/// Compiled secret patterns, initialized once. Applied in order; specific token
/// shapes run before the generic keyword rule so their prefixes are kept intact
/// where the replacement references a capture group.
static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // OpenAI / Anthropic API keys: sk-..., sk-ant-...
        (
            Regex::new(r"\bsk-[a-zA-Z0-9_-]{20,}").unwrap(),
            PLACEHOLDER,
        ),
        // GitHub tokens: ghp_, gho_, ghs_, ghu_, github_pat_
        (
            Regex::new(r"\b(ghp_[a-zA-Z0-9]{36,}|gho_[a-zA-Z0-9]{36,}|ghs_[a-zA-Z0-9]{36,}|ghu_[a-zA-Z0-9]{36,}|github_pat_[a-zA-Z0-9_]{22,})").unwrap(),
            PLACEHOLDER,
        ),
        // GitLab tokens: glpat-
        (
            Regex::new(r"\bglpat-[a-zA-Z0-9\-]{20,}").unwrap(),
            PLACEHOLDER,
        ),
        // AWS access key IDs
        (
            Regex::new(r"\bAKIA[A-Z0-9]{16}\b").unwrap(),
            PLACEHOLDER,
        ),
        // Bearer tokens (Authorization headers)
        (
            Regex::new(r"(?i)(Bearer\s+)[a-zA-Z0-9._\-]{20,}").unwrap(),
            "${1}[REDACTED]",
        ),
        // PEM private key headers
        (
            Regex::new(r"-----BEGIN [A-Z ]+-----").unwrap(),
            PLACEHOLDER,
        ),
        // api_key / api-key / apikey followed by a value
        (
            Regex::new(r"(?i)api[_-]?key[:\s]*[^\s]+").unwrap(),
            PLACEHOLDER,
        ),
        // password / token / key / secret followed by a value
        (
            Regex::new(r"(?i)(password|token|key|secret)[:\s]*[^\s]+").unwrap(),
            PLACEHOLDER,
        ),
        // Long base64-looking runs
        (
            Regex::new(r"[A-Za-z0-9+/]{40,}={0,2}").unwrap(),
            PLACEHOLDER,
        ),
    ]
});

/// Secret scrubber: the built-in pattern set plus optional exact-substring rules.
///
/// `sanitize` is total and idempotent: running it over its own output changes
/// nothing, since no rule matches the placeholder.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    extra: Vec<Regex>,
}

impl Redactor {
    /// Build a redactor with additional exact-substring patterns (case-sensitive).
    ///
    /// Empty patterns, and patterns that occur inside the placeholder itself, are
    /// ignored.
    pub fn new<S: AsRef<str>>(extra_substrings: &[S]) -> Self {
        let extra = extra_substrings
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| !s.is_empty() && !PLACEHOLDER.contains(*s))
            .filter_map(|s| Regex::new(&regex::escape(s)).ok())
            .collect();
        Self { extra }
    }

    /// Replace every recognized secret in `input` with [`PLACEHOLDER`].
    pub fn sanitize(&self, input: &str) -> String {
        let mut output = redact_secrets(input);
        for pat in &self.extra {
            output = pat.replace_all(&output, PLACEHOLDER).to_string();
        }
        output
    }
}

/// Redact the built-in secret patterns from a string.
pub fn redact_secrets(input: &str) -> String {
    let mut output = input.to_string();
    for (pat, replacement) in SECRET_PATTERNS.iter() {
        output = pat.replace_all(&output, *replacement).to_string();
    }
    output
}
