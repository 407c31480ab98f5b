//! Redaction of sensitive text before it reaches a log sink.
//!
//! A [`Redactor`] folds text through an ordered chain of [`RedactRule`]s.
//! Later rules see the output of earlier ones.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use regex::{NoExpand, Regex};

use crate::error::{ExecOptionsError, Result};

/// Placeholder substituted for redacted text.
pub const DEFAULT_REDACT_MASK: &str = "[REDACTED]";

/// Process-wide redaction kill switch.
///
/// Meant to be set once at process start in trusted debugging contexts.
static REDACTION_DISABLED: AtomicBool = AtomicBool::new(false);

/// Globally disable or re-enable redaction, regardless of registered rules.
pub fn set_redaction_disabled(disabled: bool) {
    REDACTION_DISABLED.store(disabled, Ordering::SeqCst);
}

/// Whether the process-wide kill switch is set.
pub fn redaction_disabled() -> bool {
    REDACTION_DISABLED.load(Ordering::SeqCst)
}

/// A single text-rewriting rule.
#[derive(Clone)]
pub struct RedactRule(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl RedactRule {
    /// Rule from an arbitrary text transform.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Rule that replaces every match of `pattern` with the mask.
    ///
    /// Fails if the pattern does not compile.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(|source| ExecOptionsError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::regex(re))
    }

    /// Rule from an already compiled regex.
    pub fn regex(re: Regex) -> Self {
        Self::custom(move |s| re.replace_all(s, NoExpand(DEFAULT_REDACT_MASK)).into_owned())
    }

    /// Rule that replaces every occurrence of each literal with the mask.
    ///
    /// Empty strings are ignored. Literals are replaced in the given order.
    pub fn strings<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let literals: Vec<String> = literals
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();

        Self::custom(move |s| {
            literals
                .iter()
                .fold(s.to_string(), |acc, lit| acc.replace(lit.as_str(), DEFAULT_REDACT_MASK))
        })
    }

    /// Apply this rule alone.
    pub fn apply(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl fmt::Debug for RedactRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RedactRule(..)")
    }
}

/// Ordered chain of redaction rules.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    rules: Vec<RedactRule>,
}

impl Redactor {
    /// Create an empty redactor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the end of the chain.
    pub fn push(&mut self, rule: RedactRule) {
        self.rules.push(rule);
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fold `text` through every rule in registration order.
    ///
    /// Returns the input unchanged when the kill switch is set or the chain is empty.
    pub fn redact(&self, text: &str) -> String {
        if redaction_disabled() || self.rules.is_empty() {
            return text.to_string();
        }
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redactor(rules: impl IntoIterator<Item = RedactRule>) -> Redactor {
        let mut r = Redactor::new();
        for rule in rules {
            r.push(rule);
        }
        r
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let r = Redactor::new();
        assert!(r.is_empty());
        assert_eq!(r.redact("password=hunter2"), "password=hunter2");
    }

    #[test]
    fn test_literal_rule_masks_every_occurrence() {
        let r = redactor([RedactRule::strings(["secret123"])]);
        assert_eq!(
            r.redact("a secret123 b secret123"),
            "a [REDACTED] b [REDACTED]"
        );
    }

    #[test]
    fn test_literal_rule_without_occurrences_is_identity() {
        let r = redactor([RedactRule::strings(["alpha", "beta"])]);
        assert_eq!(r.redact("gamma delta"), "gamma delta");
    }

    #[test]
    fn test_literal_rule_ignores_empty_strings() {
        let r = redactor([RedactRule::strings(["", "tok"])]);
        assert_eq!(r.redact("a tok b"), "a [REDACTED] b");
    }

    #[test]
    fn test_literal_rule_follows_literal_order() {
        // "abc" replaced first leaves nothing for "bc" to match
        let r = redactor([RedactRule::strings(["abc", "bc"])]);
        assert_eq!(r.redact("abcd"), "[REDACTED]d");

        let r = redactor([RedactRule::strings(["bc", "abc"])]);
        assert_eq!(r.redact("abcd"), "a[REDACTED]d");
    }

    #[test]
    fn test_pattern_rule_masks_all_matches() {
        let r = redactor([RedactRule::pattern(r"token=\w+").unwrap()]);
        assert_eq!(
            r.redact("token=abc other token=xyz"),
            "[REDACTED] other [REDACTED]"
        );
    }

    #[test]
    fn test_pattern_rule_leaves_no_match_behind() {
        let re = Regex::new(r"\d{4}").unwrap();
        let r = redactor([RedactRule::regex(re.clone())]);
        let out = r.redact("card 1234 5678 and 12345678");
        assert!(!re.is_match(&out));
    }

    #[test]
    fn test_pattern_rule_mask_is_not_expanded() {
        let r = redactor([RedactRule::pattern(r"(?P<x>foo)").unwrap()]);
        assert_eq!(r.redact("foo"), DEFAULT_REDACT_MASK);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = RedactRule::pattern("(unclosed").unwrap_err();
        assert!(matches!(err, ExecOptionsError::InvalidPattern { .. }));
    }

    #[test]
    fn test_rules_apply_in_registration_order() {
        let upper = RedactRule::custom(|s| s.to_uppercase());
        let literal = RedactRule::strings(["KEY"]);

        let r = redactor([upper.clone(), literal.clone()]);
        assert_eq!(r.redact("my key"), "MY [REDACTED]");

        // literal first sees lowercase "key" and misses it
        let r = redactor([literal, upper]);
        assert_eq!(r.redact("my key"), "MY KEY");
    }
}
