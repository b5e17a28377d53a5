//! Host patterns
// (c) 2024 Ross Younger

use std::{fmt::Display, str::FromStr};

use wildmatch::WildMatch;

use crate::errors::{Error, Result};

/// A pattern as used in `Host` and `Match` lines.
///
/// From ssh_config(5): a pattern consists of zero or more non-whitespace characters,
/// `*` (a wildcard that matches zero or more characters), or `?` (a wildcard that
/// matches exactly one character). Every other character matches itself.
/// Matching is always against the whole candidate string, and is case sensitive.
///
/// A pattern may be negated by prefixing it with `!`.
///
/// Two patterns are equal if they were written the same way.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// as it appeared in the file, including any `!`
    text: String,
    matcher: WildMatch,
    negated: bool,
}

impl Pattern {
    /// Compiles a pattern
    pub fn new(s: &str) -> Result<Self> {
        let (negated, body) = match s.strip_prefix('!') {
            Some(body) => (true, body),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(Error::EmptyPattern);
        }
        Ok(Self {
            text: s.to_owned(),
            matcher: WildMatch::new(body),
            negated,
        })
    }

    /// A pattern matching everything
    #[must_use]
    pub fn any() -> Self {
        Self {
            text: "*".into(),
            matcher: WildMatch::new("*"),
            negated: false,
        }
    }

    /// Does the glob match `candidate`?
    ///
    /// This does not take negation into account; the caller decides what a match on a
    /// negated pattern means.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.matcher.matches(candidate)
    }

    /// Was this pattern prefixed with `!` ?
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The pattern as it was written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}
impl Eq for Pattern {}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::Pattern;
    use crate::errors::Error;
    use anyhow::{anyhow, Context, Result};
    use assertables::assert_eq_as_result;

    #[test]
    fn globbing() -> Result<()> {
        for (pattern, candidate, result) in [
            ("foo", "foo", true),
            ("foo", "fo", false),
            ("foo", "foox", false),
            ("foo", "xfoo", false),
            ("foo", "FOO", false),
            ("f?o", "foo", true),
            ("f?o", "fooo", false),
            ("f?o", "fo", false),
            ("f*", "foo", true),
            ("*of", "oof", true),
            ("*", "anything.at.all", true),
            ("*.example.com", "www.example.com", true),
            ("*.example.com", "example.com", false),
            ("192.168.0.?", "192.168.0.1", true),
            ("192.168.0.?", "192.168.0.10", false),
            ("a.c", "abc", false),
            ("a+b", "a+b", true),
            ("(x)[y]{z}$^|", "(x)[y]{z}$^|", true),
        ] {
            assert_eq_as_result!(Pattern::new(pattern)?.matches(candidate), result)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("pattern {pattern}, candidate {candidate}"))?;
        }
        Ok(())
    }

    #[test]
    fn negation() {
        let p = Pattern::new("!*.dialup.example.com").unwrap();
        assert!(p.is_negated());
        assert!(p.matches("foo.dialup.example.com"));
        assert_eq!(p.as_str(), "!*.dialup.example.com");
        assert!(!Pattern::new("foo").unwrap().is_negated());
    }

    #[test]
    fn empty_patterns() {
        assert!(matches!(Pattern::new(""), Err(Error::EmptyPattern)));
        assert!(matches!(Pattern::new("!"), Err(Error::EmptyPattern)));
    }

    #[test]
    fn equality_uses_original_text() {
        assert_eq!(Pattern::new("a*").unwrap(), "a*".parse::<Pattern>().unwrap());
        assert_ne!(Pattern::new("a*").unwrap(), Pattern::new("!a*").unwrap());
        assert_eq!(Pattern::any(), Pattern::new("*").unwrap());
        assert_eq!(Pattern::new("!x").unwrap().to_string(), "!x");
    }
}
