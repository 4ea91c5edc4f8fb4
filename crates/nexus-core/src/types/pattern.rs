//! Wildcard search pattern type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated wildcard pattern for asset searches.
///
/// Patterns use the same tokens as the repository web UI "Name" field:
/// `*` matches any run of characters (including `/`) and `?` matches
/// exactly one character. The server understands these tokens natively, so
/// the pattern is sent verbatim as the `name` filter.
///
/// # Example
///
/// ```
/// use nexus_core::WildcardPattern;
///
/// let pattern = WildcardPattern::new("MyProject/build_2025*artifact.zip").unwrap();
/// assert_eq!(pattern.filter_value(), "MyProject/build_2025*artifact.zip");
/// assert!(pattern.matches("MyProject/build_20250101/component-a/artifact.zip"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WildcardPattern(String);

impl WildcardPattern {
    /// Create a new pattern, validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is empty or contains control
    /// characters, which cannot be carried in a query string unescaped.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the value for the server-side `name` query parameter.
    pub fn filter_value(&self) -> &str {
        &self.0
    }

    /// Returns the pattern string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the pattern contains no wildcard tokens.
    pub fn is_literal(&self) -> bool {
        !self.0.contains(['*', '?'])
    }

    /// Matches a path locally with the same semantics the server applies.
    pub fn matches(&self, candidate: &str) -> bool {
        let pattern: Vec<char> = self.0.chars().collect();
        let text: Vec<char> = candidate.chars().collect();

        let (mut p, mut t) = (0, 0);
        // Position of the last `*` and the text index it was tried at.
        let mut star: Option<(usize, usize)> = None;

        while t < text.len() {
            if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
                p += 1;
                t += 1;
            } else if p < pattern.len() && pattern[p] == '*' {
                star = Some((p, t));
                p += 1;
            } else if let Some((star_p, star_t)) = star {
                p = star_p + 1;
                t = star_t + 1;
                star = Some((star_p, star_t + 1));
            } else {
                return false;
            }
        }

        pattern[p..].iter().all(|c| *c == '*')
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.trim().is_empty() {
            return Err(InvalidInputError::Pattern {
                value: s.to_string(),
                reason: "pattern cannot be empty".to_string(),
            }
            .into());
        }

        if let Some(c) = s.chars().find(|c| c.is_control()) {
            return Err(InvalidInputError::Pattern {
                value: s.escape_debug().to_string(),
                reason: format!("contains control character {:?}", c),
            }
            .into());
        }

        Ok(())
    }
}

/// Translates a user pattern into the server-side filter value.
pub fn translate(pattern: &str) -> Result<String, Error> {
    WildcardPattern::new(pattern).map(|p| p.filter_value().to_string())
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WildcardPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for WildcardPattern {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<WildcardPattern> for String {
    fn from(pattern: WildcardPattern) -> Self {
        pattern.0
    }
}

impl AsRef<str> for WildcardPattern {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
