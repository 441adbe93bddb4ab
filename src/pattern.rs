//! Compiled path patterns and their union.
//!
//! A pattern matches a path if it matches anywhere in it (unanchored search).
//! Use `^` and `$` to pin a pattern to the start or end of the path.
//! String specs are always pattern syntax: `"/a.b"` also matches `/axb`.

use regex::Regex;

use crate::error::ConfigError;

/// A single compiled path pattern. Immutable once created.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    /// Compile a pattern, failing fast on malformed syntax.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The pattern source text.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl From<Regex> for PathPattern {
    fn from(regex: Regex) -> Self {
        Self { regex }
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What callers hand to `restricted_area` / `unrestricted_area`:
/// either pattern text (compiled on registration) or an already-compiled pattern.
#[derive(Debug, Clone)]
pub enum PathSpec {
    Literal(String),
    Compiled(PathPattern),
}

impl PathSpec {
    /// Compile into a [`PathPattern`], reporting malformed text.
    pub fn compile(self) -> Result<PathPattern, ConfigError> {
        match self {
            PathSpec::Literal(text) => PathPattern::new(&text),
            PathSpec::Compiled(pattern) => Ok(pattern),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(text: &str) -> Self {
        PathSpec::Literal(text.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(text: String) -> Self {
        PathSpec::Literal(text)
    }
}

impl From<&String> for PathSpec {
    fn from(text: &String) -> Self {
        PathSpec::Literal(text.clone())
    }
}

impl From<Regex> for PathSpec {
    fn from(regex: Regex) -> Self {
        PathSpec::Compiled(regex.into())
    }
}

impl From<PathPattern> for PathSpec {
    fn from(pattern: PathPattern) -> Self {
        PathSpec::Compiled(pattern)
    }
}

/// An ordered list of patterns matched as a union.
///
/// `is_match` is true iff any member matches; an empty set never matches.
/// Each member is tested with its own compiled regex, keeping any
/// `RegexBuilder` flags it was built with.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<PathPattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pattern: PathPattern) {
        self.patterns.push(pattern);
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    /// The first member (in declaration order) that matches `path`.
    pub fn first_match(&self, path: &str) -> Option<&PathPattern> {
        self.patterns.iter().find(|p| p.is_match(path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
