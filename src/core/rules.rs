//! Compiled rule types shared by the engine and its builder.
//!
//! Everything here is built once and only read afterwards. Patterns are
//! compiled when a rule is created, so an invalid expression is reported
//! while configuration is still being assembled.
use std::{borrow::Cow, collections::HashMap};

use regex::Regex;
use thiserror::Error;

use crate::ports::RuleSourceError;

/// Error type for assembling redirect rules
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RuleError {
    /// Loading a rule table failed
    #[error(transparent)]
    Source(#[from] RuleSourceError),

    /// A configured regular expression does not compile
    #[error("Invalid pattern for {field} '{pattern}': {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub(crate) fn compile_pattern(field: &str, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        field: field.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// A path policy (lower case, trailing slash, no trailing slash) together
/// with its optional exempting pattern.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    enabled: bool,
    ignore: Option<Regex>,
}

impl PathPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled(ignore: Option<Regex>) -> Self {
        Self {
            enabled: true,
            ignore,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ignore_pattern(&self) -> Option<&str> {
        self.ignore.as_ref().map(Regex::as_str)
    }

    /// Enabled and not exempted for `path`.
    pub fn applies_to(&self, path: &str) -> bool {
        self.enabled && !self.ignore.as_ref().is_some_and(|re| re.is_match(path))
    }
}

/// A `pattern -> replacement template` rule. The template may reference
/// capture groups (`$1`, `${name}`).
#[derive(Debug, Clone)]
pub struct RegexRedirect {
    pattern: Regex,
    replacement: String,
}

impl RegexRedirect {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, RuleError> {
        Ok(Self {
            pattern: compile_pattern("regex redirect", pattern)?,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Replace every non-overlapping match in `path` with the template.
    pub fn apply<'p>(&self, path: &'p str) -> Cow<'p, str> {
        self.pattern.replace_all(path, self.replacement.as_str())
    }
}

/// Ordered regex rules. The first rule matching a path is the one applied.
#[derive(Debug, Clone, Default)]
pub struct RegexRedirects {
    rules: Vec<RegexRedirect>,
}

impl RegexRedirects {
    pub fn push(&mut self, rule: RegexRedirect) {
        self.rules.push(rule);
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = RegexRedirect>) {
        self.rules.extend(rules);
    }

    pub fn first_match(&self, path: &str) -> Option<&RegexRedirect> {
        self.rules.iter().find(|rule| rule.is_match(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegexRedirect> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Literal path table. Later inserts replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ExactRedirects {
    targets: HashMap<String, String>,
}

impl ExactRedirects {
    pub fn insert(&mut self, path: impl Into<String>, target: impl Into<String>) {
        self.targets.insert(path.into(), target.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.targets.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.targets.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Extend<(String, String)> for ExactRedirects {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.targets.extend(iter);
    }
}
