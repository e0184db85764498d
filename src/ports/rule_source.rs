use std::path::PathBuf;

use thiserror::Error;

/// Error type for rule table sources
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RuleSourceError {
    /// The source does not exist
    #[error("Rule source not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The source exists but could not be read
    #[error("Rule source {} is unreadable: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record does not have exactly two fields
    #[error("Malformed record in {source_name} at line {line}: expected 2 fields, found {fields}")]
    MalformedRecord {
        source_name: String,
        line: u64,
        fields: usize,
    },

    /// The source could not be decoded into records
    #[error("Failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

/// Result type for rule source operations
pub type RuleSourceResult<T> = Result<T, RuleSourceError>;

/// One `key -> value` row of a rule table: a literal path and its
/// replacement, or a pattern and its replacement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecord {
    pub key: String,
    pub value: String,
}

impl RuleRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// RuleSource defines the port (interface) for two-column rule tables.
///
/// Implementations must read the whole table before returning so a caller
/// either gets every record or an error, never a prefix of the table.
pub trait RuleSource {
    /// Human readable name used in errors and logs
    fn name(&self) -> String;

    /// Read all records in source order
    fn read_records(&self) -> RuleSourceResult<Vec<RuleRecord>>;
}

/// In-memory tables, mostly useful for inline configuration and tests.
impl RuleSource for Vec<RuleRecord> {
    fn name(&self) -> String {
        "inline rules".to_string()
    }

    fn read_records(&self) -> RuleSourceResult<Vec<RuleRecord>> {
        Ok(self.clone())
    }
}
