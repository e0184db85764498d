use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

use crate::ports::rule_source::{RuleRecord, RuleSource, RuleSourceError, RuleSourceResult};

/// Rule table stored as a comma separated file with two columns and no
/// header row.
///
/// ```csv
/// /old-page,/new-page
/// "/with,comma",/target
/// ```
#[derive(Debug, Clone)]
pub struct CsvRuleSource {
    path: PathBuf,
}

impl CsvRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> RuleSourceError {
        if source.kind() == io::ErrorKind::NotFound {
            RuleSourceError::NotFound {
                path: self.path.clone(),
            }
        } else {
            RuleSourceError::Unreadable {
                path: self.path.clone(),
                source,
            }
        }
    }

    /// Parse records from any reader.
    pub fn parse_records(
        source_name: &str,
        reader: impl Read,
    ) -> RuleSourceResult<Vec<RuleRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(|e| RuleSourceError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;

            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            match (record.len(), record.get(0), record.get(1)) {
                (2, Some(key), Some(value)) => records.push(RuleRecord::new(key, value)),
                (fields, _, _) => {
                    return Err(RuleSourceError::MalformedRecord {
                        source_name: source_name.to_string(),
                        line,
                        fields,
                    });
                }
            }
        }

        Ok(records)
    }
}

impl RuleSource for CsvRuleSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_records(&self) -> RuleSourceResult<Vec<RuleRecord>> {
        let file = std::fs::File::open(&self.path).map_err(|e| self.io_error(e))?;
        let mut contents = Vec::new();
        io::BufReader::new(file)
            .read_to_end(&mut contents)
            .map_err(|e| self.io_error(e))?;

        Self::parse_records(&self.name(), contents.as_slice())
    }
}
