//! Rule evaluation over one record.
//!
//! A record is valid when every check passes:
//!
//! 1. the column count equals `expectedTotalColumn`, when configured;
//! 2. for each rule, the 1-based column exists in the record;
//! 3. `notEmpty`: the trimmed value is not empty;
//! 4. `valueInList`: the raw value is one of the listed values (case-sensitive);
//! 5. `regex`: the pattern matches the whole value.
//!
//! Broken rules never abort a run. A column reference outside the record and an
//! unparseable pattern both reject the record; the pattern error is reported
//! once, when the engine is built.
//!
//! # Example
//!
//! ```
//! use filefilter::config::{FilterConfig, ValidationRule};
//! use filefilter::validation::ValidationEngine;
//!
//! let mut config = FilterConfig::new("people.csv", "csv");
//! config.validations.push(ValidationRule::for_column(2).not_empty());
//! config.validations.push(ValidationRule::for_column(3).matching("^[0-9]+$"));
//!
//! let engine = ValidationEngine::new(&config);
//! assert!(engine.validate(&["1", "Alice", "30"]));
//! assert!(!engine.validate(&["2", "", "40"]));
//! assert!(!engine.validate(&["3", "Bob", "abc"]));
//! ```

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use tracing::{debug, error, warn};

use crate::config::{FilterConfig, ValidationRule};

/// Why a record was rejected. Columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ColumnCount { expected: usize, actual: usize },
    ColumnOutOfRange { column: i64, len: usize },
    Empty { column: usize },
    NotInList { column: usize, value: String },
    PatternMismatch { column: usize, value: String },
    InvalidPattern { column: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ColumnCount { expected, actual } => {
                write!(f, "column count mismatch: expected={}, actual={}", expected, actual)
            }
            Rejection::ColumnOutOfRange { column, len } => {
                write!(f, "column {} is outside a record of {} columns", column, len)
            }
            Rejection::Empty { column } => write!(f, "column {} failed notEmpty check", column),
            Rejection::NotInList { column, value } => {
                write!(f, "column {} failed valueInList check: value='{}'", column, value)
            }
            Rejection::PatternMismatch { column, value } => {
                write!(f, "column {} failed regex check: value='{}'", column, value)
            }
            Rejection::InvalidPattern { column } => {
                write!(f, "column {} has an invalid regex pattern", column)
            }
        }
    }
}

#[derive(Debug)]
enum Pattern {
    Compiled(Regex),
    /// Rejects every value it is applied to.
    Invalid,
}

#[derive(Debug)]
struct CompiledRule {
    /// As configured, 1-based; may be out of range.
    column: i64,
    not_empty: bool,
    allowed: HashSet<String>,
    pattern: Option<Pattern>,
}

impl CompiledRule {
    fn compile(rule: &ValidationRule) -> Self {
        let column = rule.column.unwrap_or(0);
        if column < 1 {
            warn!(column, "Invalid column index, every record will be rejected");
        }

        let pattern = rule.regex.as_deref().filter(|p| !p.is_empty()).map(|p| {
            // Anchor the whole pattern so the match covers the entire value.
            match Regex::new(&format!(r"\A(?:{})\z", p)) {
                Ok(re) => Pattern::Compiled(re),
                Err(e) => {
                    error!(column, pattern = p, error = %e, "Invalid regex pattern");
                    Pattern::Invalid
                }
            }
        });

        Self {
            column,
            not_empty: rule.not_empty.unwrap_or(false),
            allowed: rule.value_in_list.iter().cloned().collect(),
            pattern,
        }
    }

    fn check<S: AsRef<str>>(&self, row: &[S]) -> Result<(), Rejection> {
        let index = usize::try_from(self.column)
            .ok()
            .and_then(|c| c.checked_sub(1))
            .filter(|&idx| idx < row.len());
        let Some(index) = index else {
            return Err(Rejection::ColumnOutOfRange { column: self.column, len: row.len() });
        };
        let column = index + 1;
        let value = row[index].as_ref();

        if self.not_empty && value.trim().is_empty() {
            return Err(Rejection::Empty { column });
        }

        if !self.allowed.is_empty() && !self.allowed.contains(value) {
            return Err(Rejection::NotInList { column, value: value.to_string() });
        }

        match &self.pattern {
            Some(Pattern::Compiled(re)) if !re.is_match(value) => {
                Err(Rejection::PatternMismatch { column, value: value.to_string() })
            }
            Some(Pattern::Invalid) => Err(Rejection::InvalidPattern { column }),
            _ => Ok(()),
        }
    }
}

/// Compiled rule set for one pipeline run.
#[derive(Debug)]
pub struct ValidationEngine {
    expected_columns: Option<usize>,
    rules: Vec<CompiledRule>,
}

impl ValidationEngine {
    pub fn new(config: &FilterConfig) -> Self {
        Self::from_rules(config.expected_total_column, &config.validations)
    }

    pub fn from_rules(expected_columns: Option<usize>, rules: &[ValidationRule]) -> Self {
        Self {
            expected_columns,
            rules: rules.iter().map(CompiledRule::compile).collect(),
        }
    }

    /// `true` when the record passes every check.
    pub fn validate<S: AsRef<str>>(&self, row: &[S]) -> bool {
        match self.check(row) {
            Ok(()) => true,
            Err(rejection) => {
                debug!(reason = %rejection, "Record rejected");
                false
            }
        }
    }

    /// First failing check, if any.
    pub fn check<S: AsRef<str>>(&self, row: &[S]) -> Result<(), Rejection> {
        if let Some(expected) = self.expected_columns {
            if row.len() != expected {
                return Err(Rejection::ColumnCount { expected, actual: row.len() });
            }
        }
        self.rules.iter().try_for_each(|rule| rule.check(row))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
