//! Filter configuration.
//!
//! Maps the YAML configuration file onto [`FilterConfig`]. Keys are
//! camelCase:
//!
//! ```yaml
//! inputFile: sourcefile/SampleData.csv
//! fileType: CSV
//! encoding: UTF-8
//! skipHeaderLines: 1
//! expectedTotalColumn: 3
//! validations:
//!   - column: 2
//!     notEmpty: true
//!   - column: 3
//!     regex: "^[0-9]+$"
//! output:
//!   needRejectedData: true
//! ```
//!
//! [`FilterConfig::validate`] runs once before any file is opened.

pub mod output;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::{self, EncodingSpec};
use crate::error::{ConfigError, ConfigResult};
use crate::registry::{FileFormat, ProcessorRegistry};

pub use output::{OutputConfig, OutputPaths};

/// Default configuration file looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "filter-config.yaml";

/// A single column rule. All configured checks must pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    /// Column index, 1-based. Values below 1 reject every record.
    #[serde(default)]
    pub column: Option<i64>,

    /// Value must not be empty after trimming.
    #[serde(default)]
    pub not_empty: Option<bool>,

    /// Allowed values, exact match. Empty means no check.
    #[serde(default)]
    pub value_in_list: Vec<String>,

    /// Pattern the whole value must match.
    #[serde(default)]
    pub regex: Option<String>,
}

impl ValidationRule {
    pub fn for_column(column: i64) -> Self {
        Self { column: Some(column), ..Self::default() }
    }

    pub fn not_empty(mut self) -> Self {
        self.not_empty = Some(true);
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_in_list = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }
}

/// Main configuration, one per input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Input file path.
    #[serde(default)]
    pub input_file: PathBuf,

    /// File type tag: CSV, EXCEL, XLSX, XLS or TXT (case-insensitive).
    #[serde(default)]
    pub file_type: String,

    /// Literal delimiter for TXT files.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Character encoding of text files, or `auto`.
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Leading records copied to every output without validation.
    #[serde(default)]
    pub skip_header_lines: usize,

    /// Exact number of columns a record must have.
    #[serde(default)]
    pub expected_total_column: Option<usize>,

    #[serde(default)]
    pub validations: Vec<ValidationRule>,

    #[serde(default)]
    pub output: OutputConfig,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

impl FilterConfig {
    /// Minimal configuration for `input` in the given format.
    pub fn new(input: impl Into<PathBuf>, file_type: impl Into<String>) -> Self {
        Self {
            input_file: input.into(),
            file_type: file_type.into(),
            delimiter: default_delimiter(),
            encoding: default_encoding(),
            skip_header_lines: 0,
            expected_total_column: None,
            validations: Vec::new(),
            output: OutputConfig::default(),
        }
    }

    /// Load a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check the configuration is internally consistent.
    ///
    /// Returns the resolved file format. No file is touched.
    pub fn validate(&self) -> ConfigResult<FileFormat> {
        if self.input_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("inputFile"));
        }
        if self.file_type.trim().is_empty() {
            return Err(ConfigError::MissingField("fileType"));
        }

        let format = ProcessorRegistry::default().lookup(&self.file_type)?;

        if format == FileFormat::FixedDelimiter && self.delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        if format.is_text() {
            self.encoding_spec()?;
        }
        if self.validations.iter().any(|rule| rule.column.is_none()) {
            return Err(ConfigError::MissingField("validations.column"));
        }

        self.output_paths(format)?;
        Ok(format)
    }

    /// Resolved encoding of text input and output.
    pub fn encoding_spec(&self) -> ConfigResult<EncodingSpec> {
        codec::resolve_encoding(&self.encoding)
    }

    /// Filtered and rejected output paths for this configuration.
    pub fn output_paths(&self, format: FileFormat) -> ConfigResult<OutputPaths> {
        self.output.resolve(&self.input_file, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
inputFile: sourcefile/SampleData.csv
fileType: csv
skipHeaderLines: 1
expectedTotalColumn: 3
validations:
  - column: 2
    notEmpty: true
  - column: 3
    regex: "^[0-9]+$"
  - column: 1
    valueInList: ["1", "2"]
output:
  needRejectedData: false
"#;

    #[test]
    fn test_parse_yaml() {
        let config = FilterConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.input_file, PathBuf::from("sourcefile/SampleData.csv"));
        assert_eq!(config.skip_header_lines, 1);
        assert_eq!(config.expected_total_column, Some(3));
        assert_eq!(config.validations.len(), 3);
        assert_eq!(config.validations[0], ValidationRule::for_column(2).not_empty());
        assert_eq!(config.validations[1].regex.as_deref(), Some("^[0-9]+$"));
        assert_eq!(config.validations[2].value_in_list, vec!["1", "2"]);
        assert!(!config.output.need_rejected_data);
        assert_eq!(config.delimiter, ",");
        assert_eq!(config.encoding, "UTF-8");
    }

    #[test]
    fn test_validate_resolves_format() {
        let config = FilterConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.validate().unwrap(), FileFormat::Delimited);

        let config = FilterConfig::new("book.xlsx", "Excel");
        assert_eq!(config.validate().unwrap(), FileFormat::Spreadsheet);
    }

    #[test]
    fn test_missing_fields() {
        let config = FilterConfig::new("", "CSV");
        assert!(matches!(config.validate(), Err(ConfigError::MissingField("inputFile"))));

        let config = FilterConfig::new("data.csv", " ");
        assert!(matches!(config.validate(), Err(ConfigError::MissingField("fileType"))));

        let mut config = FilterConfig::new("data.csv", "CSV");
        config.validations.push(ValidationRule::default());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("validations.column"))
        ));
    }

    #[test]
    fn test_unsupported_format() {
        let config = FilterConfig::new("data.json", "json");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported file type: json"));
        assert!(err.to_string().contains("CSV"));
    }

    #[test]
    fn test_empty_delimiter_rejected_for_txt() {
        let mut config = FilterConfig::new("data.txt", "txt");
        config.delimiter = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyDelimiter)));
    }

    #[test]
    fn test_unknown_encoding() {
        let mut config = FilterConfig::new("data.csv", "csv");
        config.encoding = "klingon-8".into();
        assert!(matches!(config.validate(), Err(ConfigError::UnknownEncoding(_))));
    }

    #[test]
    fn test_out_of_range_column_is_not_a_config_error() {
        let mut config = FilterConfig::new("data.csv", "csv");
        config.validations.push(ValidationRule::for_column(0).not_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = FilterConfig::from_yaml("skipHeaderLines: [not a number]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
