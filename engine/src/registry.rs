//! Processor registry: maps a file type tag to a concrete format.
//!
//! Tags are matched case-insensitively. Several tags may share one format
//! (`EXCEL`, `XLSX` and `XLS` all select the spreadsheet processor).

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};

/// Supported input/output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Comma-separated values with `"` quoting.
    Delimited,
    /// Text split on a literal delimiter.
    FixedDelimiter,
    /// First worksheet of a workbook.
    Spreadsheet,
}

impl FileFormat {
    /// Processor name used in logs and errors.
    pub fn processor_name(self) -> &'static str {
        match self {
            FileFormat::Delimited => "csvParser",
            FileFormat::FixedDelimiter => "txtParser",
            FileFormat::Spreadsheet => "excelParser",
        }
    }

    /// Extension of the files this format writes.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Delimited => "csv",
            FileFormat::FixedDelimiter => "txt",
            FileFormat::Spreadsheet => "xlsx",
        }
    }

    pub fn is_text(self) -> bool {
        !matches!(self, FileFormat::Spreadsheet)
    }
}

struct Registration {
    tags: &'static [&'static str],
    format: FileFormat,
}

const REGISTRATIONS: &[Registration] = &[
    Registration { tags: &["CSV"], format: FileFormat::Delimited },
    Registration { tags: &["EXCEL", "XLSX", "XLS"], format: FileFormat::Spreadsheet },
    Registration { tags: &["TXT"], format: FileFormat::FixedDelimiter },
];

/// Lookup table from upper-cased tag to format.
#[derive(Debug, Clone)]
pub struct ProcessorRegistry {
    formats: BTreeMap<&'static str, FileFormat>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        let formats = REGISTRATIONS
            .iter()
            .flat_map(|reg| reg.tags.iter().map(move |tag| (*tag, reg.format)))
            .collect();
        Self { formats }
    }
}

impl ProcessorRegistry {
    /// Resolve a file type tag.
    pub fn lookup(&self, tag: &str) -> ConfigResult<FileFormat> {
        let key = tag.trim().to_uppercase();
        self.formats
            .get(key.as_str())
            .copied()
            .ok_or_else(|| ConfigError::UnsupportedFormat {
                tag: tag.to_string(),
                supported: self.supported().join(", "),
            })
    }

    /// Registered tags, sorted.
    pub fn supported(&self) -> Vec<&'static str> {
        self.formats.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = ProcessorRegistry::default();
        assert_eq!(registry.lookup("csv").unwrap(), FileFormat::Delimited);
        assert_eq!(registry.lookup("Txt").unwrap(), FileFormat::FixedDelimiter);
        assert_eq!(registry.lookup("xlsx").unwrap(), FileFormat::Spreadsheet);
        assert_eq!(registry.lookup("EXCEL").unwrap(), FileFormat::Spreadsheet);
        assert_eq!(registry.lookup(" xls ").unwrap(), FileFormat::Spreadsheet);
    }

    #[test]
    fn test_unknown_tag_lists_supported() {
        let err = ProcessorRegistry::default().lookup("parquet").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type: parquet. Supported types: CSV, EXCEL, TXT, XLS, XLSX"
        );
    }

    #[test]
    fn test_processor_names() {
        assert_eq!(FileFormat::Delimited.processor_name(), "csvParser");
        assert_eq!(FileFormat::Spreadsheet.extension(), "xlsx");
        assert!(!FileFormat::Spreadsheet.is_text());
    }
}
