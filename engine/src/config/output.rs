//! Output settings and output file naming.
//!
//! Without explicit names the outputs are derived from the input file name:
//! `SampleData.csv` → `output/SampleData_Filtered.csv` and
//! `output/SampleData_Rejected.csv`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::registry::FileFormat;

const DEFAULT_OUTPUT_DIR: &str = "output";
const FILTERED_SUFFIX: &str = "_Filtered";
const REJECTED_SUFFIX: &str = "_Rejected";

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Directory both outputs are written to, created when missing.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Whether rejected records get their own file.
    #[serde(default = "default_true")]
    pub need_rejected_data: bool,

    /// Base name of the filtered file, extension appended.
    #[serde(default, alias = "filteredFileName")]
    pub output_file_name: Option<String>,

    /// Base name of the rejected file, extension appended.
    #[serde(default)]
    pub rejected_file_name: Option<String>,
}

fn default_directory() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            need_rejected_data: true,
            output_file_name: None,
            rejected_file_name: None,
        }
    }
}

/// Resolved output locations of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub directory: PathBuf,
    pub filtered: PathBuf,
    /// `None` when rejected records are discarded.
    pub rejected: Option<PathBuf>,
}

impl OutputConfig {
    /// Resolve both output paths for `input`.
    pub fn resolve(&self, input: &Path, format: FileFormat) -> ConfigResult<OutputPaths> {
        let extension = format.extension();

        let filtered = match non_blank(&self.output_file_name) {
            Some(name) => with_extension(name, extension),
            None => derived_name(input, FILTERED_SUFFIX, extension).ok_or_else(|| {
                ConfigError::UnresolvableOutput {
                    which: "filtered",
                    reason: format!("no file name in '{}'", input.display()),
                }
            })?,
        };

        let rejected = if self.need_rejected_data {
            let name = match non_blank(&self.rejected_file_name) {
                Some(name) => with_extension(name, extension),
                None => derived_name(input, REJECTED_SUFFIX, extension).ok_or_else(|| {
                    ConfigError::UnresolvableOutput {
                        which: "rejected",
                        reason: "needRejectedData is set but no rejectedFileName is given \
                                 and none can be derived from the input"
                            .to_string(),
                    }
                })?,
            };
            Some(self.directory.join(name))
        } else {
            None
        };

        if rejected.as_deref() == Some(self.directory.join(&filtered).as_path()) {
            return Err(ConfigError::UnresolvableOutput {
                which: "rejected",
                reason: "filtered and rejected outputs resolve to the same file".to_string(),
            });
        }

        Ok(OutputPaths {
            directory: self.directory.clone(),
            filtered: self.directory.join(filtered),
            rejected,
        })
    }
}

fn non_blank(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

fn with_extension(base: &str, extension: &str) -> String {
    format!("{}.{}", base, extension)
}

/// `<stem><suffix>.<extension>` from the input file name.
fn derived_name(input: &Path, suffix: &str, extension: &str) -> Option<String> {
    let stem = input.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}{}.{}", stem, suffix, extension))
}
