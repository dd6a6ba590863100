//! Pipeline controller: one filtering run from configuration to result.
//!
//! A run walks a fixed sequence of stages:
//!
//! ```text
//! Opening ─▶ StreamingHeader ─▶ StreamingBody ─▶ Finalizing ─▶ Completed | Failed
//! ```
//!
//! The format is resolved once through the [`ProcessorRegistry`]; the stages
//! themselves are one generic routine over [`RecordSource`] and
//! [`RecordSink`]. Finalizing always runs on the sinks that were opened,
//! whatever happened before it.
//!
//! # Example
//!
//! ```rust,no_run
//! use filefilter::{process, FilterConfig};
//!
//! let config = FilterConfig::load("filter-config.yaml")?;
//! let result = process(&config)?;
//! println!("{} accepted, {} rejected", result.success_records, result.reject_records);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`ProcessorRegistry`]: crate::registry::ProcessorRegistry

use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use encoding_rs::Encoding;
use tracing::{debug, error, info};

use crate::config::output::OutputPaths;
use crate::config::FilterConfig;
use crate::error::{PipelineError, SinkResult, SourceError, SourceResult, Stage, StageError};
use crate::logs::{log_info, log_success};
use crate::models::ProcessingResult;
use crate::registry::{FileFormat, ProcessorRegistry};
use crate::sink::{DelimitedSink, FixedDelimiterSink, RecordSink, SinkRole, SpreadsheetSink};
use crate::source::{DelimitedSource, FixedDelimiterSource, RecordSource, SpreadsheetSource};
use crate::validation::ValidationEngine;

/// Processor name reported when the format itself could not be resolved.
const UNKNOWN_PROCESSOR: &str = "unknown";

/// Run the filter described by `config`.
///
/// Returns the run statistics, or a [`PipelineError`] naming the processor
/// and stage that failed along with the counts gathered up to that point.
pub fn process(config: &FilterConfig) -> Result<ProcessingResult, PipelineError> {
    let started = Instant::now();

    let format = config.validate().map_err(|e| {
        let processor = ProcessorRegistry::default()
            .lookup(&config.file_type)
            .map(FileFormat::processor_name)
            .unwrap_or(UNKNOWN_PROCESSOR);
        failure(processor, Stage::Configuration, Counts::default(), started, e.into())
    })?;
    let processor = format.processor_name();

    let paths = config.output_paths(format).map_err(|e| {
        failure(processor, Stage::Configuration, Counts::default(), started, e.into())
    })?;

    let run = Run {
        processor,
        engine: ValidationEngine::new(config),
        paths,
        header_records: config.skip_header_lines,
        started,
    };
    info!(
        processor,
        input = %config.input_file.display(),
        rules = run.engine.rule_count(),
        "Processing started"
    );

    let input = config.input_file.as_path();
    let result = match format {
        FileFormat::Delimited => {
            let encoding = run.opening(text_encoding(config))?;
            run.execute(
                || DelimitedSource::open(input, encoding),
                |path, _| DelimitedSink::create(path, encoding),
            )
        }
        FileFormat::FixedDelimiter => {
            let encoding = run.opening(text_encoding(config))?;
            let delimiter = config.delimiter.as_str();
            run.execute(
                || FixedDelimiterSource::open(input, encoding, delimiter),
                |path, _| FixedDelimiterSink::create(path, encoding, delimiter),
            )
        }
        FileFormat::Spreadsheet => run.execute(
            || SpreadsheetSource::open(input),
            SpreadsheetSink::create,
        ),
    }?;

    log_success(format!("Output written to {}", run.paths.filtered.display()));
    if let Some(rejected) = &run.paths.rejected {
        log_success(format!("Rejected records written to {}", rejected.display()));
    }
    log_info(result.summary(processor));
    Ok(result)
}

/// Concrete character set of the text input; also used for the outputs.
fn text_encoding(config: &FilterConfig) -> Result<&'static Encoding, StageError> {
    let configured = config.encoding_spec()?;
    let encoding = configured.resolve_for(&config.input_file).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound(config.input_file.clone()),
        _ => SourceError::Io(e),
    })?;
    debug!(encoding = encoding.name(), "Resolved input encoding");
    Ok(encoding)
}

// =============================================================================
// Run
// =============================================================================

/// Local counters of one run.
#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    total: u64,
    success: u64,
    reject: u64,
}

struct Run {
    processor: &'static str,
    engine: ValidationEngine,
    paths: OutputPaths,
    header_records: usize,
    started: Instant,
}

impl Run {
    fn fail(&self, stage: Stage, counts: Counts, cause: StageError) -> PipelineError {
        failure(self.processor, stage, counts, self.started, cause)
    }

    fn opening<T>(&self, step: Result<T, StageError>) -> Result<T, PipelineError> {
        step.map_err(|e| self.fail(Stage::Opening, Counts::default(), e))
    }

    fn execute<S, K>(
        &self,
        open_source: impl FnOnce() -> SourceResult<S>,
        mut open_sink: impl FnMut(&Path, SinkRole) -> SinkResult<K>,
    ) -> Result<ProcessingResult, PipelineError>
    where
        S: RecordSource,
        K: RecordSink,
    {
        let mut counts = Counts::default();

        // Opening: the source first, so a missing input leaves no output behind.
        let mut source = self.opening(open_source().map_err(StageError::from))?;
        self.opening(fs::create_dir_all(&self.paths.directory).map_err(StageError::from))?;
        let mut valid = self.opening(
            open_sink(&self.paths.filtered, SinkRole::Filtered).map_err(StageError::from),
        )?;
        let mut rejected = match &self.paths.rejected {
            None => None,
            Some(path) => match open_sink(path, SinkRole::Rejected) {
                Ok(sink) => Some(sink),
                Err(e) => {
                    if let Err(close) = valid.finish() {
                        error!(error = %close, "Failed to close filtered output");
                    }
                    return Err(self.fail(Stage::Opening, counts, e.into()));
                }
            },
        };

        let streamed = self.stream(&mut source, &mut valid, &mut rejected, &mut counts);
        drop(source);
        let finalized = finish_all(&mut valid, &mut rejected);

        match (streamed, finalized) {
            (Err((stage, cause)), finalized) => {
                if let Err(close) = finalized {
                    error!(error = %close, "Failed to finalize outputs after an earlier error");
                }
                Err(self.fail(stage, counts, cause))
            }
            (Ok(()), Err(cause)) => Err(self.fail(Stage::Finalizing, counts, cause)),
            (Ok(()), Ok(())) => Ok(ProcessingResult::completed(
                counts.total,
                counts.success,
                counts.reject,
                self.started.elapsed(),
            )),
        }
    }

    fn stream<S, K>(
        &self,
        source: &mut S,
        valid: &mut K,
        rejected: &mut Option<K>,
        counts: &mut Counts,
    ) -> Result<(), (Stage, StageError)>
    where
        S: RecordSource,
        K: RecordSink,
    {
        let header = |e: StageError| (Stage::StreamingHeader, e);
        let body = |e: StageError| (Stage::StreamingBody, e);

        for _ in 0..self.header_records {
            let Some(record) = source.next_record().map_err(|e| header(e.into()))? else {
                break;
            };
            valid.write_header(&record).map_err(|e| header(e.into()))?;
            if let Some(sink) = rejected.as_mut() {
                sink.write_header(&record).map_err(|e| header(e.into()))?;
            }
        }

        while let Some(record) = source.next_record().map_err(|e| body(e.into()))? {
            counts.total += 1;
            if self.engine.validate(record.fields()) {
                valid.write_record(&record).map_err(|e| body(e.into()))?;
                counts.success += 1;
            } else {
                if let Some(sink) = rejected.as_mut() {
                    sink.write_record(&record).map_err(|e| body(e.into()))?;
                }
                counts.reject += 1;
            }
        }
        Ok(())
    }
}

/// Finish every sink, reporting the first failure.
fn finish_all<K: RecordSink>(valid: &mut K, rejected: &mut Option<K>) -> Result<(), StageError> {
    let first = valid.finish();
    let second = rejected.as_mut().map_or(Ok(()), |sink| sink.finish());
    first.and(second).map_err(StageError::from)
}

fn failure(
    processor: &'static str,
    stage: Stage,
    counts: Counts,
    started: Instant,
    cause: StageError,
) -> PipelineError {
    let result = ProcessingResult::failed(
        counts.total,
        counts.success,
        counts.reject,
        started.elapsed(),
        cause.to_string(),
    );
    error!(processor, %stage, error = %cause, "Processing failed");
    PipelineError { processor, stage, result, cause }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationRule;
    use crate::error::SinkError;
    use crate::models::{Cell, Origin, Record};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn csv_config(dir: &TempDir, input: PathBuf) -> FilterConfig {
        let mut config = FilterConfig::new(input, "csv");
        config.output.directory = dir.path().join("out");
        config
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_scenario_counts_and_routing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            &dir,
            "people.csv",
            b"id,name,age\n1,Alice,30\n2,,40\n3,Bob,abc\n",
        );
        let mut config = csv_config(&dir, input);
        config.skip_header_lines = 1;
        config.validations = vec![
            ValidationRule::for_column(2).not_empty(),
            ValidationRule::for_column(3).matching("^[0-9]+$"),
        ];

        let result = process(&config).unwrap();
        assert!(result.success);
        assert_eq!(result.total_records, 3);
        assert_eq!(result.success_records, 1);
        assert_eq!(result.reject_records, 2);

        let out = dir.path().join("out");
        assert_eq!(read(&out.join("people_Filtered.csv")), "id,name,age\n1,Alice,30\n");
        assert_eq!(
            read(&out.join("people_Rejected.csv")),
            "id,name,age\n2,,40\n3,Bob,abc\n"
        );
    }

    #[test]
    fn test_header_records_pass_through_uncounted() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "h.csv", b"title\nsub,title\nx\n\ny\n");
        let mut config = csv_config(&dir, input);
        config.skip_header_lines = 2;
        config.validations = vec![ValidationRule::for_column(1).not_empty()];

        let result = process(&config).unwrap();
        assert_eq!(result.total_records, 3);
        assert_eq!(result.success_records, 2);
        assert_eq!(result.reject_records, 1);

        let out = dir.path().join("out");
        assert_eq!(read(&out.join("h_Filtered.csv")), "title\nsub,title\nx\ny\n");
        assert_eq!(read(&out.join("h_Rejected.csv")), "title\nsub,title\n\n");
    }

    #[test]
    fn test_header_longer_than_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "short.csv", b"only\n");
        let mut config = csv_config(&dir, input);
        config.skip_header_lines = 5;

        let result = process(&config).unwrap();
        assert_eq!(result.total_records, 0);
        assert_eq!(read(&dir.path().join("out/short_Filtered.csv")), "only\n");
    }

    #[test]
    fn test_csv_round_trip_is_byte_exact() {
        let content = "id,text,path\r\n1,\"He said \"\"hi\"\"\",C:\\temp\\\r\n2,\"multi\nline\",  spaced  \r\n3,plain,last";
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "exact.csv", content.as_bytes());
        let config = csv_config(&dir, input);

        let result = process(&config).unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.success_records, 4);
        assert_eq!(
            read(&dir.path().join("out/exact_Filtered.csv")),
            format!("{}\n", content)
        );
        assert_eq!(read(&dir.path().join("out/exact_Rejected.csv")), "");
    }

    #[test]
    fn test_inch_mark_does_not_swallow_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "tv.csv", b"1,5\" screen,ok\n2,,bad\n3,Carol,ok\n");
        let mut config = csv_config(&dir, input);
        config.validations = vec![ValidationRule::for_column(2).not_empty()];

        let result = process(&config).unwrap();
        assert_eq!(result.total_records, 3);
        assert_eq!(result.success_records, 2);
        assert_eq!(result.reject_records, 1);
        assert_eq!(
            read(&dir.path().join("out/tv_Filtered.csv")),
            "1,5\" screen,ok\n3,Carol,ok\n"
        );
        assert_eq!(read(&dir.path().join("out/tv_Rejected.csv")), "2,,bad\n");
    }

    #[test]
    fn test_unterminated_quote_fails_in_body() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "open.csv", b"1,ok\n2,\"never closed\n3,x\n");
        let config = csv_config(&dir, input);

        let err = process(&config).unwrap_err();
        assert_eq!(err.stage, Stage::StreamingBody);
        assert_eq!(err.result.total_records, 1);
        assert!(matches!(err.cause, StageError::Source(SourceError::Malformed { line: 2, .. })));
        assert_eq!(read(&dir.path().join("out/open_Filtered.csv")), "1,ok\n");
    }

    #[test]
    fn test_txt_keeps_trailing_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "data.txt", b"a|b|\nc|d|e\n");
        let mut config = FilterConfig::new(input, "TXT");
        config.delimiter = "|".to_string();
        config.expected_total_column = Some(3);
        config.validations = vec![ValidationRule::for_column(3).not_empty()];
        config.output.directory = dir.path().join("out");

        let result = process(&config).unwrap();
        assert_eq!(result.success_records, 1);
        assert_eq!(result.reject_records, 1);
        assert_eq!(read(&dir.path().join("out/data_Filtered.txt")), "c|d|e\n");
        assert_eq!(read(&dir.path().join("out/data_Rejected.txt")), "a|b|\n");
    }

    #[test]
    fn test_disabled_rejected_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "r.csv", b"1,x\n2,\n");
        let mut config = csv_config(&dir, input);
        config.output.need_rejected_data = false;
        config.validations = vec![ValidationRule::for_column(2).not_empty()];

        let result = process(&config).unwrap();
        assert_eq!(result.reject_records, 1);
        assert!(dir.path().join("out/r_Filtered.csv").exists());
        assert!(!dir.path().join("out/r_Rejected.csv").exists());
    }

    #[test]
    fn test_out_of_range_column_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "c.csv", b"a,b,c\n");
        let mut config = csv_config(&dir, input);
        config.validations = vec![ValidationRule::for_column(5).not_empty()];

        let result = process(&config).unwrap();
        assert!(result.success);
        assert_eq!(result.reject_records, 1);
    }

    #[test]
    fn test_invalid_regex_rejects_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "re.csv", b"1\n2\n");
        let mut config = csv_config(&dir, input);
        config.validations = vec![ValidationRule::for_column(1).matching("([0-9")];

        let result = process(&config).unwrap();
        assert_eq!(result.total_records, 2);
        assert_eq!(result.reject_records, 2);
    }

    #[test]
    fn test_missing_input_fails_in_opening() {
        let dir = tempfile::tempdir().unwrap();
        let config = csv_config(&dir, dir.path().join("absent.csv"));

        let err = process(&config).unwrap_err();
        assert_eq!(err.stage, Stage::Opening);
        assert_eq!(err.processor, "csvParser");
        assert!(!err.result.success);
        assert!(matches!(err.cause, StageError::Source(SourceError::NotFound(_))));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_unsupported_format_fails_in_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "x.json", b"{}");
        let mut config = csv_config(&dir, input);
        config.file_type = "json".to_string();

        let err = process(&config).unwrap_err();
        assert_eq!(err.stage, Stage::Configuration);
        assert_eq!(err.processor, UNKNOWN_PROCESSOR);
        assert!(err.to_string().contains("Unsupported file type"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_latin1_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let content: &[u8] = b"nom,ville\nRen\xE9,Orl\xE9ans\n";
        let input = write_input(&dir, "latin.csv", content);
        let mut config = csv_config(&dir, input);
        config.encoding = "ISO-8859-1".to_string();
        config.skip_header_lines = 1;
        config.validations = vec![ValidationRule::for_column(2).one_of(["Orléans"])];

        let result = process(&config).unwrap();
        assert_eq!(result.success_records, 1);
        assert_eq!(fs::read(dir.path().join("out/latin_Filtered.csv")).unwrap(), content);
    }

    #[test]
    fn test_spreadsheet_round_trip_keeps_types() {
        use rust_xlsxwriter::{Format, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_string(0, 0, "name").unwrap();
        sheet.write_string(0, 1, "age").unwrap();
        sheet.write_string(0, 2, "joined").unwrap();
        sheet.write_string(0, 3, "member").unwrap();
        sheet.write_string(1, 0, "Alice").unwrap();
        sheet.write_number(1, 1, 30.0).unwrap();
        sheet.write_number_with_format(1, 2, 45306.0, &date).unwrap();
        sheet.write_boolean(1, 3, true).unwrap();
        sheet.write_string(2, 0, "Bob").unwrap();
        sheet.write_string(2, 1, "n/a").unwrap();
        workbook.save(&input).unwrap();

        let mut config = FilterConfig::new(input, "excel");
        config.skip_header_lines = 1;
        config.validations = vec![ValidationRule::for_column(2).matching("[0-9]+")];
        config.output.directory = dir.path().join("out");

        let result = process(&config).unwrap();
        assert_eq!(result.total_records, 2);
        assert_eq!(result.success_records, 1);
        assert_eq!(result.reject_records, 1);

        let mut filtered =
            SpreadsheetSource::open(&dir.path().join("out/book_Filtered.xlsx")).unwrap();
        let header = filtered.next_record().unwrap().unwrap();
        assert_eq!(header.fields(), &["name", "age", "joined", "member"]);
        let row = filtered.next_record().unwrap().unwrap();
        match row.origin() {
            Origin::Cells(cells) => assert_eq!(
                cells.as_slice(),
                &[
                    Cell::Text("Alice".into()),
                    Cell::Number(30.0),
                    Cell::Date(45306.0),
                    Cell::Boolean(true),
                ]
            ),
            other => panic!("unexpected origin {:?}", other),
        }
        assert!(filtered.next_record().unwrap().is_none());

        let mut rejected =
            SpreadsheetSource::open(&dir.path().join("out/book_Rejected.xlsx")).unwrap();
        rejected.next_record().unwrap();
        let row = rejected.next_record().unwrap().unwrap();
        assert_eq!(row.fields(), &["Bob", "n/a"]);
    }

    struct VecSource(std::vec::IntoIter<Record>);

    impl RecordSource for VecSource {
        fn next_record(&mut self) -> SourceResult<Option<Record>> {
            Ok(self.0.next())
        }
    }

    /// Sink that fails on a given write and records which roles were finished.
    struct FlakySink {
        role: SinkRole,
        fail_on: Option<usize>,
        writes: usize,
        finished: Rc<RefCell<Vec<SinkRole>>>,
    }

    impl RecordSink for FlakySink {
        fn write_record(&mut self, _record: &Record) -> SinkResult<()> {
            self.writes += 1;
            if self.fail_on == Some(self.writes) {
                return Err(SinkError::Io(io::Error::other("disk full")));
            }
            Ok(())
        }

        fn finish(&mut self) -> SinkResult<()> {
            self.finished.borrow_mut().push(self.role);
            Ok(())
        }
    }

    #[test]
    fn test_sinks_finalized_after_body_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let run = Run {
            processor: "csvParser",
            engine: ValidationEngine::from_rules(None, &[]),
            paths: OutputPaths {
                directory: dir.path().to_path_buf(),
                filtered: dir.path().join("f"),
                rejected: Some(dir.path().join("r")),
            },
            header_records: 0,
            started: Instant::now(),
        };
        let records: Vec<Record> = (1..=4).map(|i| Record::new(vec![i.to_string()])).collect();
        let finished = Rc::new(RefCell::new(Vec::new()));

        let err = run
            .execute(
                || Ok(VecSource(records.into_iter())),
                |_path: &Path, role| {
                    Ok(FlakySink {
                        role,
                        fail_on: (role == SinkRole::Filtered).then_some(3),
                        writes: 0,
                        finished: Rc::clone(&finished),
                    })
                },
            )
            .unwrap_err();

        assert_eq!(err.stage, Stage::StreamingBody);
        assert!(!err.result.success);
        assert_eq!(err.result.total_records, 3);
        assert_eq!(err.result.success_records, 2);
        assert_eq!(err.result.reject_records, 0);
        assert!(matches!(err.cause, StageError::Sink(SinkError::Io(_))));
        assert_eq!(*finished.borrow(), vec![SinkRole::Filtered, SinkRole::Rejected]);
    }
}
