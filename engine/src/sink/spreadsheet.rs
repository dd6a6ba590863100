//! Spreadsheet sink.
//!
//! Writes a single worksheet in constant-memory mode: each row is flushed to
//! disk once the next one starts, so memory does not grow with the number of
//! records. Cell types are kept: numbers stay numbers, booleans stay
//! booleans, formulas are written as formulas and dates as date-formatted
//! serial numbers.

use std::fs::File;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use super::{RecordSink, SinkRole};
use crate::error::{SinkError, SinkResult};
use crate::models::{Cell, Origin, Record};

/// Columns per worksheet.
const MAX_COLUMNS: usize = 16_384;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

pub struct SpreadsheetSink {
    path: PathBuf,
    workbook: Option<Workbook>,
    next_row: u32,
    date: Format,
    datetime: Format,
}

impl SpreadsheetSink {
    pub fn create(path: &Path, role: SinkRole) -> SinkResult<Self> {
        // Fail on an unwritable location now rather than at save time.
        File::create(path)?;

        let mut workbook = Workbook::new();
        workbook
            .add_worksheet_with_constant_memory()
            .set_name(role.sheet_name())?;
        debug!(path = %path.display(), sheet = role.sheet_name(), "Opened output");

        Ok(Self {
            path: path.to_path_buf(),
            workbook: Some(workbook),
            next_row: 0,
            date: Format::new().set_num_format(DATE_FORMAT),
            datetime: Format::new().set_num_format(DATETIME_FORMAT),
        })
    }

    fn write_cells(&mut self, cells: &[Cell]) -> SinkResult<()> {
        if cells.len() > MAX_COLUMNS {
            return Err(SinkError::TooManyColumns(cells.len()));
        }
        let row = self.next_row;
        let workbook = self.workbook.as_mut().ok_or_else(|| closed(&self.path))?;
        let sheet = workbook.worksheet_from_index(0)?;

        for (idx, cell) in cells.iter().enumerate() {
            // Bounded by MAX_COLUMNS above.
            let col = idx as u16;
            match cell {
                Cell::Blank => continue,
                Cell::Text(s) => sheet.write_string(row, col, s)?,
                Cell::Number(n) => sheet.write_number(row, col, *n)?,
                Cell::Boolean(b) => sheet.write_boolean(row, col, *b)?,
                Cell::Formula(f) => sheet.write_formula(row, col, f.as_str())?,
                Cell::Date(serial) if serial.fract() == 0.0 => {
                    sheet.write_number_with_format(row, col, *serial, &self.date)?
                }
                Cell::Date(serial) => {
                    sheet.write_number_with_format(row, col, *serial, &self.datetime)?
                }
            };
        }
        self.next_row += 1;
        Ok(())
    }
}

impl RecordSink for SpreadsheetSink {
    fn write_record(&mut self, record: &Record) -> SinkResult<()> {
        match record.origin() {
            Origin::Cells(cells) => self.write_cells(cells),
            Origin::Line(_) | Origin::Detached => {
                let cells: Vec<Cell> = record
                    .fields()
                    .iter()
                    .map(|f| if f.is_empty() { Cell::Blank } else { Cell::Text(f.clone()) })
                    .collect();
                self.write_cells(&cells)
            }
        }
    }

    fn finish(&mut self) -> SinkResult<()> {
        if let Some(mut workbook) = self.workbook.take() {
            workbook.save(&self.path)?;
        }
        Ok(())
    }
}

fn closed(path: &Path) -> SinkError {
    SinkError::Io(std::io::Error::other(format!(
        "output {} already closed",
        path.display()
    )))
}
