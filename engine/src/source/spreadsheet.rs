//! Spreadsheet source (xlsx, xlsm, xls, ods).
//!
//! Reads the first worksheet. Each non-blank row becomes one record whose
//! cells keep their type; columns keep their absolute position, so a row
//! starting in column C has two leading blank cells.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use super::{open_input, RecordSource};
use crate::error::{SourceError, SourceResult};
use crate::models::{Cell, Record};

pub struct SpreadsheetSource {
    values: Range<Data>,
    formulas: Option<Range<String>>,
    next_row: u32,
    end_row: u32,
    exhausted: bool,
}

impl SpreadsheetSource {
    /// Open the first worksheet of the workbook at `path`.
    pub fn open(path: &Path) -> SourceResult<Self> {
        // Distinguish a missing file from an unreadable workbook.
        drop(open_input(path)?);

        let mut workbook = open_workbook_auto(path)?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(SourceError::EmptyWorkbook)?;
        debug!(sheet = %sheet, path = %path.display(), "Reading worksheet");

        let values = workbook.worksheet_range(&sheet)?;
        let formulas = match workbook.worksheet_formula(&sheet) {
            Ok(range) => Some(range),
            Err(e) => {
                debug!(error = %e, "Formulas unavailable, reading cached values only");
                None
            }
        };
        Ok(Self::from_ranges(values, formulas))
    }

    /// Build a source over already loaded cell ranges.
    pub fn from_ranges(values: Range<Data>, formulas: Option<Range<String>>) -> Self {
        let bounds = [
            values.start().zip(values.end()),
            formulas.as_ref().and_then(|f| f.start().zip(f.end())),
        ];
        let mut rows = bounds.iter().flatten().map(|(start, end)| (start.0, end.0));
        let (first, last, exhausted) = match rows.next() {
            None => (0, 0, true),
            Some((s, e)) => {
                let (s, e) = rows.fold((s, e), |(s0, e0), (s1, e1)| (s0.min(s1), e0.max(e1)));
                (s, e, false)
            }
        };
        let formulas = formulas.filter(|f| !f.is_empty());

        Self {
            values,
            formulas,
            next_row: first,
            end_row: last,
            exhausted,
        }
    }

    fn last_column(&self) -> u32 {
        let value_end = self.values.end().map(|(_, c)| c);
        let formula_end = self.formulas.as_ref().and_then(|f| f.end()).map(|(_, c)| c);
        value_end.max(formula_end).unwrap_or(0)
    }

    fn cell_at(&self, row: u32, col: u32) -> Cell {
        let formula = self
            .formulas
            .as_ref()
            .and_then(|f| f.get_value((row, col)))
            .filter(|f| !f.is_empty());
        if let Some(formula) = formula {
            return Cell::Formula(formula.trim_start_matches('=').to_string());
        }
        self.values.get_value((row, col)).map(convert).unwrap_or(Cell::Blank)
    }

    fn read_row(&self, row: u32) -> Vec<Cell> {
        let mut cells: Vec<Cell> = (0..=self.last_column()).map(|col| self.cell_at(row, col)).collect();
        while cells.last().is_some_and(Cell::is_blank) {
            cells.pop();
        }
        cells
    }
}

impl RecordSource for SpreadsheetSource {
    fn next_record(&mut self) -> SourceResult<Option<Record>> {
        while !self.exhausted {
            let row = self.next_row;
            if row >= self.end_row {
                self.exhausted = true;
            } else {
                self.next_row += 1;
            }

            let cells = self.read_row(row);
            if !cells.is_empty() {
                return Ok(Some(Record::from_cells(cells)));
            }
        }
        Ok(None)
    }
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::DateTime(dt) if dt.is_datetime() => Cell::Date(dt.as_f64()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
