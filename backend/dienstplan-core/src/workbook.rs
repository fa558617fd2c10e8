// src/workbook.rs
//
// Spreadsheet bytes (ODS or XLSX) -> plain cell grids. The schedule parser
// only ever sees `SheetGrid`, so it can be exercised without a workbook file.
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::debug;

use crate::error::ScheduleError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Trimmed textual form; integral numbers print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::text(s),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// One sheet as absolute rows starting at A1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetGrid {
    pub fn new(name: &str, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.to_string(),
            rows,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn first_cell_text(&self, row: usize) -> String {
        self.cell(row, 0).as_text()
    }
}

// Only used cells are copied; each row is as wide as its last used cell,
// so a stray far-off cell costs one long row instead of a dense matrix.
fn grid_from_range(name: &str, range: &Range<Data>) -> SheetGrid {
    let Some((first_row, first_col)) = range.start() else {
        return SheetGrid::new(name, Vec::new());
    };
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (r, c, data) in range.used_cells() {
        let cell = Cell::from(data);
        if cell.is_empty() {
            continue;
        }
        // used_cells is relative to the range start; the grid is absolute.
        let (row, col) = (first_row as usize + r, first_col as usize + c);
        if rows.len() <= row {
            rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, Cell::default);
        }
        cells[col] = cell;
    }
    SheetGrid::new(name, rows)
}

/// Reads every sheet of an ODS/XLSX/XLS workbook held in memory.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<SheetGrid>, ScheduleError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = workbook.sheet_names().to_vec();
    debug!("Workbook opened with {} sheets: {:?}", names.len(), names);

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ScheduleError::Sheet {
                sheet: name.clone(),
                message: e.to_string(),
            })?;
        sheets.push(grid_from_range(&name, &range));
    }
    Ok(sheets)
}
