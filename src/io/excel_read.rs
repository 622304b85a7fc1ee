use std::fs::File;
use std::path::Path;

use calamine::{DataType, Range, Reader, open_workbook_auto};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::io::text;
use crate::model::{ValueTable, VariableMapping, VariableRow};
use crate::substitute::{self, DELIMITER};

/// Header labels recognised in the name column when the header mode is
/// [`HeaderMode::Auto`].
pub const HEADER_LABELS: [&str; 4] = ["Variable", "Variables", "Name", "Key"];

/// How the first row of the value table is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// Skip the first row when it looks like a header.
    #[default]
    Auto,
    /// The first row is always a header.
    Present,
    /// Every row holds a variable.
    Absent,
}

/// Options controlling how a value table is located and interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Sheet to read; the first sheet when unset.
    pub sheet: Option<String>,
    pub header: HeaderMode,
    /// 1-based value column used when building a single mapping.
    pub column: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            header: HeaderMode::Auto,
            column: 1,
        }
    }
}

/// Reads the value table at `path`.
///
/// Column `A` holds variable names and every other column holds values. Rows
/// with an empty name are skipped and missing values read as empty strings.
pub fn read_value_table(path: &Path, options: &TableOptions) -> Result<ValueTable> {
    let file = File::open(path).map_err(|error| text::source_error(path, error))?;
    if !file.metadata()?.is_file() {
        return Err(ToolError::SourceNotFound(path.to_path_buf()));
    }
    drop(file);

    let mut workbook = open_workbook_auto(path)?;
    let range = match &options.sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .ok_or_else(|| ToolError::MalformedTable(format!("missing sheet '{name}'")))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ToolError::MalformedTable("workbook has no sheets".into()))?,
    }?;

    let table = parse_table(&range, options.header)?;
    debug!(
        rows = table.rows.len(),
        value_columns = table.value_columns,
        "value table loaded"
    );
    Ok(table)
}

/// Reads the value table at `path` and builds the mapping for the value
/// column selected in `options`.
pub fn load_mapping(path: &Path, options: &TableOptions) -> Result<VariableMapping> {
    let table = read_value_table(path, options)?;
    table_mapping(&table, options.column)
}

/// Builds the mapping for `column`, failing when the table has no such value
/// column.
pub fn table_mapping(table: &ValueTable, column: usize) -> Result<VariableMapping> {
    table.mapping(column).ok_or_else(|| {
        ToolError::MalformedTable(format!(
            "value column {column} requested but the table has {} value column(s)",
            table.value_columns
        ))
    })
}

fn parse_table(range: &Range<DataType>, header: HeaderMode) -> Result<ValueTable> {
    // Cells are addressed absolutely: calamine trims leading empty rows and
    // columns from the range. The header candidate is the first non-blank row.
    let (last_row, last_col) = range
        .end()
        .ok_or_else(|| ToolError::MalformedTable("sheet is empty".into()))?;

    let width = last_col as usize + 1;
    if width < 2 {
        return Err(ToolError::MalformedTable(format!(
            "expected a name column and at least one value column, found {width} column(s)"
        )));
    }
    let value_columns = width - 1;

    let row_cells = |row: u32| -> Vec<String> {
        (0..=last_col)
            .map(|col| cell_to_string(range.get_value((row, col))))
            .collect()
    };

    let mut rows = Vec::new();
    let mut headers = None;
    let mut seen_content = false;

    for row_idx in 0..=last_row {
        let cells = row_cells(row_idx);
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let first_row = !seen_content;
        seen_content = true;
        if first_row && is_header_row(&cells[0], header) {
            headers = Some(cells[1..].to_vec());
            continue;
        }

        let name = normalize_name(&cells[0]);
        if name.is_empty() {
            continue;
        }
        rows.push(VariableRow {
            name,
            values: cells[1..].to_vec(),
        });
    }

    Ok(ValueTable {
        headers,
        rows,
        value_columns,
    })
}

fn is_header_row(name_cell: &str, mode: HeaderMode) -> bool {
    match mode {
        HeaderMode::Present => true,
        HeaderMode::Absent => false,
        HeaderMode::Auto => {
            let trimmed = name_cell.trim();
            if trimmed.is_empty() || is_delimited(trimmed) {
                return false;
            }
            HEADER_LABELS.contains(&trimmed) || !substitute::is_valid_name(trimmed)
        }
    }
}

fn is_delimited(name: &str) -> bool {
    name.len() > 2 && name.starts_with(DELIMITER) && name.ends_with(DELIMITER)
}

/// Trims the name cell and strips `$` delimiters when the name is written in
/// token form.
fn normalize_name(cell: &str) -> String {
    let trimmed = cell.trim();
    if is_delimited(trimmed) {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
