use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use crate::error::Result;
use crate::model::{Rendered, Segment, SegmentKind};
use crate::substitute::DELIMITER;

/// Sheet holding the variable form.
pub const VARIABLES_SHEET: &str = "Variables";
/// Sheet holding the rendered configurations.
pub const OUTPUT_SHEET: &str = "Output";
/// Header of the name column in the variable form.
pub const NAME_HEADER: &str = "Variable";
/// Header of the value column in the variable form.
pub const VALUE_HEADER: &str = "Value";

const NAME_COLUMN_WIDTH: f64 = 32.0;
const VALUE_COLUMN_WIDTH: f64 = 48.0;
const OUTPUT_COLUMN_WIDTH: f64 = 95.0;

/// A rendered configuration destined for one column of the output sheet.
#[derive(Debug, Clone)]
pub struct OutputColumn {
    pub label: String,
    pub rendered: Rendered,
}

struct SegmentFormats {
    body: Format,
    highlight: Format,
    error: Format,
}

impl SegmentFormats {
    fn new() -> Self {
        Self {
            body: Format::new(),
            highlight: Format::new().set_bold().set_font_color(Color::Blue),
            error: Format::new().set_bold().set_font_color(Color::Red),
        }
    }

    fn for_kind(&self, kind: &SegmentKind) -> &Format {
        match kind {
            SegmentKind::Literal => &self.body,
            SegmentKind::Replaced { .. } => &self.highlight,
            SegmentKind::Unresolved { .. } => &self.error,
        }
    }
}

/// Writes a form listing `variables` in token form, one per row, with an empty
/// value column for the user to fill in.
pub fn write_variable_form(path: &Path, variables: &[String]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(VARIABLES_SHEET)?;
    worksheet.set_column_width(0, NAME_COLUMN_WIDTH)?;
    worksheet.set_column_width(1, VALUE_COLUMN_WIDTH)?;
    worksheet.write_string_with_format(0, 0, NAME_HEADER, &header)?;
    worksheet.write_string_with_format(0, 1, VALUE_HEADER, &header)?;
    worksheet.set_freeze_panes(1, 0)?;

    for (row_idx, name) in variables.iter().enumerate() {
        let token = format!("{DELIMITER}{name}{DELIMITER}");
        worksheet.write_string((row_idx + 1) as u32, 0, token)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes one rendered configuration per column of the output sheet. Row 1
/// carries the column labels; rendered lines follow, one per row, with
/// replaced values highlighted and unresolved tokens flagged.
pub fn write_output_workbook(path: &Path, columns: &[OutputColumn]) -> Result<()> {
    let mut workbook = Workbook::new();
    let formats = SegmentFormats::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (col_idx, column) in columns.iter().enumerate() {
        let col = col_idx as u16;
        worksheet.set_column_width(col, OUTPUT_COLUMN_WIDTH)?;
        worksheet.write_string_with_format(0, col, &column.label, &header)?;

        for (line_idx, line) in column.rendered.lines().iter().enumerate() {
            write_line(worksheet, (line_idx + 1) as u32, col, line, &formats)?;
        }
    }

    if !columns.is_empty() {
        worksheet.set_freeze_panes(1, 0)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_line(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    line: &[Segment],
    formats: &SegmentFormats,
) -> Result<()> {
    match line {
        [] => {}
        [single] => {
            worksheet.write_string_with_format(
                row,
                col,
                &single.text,
                formats.for_kind(&single.kind),
            )?;
        }
        segments => {
            let fragments: Vec<(&Format, &str)> = segments
                .iter()
                .map(|segment| (formats.for_kind(&segment.kind), segment.text.as_str()))
                .collect();
            worksheet.write_rich_string(row, col, &fragments)?;
        }
    }
    Ok(())
}
