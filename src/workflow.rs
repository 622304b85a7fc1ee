use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::io::excel_read::{self, TableOptions};
use crate::io::excel_write::{self, OutputColumn};
use crate::io::text;
use crate::model::{Rendered, RunReport, ValueTable};
use crate::substitute;

/// Writes a variable form for `template` to `output` and returns the variable
/// names it lists.
#[instrument(
    level = "info",
    skip_all,
    fields(template = %template.display(), output = %output.display())
)]
pub fn create_form(template: &Path, output: &Path) -> Result<Vec<String>> {
    let source = text::read_template(template)?;
    let variables = substitute::template_variables(&source);
    info!(variable_count = variables.len(), "collected template variables");
    text::ensure_parent(output)?;
    excel_write::write_variable_form(output, &variables)?;
    Ok(variables)
}

/// Renders `template` with the values of the selected table column and writes
/// the result to `output`.
///
/// The table and template are both loaded before anything is written, so a
/// fatal error leaves `output` untouched. Unresolved tokens do not fail the
/// run; they are listed in the returned report.
#[instrument(
    level = "info",
    skip_all,
    fields(
        template = %template.display(),
        table = %table.display(),
        output = %output.display(),
        column = options.column
    )
)]
pub fn render_to_file(
    template: &Path,
    table: &Path,
    output: &Path,
    options: &TableOptions,
) -> Result<RunReport> {
    let values = excel_read::read_value_table(table, options)?;
    let mapping = excel_read::table_mapping(&values, options.column)?;
    info!(variable_count = mapping.len(), "loaded variable mapping");

    let source = text::read_template(template)?;
    let rendered = substitute::substitute(&source, &mapping);
    log_unresolved(&values.column_label(options.column), &rendered);

    text::write_output(output, &rendered.text())?;
    debug!(replaced = rendered.replaced_count(), "output written");

    Ok(report(template, table, &values, options.column, &rendered))
}

/// Renders `template` once per value column of the table and writes every
/// rendering into a single output workbook.
#[instrument(
    level = "info",
    skip_all,
    fields(template = %template.display(), table = %table.display(), output = %output.display())
)]
pub fn render_to_workbook(
    template: &Path,
    table: &Path,
    output: &Path,
    options: &TableOptions,
) -> Result<Vec<RunReport>> {
    let values = excel_read::read_value_table(table, options)?;
    let source = text::read_template(template)?;

    let mut columns = Vec::with_capacity(values.value_columns);
    let mut reports = Vec::with_capacity(values.value_columns);

    for column in 1..=values.value_columns {
        let mapping = excel_read::table_mapping(&values, column)?;
        let rendered = substitute::substitute(&source, &mapping);
        log_unresolved(&values.column_label(column), &rendered);
        reports.push(report(template, table, &values, column, &rendered));
        columns.push(OutputColumn {
            label: values.column_label(column),
            rendered,
        });
    }
    info!(column_count = columns.len(), "rendered value columns");

    text::ensure_parent(output)?;
    excel_write::write_output_workbook(output, &columns)?;
    Ok(reports)
}

/// Writes the report of a single render as a pretty-printed JSON object.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    write_json(path, &serde_json::to_string_pretty(report)?)
}

/// Writes the reports of a workbook render as a pretty-printed JSON array,
/// whatever the number of value columns.
pub fn write_reports(path: &Path, reports: &[RunReport]) -> Result<()> {
    write_json(path, &serde_json::to_string_pretty(reports)?)
}

fn write_json(path: &Path, json: &str) -> Result<()> {
    text::ensure_parent(path)?;
    fs::write(path, json)?;
    Ok(())
}

fn report(
    template: &Path,
    table: &Path,
    values: &ValueTable,
    column: usize,
    rendered: &Rendered,
) -> RunReport {
    RunReport {
        template: template.to_path_buf(),
        table: table.to_path_buf(),
        column,
        label: values.column_label(column),
        replaced: rendered.replaced_count(),
        unresolved: rendered.unresolved.clone(),
    }
}

fn log_unresolved(label: &str, rendered: &Rendered) {
    for token in &rendered.unresolved {
        warn!(
            label = %label,
            token = %token.name,
            line = token.line,
            occurrences = token.occurrences,
            "unresolved token left in output"
        );
    }
}
