use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of a template variable, without the surrounding `$` delimiters.
pub type VariableName = String;

/// Name → value table used to resolve template tokens.
///
/// Names are case-sensitive. When the same name is inserted twice the later
/// value replaces the earlier one, mirroring how a spreadsheet read top to
/// bottom resolves duplicate rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMapping {
    values: BTreeMap<VariableName, String>,
}

impl VariableMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value bound to `name`.
    pub fn insert(&mut self, name: impl Into<VariableName>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for VariableMapping
where
    N: Into<VariableName>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut mapping = VariableMapping::new();
        for (name, value) in iter {
            mapping.insert(name, value);
        }
        mapping
    }
}

/// One variable row of the value table: the name and one value per value
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRow {
    pub name: VariableName,
    pub values: Vec<String>,
}

/// In-memory copy of the spreadsheet holding variable values.
///
/// Column `A` holds the variable names; every following column is a value
/// column, addressed 1-based so that spreadsheet column `B` is value column 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTable {
    /// Header text per value column, when the sheet has a header row.
    pub headers: Option<Vec<String>>,
    /// Rows with a non-empty name, in sheet order.
    pub rows: Vec<VariableRow>,
    /// Number of value columns.
    pub value_columns: usize,
}

impl ValueTable {
    /// Builds the mapping for value column `column` (1-based). Returns `None`
    /// when the column does not exist.
    pub fn mapping(&self, column: usize) -> Option<VariableMapping> {
        if column == 0 || column > self.value_columns {
            return None;
        }
        let index = column - 1;
        Some(
            self.rows
                .iter()
                .map(|row| {
                    let value = row.values.get(index).cloned().unwrap_or_default();
                    (row.name.clone(), value)
                })
                .collect(),
        )
    }

    /// Header label for value column `column`, falling back to `Value N`.
    pub fn column_label(&self, column: usize) -> String {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(column.wrapping_sub(1)))
            .filter(|label| !label.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Value {column}"))
    }
}

/// Role of a piece of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Template text copied through unchanged.
    Literal,
    /// A token that was replaced by its mapped value.
    Replaced { name: VariableName },
    /// A token without a mapping entry, emitted verbatim.
    Unresolved { name: VariableName },
}

/// A contiguous piece of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Literal,
            text: text.into(),
        }
    }
}

/// A token found in the template that has no mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedToken {
    pub name: VariableName,
    /// 1-based line of the first occurrence.
    pub line: usize,
    pub occurrences: usize,
}

/// Result of substituting a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub segments: Vec<Segment>,
    /// Distinct unresolved tokens in order of first appearance.
    pub unresolved: Vec<UnresolvedToken>,
}

impl Rendered {
    /// Concatenated output text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|segment| segment.text.as_str()).collect()
    }

    /// Number of tokens that were replaced.
    pub fn replaced_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment.kind, SegmentKind::Replaced { .. }))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Splits the segments at line breaks. `\r\n` and `\n` both end a line and
    /// empty pieces are dropped, so an empty line yields an empty vector.
    pub fn lines(&self) -> Vec<Vec<Segment>> {
        let mut lines = Vec::new();
        let mut current: Vec<Segment> = Vec::new();

        for segment in &self.segments {
            let mut pieces = segment.text.split('\n').peekable();
            while let Some(piece) = pieces.next() {
                let ends_line = pieces.peek().is_some();
                let piece = if ends_line {
                    piece.strip_suffix('\r').unwrap_or(piece)
                } else {
                    piece
                };
                if !piece.is_empty() {
                    current.push(Segment {
                        kind: segment.kind.clone(),
                        text: piece.to_string(),
                    });
                }
                if ends_line {
                    lines.push(std::mem::take(&mut current));
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

/// Serialisable summary of a single render, written with `--report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub template: PathBuf,
    pub table: PathBuf,
    /// 1-based value column the mapping was built from.
    pub column: usize,
    pub label: String,
    pub replaced: usize,
    pub unresolved: Vec<UnresolvedToken>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ValueTable {
        ValueTable {
            headers: Some(vec!["site-a".into(), String::new()]),
            rows: vec![
                VariableRow {
                    name: "HOST".into(),
                    values: vec!["db1".into(), "db2".into()],
                },
                VariableRow {
                    name: "PORT".into(),
                    values: vec!["5432".into()],
                },
            ],
            value_columns: 2,
        }
    }

    #[test]
    fn mapping_keeps_last_duplicate() {
        let mapping: VariableMapping = [("VAR", "1"), ("VAR", "2")].into_iter().collect();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("VAR"), Some("2"));
    }

    #[test]
    fn mapping_is_case_sensitive() {
        let mapping: VariableMapping = [("host", "a")].into_iter().collect();
        assert_eq!(mapping.get("HOST"), None);
    }

    #[test]
    fn table_mapping_fills_short_rows_with_empty_values() {
        let mapping = table().mapping(2).expect("second column exists");
        assert_eq!(mapping.get("HOST"), Some("db2"));
        assert_eq!(mapping.get("PORT"), Some(""));
    }

    #[test]
    fn table_mapping_rejects_unknown_columns() {
        assert!(table().mapping(0).is_none());
        assert!(table().mapping(3).is_none());
    }

    #[test]
    fn column_label_falls_back_when_header_blank() {
        let table = table();
        assert_eq!(table.column_label(1), "site-a");
        assert_eq!(table.column_label(2), "Value 2");
    }

    #[test]
    fn lines_split_segments_across_line_breaks() {
        let rendered = Rendered {
            segments: vec![
                Segment::literal("host "),
                Segment {
                    kind: SegmentKind::Replaced {
                        name: "HOST".into(),
                    },
                    text: "db1".into(),
                },
                Segment::literal("\r\n\nport "),
                Segment {
                    kind: SegmentKind::Unresolved {
                        name: "PORT".into(),
                    },
                    text: "$PORT$".into(),
                },
                Segment::literal("\n"),
            ],
            unresolved: Vec::new(),
        };

        let lines = rendered.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 2);
        assert!(lines[1].is_empty());
        assert_eq!(lines[2][1].text, "$PORT$");
    }
}
