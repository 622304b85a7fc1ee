//! Token scanning and substitution.
//!
//! A token is a `$` followed by one or more characters that are neither `$`
//! nor whitespace, closed by another `$`. Matches are leftmost-first and never
//! overlap: after a token the scan resumes right after its closing delimiter.
//! A `$` that cannot open a token is ordinary text.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Rendered, Segment, SegmentKind, UnresolvedToken, VariableMapping};

/// Delimiter surrounding variable names in templates.
pub const DELIMITER: char = '$';

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^$\s]+)\$").expect("token pattern is valid"));

/// A token located in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Variable name without delimiters.
    pub name: &'a str,
    /// Byte span of the token including both delimiters.
    pub span: Range<usize>,
}

/// Scans `text` for tokens, in order.
pub fn tokens(text: &str) -> impl Iterator<Item = Token<'_>> {
    TOKEN_PATTERN.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let name = caps.get(1)?;
        Some(Token {
            name: name.as_str(),
            span: whole.range(),
        })
    })
}

/// Returns true when `name` could appear between two delimiters.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|ch| ch == DELIMITER || ch.is_whitespace())
}

/// Lists the distinct variable names used by `template` in order of first
/// appearance.
pub fn template_variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in tokens(template) {
        if !names.iter().any(|name| name == token.name) {
            names.push(token.name.to_string());
        }
    }
    names
}

/// Replaces every token of `template` that has an entry in `mapping`.
///
/// Values are inserted literally and never scanned again. Tokens without a
/// mapping entry stay in the output verbatim and are listed in
/// [`Rendered::unresolved`].
pub fn substitute(template: &str, mapping: &VariableMapping) -> Rendered {
    let mut segments = Vec::new();
    let mut unresolved: Vec<UnresolvedToken> = Vec::new();
    let mut unresolved_index: HashMap<&str, usize> = HashMap::new();

    let mut cursor = 0;
    let mut line = 1;

    for token in tokens(template) {
        let literal = &template[cursor..token.span.start];
        line += literal.matches('\n').count();
        if !literal.is_empty() {
            segments.push(Segment::literal(literal));
        }

        match mapping.get(token.name) {
            Some(value) => segments.push(Segment {
                kind: SegmentKind::Replaced {
                    name: token.name.to_string(),
                },
                text: value.to_string(),
            }),
            None => {
                match unresolved_index.get(token.name) {
                    Some(&index) => unresolved[index].occurrences += 1,
                    None => {
                        unresolved_index.insert(token.name, unresolved.len());
                        unresolved.push(UnresolvedToken {
                            name: token.name.to_string(),
                            line,
                            occurrences: 1,
                        });
                    }
                }
                segments.push(Segment {
                    kind: SegmentKind::Unresolved {
                        name: token.name.to_string(),
                    },
                    text: template[token.span.clone()].to_string(),
                });
            }
        }

        cursor = token.span.end;
    }

    if cursor < template.len() {
        segments.push(Segment::literal(&template[cursor..]));
    }

    Rendered {
        segments,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(&str, &str)]) -> VariableMapping {
        entries.iter().copied().collect()
    }

    fn names(text: &str) -> Vec<&str> {
        tokens(text).map(|token| token.name).collect()
    }

    #[test]
    fn replaces_every_mapped_token() {
        let rendered = substitute(
            "host=$HOST$;port=$PORT$",
            &mapping(&[("HOST", "db1"), ("PORT", "5432")]),
        );
        assert_eq!(rendered.text(), "host=db1;port=5432");
        assert!(rendered.is_complete());
        assert_eq!(rendered.replaced_count(), 2);
    }

    #[test]
    fn unmapped_tokens_stay_verbatim_and_are_reported() {
        let rendered = substitute("$A$-$B$", &mapping(&[("A", "x")]));
        assert_eq!(rendered.text(), "x-$B$");
        assert_eq!(
            rendered.unresolved,
            vec![UnresolvedToken {
                name: "B".into(),
                line: 1,
                occurrences: 1,
            }]
        );
    }

    #[test]
    fn text_without_tokens_is_unchanged() {
        let template = "interface eth0\n  mtu 9000\n  cost $5 per unit\n";
        let rendered = substitute(template, &mapping(&[("X", "y")]));
        assert_eq!(rendered.text(), template);
        assert_eq!(rendered.replaced_count(), 0);
    }

    #[test]
    fn empty_template_renders_empty() {
        let rendered = substitute("", &VariableMapping::new());
        assert_eq!(rendered.text(), "");
        assert!(rendered.segments.is_empty());
    }

    #[test]
    fn repeated_tokens_receive_the_same_value() {
        let rendered = substitute("$N$ $N$\n$N$", &mapping(&[("N", "7")]));
        assert_eq!(rendered.text(), "7 7\n7");
        assert_eq!(rendered.replaced_count(), 3);
    }

    #[test]
    fn values_are_not_rescanned() {
        let first = substitute("[$A$]", &mapping(&[("A", "$X$"), ("X", "boom")]));
        assert_eq!(first.text(), "[$X$]");

        let second = substitute(&first.text(), &mapping(&[("A", "$X$")]));
        assert_eq!(second.text(), "[$X$]");
        assert_eq!(second.unresolved[0].name, "X");
    }

    #[test]
    fn empty_values_count_as_resolved() {
        let rendered = substitute("a$GAP$b", &mapping(&[("GAP", "")]));
        assert_eq!(rendered.text(), "ab");
        assert!(rendered.is_complete());
    }

    #[test]
    fn unterminated_token_is_literal() {
        assert!(names("prefix $NAME").is_empty());
        let rendered = substitute("prefix $NAME", &mapping(&[("NAME", "x")]));
        assert_eq!(rendered.text(), "prefix $NAME");
    }

    #[test]
    fn whitespace_interrupts_a_token() {
        assert_eq!(names("$A B$ $C$"), vec!["C"]);
        assert_eq!(names("$A\tB$"), Vec::<&str>::new());
    }

    #[test]
    fn double_delimiter_is_not_a_token() {
        assert_eq!(names("$$A$"), vec!["A"]);
        assert_eq!(names("$$"), Vec::<&str>::new());
    }

    #[test]
    fn scanning_resumes_after_closing_delimiter() {
        assert_eq!(names("$A$B$C$"), vec!["A", "C"]);
        let rendered = substitute("$A$B$C$", &mapping(&[("A", "1"), ("C", "3")]));
        assert_eq!(rendered.text(), "1B3");
    }

    #[test]
    fn names_may_contain_punctuation_and_unicode() {
        assert_eq!(names("$if.name-1$ $naïve$"), vec!["if.name-1", "naïve"]);
    }

    #[test]
    fn unresolved_tokens_record_first_line_and_count() {
        let rendered = substitute("a\n$X$\n$Y$ $X$", &VariableMapping::new());
        assert_eq!(
            rendered.unresolved,
            vec![
                UnresolvedToken {
                    name: "X".into(),
                    line: 2,
                    occurrences: 2,
                },
                UnresolvedToken {
                    name: "Y".into(),
                    line: 3,
                    occurrences: 1,
                },
            ]
        );
    }

    #[test]
    fn template_variables_are_unique_and_ordered() {
        assert_eq!(
            template_variables("$B$ $A$ $B$ $C"),
            vec!["B".to_string(), "A".to_string()]
        );
    }

    #[test]
    fn validates_names() {
        assert!(is_valid_name("HOSTNAME"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("A B"));
        assert!(!is_valid_name("A$B"));
    }
}
