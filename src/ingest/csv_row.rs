//! Quote-aware row splitting for the tester's CSV export.
//!
//! The export is not strict RFC 4180: label columns carry embedded
//! `key='value', key='value'` lists inside double quotes, and the
//! splitter only needs to keep those commas out of the column boundaries.
//!
//! Rules, applied in a single left-to-right pass:
//! - a comma outside a quoted span separates columns
//! - a double quote toggles the quoted span and is not copied to the output
//! - two consecutive double quotes produce one literal `"`, except when the
//!   pair opens a column (`""` at column start is an empty column)

/// What the scanner saw immediately before the current character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    ColumnStart,
    Quote,
    Other,
}

/// Splits one line into its columns. Always returns at least one column.
pub fn split_row(line: &str) -> Vec<String> {
    let mut columns = Vec::new();
    let mut current = String::new();
    let mut outside_quotes = true;
    let mut prev = Prev::ColumnStart;

    for ch in line.chars() {
        prev = match ch {
            '"' => {
                outside_quotes = !outside_quotes;
                match prev {
                    Prev::Quote => {
                        current.push('"');
                        Prev::Other
                    }
                    Prev::ColumnStart => Prev::Other,
                    Prev::Other => Prev::Quote,
                }
            }
            ',' if outside_quotes => {
                columns.push(std::mem::take(&mut current));
                Prev::ColumnStart
            }
            _ => {
                current.push(ch);
                Prev::Other
            }
        };
    }
    columns.push(current);
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_columns_split_on_commas() {
        assert_eq!(split_row("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_line_is_one_empty_column() {
        assert_eq!(split_row(""), vec![""]);
    }

    #[test]
    fn test_trailing_comma_yields_trailing_empty_column() {
        assert_eq!(split_row("a,b,"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_comma_inside_quotes_is_not_a_separator() {
        let cols = split_row(r#"1,"value='5', lower_limit='0'",x"#);
        assert_eq!(cols, vec!["1", "value='5', lower_limit='0'", "x"]);
    }

    #[test]
    fn test_doubled_quote_inside_span_is_literal() {
        assert_eq!(split_row(r#""say ""hi""",z"#), vec![r#"say "hi""#, "z"]);
    }

    #[test]
    fn test_empty_quoted_column_has_no_literal_quote() {
        assert_eq!(split_row(r#"a,"",b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn test_quotes_in_the_middle_of_a_column_are_elided() {
        assert_eq!(split_row(r#"ab"c,d"e,f"#), vec!["abc,de", "f"]);
    }

    #[test]
    fn test_unterminated_quote_swallows_rest_of_line() {
        assert_eq!(split_row(r#"a,"b,c"#), vec!["a", "b,c"]);
    }
}
