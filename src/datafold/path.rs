//! Datafold identifies tables and columns with dotted paths whose segments
//! may be double-quoted, e.g. `"my-project".analytics."daily ""raw"" events"`.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::data_models::{BIGQUERY, table_key};

const QUOTE: char = '"';
const SEPARATOR: char = '.';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Unclosed quote in `{path}` at char {position}")]
    UnclosedQuote { path: String, position: usize },
    #[error("Empty token in `{path}` at char {position}")]
    EmptySegment { path: String, position: usize },
    #[error("path `{path}` has {found} segments, expected at least 3")]
    TooShort { path: String, found: usize },
}

/// Character cursor that counts every pop, including pops past the end.
struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    consumed: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            chars: s.chars().peekable(),
            consumed: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn pop(&mut self) -> Option<char> {
        self.consumed += 1;
        self.chars.next()
    }
}

/// Splits a Datafold path into its unquoted segments.
pub fn unquote_path(path: &str) -> Result<Vec<String>, PathError> {
    let mut cursor = Cursor::new(path);
    let mut segment = String::new();
    let mut segments = Vec::new();

    loop {
        match cursor.pop() {
            Some(QUOTE) => loop {
                match cursor.pop() {
                    Some(QUOTE) if cursor.peek() == Some(QUOTE) => {
                        cursor.pop();
                        segment.push(QUOTE);
                    }
                    Some(QUOTE) => break,
                    Some(c) => segment.push(c),
                    None => {
                        return Err(PathError::UnclosedQuote {
                            path: path.to_string(),
                            position: cursor.consumed,
                        });
                    }
                }
            },
            c @ (Some(SEPARATOR) | None) => {
                if segment.is_empty() {
                    return Err(PathError::EmptySegment {
                        path: path.to_string(),
                        position: cursor.consumed,
                    });
                }
                segments.push(std::mem::take(&mut segment));
                if c.is_none() {
                    break;
                }
            }
            Some(c) => segment.push(c),
        }
    }

    Ok(segments)
}

/// A `cluster.schema.table[.column]` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePath {
    pub cluster: String,
    pub schema: String,
    pub table: String,
    pub column: Option<String>,
}

impl TablePath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = unquote_path(path)?;
        let found = segments.len();
        let mut segments = segments.into_iter();
        match (segments.next(), segments.next(), segments.next()) {
            (Some(cluster), Some(schema), Some(table)) => Ok(Self {
                cluster,
                schema,
                table,
                column: segments.next(),
            }),
            _ => Err(PathError::TooShort {
                path: path.to_string(),
                found,
            }),
        }
    }

    pub fn table_key(&self) -> String {
        table_key(BIGQUERY, &self.cluster, &self.schema, &self.table)
    }

    pub fn column_key(&self, column: &str) -> String {
        format!("{}/{column}", self.table_key())
    }

    /// Table key, or column key when the path names a column.
    pub fn key(&self) -> String {
        match &self.column {
            Some(column) => self.column_key(column),
            None => self.table_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        assert_eq!(
            unquote_path("proj.sales.orders").unwrap(),
            vec!["proj", "sales", "orders"]
        );
        assert_eq!(unquote_path("orders").unwrap(), vec!["orders"]);
    }

    #[test]
    fn test_quoted_segments() {
        assert_eq!(
            unquote_path(r#""my-proj"."sales.eu".orders"#).unwrap(),
            vec!["my-proj", "sales.eu", "orders"]
        );
        assert_eq!(
            unquote_path(r#""say ""hi""".t"#).unwrap(),
            vec![r#"say "hi""#, "t"]
        );
    }

    #[test]
    fn test_quote_inside_segment_is_joined() {
        assert_eq!(unquote_path(r#"a"b.c"d.e"#).unwrap(), vec!["ab.cd", "e"]);
    }

    #[test]
    fn test_unclosed_quote() {
        assert_eq!(
            unquote_path(r#"a."bc"#),
            Err(PathError::UnclosedQuote {
                path: r#"a."bc"#.to_string(),
                position: 6,
            })
        );
    }

    #[test]
    fn test_empty_segments() {
        assert_eq!(
            unquote_path("a..b"),
            Err(PathError::EmptySegment {
                path: "a..b".to_string(),
                position: 3,
            })
        );
        assert_eq!(
            unquote_path("a."),
            Err(PathError::EmptySegment {
                path: "a.".to_string(),
                position: 3,
            })
        );
        assert!(matches!(
            unquote_path(""),
            Err(PathError::EmptySegment { position: 1, .. })
        ));
        assert!(matches!(
            unquote_path(r#""".b"#),
            Err(PathError::EmptySegment { position: 3, .. })
        ));
    }

    #[test]
    fn test_table_path_keys() {
        let path = TablePath::parse(r#"proj."sales".orders.amount"#).unwrap();
        assert_eq!(path.table_key(), "bigquery://proj.sales/orders");
        assert_eq!(path.key(), "bigquery://proj.sales/orders/amount");
        assert_eq!(
            path.column_key("id"),
            "bigquery://proj.sales/orders/id"
        );

        let path = TablePath::parse("proj.sales.orders").unwrap();
        assert_eq!(path.column, None);
        assert_eq!(path.key(), "bigquery://proj.sales/orders");
    }

    #[test]
    fn test_table_path_too_short() {
        assert_eq!(
            TablePath::parse("proj.sales"),
            Err(PathError::TooShort {
                path: "proj.sales".to_string(),
                found: 2,
            })
        );
    }
}
