//! Minimal RFC 4180 reader: comma delimiter, double-quote quoting.
//!
//! # Invariants
//! - `""` inside a quoted field is one literal quote.
//! - A quote opens a quoted field only at the start of that field;
//!   elsewhere it is literal text.
//! - Quoted fields may span lines; `\r\n` and `\n` both end a record.
//! - Records consisting only of whitespace are skipped.
//! - Line numbers are 1-based and point at the first line of a record.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// One data record with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub values: Vec<String>,
}

/// Parsed header plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<CsvRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    /// No header record.
    Empty,
    /// A quoted field is still open at end of input.
    UnterminatedQuote { line: usize },
}

impl Display for CsvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "csv is empty"),
            Self::UnterminatedQuote { line } => {
                write!(f, "unterminated quoted field starting on line {line}")
            }
        }
    }
}

impl Error for CsvError {}

/// Parses `text`; the first non-blank record is the header.
pub fn parse_csv(text: &str) -> Result<CsvTable, CsvError> {
    let mut records = parse_records(text)?.into_iter();
    let header = records.next().ok_or(CsvError::Empty)?;
    Ok(CsvTable {
        header: header.values,
        rows: records.collect(),
    })
}

fn parse_records(text: &str) -> Result<Vec<CsvRow>, CsvError> {
    let mut records = Vec::new();
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    current.push(ch);
                }
                _ => current.push(ch),
            }
            continue;
        }

        match ch {
            '"' if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            ',' => {
                values.push(std::mem::take(&mut current));
                at_field_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                values.push(std::mem::take(&mut current));
                push_record(&mut records, std::mem::take(&mut values), record_line);
                line += 1;
                record_line = line;
                at_field_start = true;
            }
            _ => {
                current.push(ch);
                at_field_start = false;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: record_line });
    }
    values.push(current);
    push_record(&mut records, values, record_line);
    Ok(records)
}

fn push_record(records: &mut Vec<CsvRow>, values: Vec<String>, line: usize) {
    if values.iter().all(|value| value.trim().is_empty()) {
        return;
    }
    records.push(CsvRow { line, values });
}

#[cfg(test)]
mod tests {
    use super::{parse_csv, CsvError};

    #[test]
    fn parses_header_and_rows_with_line_numbers() {
        let table = parse_csv("city,brand\nPrague,KB\n\nBrno,CSOB\n").expect("parse");
        assert_eq!(table.header, vec!["city", "brand"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].line, 4);
        assert_eq!(table.rows[1].values, vec!["Brno", "CSOB"]);
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let table =
            parse_csv("address,brand\r\n\"Main St 1, Prague\",\"The \"\"Bank\"\"\"\r\n\"a\nb\",x\r\nlast,y")
                .expect("parse");
        assert_eq!(table.rows[0].values, vec!["Main St 1, Prague", "The \"Bank\""]);
        assert_eq!(table.rows[1].values, vec!["a\nb", "x"]);
        assert_eq!(table.rows[1].line, 3);
        assert_eq!(table.rows[2].line, 5);
    }

    #[test]
    fn empty_fields_are_preserved() {
        let table = parse_csv("a,b,c\n,,x\n").expect("parse");
        assert_eq!(table.rows[0].values, vec!["", "", "x"]);
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        let table = parse_csv("a,b\nab\"c,d\nnext,row\n").expect("parse");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].values, vec!["ab\"c", "d"]);
        assert_eq!(table.rows[1].values, vec!["next", "row"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse_csv(""), Err(CsvError::Empty));
        assert_eq!(parse_csv("\n \n"), Err(CsvError::Empty));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(
            parse_csv("a,b\n1,\"open\n"),
            Err(CsvError::UnterminatedQuote { line: 2 })
        );
    }
}
