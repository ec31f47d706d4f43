//! Raw delimited reader.
//!
//! Produces rows of unquoted string fields without interpreting them: no
//! whitespace stripping, no missing-token matching, no type parsing. Those
//! are deferred to later stages because missing-token matching must happen on
//! the stripped value while string columns must keep whatever survives
//! stripping.
//!
//! The whole file is consumed before anything downstream runs; type and
//! missing-token inference need the complete per-column value distribution.
//! Gzip-compressed input is detected by its magic bytes and decompressed
//! transparently.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use fletcher_result::{Error, Result};

use crate::CsvReadOptions;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Header names plus raw data rows, every row arity-checked against the
/// header.
#[derive(Debug, Clone)]
pub struct RawRows {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawRows {
    pub fn num_columns(&self) -> usize {
        self.header.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Read a delimited file (plain or gzip-compressed) into raw rows.
///
/// Fails with [`Error::MalformedRow`] on the first data row whose field count
/// differs from the header's; no partial output is produced. The file handle
/// is closed on every exit path.
pub fn read_raw(path: &Path, options: &CsvReadOptions) -> Result<RawRows> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    if bytes.starts_with(&GZIP_MAGIC) {
        tracing::debug!(path = %path.display(), "decompressing gzip input");
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;
        bytes = decoded;
    }

    let text = String::from_utf8(bytes)
        .map_err(|_| Error::InvalidArgumentError("input is not valid UTF-8".into()))?;
    parse_str(&text, options)
}

/// Parse delimited text already held in memory.
pub fn parse_str(text: &str, options: &CsvReadOptions) -> Result<RawRows> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut records = split_records(text, options.delimiter as char);
    if records.is_empty() {
        return Err(Error::InvalidArgumentError(
            "input contains no rows".into(),
        ));
    }

    let header = if options.has_header {
        records.remove(0)
    } else {
        (0..records[0].len()).map(|i| format!("col_{i}")).collect()
    };

    let expected = header.len();
    for (idx, row) in records.iter().enumerate() {
        if row.len() != expected {
            return Err(Error::MalformedRow {
                row: idx + 1,
                expected,
                found: row.len(),
            });
        }
    }

    Ok(RawRows {
        header,
        rows: records,
    })
}

/// Split text into records of unquoted fields.
///
/// Quote handling follows the usual delimited-text convention: a quoted field
/// may contain the delimiter and record separators, and `""` inside a quoted
/// field is a literal quote.
fn split_records(text: &str, delim: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            c if c == delim => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }

    // Final record without a trailing newline.
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn read_str(text: &str) -> Result<RawRows> {
        parse_str(text, &CsvReadOptions::default())
    }

    #[test]
    fn reads_header_and_rows() {
        let rows = read_str("a,b,c\n1,2,3\n4,5,6\n").expect("parse");
        assert_eq!(rows.header, vec!["a", "b", "c"]);
        assert_eq!(rows.num_rows(), 2);
        assert_eq!(rows.rows[1], vec!["4", "5", "6"]);
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_newlines() {
        let rows = read_str("name,note\n\"Doe, Jane\",\"line one\nline two\"\n").expect("parse");
        assert_eq!(rows.rows[0][0], "Doe, Jane");
        assert_eq!(rows.rows[0][1], "line one\nline two");
    }

    #[test]
    fn doubled_quote_is_literal() {
        let rows = read_str("q\n\"say \"\"hi\"\"\"\n").expect("parse");
        assert_eq!(rows.rows[0][0], "say \"hi\"");
    }

    #[test]
    fn whitespace_is_not_stripped_here() {
        let rows = read_str("a,b\n  x  , y\n").expect("parse");
        assert_eq!(rows.rows[0][0], "  x  ");
        assert_eq!(rows.rows[0][1], " y");
    }

    #[test]
    fn short_row_is_malformed_with_one_based_index() {
        // Scenario: header has 3 fields, the second data row has 2.
        let err = read_str("a,b,c\n1,2,3\n4,5\n").expect_err("malformed");
        match err {
            Error::MalformedRow {
                row,
                expected,
                found,
            } => {
                assert_eq!(row, 2);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn crlf_line_endings_are_handled() {
        let rows = read_str("a,b\r\n1,2\r\n").expect("parse");
        assert_eq!(rows.num_rows(), 1);
        assert_eq!(rows.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn missing_final_newline_still_yields_last_row() {
        let rows = read_str("a,b\n1,2").expect("parse");
        assert_eq!(rows.num_rows(), 1);
    }

    #[test]
    fn tab_delimiter() {
        let options = CsvReadOptions {
            delimiter: b'\t',
            ..Default::default()
        };
        let rows = parse_str("a\tb\n1\t2\n", &options).expect("parse");
        assert_eq!(rows.header, vec!["a", "b"]);
        assert_eq!(rows.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn headerless_input_synthesizes_names() {
        let options = CsvReadOptions {
            has_header: false,
            ..Default::default()
        };
        let rows = parse_str("1,2\n3,4\n", &options).expect("parse");
        assert_eq!(rows.header, vec!["col_0", "col_1"]);
        assert_eq!(rows.num_rows(), 2);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let rows = read_str("\u{FEFF}a,b\n1,2\n").expect("parse");
        assert_eq!(rows.header[0], "a");
    }

    #[test]
    fn gzip_input_is_transparently_decompressed() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"a,b\n1,2\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut tmp = NamedTempFile::new().expect("create tmp");
        tmp.write_all(&compressed).unwrap();

        let rows = read_raw(tmp.path(), &CsvReadOptions::default()).expect("read gzip");
        assert_eq!(rows.header, vec!["a", "b"]);
        assert_eq!(rows.rows[0], vec!["1", "2"]);
    }
}
