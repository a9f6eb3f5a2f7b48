//! Streaming NDJSON reader.
//!
//! A `RowSource` hands out its rows exactly once. Asking a second time is an
//! error rather than a silently empty sequence; callers that need to read a
//! relation twice call `materialize` and keep the `Relation`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rowq_core::error::{Error, Result};
use rowq_core::row::{parse_row, Relation, Row};

/// Sentinel accepted in place of a path to mean standard input.
pub const STDIN_SENTINEL: &str = "-";

/// Where a relation is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceSpec {
    Stdin,
    Path(PathBuf),
}

impl SourceSpec {
    pub fn parse(s: &str) -> Self {
        if s == STDIN_SENTINEL {
            SourceSpec::Stdin
        } else {
            SourceSpec::Path(PathBuf::from(s))
        }
    }
}

impl From<String> for SourceSpec {
    fn from(s: String) -> Self {
        SourceSpec::parse(&s)
    }
}

impl From<SourceSpec> for String {
    fn from(spec: SourceSpec) -> Self {
        match spec {
            SourceSpec::Stdin => STDIN_SENTINEL.to_string(),
            SourceSpec::Path(p) => p.to_string_lossy().into_owned(),
        }
    }
}

/// Raw line bytes with the terminator removed. Decoding happens per line so
/// bad UTF-8 is reported against its line number.
type LineIter<'a> = Box<dyn Iterator<Item = io::Result<Vec<u8>>> + 'a>;

/// Single-use producer of rows.
pub struct RowSource<'a> {
    lines: Option<LineIter<'a>>,
    label: String,
}

impl RowSource<'static> {
    pub fn open(spec: &SourceSpec, buffer_bytes: usize) -> Result<Self> {
        match spec {
            SourceSpec::Stdin => Ok(Self::stdin(buffer_bytes)),
            SourceSpec::Path(p) => Self::from_path(p, buffer_bytes),
        }
    }

    pub fn from_path(path: impl AsRef<Path>, buffer_bytes: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut src = Self::from_reader(file, buffer_bytes);
        src.label = path.display().to_string();
        Ok(src)
    }

    pub fn stdin(buffer_bytes: usize) -> Self {
        let mut src = Self::from_reader(io::stdin(), buffer_bytes);
        src.label = "<stdin>".to_string();
        src
    }
}

impl<'a> RowSource<'a> {
    pub fn from_reader<R: Read + 'a>(reader: R, buffer_bytes: usize) -> Self {
        let buffered = BufReader::with_capacity(buffer_bytes.max(1), reader);
        let lines = buffered.split(b'\n').map(|line| {
            line.map(|mut bytes| {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                bytes
            })
        });
        Self {
            lines: Some(Box::new(lines)),
            label: "<reader>".to_string(),
        }
    }

    /// Rows from an already-open line sequence.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: 'a,
    {
        Self {
            lines: Some(Box::new(lines.into_iter().map(|l| Ok(l.into_bytes())))),
            label: "<lines>".to_string(),
        }
    }

    /// Human-readable origin, for diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_consumed(&self) -> bool {
        self.lines.is_none()
    }

    /// Take the lazy row sequence. Fails with `Error::SourceConsumed` if the
    /// rows were already taken.
    pub fn rows(&mut self) -> Result<JsonlRows<'a>> {
        let lines = self.lines.take().ok_or(Error::SourceConsumed)?;
        Ok(JsonlRows {
            lines,
            line_no: 0,
            done: false,
        })
    }

    /// Read every row into memory. The first malformed line aborts.
    pub fn materialize(&mut self) -> Result<Relation> {
        self.rows()?.collect()
    }
}

/// Iterator over the rows of one NDJSON input.
///
/// Blank lines are skipped. The first error (I/O or parse) is yielded once and
/// the iterator is fused afterwards.
pub struct JsonlRows<'a> {
    lines: LineIter<'a>,
    line_no: usize,
    done: bool,
}

impl<'a> Iterator for JsonlRows<'a> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let bytes = match self.lines.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(Error::Io(e)));
                }
                Some(Ok(bytes)) => bytes,
            };
            self.line_no += 1;
            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    tracing::debug!(line = self.line_no, "aborting read on non-UTF-8 line");
                    return Some(Err(Error::parse(self.line_no, format!("invalid UTF-8: {e}"))));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let parsed = parse_row(&line, self.line_no);
            if parsed.is_err() {
                self.done = true;
                tracing::debug!(line = self.line_no, "aborting read on malformed line");
            }
            return Some(parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn skips_blank_lines() {
        let mut src = RowSource::from_lines(lines(&[r#"{"a":1}"#, "", "   ", r#"{"a":2}"#]));
        let rows = src.materialize().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["a"], json!(2));
    }

    #[test]
    fn second_read_is_an_error() {
        let mut src = RowSource::from_lines(lines(&[r#"{"a":1}"#]));
        let first: Vec<_> = src.rows().unwrap().collect();
        assert_eq!(first.len(), 1);
        assert!(src.is_consumed());
        assert!(matches!(src.rows(), Err(Error::SourceConsumed)));
    }

    #[test]
    fn malformed_line_is_fatal_and_fuses() {
        let mut src = RowSource::from_lines(lines(&[
            r#"{"a":1}"#,
            "",
            "{not json",
            r#"{"a":3}"#,
        ]));
        let mut rows = src.rows().unwrap();
        assert!(rows.next().unwrap().is_ok());
        match rows.next() {
            Some(Err(Error::Parse { line, .. })) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(rows.next().is_none());
    }

    #[test]
    fn reads_from_any_reader() {
        let data = b"{\"x\":\"y\"}\n\n{\"x\":\"z\"}\n";
        let mut src = RowSource::from_reader(&data[..], 16);
        let rows = src.materialize().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn invalid_utf8_is_a_parse_error_on_its_line() {
        let data = b"{\"a\":1}\n{\"a\":\"\xff\"}\n{\"a\":3}\n";
        let mut src = RowSource::from_reader(&data[..], 64);
        let mut rows = src.rows().unwrap();
        assert_eq!(rows.next().unwrap().unwrap()["a"], json!(1));
        match rows.next() {
            Some(Err(Error::Parse { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(rows.next().is_none());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let data = b"{\"a\":1}\r\n\r\n{\"a\":2}\r\n";
        let mut src = RowSource::from_reader(&data[..], 8);
        let rows = src.materialize().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["a"], json!(2));
    }

    #[test]
    fn dash_means_stdin() {
        assert_eq!(SourceSpec::parse("-"), SourceSpec::Stdin);
        assert_eq!(
            SourceSpec::parse("data/in.jsonl"),
            SourceSpec::Path(PathBuf::from("data/in.jsonl"))
        );
    }
}
