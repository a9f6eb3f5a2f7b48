//! Streaming NDJSON writer.

use std::io::{BufWriter, Write};

use rowq_core::error::Result;
use rowq_core::row::Row;

/// Writes one JSON object per line, keeping each row's column order.
pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    rows_written: u64,
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            rows_written: 0,
        }
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Drain `rows` into the sink. On the first error, everything written so
    /// far is flushed and the error is returned; nothing is rolled back.
    pub fn write_all<I>(&mut self, rows: I) -> Result<u64>
    where
        I: IntoIterator<Item = Result<Row>>,
    {
        let before = self.rows_written;
        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    self.flush()?;
                    return Err(e);
                }
            };
            self.write_row(&row)?;
        }
        self.flush()?;
        Ok(self.rows_written - before)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}
