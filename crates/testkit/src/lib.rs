#![warn(missing_docs)]
//! Test and reporting surfaces: JSONL record sinks, audit run summaries and
//! fixtures for catalogs and in-memory worlds.

mod fixtures;
mod summary;

use anyhow::Result;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use fixtures::*;
pub use summary::*;

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            file: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one record.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered records to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Record<'a> {
        position: [i32; 3],
        severity: &'a str,
    }

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("statuses.jsonl");
        let mut sink = JsonlSink::create(&path).expect("sink create");
        sink.write(&Record {
            position: [1, 1, 4],
            severity: "ok",
        })
        .unwrap();
        sink.write(&Record {
            position: [0, -2, 0],
            severity: "red",
        })
        .unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.written(), 2);

        let contents = fs::read_to_string(&path).expect("file readable");
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"severity\":\"red\""));
    }
}
