// src/sink.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Table sinks: drain a channel until it closes, then finalize the output once
//!
//! Two flavours share the [`Sink`] trait:
//! - [`RecordSink`] serializes typed rows itself (CSV via `csv`, JSON lines via
//!   `serde_json`).
//! - [`ChunkSink`] writes [`Chunk`]s that producers already encoded, which
//!   moves serialization cost onto the worker threads.
//!
//! A sink that hits a write error keeps draining (and discarding) its channel
//! so producers never block forever on a full channel. The first error is
//! announced through the `on_error` hook of [`drain_with`] as soon as it
//! happens and returned once the channel closes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use crossbeam_channel::Receiver;
use serde::Serialize;

use crate::error::{GenError, Result};
use crate::records::Record;

/// Output encoding of every table in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    JsonLines,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::JsonLines => "jsonl",
        }
    }

    /// Header line written ahead of pre-encoded chunks (CSV only)
    pub fn header_line(&self, columns: &[&str]) -> Option<Bytes> {
        match self {
            OutputFormat::Csv => Some(Bytes::from(format!("{}\n", columns.join(",")))),
            OutputFormat::JsonLines => None,
        }
    }
}

/// Pre-encoded block of rows
#[derive(Debug, Clone)]
pub struct Chunk {
    pub rows: u64,
    pub data: Bytes,
}

/// Encode `rows` (without a header) into one chunk
pub fn encode_chunk<T: Serialize>(table: &str, rows: &[T], format: OutputFormat) -> Result<Chunk> {
    let mut buf = Vec::with_capacity(rows.len() * 64);
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut buf);
            for row in rows {
                writer.serialize(row).map_err(|source| GenError::Csv {
                    table: table.to_string(),
                    source,
                })?;
            }
            writer.flush().map_err(|e| GenError::io(table, e))?;
        }
        OutputFormat::JsonLines => {
            for row in rows {
                serde_json::to_writer(&mut buf, row).map_err(|source| GenError::Json {
                    table: table.to_string(),
                    source,
                })?;
                buf.push(b'\n');
            }
        }
    }
    Ok(Chunk {
        rows: rows.len() as u64,
        data: Bytes::from(buf),
    })
}

/// Consumer end of a table channel
pub trait Sink<T>: Send {
    /// Write one message, returning the number of rows it carried
    fn write(&mut self, message: &T) -> Result<u64>;

    /// Flush and close the underlying resource
    fn finish(&mut self) -> Result<()>;
}

enum Encoder<W: Write> {
    Csv(csv::Writer<W>),
    JsonLines(W),
}

/// Serializes typed rows into a writer
///
/// CSV output always starts with a header line, also for a table without rows.
pub struct RecordSink<T, W: Write = BufWriter<File>> {
    table: String,
    path: PathBuf,
    encoder: Option<Encoder<W>>,
    rows: u64,
    _rows: PhantomData<fn(&T)>,
}

impl<T> RecordSink<T> {
    /// Create (truncate) `path` and write `table` rows to it
    pub fn create(table: &str, path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path).map_err(|e| GenError::io(path, e))?;
        tracing::debug!("Opened {} for table {}", path.display(), table);
        Ok(Self::from_writer(table, path, BufWriter::new(file), format))
    }
}

impl<T, W: Write> RecordSink<T, W> {
    pub fn from_writer(table: &str, path: &Path, writer: W, format: OutputFormat) -> Self {
        let encoder = match format {
            OutputFormat::Csv => Encoder::Csv(csv::Writer::from_writer(writer)),
            OutputFormat::JsonLines => Encoder::JsonLines(writer),
        };
        Self {
            table: table.to_string(),
            path: path.to_path_buf(),
            encoder: Some(encoder),
            rows: 0,
            _rows: PhantomData,
        }
    }

    /// I/O failures surface as `Io`, everything else as `Csv`
    fn csv_error(&self, source: csv::Error) -> GenError {
        if !source.is_io_error() {
            return GenError::Csv {
                table: self.table.clone(),
                source,
            };
        }
        match source.into_kind() {
            csv::ErrorKind::Io(e) => GenError::io(&self.path, e),
            kind => GenError::io(&self.path, std::io::Error::other(format!("{kind:?}"))),
        }
    }

    fn json_error(&self, source: serde_json::Error) -> GenError {
        if source.is_io() {
            GenError::io(&self.path, source.into())
        } else {
            GenError::Json {
                table: self.table.clone(),
                source,
            }
        }
    }

    fn closed(&self) -> GenError {
        GenError::io(
            &self.path,
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink already finished"),
        )
    }
}

impl<T: Record, W: Write + Send> Sink<T> for RecordSink<T, W> {
    fn write(&mut self, row: &T) -> Result<u64> {
        match self.encoder.as_mut() {
            Some(Encoder::Csv(writer)) => {
                if let Err(source) = writer.serialize(row) {
                    return Err(self.csv_error(source));
                }
            }
            Some(Encoder::JsonLines(writer)) => {
                if let Err(source) = serde_json::to_writer(&mut *writer, row) {
                    return Err(self.json_error(source));
                }
                writer
                    .write_all(b"\n")
                    .map_err(|e| GenError::io(&self.path, e))?;
            }
            None => return Err(self.closed()),
        }
        self.rows += 1;
        Ok(1)
    }

    fn finish(&mut self) -> Result<()> {
        // csv writes the header with the first row, an empty table needs it here
        if self.rows == 0 {
            if let Some(Encoder::Csv(writer)) = self.encoder.as_mut() {
                if let Err(source) = writer.write_record(T::COLUMNS) {
                    return Err(self.csv_error(source));
                }
            }
        }
        match self.encoder.take() {
            Some(Encoder::Csv(mut writer)) => writer.flush(),
            Some(Encoder::JsonLines(mut writer)) => writer.flush(),
            None => return Ok(()),
        }
        .map_err(|e| GenError::io(&self.path, e))?;
        tracing::debug!("Closed {} ({})", self.path.display(), self.table);
        Ok(())
    }
}

/// Writes pre-encoded chunks behind an optional header line
pub struct ChunkSink<W: Write = BufWriter<File>> {
    path: PathBuf,
    writer: Option<W>,
    header: Option<Bytes>,
}

impl ChunkSink {
    pub fn create(path: &Path, header: Option<Bytes>) -> Result<Self> {
        let file = File::create(path).map_err(|e| GenError::io(path, e))?;
        tracing::debug!("Opened {} for pre-encoded chunks", path.display());
        Ok(Self::from_writer(path, BufWriter::new(file), header))
    }
}

impl<W: Write> ChunkSink<W> {
    pub fn from_writer(path: &Path, writer: W, header: Option<Bytes>) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            header,
        }
    }

    fn emit(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            GenError::io(
                &self.path,
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink already finished"),
            )
        })?;
        writer
            .write_all(data)
            .map_err(|e| GenError::io(&self.path, e))
    }

    fn write_header(&mut self) -> Result<()> {
        if let Some(header) = self.header.take() {
            self.emit(&header)?;
        }
        Ok(())
    }
}

impl<W: Write + Send> Sink<Chunk> for ChunkSink<W> {
    fn write(&mut self, chunk: &Chunk) -> Result<u64> {
        self.write_header()?;
        self.emit(&chunk.data)?;
        tracing::trace!("Wrote chunk of {} rows to {}", chunk.rows, self.path.display());
        Ok(chunk.rows)
    }

    fn finish(&mut self) -> Result<()> {
        // An empty table still gets its header
        if self.writer.is_some() {
            self.write_header()?;
        }
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| GenError::io(&self.path, e))?;
            tracing::debug!("Closed {}", self.path.display());
        }
        Ok(())
    }
}

/// Drain `rx` into `sink` until every sender is gone, then finish the sink
///
/// Returns the number of rows written or the first error. After an error the
/// remaining messages are received and dropped.
pub fn drain<T, S: Sink<T>>(table: &str, sink: S, rx: Receiver<T>) -> Result<u64> {
    drain_with(table, sink, rx, |_| {})
}

/// [`drain`], calling `on_error` once when a write or the final flush first fails
///
/// The hook runs while producers may still be sending, so it can stop them
/// without waiting for the channel to close.
pub fn drain_with<T, S, F>(table: &str, mut sink: S, rx: Receiver<T>, on_error: F) -> Result<u64>
where
    S: Sink<T>,
    F: FnOnce(&GenError),
{
    let mut rows = 0u64;
    let mut discarded = 0u64;
    let mut first_error = None;
    let mut on_error = Some(on_error);

    for message in rx.iter() {
        if first_error.is_some() {
            discarded += 1;
            continue;
        }
        match sink.write(&message) {
            Ok(n) => rows += n,
            Err(err) => {
                tracing::debug!("Sink for {} failed: {}", table, err);
                if let Some(hook) = on_error.take() {
                    hook(&err);
                }
                first_error = Some(err);
            }
        }
    }

    let finished = sink.finish();
    if let (None, Err(err), Some(hook)) = (&first_error, &finished, on_error.take()) {
        hook(err);
    }
    if discarded > 0 {
        tracing::warn!(
            "Sink for {} discarded {} message(s) after a write error",
            table,
            discarded
        );
    }

    match first_error {
        Some(err) => Err(err),
        None => finished.map(|()| rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[derive(Serialize)]
    struct Row {
        id: i64,
        name: &'static str,
    }

    impl Record for Row {
        const COLUMNS: &'static [&'static str] = &["id", "name"];
    }

    /// Accepts `limit` bytes, then fails every write
    struct FailingWriter {
        limit: usize,
        written: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_csv_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let sink = RecordSink::<Row>::create("rows", &path, OutputFormat::Csv).unwrap();

        let (tx, rx) = bounded(2);
        let producer = thread::spawn(move || {
            for id in 1..=10 {
                tx.send(Row { id, name: "x" }).unwrap();
            }
        });
        let rows = drain("rows", sink, rx).unwrap();
        producer.join().unwrap();

        assert_eq!(rows, 10);
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,name");
        assert_eq!(lines[1], "1,x");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_json_lines_sink() {
        let mut out = Vec::new();
        {
            let mut sink = RecordSink::<Row, _>::from_writer(
                "rows",
                Path::new("mem"),
                &mut out,
                OutputFormat::JsonLines,
            );
            sink.write(&Row { id: 7, name: "a" }).unwrap();
            sink.finish().unwrap();
            assert!(sink.write(&Row { id: 8, name: "b" }).is_err());
        }
        assert_eq!(String::from_utf8(out).unwrap(), "{\"id\":7,\"name\":\"a\"}\n");
    }

    #[test]
    fn test_sink_keeps_draining_after_error() {
        let sink = RecordSink::<Row, _>::from_writer(
            "rows",
            Path::new("broken"),
            FailingWriter {
                limit: 16,
                written: 0,
            },
            OutputFormat::JsonLines,
        );

        // Capacity 1: the producer would deadlock if the sink stopped receiving
        let (tx, rx) = bounded(1);
        let producer = thread::spawn(move || {
            for id in 0..1000 {
                tx.send(Row { id, name: "abc" }).unwrap();
            }
        });

        let err = drain("rows", sink, rx).unwrap_err();
        producer.join().unwrap();
        assert!(matches!(err, GenError::Json { .. } | GenError::Io { .. }), "{:?}", err);
    }

    #[test]
    fn test_csv_write_failure_is_io() {
        let sink = RecordSink::<Row, _>::from_writer(
            "rows",
            Path::new("broken.csv"),
            FailingWriter {
                limit: 16,
                written: 0,
            },
            OutputFormat::Csv,
        );
        let (tx, rx) = bounded(4);
        let producer = thread::spawn(move || {
            // Enough rows to overflow the csv writer's internal buffer
            for id in 0..5000 {
                tx.send(Row { id, name: "abcdef" }).unwrap();
            }
        });

        let err = drain("rows", sink, rx).unwrap_err();
        producer.join().unwrap();
        match err {
            GenError::Io { path, source } => {
                assert_eq!(path, Path::new("broken.csv"));
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_hook_fires_while_producers_run() {
        let sink = RecordSink::<Row, _>::from_writer(
            "rows",
            Path::new("broken"),
            FailingWriter {
                limit: 16,
                written: 0,
            },
            OutputFormat::JsonLines,
        );
        let stop = Arc::new(AtomicBool::new(false));

        // Without the hook this producer never stops and drain never returns
        let (tx, rx) = bounded(1);
        let flag = stop.clone();
        let producer = thread::spawn(move || {
            let mut sent = 0u64;
            while !flag.load(Ordering::Relaxed) {
                tx.send(Row { id: 1, name: "abc" }).unwrap();
                sent += 1;
            }
            sent
        });

        let mut calls = 0;
        let err = drain_with("rows", sink, rx, |_| {
            calls += 1;
            stop.store(true, Ordering::Relaxed);
        })
        .unwrap_err();
        let sent = producer.join().unwrap();

        assert!(matches!(err, GenError::Io { .. }), "{:?}", err);
        assert_eq!(calls, 1);
        assert!(sent >= 1);
    }

    #[test]
    fn test_empty_csv_table_keeps_header() {
        let mut out = Vec::new();
        {
            let sink = RecordSink::<Row, _>::from_writer(
                "rows",
                Path::new("mem"),
                &mut out,
                OutputFormat::Csv,
            );
            let (tx, rx) = bounded::<Row>(1);
            drop(tx);
            assert_eq!(drain("rows", sink, rx).unwrap(), 0);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "id,name\n");
    }

    #[test]
    fn test_empty_json_table_is_empty() {
        let mut out = Vec::new();
        {
            let mut sink = RecordSink::<Row, _>::from_writer(
                "rows",
                Path::new("mem"),
                &mut out,
                OutputFormat::JsonLines,
            );
            sink.finish().unwrap();
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_chunk_sink_writes_header_once() {
        let rows = [Row { id: 1, name: "a" }, Row { id: 2, name: "b" }];
        let chunk = encode_chunk("rows", &rows, OutputFormat::Csv).unwrap();
        assert_eq!(chunk.rows, 2);

        let mut out = Vec::new();
        {
            let sink = ChunkSink::from_writer(
                Path::new("mem"),
                &mut out,
                OutputFormat::Csv.header_line(&["id", "name"]),
            );
            let (tx, rx) = bounded(4);
            tx.send(chunk.clone()).unwrap();
            tx.send(chunk).unwrap();
            drop(tx);
            assert_eq!(drain("rows", sink, rx).unwrap(), 4);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "id,name\n1,a\n2,b\n1,a\n2,b\n");
    }

    #[test]
    fn test_empty_chunk_table_keeps_header() {
        let mut out = Vec::new();
        {
            let sink = ChunkSink::from_writer(
                Path::new("mem"),
                &mut out,
                OutputFormat::Csv.header_line(&["id"]),
            );
            let (tx, rx) = bounded::<Chunk>(1);
            drop(tx);
            assert_eq!(drain("rows", sink, rx).unwrap(), 0);
        }
        assert_eq!(out, b"id\n");
    }

    #[test]
    fn test_json_chunk_has_no_header() {
        assert!(OutputFormat::JsonLines.header_line(&["id"]).is_none());
        let chunk = encode_chunk("rows", &[Row { id: 3, name: "z" }], OutputFormat::JsonLines)
            .unwrap();
        assert_eq!(&chunk.data[..], b"{\"id\":3,\"name\":\"z\"}\n");
    }
}
