//! JSON-lines document input
//!
//! One JSON document per line, plain or compressed: gzip for a `.gz`
//! extension, lz4 frames for `.lz4`. Blank lines are skipped. `-` reads
//! standard input.

use crate::error::{Result, StorageError};
use flate2::read::GzDecoder;
use lz4_flex::frame::FrameDecoder;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

/// Compression of a JSON-lines file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Compression {
    None,
    Gzip,
    Lz4,
}

impl Compression {
    pub(crate) fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("lz4") => Compression::Lz4,
            _ => Compression::None,
        }
    }
}

/// Streaming reader of JSON-lines documents
pub struct DocumentReader {
    source: String,
    lines: Lines<Box<dyn BufRead + Send>>,
    line_no: usize,
}

impl DocumentReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new("-") {
            return Ok(Self::new("<stdin>", BufReader::new(io::stdin())));
        }
        let file = File::open(path)?;
        let source = path.display().to_string();
        Ok(match Compression::of(path) {
            Compression::Gzip => Self::new(source, BufReader::new(GzDecoder::new(file))),
            Compression::Lz4 => Self::new(source, BufReader::new(FrameDecoder::new(file))),
            Compression::None => Self::new(source, BufReader::new(file)),
        })
    }

    /// Read documents from any buffered source; `source` names it in errors
    pub fn new(source: impl Into<String>, reader: impl BufRead + Send + 'static) -> Self {
        let reader: Box<dyn BufRead + Send> = Box::new(reader);
        Self {
            source: source.into(),
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Chunks of up to `size` documents
    pub fn batches(self, size: usize) -> Batches {
        Batches {
            reader: self,
            size: size.max(1),
        }
    }

    pub fn read_all(self) -> Result<Vec<Value>> {
        self.collect()
    }
}

impl Iterator for DocumentReader {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|e| StorageError::Parse {
                path: self.source.clone(),
                line: self.line_no,
                message: e.to_string(),
            }));
        }
    }
}

/// Iterator over document batches
pub struct Batches {
    reader: DocumentReader,
    size: usize,
}

impl Iterator for Batches {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.reader.next() {
                Some(Ok(document)) => batch.push(document),
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
