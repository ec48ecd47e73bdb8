//! Feature matrix output

use crate::error::Result;
use crate::reader::Compression;
use flate2::write::GzEncoder;
use jsonvec_core::SparseBoolMatrix;
use lz4_flex::frame::FrameEncoder;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Output sink, compressed for `.gz` and `.lz4` paths, standard output for `-`
///
/// Compressed streams are finished when the sink is dropped.
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<Box<dyn Write>> {
    let path = path.as_ref();
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = BufWriter::new(File::create(path)?);
    let sink: Box<dyn Write> = match Compression::of(path) {
        Compression::Gzip => Box::new(GzEncoder::new(file, flate2::Compression::default())),
        Compression::Lz4 => Box::new(FrameEncoder::new(file).auto_finish()),
        Compression::None => Box::new(file),
    };
    Ok(sink)
}

/// Write each matrix row as a JSON array of hot columns, one per line
pub fn write_rows<W: Write + ?Sized>(writer: &mut W, matrix: &SparseBoolMatrix) -> Result<()> {
    for row in matrix.rows() {
        serde_json::to_writer(&mut *writer, row)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
