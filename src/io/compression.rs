//! Transparent compression selected by file extension.
//!
//! When enabled via feature flags, the following codecs are available:
//! - **Gzip** (`.gz`, `.gzip`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`, `.zstd`) - via `zstd` (feature: `compression-zstd`)
//!
//! Both formats allow concatenated members/frames, so appending a compressed
//! block to an existing compressed file keeps it readable as one stream. Paths
//! with no matching extension are read and written as plain text.

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A compression format bound to one or more file extensions.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip").
    fn name(&self) -> &'static str;

    /// Lowercase extensions with the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Sink>>;
}

/// A writer that must be explicitly closed to emit trailing bytes.
pub trait Sink: Write {
    /// Flush buffered data and write any format trailer.
    fn close(self: Box<Self>) -> std::io::Result<()>;
}

impl<W: Write> Sink for BufWriter<W> {
    fn close(mut self: Box<Self>) -> std::io::Result<()> {
        self.flush()
    }
}

static CODECS: &[&dyn CompressionCodec] = &[
    #[cfg(feature = "compression-gzip")]
    &GzipCodec,
    #[cfg(feature = "compression-zstd")]
    &ZstdCodec,
];

/// The codec whose extension ends `path`, compared case-insensitively.
#[must_use]
pub fn detect(path: &Path) -> Option<&'static dyn CompressionCodec> {
    let name = path.to_string_lossy().to_lowercase();
    CODECS
        .iter()
        .copied()
        .find(|codec| codec.extensions().iter().any(|ext| name.ends_with(ext)))
}

/// Wrap `reader` with the decompressor matching `path`, if any.
///
/// # Errors
/// Returns the codec's initialization error.
pub fn wrap_reader<R: Read + 'static>(reader: R, path: &Path) -> std::io::Result<Box<dyn Read>> {
    let buffered: Box<dyn Read> = Box::new(BufReader::new(reader));
    match detect(path) {
        Some(codec) => {
            tracing::trace!(codec = codec.name(), path = %path.display(), "decompressing input");
            codec.wrap_reader(buffered)
        }
        None => Ok(buffered),
    }
}

/// Wrap `writer` with the compressor matching `path`, if any.
///
/// # Errors
/// Returns the codec's initialization error.
pub fn wrap_writer<W: Write + 'static>(writer: W, path: &Path) -> std::io::Result<Box<dyn Sink>> {
    match detect(path) {
        Some(codec) => {
            tracing::trace!(codec = codec.name(), path = %path.display(), "compressing output");
            codec.wrap_writer(Box::new(BufWriter::new(writer)))
        }
        None => Ok(Box::new(BufWriter::new(writer))),
    }
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
struct GzipSink(flate2::write::GzEncoder<Box<dyn Write>>);

#[cfg(feature = "compression-gzip")]
impl Write for GzipSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

#[cfg(feature = "compression-gzip")]
impl Sink for GzipSink {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        let GzipSink(encoder) = *self;
        encoder.finish()?.flush()
    }
}

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".gz", ".gzip"]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        // Appended writes produce one gzip member each.
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Sink>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzipSink(GzEncoder::new(writer, Compression::default()))))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
struct ZstdSink(zstd::stream::write::Encoder<'static, Box<dyn Write>>);

#[cfg(feature = "compression-zstd")]
impl Write for ZstdSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

#[cfg(feature = "compression-zstd")]
impl Sink for ZstdSink {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        let ZstdSink(encoder) = *self;
        encoder.finish()?.flush()
    }
}

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zst", ".zstd"]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Sink>> {
        zstd::stream::write::Encoder::new(writer, 3).map(|e| Box::new(ZstdSink(e)) as Box<dyn Sink>)
    }
}
