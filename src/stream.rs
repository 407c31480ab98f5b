//! Composable reader/writer adapters used to build the command's I/O endpoints.
//!
//! Every adapter is a small wrapper implementing [`Read`] or [`Write`]:
//! - [`LogWriter`]: one log record per write at a fixed level
//! - [`RedactingWriter`]: redacts text before handing it to the inner writer
//! - [`FlaggingWriter`]: discards data, remembers that something was written
//! - [`MultiWriter`]: fans each write out to several writers
//! - [`TeeReader`]: copies everything read into a writer

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::Level;

use crate::error::{ExecOptionsError, Result};
use crate::logging::Logger;
use crate::redact::Redactor;

/// Writer that turns each write into exactly one log record.
#[derive(Clone)]
pub struct LogWriter {
    logger: Arc<dyn Logger>,
    level: Level,
}

impl LogWriter {
    /// Create a log writer emitting at `level`.
    pub fn new(logger: Arc<dyn Logger>, level: Level) -> Self {
        Self { logger, level }
    }

    /// Level this writer logs at.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.logger.log(self.level, &String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogWriter").field("level", &self.level).finish()
    }
}

/// Writer that redacts each write before forwarding it.
///
/// Reports the length of the original buffer as written.
#[derive(Debug)]
pub struct RedactingWriter<W: Write> {
    inner: W,
    redactor: Redactor,
}

impl<W: Write> RedactingWriter<W> {
    /// Wrap `inner` with the given redaction chain.
    pub fn new(inner: W, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let redacted = self.redactor.redact(&String::from_utf8_lossy(buf));
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Shared flag recording that a non-empty write happened.
///
/// Starts unset and never resets.
#[derive(Debug, Clone, Default)]
pub struct WriteFlag(Arc<AtomicBool>);

impl WriteFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a non-empty write was seen.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Discarding writer that sets a [`WriteFlag`] on the first non-empty write.
#[derive(Debug, Clone)]
pub struct FlaggingWriter {
    flag: WriteFlag,
}

impl FlaggingWriter {
    /// Create a writer that sets `flag`.
    pub fn new(flag: WriteFlag) -> Self {
        Self { flag }
    }
}

impl Write for FlaggingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !buf.is_empty() {
            self.flag.set();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that duplicates each write to all members, in order.
///
/// Every member must accept the whole buffer; the first failure is returned
/// as is and later members are not written to. With no members, writes are
/// discarded.
#[derive(Default)]
pub struct MultiWriter<'a> {
    writers: Vec<Box<dyn Write + Send + 'a>>,
}

impl<'a> MultiWriter<'a> {
    /// Create an empty fan-out writer.
    pub fn new() -> Self {
        Self {
            writers: Vec::new(),
        }
    }

    /// Append a member.
    pub fn push<W: Write + Send + 'a>(&mut self, writer: W) {
        self.writers.push(Box::new(writer));
    }

    /// Builder form of [`MultiWriter::push`].
    pub fn with<W: Write + Send + 'a>(mut self, writer: W) -> Self {
        self.push(writer);
        self
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.writers.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl Write for MultiWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for writer in &mut self.writers {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}

impl fmt::Debug for MultiWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiWriter")
            .field("writers", &self.writers.len())
            .finish()
    }
}

/// Reader that writes everything it reads into a writer, as it is read.
#[derive(Debug)]
pub struct TeeReader<R: Read, W: Write> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> TeeReader<R, W> {
    /// Create a tee from `reader` into `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.writer.write_all(&buf[..n])?;
        }
        Ok(n)
    }
}

/// Size of an input source, as far as it can be told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderSize {
    /// Number of bytes that will be read.
    Known(u64),
    /// Source kind does not expose a size.
    Unknown,
    /// Interactive character device such as a terminal.
    CharDevice,
}

/// Command input source.
pub enum InputSource<'a> {
    /// In-memory data.
    Bytes(Cursor<Vec<u8>>),
    /// File on disk (or a device).
    File(File),
    /// Any other reader.
    Reader(Box<dyn Read + Send + 'a>),
}

impl<'a> InputSource<'a> {
    /// Source from an in-memory buffer.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Cursor::new(data.into()))
    }

    /// Source from an arbitrary reader.
    pub fn reader<R: Read + Send + 'a>(reader: R) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Determine how much data the source holds.
    ///
    /// Only a failing stat on a file is an error.
    pub fn size(&self) -> Result<ReaderSize> {
        match self {
            Self::Bytes(cursor) => {
                let len = cursor.get_ref().len() as u64;
                Ok(ReaderSize::Known(len.saturating_sub(cursor.position())))
            }
            Self::File(file) => {
                let meta = file.metadata().map_err(ExecOptionsError::ReaderStat)?;
                if is_char_device(&meta) {
                    return Ok(ReaderSize::CharDevice);
                }
                Ok(ReaderSize::Known(meta.len()))
            }
            Self::Reader(_) => Ok(ReaderSize::Unknown),
        }
    }
}

impl Read for InputSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Bytes(cursor) => cursor.read(buf),
            Self::File(file) => file.read(buf),
            Self::Reader(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for InputSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(cursor) => f.debug_tuple("Bytes").field(&cursor.get_ref().len()).finish(),
            Self::File(file) => f.debug_tuple("File").field(file).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

#[cfg(unix)]
fn is_char_device(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    meta.file_type().is_char_device()
}

#[cfg(not(unix))]
fn is_char_device(_meta: &std::fs::Metadata) -> bool {
    false
}
