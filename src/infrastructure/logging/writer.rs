//! Lock-synchronised writers for the console sink

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use super::config::ConsoleTarget;

/// Writer shared behind a mutex
///
/// The formatting layer renders a whole entry before writing it, and the
/// guard handed out by [`MakeWriter::make_writer`] holds the lock for that
/// single write, so entries from concurrent callers never interleave.
#[derive(Debug)]
pub struct LockedWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for LockedWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> LockedWriter<W> {
    /// Wrap `writer`
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockedWriter<Box<dyn Write + Send>> {
    /// Locked handle on the given console stream
    pub fn console(target: ConsoleTarget) -> Self {
        let stream: Box<dyn Write + Send> = match target {
            ConsoleTarget::Stdout => Box::new(io::stdout()),
            ConsoleTarget::Stderr => Box::new(io::stderr()),
        };
        Self::new(stream)
    }
}

impl LockedWriter<Vec<u8>> {
    /// In-memory buffer, useful to capture console output
    pub fn buffer() -> Self {
        Self::new(Vec::new())
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }
}

/// Guard returned for one write
pub struct LockedWriterGuard<'a, W> {
    guard: MutexGuard<'a, W>,
}

impl<W: Write> Write for LockedWriterGuard<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.guard.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard.flush()
    }
}

impl<'a, W: Write + 'a> MakeWriter<'a> for LockedWriter<W> {
    type Writer = LockedWriterGuard<'a, W>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriterGuard { guard: self.lock() }
    }
}
