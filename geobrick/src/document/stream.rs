use std::io::{self, BufWriter, Write};

/// Buffered output that knows its absolute position in the file.
///
/// Writes are append only, the position is where the next byte lands.
pub(crate) struct OutputStream<W: Write> {
    inner: BufWriter<W>,
    position: u64,
}

impl<W: Write> OutputStream<W> {
    /// `position` is the current length of the file `inner` appends to.
    pub fn new(inner: W, position: u64) -> Self {
        Self {
            inner: BufWriter::new(inner),
            position,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// The unbuffered stream. Everything written so far is flushed first.
    pub fn get_mut(&mut self) -> io::Result<&mut W> {
        self.inner.flush()?;
        Ok(self.inner.get_mut())
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> Write for OutputStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
