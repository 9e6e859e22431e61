use std::io::{self, Read, Write};

/// Writer adapter that counts the bytes accepted by the wrapped sink.
pub(crate) struct CountingWriter<W> {
    inner: W,
    bytes: u64,
}

impl<W> CountingWriter<W> {
    pub(crate) const fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    pub(crate) const fn bytes(&self) -> u64 {
        self.bytes
    }

    pub(crate) const fn inner_ref(&self) -> &W {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub(crate) fn into_parts(self) -> (W, u64) {
        (self.inner, self.bytes)
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(written as u64);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader adapter that remembers whether the wrapped source itself failed.
///
/// Codecs surface source errors and their own decoding errors through the
/// same `io::Error` channel; the flag lets the decoder tell them apart.
pub(crate) struct SourceReader<R> {
    inner: R,
    failed: bool,
}

impl<R> SourceReader<R> {
    pub(crate) const fn new(inner: R) -> Self {
        Self {
            inner,
            failed: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.failed = false;
    }

    pub(crate) const fn failed(&self) -> bool {
        self.failed
    }

    pub(crate) const fn get_ref(&self) -> &R {
        &self.inner
    }

    pub(crate) fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for SourceReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(read) => Ok(read),
            Err(err) => {
                // Interrupted reads are retried by the codecs and never surface.
                if err.kind() != io::ErrorKind::Interrupted {
                    self.failed = true;
                }
                Err(err)
            }
        }
    }
}
