//! Wrapper for reading piped input, implements [BufferedReaderWrapper].
use super::bufreader_wrapper::BufferedReaderWrapper;
use std::io::{self, Read};

/// Wrapper for a reader where input data can be read from, implements [BufferedReaderWrapper].
#[derive(Debug)]
pub struct StdInReader<R> {
    /// Generic reader that is wrapped
    pub reader: R,
}

impl StdInReader<io::Stdin> {
    /// Wrap the process stdin.
    pub fn stdin() -> Self {
        Self {
            reader: io::stdin(),
        }
    }
}

impl BufferedReaderWrapper for StdInReader<io::Stdin> {}

impl io::Read for StdInReader<io::Stdin> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.lock().read(buf)
    }
}
