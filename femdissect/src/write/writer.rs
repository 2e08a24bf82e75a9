//! Writes packet records to file/stdout as JSON lines. Uses a buffer to reduce the amount of syscalls.
//!
//! Receives packets incrementally and once a certain amount of serialized data is reached, it will
//! write it out to file/stdout.
//! Implements drop to flush the remaining data once processing is done.

use crate::config::streams::StreamOpt;
use crate::records::PacketRecord;
use crate::util::*;

/// Trait for a writer that can write decoded packets to file/stdout.
pub trait Writer {
    /// Write data to file/stdout
    fn write(&mut self, data: &[u8]) -> io::Result<()>;
    /// Serialize a packet into the buffer, flushing first if the buffer is full
    fn push_packet(&mut self, packet: &PacketRecord) -> io::Result<()>;
    /// Flush the buffer to file/stdout
    fn flush(&mut self) -> io::Result<()>;
}

/// A writer that uses a buffer to reduce the amount of syscalls.
#[derive(Debug)]
pub struct BufferedWriter {
    line_buffer: Vec<u8>,
    buf_writer: Option<io::BufWriter<fs::File>>, // If no file is specified -> write to stdout
    max_buffer_size: usize,
}

impl BufferedWriter {
    /// Create a new BufferedWriter from a config and a max buffer size in bytes.
    pub fn new(config: &impl StreamOpt, max_buffer_size: usize) -> io::Result<Self> {
        let buf_writer = match config.packet_output() {
            DataOutputMode::File(path) => {
                let file = fs::File::create(path)?;
                Some(io::BufWriter::new(file))
            }
            DataOutputMode::Stdout | DataOutputMode::None => None,
        };
        Ok(BufferedWriter {
            line_buffer: Vec::with_capacity(max_buffer_size),
            buf_writer,
            max_buffer_size,
        })
    }

    /// Number of bytes waiting to be written.
    pub fn buffered_len(&self) -> usize {
        self.line_buffer.len()
    }
}

impl Writer for BufferedWriter {
    #[inline]
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        match &mut self.buf_writer {
            Some(buf_writer) => {
                io::Write::write_all(buf_writer, data)?;
                io::Write::flush(buf_writer)
            }
            None => io::Write::write_all(&mut io::stdout().lock(), data),
        }
    }

    #[inline]
    fn push_packet(&mut self, packet: &PacketRecord) -> io::Result<()> {
        if self.line_buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }
        serde_json::to_writer(&mut self.line_buffer, packet)?;
        self.line_buffer.push(b'\n');
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        if self.line_buffer.is_empty() {
            return Ok(());
        }
        let data = mem::take(&mut self.line_buffer);
        let res = self.write(&data);
        // Keep the allocation for the next batch
        self.line_buffer = data;
        self.line_buffer.clear();
        res
    }
}

impl Drop for BufferedWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            // A closed stdout pipe is not worth reporting
            if e.kind() != io::ErrorKind::BrokenPipe {
                crate::display_error(&format!("Failed to flush output: {e}"));
            }
        }
    }
}
