//! Contains the [InputScanner], responsible for reading 32-bit words from the input and forwarding them in chunks.

use super::bufreader_wrapper::BufferedReaderWrapper;
use super::stats::InputStatType;
use super::stats::Stats;
use super::word_chunk::WordChunk;
use byteorder::{ByteOrder, LittleEndian};
use owo_colors::OwoColorize;
use std::io;

/// Size of an XMIT word in bytes
pub const XMIT_WORD_SIZE: usize = 4;

/// Scans data read through a [BufferedReaderWrapper], tracks the position in memory and sends [InputStatType] through the [`flume::Sender<InputStatType>`] channel.
///
/// The input is read as little-endian 32-bit words. If the input ends in the middle of a word,
/// the missing bytes are zero-padded and the word is still forwarded.
#[derive(Debug)]
pub struct InputScanner<R: ?Sized + BufferedReaderWrapper> {
    reader: Box<R>,
    mem_pos: u64,
    stats_controller_sender_ch: Option<flume::Sender<InputStatType>>,
    stats: Option<Stats>,
    reached_eof: bool,
}

impl<R: ?Sized + BufferedReaderWrapper> InputScanner<R> {
    /// Creates a new [InputScanner] from a [BufferedReaderWrapper] and a producer channel for [InputStatType].
    pub fn new(
        reader: Box<R>,
        stats_controller_sender_ch: Option<flume::Sender<InputStatType>>,
    ) -> Self {
        InputScanner {
            reader,
            mem_pos: 0,
            stats_controller_sender_ch: stats_controller_sender_ch.clone(),
            stats: stats_controller_sender_ch.map(Stats::new),
            reached_eof: false,
        }
    }

    /// Creates a new [InputScanner] that does not report any stats.
    pub fn minimal(reader: Box<R>) -> Self {
        Self::new(reader, None)
    }

    /// Byte offset of the next word to be read.
    pub fn current_mem_pos(&self) -> u64 {
        self.mem_pos
    }

    #[inline(always)]
    fn report(&self, stat: InputStatType) {
        if let Some(stats_sender) = self.stats_controller_sender_ch.as_ref() {
            if stats_sender.send(stat).is_err() {
                log::trace!("Stats receiver dropped");
            }
        }
    }

    /// Reads up to `max_words` 32-bit words.
    ///
    /// Returns a chunk with fewer words if the end of the input is reached,
    /// and an [UnexpectedEof](io::ErrorKind::UnexpectedEof) error if no words could be read at all.
    pub fn load_chunk(&mut self, max_words: usize) -> io::Result<WordChunk> {
        if self.reached_eof {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "End of input already reached",
            ));
        }
        let mut buf = vec![0_u8; max_words * XMIT_WORD_SIZE];
        let filled = match self.fill_buf(&mut buf) {
            Ok(filled) => filled,
            Err(e) => {
                self.report(InputStatType::Fatal(
                    format!("Failed reading input at {:#X}: {e}", self.mem_pos).into(),
                ));
                return Err(e);
            }
        };
        if filled < buf.len() {
            self.reached_eof = true;
        }
        if filled == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "No more words in input",
            ));
        }

        let word_count = filled.div_ceil(XMIT_WORD_SIZE);
        let padded = word_count * XMIT_WORD_SIZE - filled;
        if padded > 0 {
            // The buffer is zero-initialized so the tail is already padded
            log::warn!(
                "{}",
                format!(
                    "Input ends with a partial word at {:#X}, {padded} byte(s) zero-padded",
                    self.mem_pos + (filled - (filled % XMIT_WORD_SIZE)) as u64
                )
                .yellow()
            );
            if let Some(stats) = self.stats.as_mut() {
                stats.truncated_tail(padded as u8);
            }
        }

        let mut words = vec![0_u32; word_count];
        LittleEndian::read_u32_into(&buf[..word_count * XMIT_WORD_SIZE], &mut words);

        let chunk = WordChunk::new(words, self.mem_pos);
        self.mem_pos += filled as u64;
        if let Some(stats) = self.stats.as_mut() {
            stats.add_words_read(word_count as u32);
            stats.add_bytes_read(filled as u64);
        }
        Ok(chunk)
    }

    // Read until the buffer is full or the reader is exhausted
    fn fill_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R> Drop for InputScanner<R>
where
    R: ?Sized + BufferedReaderWrapper,
{
    fn drop(&mut self) {
        if let Some(mut stat_tracker) = self.stats.take() {
            stat_tracker.flush_stats();
        }
    }
}
