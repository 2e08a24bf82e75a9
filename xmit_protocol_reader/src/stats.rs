//! Contains the [InputStatType] enum for which kind of statistics are gathered, and the [Stats] struct for tracking and reporting statistics about the input data.

#[allow(variant_size_differences)] // Allow in this case, the string is already a pointer.
#[derive(Debug, Clone, PartialEq)]
/// Possible stats that the input scanner reports.
pub enum InputStatType {
    /// Fatal error, stop processing.
    Fatal(Box<str>),
    /// Non-fatal error in the input.
    Error(Box<str>),
    /// Increment the total 32-bit words read.
    WordsRead(u32),
    /// Increment the total bytes read.
    BytesRead(u64),
    /// The input ended in the middle of a 32-bit word, holds how many bytes were zero-padded.
    TruncatedTail(u8),
}

/// Report the accumulated count every time this many words have been read.
const WORDS_READ_REPORT_INTERVAL: u32 = 100_000;

/// Struct for tracking and reporting statistics about the input data.
#[derive(Debug)]
pub struct Stats {
    reporter: flume::Sender<InputStatType>,
    words_read: u32,
    bytes_read: u64,
}

impl Stats {
    /// Create a new [Stats] instance.
    pub fn new(reporter: flume::Sender<InputStatType>) -> Self {
        Self {
            reporter,
            words_read: 0,
            bytes_read: 0,
        }
    }

    /// Add to the words read counter, the count is sent in batches.
    pub fn add_words_read(&mut self, words: u32) {
        self.words_read += words;
        if self.words_read >= WORDS_READ_REPORT_INTERVAL {
            self.send(InputStatType::WordsRead(self.words_read));
            self.words_read = 0;
        }
    }

    /// Add to the bytes read counter.
    pub fn add_bytes_read(&mut self, bytes: u64) {
        self.bytes_read += bytes;
    }

    /// Report that the input ended with a partial word.
    pub fn truncated_tail(&mut self, padded_bytes: u8) {
        self.send(InputStatType::TruncatedTail(padded_bytes));
    }

    /// Flush the stats to the reporter channel (sends all the current stats).
    pub fn flush_stats(&mut self) {
        self.send(InputStatType::WordsRead(self.words_read));
        self.send(InputStatType::BytesRead(self.bytes_read));
        self.words_read = 0;
        self.bytes_read = 0;
    }

    fn send(&self, stat: InputStatType) {
        if self.reporter.send(stat).is_err() {
            log::trace!("Input stats receiver dropped, stat discarded");
        }
    }
}
