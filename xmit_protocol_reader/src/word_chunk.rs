//! Contains the [WordChunk] that carries a batch of 32-bit words from the reader to the decoder.

/// A batch of consecutive 32-bit words and the byte offset of the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordChunk {
    words: Vec<u32>,
    mem_pos: u64,
}

impl WordChunk {
    /// Create a chunk from words that were read starting at byte offset `mem_pos`.
    pub fn new(words: Vec<u32>, mem_pos: u64) -> Self {
        Self { words, mem_pos }
    }

    /// Byte offset of the first word in the chunk.
    pub fn mem_pos(&self) -> u64 {
        self.mem_pos
    }

    /// Number of 32-bit words in the chunk.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the chunk holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Borrow the words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Iterate over each word together with its byte offset in the input.
    pub fn iter_with_mem_pos(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(i, w)| (*w, self.mem_pos + (i as u64) * 4))
    }
}
