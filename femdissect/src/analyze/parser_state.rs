//! Contains the [ParserState] carried between words and the [classify] function
//! that assigns every 16-bit FEM word a [WordKind].

use crate::util::*;
use crate::words::header::{HEADER_FIRST, HEADER_PREFIX};
use crate::words::kind::{WordKind, HEADER_SLOTS};
use crate::words::variant::StreamVariant;

/// Number of recent 16-bit words kept for error context.
pub const RECENT_WORDS_CAPACITY: usize = 32;

const TOP_NIBBLE_MASK: u16 = 0xF000;

/// Counts of observed (current, previous) word kind pairs, indexed `[current][previous]`.
pub type TransitionMatrix = [[u64; WordKind::COUNT]; WordKind::COUNT];

/// State that persists across words of one stream.
pub struct ParserState {
    header_slot: u8,
    prev_kind: Option<WordKind>,
    recent_words: ConstGenericRingBuffer<u16, RECENT_WORDS_CAPACITY>,
    transitions: TransitionMatrix,
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserState {
    /// Fresh state, no header in progress and no previous word.
    pub fn new() -> Self {
        Self {
            header_slot: 0,
            prev_kind: None,
            recent_words: ConstGenericRingBuffer::new(),
            transitions: [[0; WordKind::COUNT]; WordKind::COUNT],
        }
    }

    /// Index of the next expected header word, 0 when no header is in progress.
    pub fn header_slot(&self) -> u8 {
        self.header_slot
    }

    /// Abandon a header in progress.
    pub fn reset_header_slot(&mut self) {
        self.header_slot = 0;
    }

    /// Kind of the previous word, `None` before the first word.
    pub fn prev_kind(&self) -> Option<WordKind> {
        self.prev_kind
    }

    /// Remember a raw 16-bit word for error context.
    pub fn push_recent(&mut self, word: u16) {
        self.recent_words.push(word);
    }

    /// Remember both halves of a 32-bit packet sentinel, low half first.
    pub fn push_recent_xmit(&mut self, word: u32) {
        self.push_recent(word as u16);
        self.push_recent((word >> 16) as u16);
    }

    /// The recent words as a hex dump, oldest first.
    pub fn recent_words_dump(&self) -> String {
        self.recent_words
            .iter()
            .map(|w| format!("{w:04X}"))
            .join(" ")
    }

    /// Tally the transition from the previous kind to `kind` and make `kind` the previous kind.
    ///
    /// Returns the previous kind when the pair is not an expected adjacency.
    pub fn record_transition(&mut self, kind: WordKind) -> Option<WordKind> {
        let anomalous_prev = match self.prev_kind {
            Some(prev) => {
                self.transitions[kind.index()][prev.index()] += 1;
                if super::protocol_validator::is_adjacent(prev, kind) {
                    None
                } else {
                    Some(prev)
                }
            }
            None => None,
        };
        self.prev_kind = Some(kind);
        anomalous_prev
    }

    /// The transition counts, indexed `[current][previous]`.
    pub fn transitions(&self) -> &TransitionMatrix {
        &self.transitions
    }
}

/// Classify a 16-bit FEM word.
///
/// `order` is the position of the word within its 32-bit XMIT word (0 for the low half).
/// The header pair words only classify as such when they continue a header started by a
/// `0xFFFF` in the low half, which keeps body words with an `F` top nibble from being
/// taken for header words.
pub fn classify(word: u16, order: u8, state: &mut ParserState, variant: StreamVariant) -> WordKind {
    state.push_recent(word);

    if word == HEADER_FIRST && order == 0 && state.header_slot == 0 {
        state.header_slot = 1;
        return WordKind::HeaderFirst;
    }

    if (1..HEADER_SLOTS as u8).contains(&state.header_slot)
        && word & TOP_NIBBLE_MASK == HEADER_PREFIX
        && state.header_slot % 2 == order
    {
        if let Some(kind) = WordKind::from_header_slot(state.header_slot) {
            state.header_slot = (state.header_slot + 1) % HEADER_SLOTS as u8;
            return kind;
        }
    }

    state.header_slot = 0;
    variant.classify_body(word)
}
