//! The unary-run Huffman code used to compress consecutive ADC sample deltas.
//!
//! An `AdcHuffman` word carries a 14-bit payload. Reading it from the most significant bit,
//! every `1` terminates a run of `0`s and the run length selects a delta:
//!
//! | run   | 0 | 1  | 2  | 3  | 4  | 5  | 6  |
//! |-------|---|----|----|----|----|----|----|
//! | delta | 0 | -1 | +1 | -2 | +2 | -3 | +3 |
//!
//! The most significant symbol is the latest sample in time, zeros left over at the least
//! significant end are padding. Runs longer than 6 cannot be decoded and produce the
//! [SAMPLE_SENTINEL](super::SAMPLE_SENTINEL).

use super::{ADC_MAX, SAMPLE_SENTINEL};

/// Width of the Huffman payload in bits.
pub const HUFFMAN_PAYLOAD_BITS: u32 = 14;
/// Mask selecting the Huffman payload of a word.
pub const HUFFMAN_PAYLOAD_MASK: u16 = 0x3FFF;
/// Longest run of zeros that maps to a delta.
pub const MAX_RUN: u8 = 6;

const RUN_TO_DELTA: [i8; MAX_RUN as usize + 1] = [0, -1, 1, -2, 2, -3, 3];

/// One decoded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuffmanSymbol {
    /// A sample delta in `-3..=3`.
    Delta(i8),
    /// A run longer than [MAX_RUN], holds the run length.
    InvalidRun(u8),
}

/// Map a run length to its delta.
#[inline]
pub fn run_to_delta(run: u8) -> Option<i8> {
    RUN_TO_DELTA.get(run as usize).copied()
}

/// Map a delta to the run length that encodes it.
#[inline]
pub fn delta_to_run(delta: i8) -> Option<u8> {
    RUN_TO_DELTA
        .iter()
        .position(|d| *d == delta)
        .map(|run| run as u8)
}

/// The symbols of one Huffman payload in time order, earliest first.
///
/// A payload has at most 14 terminated runs so the symbols are stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedHuffman {
    symbols: [HuffmanSymbol; HUFFMAN_PAYLOAD_BITS as usize],
    len: u8,
}

impl DecodedHuffman {
    /// Decode the low 14 bits of `word`.
    pub fn decode(word: u16) -> Self {
        let payload = word & HUFFMAN_PAYLOAD_MASK;
        let mut symbols = [HuffmanSymbol::Delta(0); HUFFMAN_PAYLOAD_BITS as usize];
        let mut len = 0;
        let mut run: u8 = 0;
        for bit in (0..HUFFMAN_PAYLOAD_BITS).rev() {
            if payload & (1 << bit) == 0 {
                run += 1;
                continue;
            }
            symbols[len] = match run_to_delta(run) {
                Some(delta) => HuffmanSymbol::Delta(delta),
                None => HuffmanSymbol::InvalidRun(run),
            };
            len += 1;
            run = 0;
        }
        // Scanned latest first
        symbols[..len].reverse();
        Self {
            symbols,
            len: len as u8,
        }
    }

    /// The decoded symbols, earliest sample first.
    pub fn symbols(&self) -> &[HuffmanSymbol] {
        &self.symbols[..self.len as usize]
    }

    /// Returns true if no symbol was terminated in the payload.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of invalid runs in the payload.
    pub fn invalid_runs(&self) -> usize {
        self.symbols()
            .iter()
            .filter(|s| matches!(s, HuffmanSymbol::InvalidRun(_)))
            .count()
    }
}

/// Outcome of reconstructing one sample from a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconstructed {
    /// A valid 12-bit sample.
    Sample(u16),
    /// The symbol could not be decoded.
    InvalidRun,
    /// The delta moved the value outside the ADC range.
    OutOfRange(i32),
}

/// Apply decoded symbols to `baseline` and push the samples onto `out`.
///
/// Implausible samples are pushed as the [SAMPLE_SENTINEL] and do not move the baseline.
/// Returns the new baseline and calls `on_implausible` once per sentinel that was pushed.
pub fn reconstruct_into(
    decoded: &DecodedHuffman,
    mut baseline: u16,
    out: &mut Vec<u16>,
    mut on_implausible: impl FnMut(Reconstructed),
) -> u16 {
    for symbol in decoded.symbols() {
        let outcome = match *symbol {
            HuffmanSymbol::Delta(delta) => {
                let value = i32::from(baseline) + i32::from(delta);
                if (0..=i32::from(ADC_MAX)).contains(&value) {
                    Reconstructed::Sample(value as u16)
                } else {
                    Reconstructed::OutOfRange(value)
                }
            }
            HuffmanSymbol::InvalidRun(_) => Reconstructed::InvalidRun,
        };
        match outcome {
            Reconstructed::Sample(sample) => {
                out.push(sample);
                baseline = sample;
            }
            implausible => {
                out.push(SAMPLE_SENTINEL);
                on_implausible(implausible);
            }
        }
    }
    baseline
}

/// Encode deltas (time order, earliest first) into one Huffman word with the given prefix bits.
///
/// Returns `None` if a delta is outside `-3..=3` or the code does not fit in 14 bits.
pub fn encode(deltas: &[i8], prefix: u16) -> Option<u16> {
    let mut payload: u32 = 0;
    let mut used: u32 = 0;
    // Latest sample goes to the most significant end
    for delta in deltas.iter().rev() {
        let run = u32::from(delta_to_run(*delta)?);
        used += run + 1;
        if used > HUFFMAN_PAYLOAD_BITS {
            return None;
        }
        payload |= 1 << (HUFFMAN_PAYLOAD_BITS - used);
    }
    Some(prefix | payload as u16)
}
