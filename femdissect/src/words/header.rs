//! Contains the [FemHeader] fields and the [HeaderFieldAccumulator] that assembles them from the twelve header words.
//!
//! The header opens with `0xFFFF` followed by eleven words with top nibble `0xF`.
//! After the id/slot word come five pairs, each carrying a 24-bit field as 12-bit MSB and LSB halves:
//! word count, event number, frame number, checksum and a sixth pair that is not defined and is discarded.

use super::kind::WordKind;
use super::variant::StreamVariant;
use super::LOW_12_BITS;
use crate::util::*;

/// Mask for the 24-bit header fields.
pub const FIELD_MASK: u32 = 0xFF_FFFF;
/// Top nibble of every header word after `HeaderFirst`.
pub const HEADER_PREFIX: u16 = 0xF000;
/// The first header word.
pub const HEADER_FIRST: u16 = 0xFFFF;

/// Decoded header of one FEM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FemHeader {
    /// Module id, 4 bits (SN) or 7 bits (legacy).
    pub module_id: u8,
    /// Crate slot, 5 bits.
    pub slot: u8,
    /// Test flag.
    pub test: bool,
    /// Overflow flag.
    pub overflow: bool,
    /// Full flag.
    pub full: bool,
    /// Declared number of body words.
    pub word_count: u32,
    /// Event number.
    pub event: u32,
    /// Frame number.
    pub frame: u32,
    /// Declared checksum of the body words.
    pub checksum: u32,
}

impl FemHeader {
    /// Decode the `HeaderIdSlot` word into the id, slot and flag fields.
    pub fn set_id_slot(&mut self, word: u16, variant: StreamVariant) {
        self.slot = (word & 0x1F) as u8;
        self.module_id = variant.module_id(word);
        if variant.has_header_flags() {
            self.test = (word >> 9) & 1 == 1;
            self.overflow = (word >> 10) & 1 == 1;
            self.full = (word >> 11) & 1 == 1;
        }
    }
}

/// Which half of a 24-bit field a header word carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Hi,
    Lo,
}

/// Set one 12-bit half of a 24-bit field, leaving the other half untouched.
#[inline]
fn set_half(field: &mut u32, half: Half, word: u16) {
    let bits = u32::from(word & LOW_12_BITS);
    *field = match half {
        Half::Hi => (*field & 0xFFF) | (bits << 12),
        Half::Lo => (*field & 0xFF_F000) | bits,
    };
}

/// Assembles a [FemHeader] from classified header words.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderFieldAccumulator {
    header: FemHeader,
    variant: StreamVariant,
    complete: bool,
}

impl HeaderFieldAccumulator {
    /// New accumulator for the given stream variant.
    pub fn new(variant: StreamVariant) -> Self {
        Self {
            header: FemHeader::default(),
            variant,
            complete: false,
        }
    }

    /// Start over for the next header.
    pub fn reset(&mut self) {
        self.header = FemHeader::default();
        self.complete = false;
    }

    /// Add a header word to the fields.
    ///
    /// Returns true when the word completes the header. Non-header kinds are ignored.
    pub fn accumulate(&mut self, kind: WordKind, word: u16) -> bool {
        let h = &mut self.header;
        match kind {
            WordKind::HeaderFirst => self.complete = false,
            WordKind::HeaderIdSlot => h.set_id_slot(word, self.variant),
            WordKind::HeaderWordCountHi => set_half(&mut h.word_count, Half::Hi, word),
            WordKind::HeaderWordCountLo => set_half(&mut h.word_count, Half::Lo, word),
            WordKind::HeaderEventHi => set_half(&mut h.event, Half::Hi, word),
            WordKind::HeaderEventLo => set_half(&mut h.event, Half::Lo, word),
            WordKind::HeaderFrameHi => set_half(&mut h.frame, Half::Hi, word),
            WordKind::HeaderFrameLo => set_half(&mut h.frame, Half::Lo, word),
            WordKind::HeaderChecksumHi => set_half(&mut h.checksum, Half::Hi, word),
            WordKind::HeaderChecksumLo => set_half(&mut h.checksum, Half::Lo, word),
            // Contents of the sixth pair are undefined
            WordKind::HeaderReservedHi => (),
            WordKind::HeaderReservedLo => self.complete = true,
            WordKind::ChannelHeader
            | WordKind::RoiHeader
            | WordKind::AdcSample
            | WordKind::AdcHuffman
            | WordKind::ChannelTrailer
            | WordKind::Unknown
            | WordKind::PacketHeader
            | WordKind::PacketTrailer => (),
        }
        self.complete
    }

    /// The fields assembled so far.
    pub fn header(&self) -> &FemHeader {
        &self.header
    }

    /// Returns true once the `HeaderReservedLo` word was accumulated.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Split a 24-bit field into its (Hi, Lo) header words, including the `0xF` prefix.
pub fn encode_field(value: u32) -> [u16; 2] {
    let value = value & FIELD_MASK;
    [
        HEADER_PREFIX | ((value >> 12) as u16 & LOW_12_BITS),
        HEADER_PREFIX | (value as u16 & LOW_12_BITS),
    ]
}

/// Encode a full header as its twelve 16-bit words in stream order.
///
/// Used to build synthetic streams, the inverse of [HeaderFieldAccumulator].
pub fn encode_header(header: &FemHeader, variant: StreamVariant) -> [u16; 12] {
    let id_bits = match variant {
        StreamVariant::Sn => u16::from(header.module_id & 0xF),
        StreamVariant::Legacy => u16::from(header.module_id & 0x7F),
    };
    let mut id_slot = HEADER_PREFIX | (u16::from(header.slot) & 0x1F) | (id_bits << 5);
    if variant.has_header_flags() {
        id_slot |= u16::from(header.test) << 9
            | u16::from(header.overflow) << 10
            | u16::from(header.full) << 11;
    }
    let [wc_hi, wc_lo] = encode_field(header.word_count);
    let [ev_hi, ev_lo] = encode_field(header.event);
    let [fr_hi, fr_lo] = encode_field(header.frame);
    let [cs_hi, cs_lo] = encode_field(header.checksum);
    [
        HEADER_FIRST,
        id_slot,
        wc_hi,
        wc_lo,
        ev_hi,
        ev_lo,
        fr_hi,
        fr_lo,
        cs_hi,
        cs_lo,
        HEADER_PREFIX,
        HEADER_PREFIX,
    ]
}
