//! Contains the [WordKind] enum that every classified word maps to.

use crate::util::*;

/// Symbolic type of a word in the stream.
///
/// The first eighteen kinds are produced by the 16-bit classifier, the two packet kinds
/// come from the 32-bit transport words. All of them take part in the transition matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WordKind {
    /// `0xFFFF` in the low half of a 32-bit word, opens a FEM header.
    HeaderFirst,
    /// Module id, crate slot and flags.
    HeaderIdSlot,
    /// Bits 23:12 of the declared word count.
    HeaderWordCountHi,
    /// Bits 11:0 of the declared word count.
    HeaderWordCountLo,
    /// Bits 23:12 of the event number.
    HeaderEventHi,
    /// Bits 11:0 of the event number.
    HeaderEventLo,
    /// Bits 23:12 of the frame number.
    HeaderFrameHi,
    /// Bits 11:0 of the frame number.
    HeaderFrameLo,
    /// Bits 23:12 of the declared checksum.
    HeaderChecksumHi,
    /// Bits 11:0 of the declared checksum.
    HeaderChecksumLo,
    /// First word of the unused sixth header pair.
    HeaderReservedHi,
    /// Second word of the unused sixth header pair, completes the header.
    HeaderReservedLo,
    /// Opens a channel.
    ChannelHeader,
    /// Opens a region of interest inside a channel.
    RoiHeader,
    /// Raw 12-bit ADC sample.
    AdcSample,
    /// Huffman compressed sample deltas.
    AdcHuffman,
    /// Closes a channel.
    ChannelTrailer,
    /// Matched no pattern.
    Unknown,
    /// Packet header sentinel.
    PacketHeader,
    /// Packet trailer sentinel.
    PacketTrailer,
}

impl WordKind {
    /// Number of word kinds.
    pub const COUNT: usize = 20;

    /// All word kinds in index order.
    pub const ALL: [WordKind; WordKind::COUNT] = [
        WordKind::HeaderFirst,
        WordKind::HeaderIdSlot,
        WordKind::HeaderWordCountHi,
        WordKind::HeaderWordCountLo,
        WordKind::HeaderEventHi,
        WordKind::HeaderEventLo,
        WordKind::HeaderFrameHi,
        WordKind::HeaderFrameLo,
        WordKind::HeaderChecksumHi,
        WordKind::HeaderChecksumLo,
        WordKind::HeaderReservedHi,
        WordKind::HeaderReservedLo,
        WordKind::ChannelHeader,
        WordKind::RoiHeader,
        WordKind::AdcSample,
        WordKind::AdcHuffman,
        WordKind::ChannelTrailer,
        WordKind::Unknown,
        WordKind::PacketHeader,
        WordKind::PacketTrailer,
    ];

    /// Index of the kind in [WordKind::ALL] and in the transition matrix.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The header kinds sit at index 0..=11, so the index doubles as the header slot.
    #[inline]
    pub fn header_slot(self) -> Option<u8> {
        let idx = self.index();
        if idx < HEADER_SLOTS {
            Some(idx as u8)
        } else {
            None
        }
    }

    /// Inverse of [WordKind::header_slot].
    #[inline]
    pub fn from_header_slot(slot: u8) -> Option<WordKind> {
        if (slot as usize) < HEADER_SLOTS {
            Some(WordKind::ALL[slot as usize])
        } else {
            None
        }
    }

    /// Returns true for the twelve FEM header kinds.
    #[inline]
    pub fn is_header(self) -> bool {
        self.header_slot().is_some()
    }

    /// Returns true for the two packet sentinel kinds.
    #[inline]
    pub fn is_packet_sentinel(self) -> bool {
        matches!(self, WordKind::PacketHeader | WordKind::PacketTrailer)
    }

    /// Short name used in the transition report.
    pub fn short_name(self) -> &'static str {
        match self {
            WordKind::HeaderFirst => "HdrFirst",
            WordKind::HeaderIdSlot => "HdrIdSlot",
            WordKind::HeaderWordCountHi => "HdrWcHi",
            WordKind::HeaderWordCountLo => "HdrWcLo",
            WordKind::HeaderEventHi => "HdrEvHi",
            WordKind::HeaderEventLo => "HdrEvLo",
            WordKind::HeaderFrameHi => "HdrFrHi",
            WordKind::HeaderFrameLo => "HdrFrLo",
            WordKind::HeaderChecksumHi => "HdrCsHi",
            WordKind::HeaderChecksumLo => "HdrCsLo",
            WordKind::HeaderReservedHi => "HdrResHi",
            WordKind::HeaderReservedLo => "HdrResLo",
            WordKind::ChannelHeader => "ChHdr",
            WordKind::RoiHeader => "RoiHdr",
            WordKind::AdcSample => "Adc",
            WordKind::AdcHuffman => "AdcHuff",
            WordKind::ChannelTrailer => "ChTrl",
            WordKind::Unknown => "Unknown",
            WordKind::PacketHeader => "PktHdr",
            WordKind::PacketTrailer => "PktTrl",
        }
    }
}

/// Number of words in a FEM header, `HeaderFirst` plus five and a half pairs.
pub const HEADER_SLOTS: usize = 12;

impl fmt::Display for WordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
