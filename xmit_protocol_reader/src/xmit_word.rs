//! Classification of the 32-bit words of the XMIT transport stream.
//!
//! The transport multiplexes the FEM readout into packets delimited by two sentinel words.
//! Every other 32-bit word carries two 16-bit FEM words, low half first.

/// Sentinel that opens a packet.
pub const PACKET_HEADER: u32 = 0xFFFF_FFFF;
/// Sentinel that closes a packet.
pub const PACKET_TRAILER: u32 = 0xE000_0000;

/// Kind of a 32-bit XMIT word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmitWordKind {
    /// Packet header sentinel `0xFFFFFFFF`.
    PacketHeader,
    /// Packet trailer sentinel `0xE0000000`.
    PacketTrailer,
    /// Two 16-bit FEM words.
    FemWords,
}

/// Classify a 32-bit XMIT word.
#[inline]
pub fn classify_xmit_word(word: u32) -> XmitWordKind {
    match word {
        PACKET_HEADER => XmitWordKind::PacketHeader,
        PACKET_TRAILER => XmitWordKind::PacketTrailer,
        _ => XmitWordKind::FemWords,
    }
}

/// Split a 32-bit word into its two 16-bit FEM words, in the order they are processed.
///
/// Index 0 is the low half (bits 0-15), index 1 the high half (bits 16-31).
#[inline]
pub fn split_fem_words(word: u32) -> [u16; 2] {
    [(word & 0xFFFF) as u16, (word >> 16) as u16]
}
