//! Word level definitions of the FEM data carried inside the XMIT stream.
//!
//! Contains the closed set of [WordKind]s, the bit patterns of the supported [StreamVariant]s,
//! the [Huffman](huffman) delta code and the [header](header) field layout.

pub mod header;
pub mod huffman;
pub mod kind;
pub mod variant;

/// Mask for the 12-bit payload carried by header pair words and raw ADC samples.
pub const LOW_12_BITS: u16 = 0xFFF;
/// Mask for the channel id carried by channel headers and trailers.
pub const CHANNEL_ID_MASK: u16 = 0x3F;
/// Number of channels per FEM.
pub const CHANNELS_PER_FEM: usize = 64;
/// Highest valid 12-bit ADC value.
pub const ADC_MAX: u16 = 0xFFF;
/// Sample value marking an implausible (undecodable or out of range) sample.
///
/// Distinguishable from every valid 12-bit ADC value.
pub const SAMPLE_SENTINEL: u16 = 4096;

/// Extract the channel id of a channel header or trailer.
#[inline]
pub fn channel_id(word: u16) -> u8 {
    (word & CHANNEL_ID_MASK) as u8
}
