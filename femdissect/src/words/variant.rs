//! Contains the [StreamVariant] enum that selects the body word bit patterns.
//!
//! | Word           | SN stream              | Legacy stream          |
//! |----------------|------------------------|------------------------|
//! | ChannelHeader  | `w & 0xF000 == 0x1000` | `w & 0xF000 == 0x4000` |
//! | RoiHeader      | `w & 0xF000 == 0x4000` | -                      |
//! | AdcSample      | `w & 0xF000 == 0x2000` | `w & 0xF000 == 0x0000` |
//! | AdcHuffman     | `w & 0xC000 == 0xC000` | `w & 0xC000 == 0x8000` |
//! | ChannelTrailer | `w & 0xF000 == 0x3000` | `w & 0xF000 == 0x5000` |
//! | Module id      | bits 5-8               | bits 5-11              |

use super::kind::WordKind;
use crate::util::*;

const TOP_NIBBLE: u16 = 0xF000;
const TOP_TWO_BITS: u16 = 0xC000;

/// Wire format variant of the FEM body words.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamVariant {
    /// Supernova stream, channels carry frame check bits and ROI headers.
    #[default]
    Sn,
    /// Neutrino stream, the older format with 7-bit module ids and no ROI headers.
    Legacy,
}

impl StreamVariant {
    /// Match a word against the body patterns of this variant.
    ///
    /// Returns [WordKind::Unknown] if no pattern matches.
    #[inline]
    pub fn classify_body(self, word: u16) -> WordKind {
        match self {
            StreamVariant::Sn => match word & TOP_NIBBLE {
                0x1000 => WordKind::ChannelHeader,
                0x2000 => WordKind::AdcSample,
                0x3000 => WordKind::ChannelTrailer,
                0x4000 => WordKind::RoiHeader,
                _ if word & TOP_TWO_BITS == 0xC000 => WordKind::AdcHuffman,
                _ => WordKind::Unknown,
            },
            StreamVariant::Legacy => match word & TOP_NIBBLE {
                0x0000 => WordKind::AdcSample,
                0x4000 => WordKind::ChannelHeader,
                0x5000 => WordKind::ChannelTrailer,
                _ if word & TOP_TWO_BITS == 0x8000 => WordKind::AdcHuffman,
                _ => WordKind::Unknown,
            },
        }
    }

    /// Decode the module id from the `HeaderIdSlot` word.
    #[inline]
    pub fn module_id(self, id_slot_word: u16) -> u8 {
        match self {
            StreamVariant::Sn => ((id_slot_word >> 5) & 0xF) as u8,
            StreamVariant::Legacy => ((id_slot_word >> 5) & 0x7F) as u8,
        }
    }

    /// The legacy id spans bits 5-11, so the flag bits are only defined for the SN stream.
    #[inline]
    pub fn has_header_flags(self) -> bool {
        matches!(self, StreamVariant::Sn)
    }

    /// Only SN channel headers carry the low bits of the frame number.
    #[inline]
    pub fn checks_channel_frame(self) -> bool {
        matches!(self, StreamVariant::Sn)
    }
}

impl fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamVariant::Sn => write!(f, "SN"),
            StreamVariant::Legacy => write!(f, "Legacy"),
        }
    }
}

impl FromStr for StreamVariant {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SN" | "SUPERNOVA" => Ok(StreamVariant::Sn),
            "LEGACY" | "NU" | "NEUTRINO" => Ok(StreamVariant::Legacy),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Invalid stream variant, expected `sn` or `legacy`",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sn_patterns() {
        let v = StreamVariant::Sn;
        assert_eq!(v.classify_body(0x1005), WordKind::ChannelHeader);
        assert_eq!(v.classify_body(0x2ABC), WordKind::AdcSample);
        assert_eq!(v.classify_body(0x3005), WordKind::ChannelTrailer);
        assert_eq!(v.classify_body(0x4010), WordKind::RoiHeader);
        assert_eq!(v.classify_body(0xC001), WordKind::AdcHuffman);
        assert_eq!(v.classify_body(0xF001), WordKind::AdcHuffman);
        assert_eq!(v.classify_body(0x0123), WordKind::Unknown);
        assert_eq!(v.classify_body(0x8000), WordKind::Unknown);
    }

    #[test]
    fn legacy_patterns() {
        let v = StreamVariant::Legacy;
        assert_eq!(v.classify_body(0x4005), WordKind::ChannelHeader);
        assert_eq!(v.classify_body(0x0ABC), WordKind::AdcSample);
        assert_eq!(v.classify_body(0x5005), WordKind::ChannelTrailer);
        assert_eq!(v.classify_body(0x8001), WordKind::AdcHuffman);
        assert_eq!(v.classify_body(0xB001), WordKind::AdcHuffman);
        assert_eq!(v.classify_body(0x1005), WordKind::Unknown);
        assert_eq!(v.classify_body(0xC001), WordKind::Unknown);
    }

    #[test]
    fn module_id_width() {
        // slot 3, id bits all set
        let word = 0xFFE3;
        assert_eq!(StreamVariant::Sn.module_id(word), 0xF);
        assert_eq!(StreamVariant::Legacy.module_id(word), 0x7F);
    }

    #[test]
    fn from_str() {
        assert_eq!("sn".parse::<StreamVariant>().unwrap(), StreamVariant::Sn);
        assert_eq!(
            "Legacy".parse::<StreamVariant>().unwrap(),
            StreamVariant::Legacy
        );
        assert!("xyz".parse::<StreamVariant>().is_err());
    }
}
