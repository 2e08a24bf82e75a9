//! Recoverable protocol anomalies and their error codes.

use crate::util::*;
use crate::words::kind::WordKind;

/// A recoverable deviation from the protocol, reported as an error message and decoding continues.
#[derive(Debug, Clone, PartialEq)]
pub enum Anomaly {
    /// A word kind followed a kind it may not follow.
    IllegalTransition {
        prev: WordKind,
        curr: WordKind,
        recent_words: String,
    },
    /// The header word sequence broke off, `found` is `None` at a packet boundary or end of stream.
    BrokenHeader {
        expected: WordKind,
        found: Option<WordKind>,
    },
    /// A channel trailer did not match the open channel.
    ChannelMismatch { open: Option<u8>, trailer: u8 },
    /// A channel was still open when the next channel or the end of the record arrived.
    UnterminatedChannel { channel: u8, next: Option<u8> },
    /// Channel header frame bits differ from the low bits of the FEM frame number.
    BadFrame {
        channel: u8,
        frame_bits: u8,
        frame: u32,
    },
    WordCountMismatch {
        module_id: u8,
        declared: u32,
        counted: u32,
    },
    ChecksumMismatch {
        module_id: u8,
        declared: u32,
        counted: u32,
    },
    /// A Huffman run longer than the code table.
    InvalidHuffmanRun { channel: u8 },
    /// A reconstructed sample outside the ADC range.
    SampleOutOfRange { channel: u8, value: i32 },
}

impl Anomaly {
    /// The error code of the anomaly.
    pub fn code(&self) -> u8 {
        match self {
            Anomaly::IllegalTransition { .. } => 10,
            Anomaly::BrokenHeader { .. } => 20,
            Anomaly::ChannelMismatch { .. } => 30,
            Anomaly::UnterminatedChannel { .. } => 31,
            Anomaly::BadFrame { .. } => 40,
            Anomaly::WordCountMismatch { .. } => 50,
            Anomaly::ChecksumMismatch { .. } => 51,
            Anomaly::InvalidHuffmanRun { .. } => 60,
            Anomaly::SampleOutOfRange { .. } => 70,
        }
    }

    /// Format the anomaly as an error message for the stats controller.
    pub fn to_error_msg(&self, mem_pos: u64) -> String {
        format!("0x{mem_pos:X}: [E{code}] {self}", code = self.code())
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::IllegalTransition {
                prev,
                curr,
                recent_words,
            } => write!(
                f,
                "Illegal transition {prev} -> {curr}. Recent words: [{recent_words}]"
            ),
            Anomaly::BrokenHeader { expected, found } => match found {
                Some(found) => write!(f, "FEM header broken, expected {expected} got {found}"),
                None => write!(f, "FEM header broken, expected {expected} got end of data"),
            },
            Anomaly::ChannelMismatch { open, trailer } => match open {
                Some(open) => write!(
                    f,
                    "Channel trailer {trailer} does not match open channel {open}"
                ),
                None => write!(f, "Channel trailer {trailer} without an open channel"),
            },
            Anomaly::UnterminatedChannel { channel, next } => match next {
                Some(next) => write!(
                    f,
                    "Channel {channel} not terminated before channel {next}"
                ),
                None => write!(f, "Channel {channel} not terminated before end of FEM record"),
            },
            Anomaly::BadFrame {
                channel,
                frame_bits,
                frame,
            } => write!(
                f,
                "Channel {channel} frame bits {frame_bits:#04X} do not match frame number {frame:#X}"
            ),
            Anomaly::WordCountMismatch {
                module_id,
                declared,
                counted,
            } => write!(
                f,
                "FEM {module_id} word count mismatch, declared {declared} counted {counted}"
            ),
            Anomaly::ChecksumMismatch {
                module_id,
                declared,
                counted,
            } => write!(
                f,
                "FEM {module_id} checksum mismatch, declared {declared:#08X} counted {counted:#08X}"
            ),
            Anomaly::InvalidHuffmanRun { channel } => {
                write!(f, "Huffman run longer than 6 zero bits in channel {channel}")
            }
            Anomaly::SampleOutOfRange { channel, value } => write!(
                f,
                "Reconstructed sample {value} outside ADC range in channel {channel}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_message_format() {
        let msg = Anomaly::ChannelMismatch {
            open: Some(5),
            trailer: 7,
        }
        .to_error_msg(0x1C);
        assert_eq!(
            msg,
            "0x1C: [E30] Channel trailer 7 does not match open channel 5"
        );
    }

    #[test]
    fn codes_are_unique() {
        let anomalies = [
            Anomaly::IllegalTransition {
                prev: WordKind::Unknown,
                curr: WordKind::AdcSample,
                recent_words: String::new(),
            },
            Anomaly::BrokenHeader {
                expected: WordKind::HeaderFrameLo,
                found: None,
            },
            Anomaly::ChannelMismatch {
                open: None,
                trailer: 1,
            },
            Anomaly::UnterminatedChannel {
                channel: 1,
                next: None,
            },
            Anomaly::BadFrame {
                channel: 1,
                frame_bits: 2,
                frame: 3,
            },
            Anomaly::WordCountMismatch {
                module_id: 1,
                declared: 1,
                counted: 2,
            },
            Anomaly::ChecksumMismatch {
                module_id: 1,
                declared: 1,
                counted: 2,
            },
            Anomaly::InvalidHuffmanRun { channel: 0 },
            Anomaly::SampleOutOfRange {
                channel: 0,
                value: -1,
            },
        ];
        let codes: Vec<u8> = anomalies.iter().map(Anomaly::code).collect();
        assert_eq!(codes, vec![10, 20, 30, 31, 40, 50, 51, 60, 70]);
    }
}
