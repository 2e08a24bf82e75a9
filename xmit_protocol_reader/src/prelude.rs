//! Includes all the basics for working with the XMIT input module.

pub use super::bufreader_wrapper::BufferedReaderWrapper;
pub use super::input_scanner::InputScanner;
pub use super::input_scanner::XMIT_WORD_SIZE;
pub use super::stats::InputStatType;
pub use super::stdin_reader::StdInReader;
pub use super::word_chunk::WordChunk;
pub use super::xmit_word::classify_xmit_word;
pub use super::xmit_word::split_fem_words;
pub use super::xmit_word::XmitWordKind;
pub use super::xmit_word::PACKET_HEADER;
pub use super::xmit_word::PACKET_TRAILER;
