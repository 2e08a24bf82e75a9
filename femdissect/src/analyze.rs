//! Decoding of the FEM words carried in the XMIT stream.
//!
//! A [Dissecter](dissecter::Dissecter) owns the per-stream state: the [ParserState](parser_state::ParserState)
//! used for classification and transition tallies, the [FemBuilder](fem_builder::FemBuilder) and the
//! [PacketDemux](packet_demux::PacketDemux).

pub mod anomaly;
pub mod dissecter;
pub mod fem_builder;
pub mod lib;
pub mod packet_demux;
pub mod parser_state;
pub mod protocol_validator;

use crate::config::decode::{DecodeOpt, FullFlagPolicy, PayloadMode};
use crate::words::variant::StreamVariant;

/// How a stream is decoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSettings {
    /// Bit patterns of the body words.
    pub variant: StreamVariant,
    /// Keep full waveforms or per-channel summaries.
    pub payload: PayloadMode,
    /// What to do when a FEM reports the full flag.
    pub on_full: FullFlagPolicy,
}

impl DecodeSettings {
    /// Collect the decode settings from a config.
    pub fn from_config(config: &impl DecodeOpt) -> Self {
        Self {
            variant: config.stream_variant(),
            payload: config.payload_mode(),
            on_full: config.full_flag_policy(),
        }
    }
}

/// Whether decoding goes on after a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep decoding.
    Continue,
    /// Stop decoding, the pending records were flushed.
    Terminate,
}
