//! Contains the [DecodeStats] struct that accumulates the counters of the decoded stream, and the
//! [FemTally] each emitted FEM record is reduced to before it is sent to the controller.

use crate::records::FemRecord;
use crate::util::*;
use crate::words::variant::StreamVariant;

/// The counters of one FEM record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FemTally {
    /// Module id from the header.
    pub module_id: u8,
    /// All twelve header words were seen.
    pub header_complete: bool,
    /// Decoding stopped at this record.
    pub truncated: bool,
    /// The header reported the full flag.
    pub full: bool,
    /// The header reported the overflow flag.
    pub overflow: bool,
    /// The declared and counted word count or checksum differ.
    pub integrity_mismatch: bool,
    /// Channels holding data.
    pub populated_channels: u32,
    /// Channel headers seen.
    pub channels: u32,
    /// Channel headers with mismatching frame bits.
    pub bad_frames: u32,
    /// Channel trailers not matching the open channel.
    pub channel_mismatches: u32,
    /// Channels left open.
    pub unterminated_channels: u32,
    /// Samples replaced by the sentinel.
    pub implausible_samples: u32,
}

impl FemTally {
    /// Reduce a record to its counters.
    pub fn from_record(fem: &FemRecord) -> Self {
        Self {
            module_id: fem.header.module_id,
            header_complete: fem.header_complete,
            truncated: fem.truncated,
            full: fem.header.full,
            overflow: fem.header.overflow,
            integrity_mismatch: fem.header_complete
                && !fem.truncated
                && !(fem.word_count_matches() && fem.checksum_matches()),
            populated_channels: fem.populated_channels() as u32,
            channels: fem.channel_count,
            bad_frames: fem.bad_frame_count,
            channel_mismatches: fem.channel_mismatch_count,
            unterminated_channels: fem.unterminated_channels,
            implausible_samples: fem.implausible_samples,
        }
    }
}

/// Counters accumulated over the whole stream.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeStats {
    stream_variant: Option<StreamVariant>,
    words_read: u64,
    bytes_read: u64,
    padded_tail_bytes: u8,
    packets_seen: u64,
    packets_without_trailer: u64,
    fems_seen: u64,
    fems_incomplete_header: u64,
    fems_integrity_mismatch: u64,
    fems_full_flag: u64,
    fems_overflow: u64,
    channels_seen: u64,
    channels_populated: u64,
    bad_frames: u64,
    channel_mismatches: u64,
    unterminated_channels: u64,
    implausible_samples: u64,
    orphan_words: u64,
    module_ids: Vec<u8>,
    early_termination: Option<Box<str>>,
}

impl DecodeStats {
    pub(super) fn record_stream_variant(&mut self, variant: StreamVariant) {
        self.stream_variant = Some(variant);
    }

    pub(super) fn add_words_read(&mut self, words: u32) {
        self.words_read += u64::from(words);
    }

    pub(super) fn add_bytes_read(&mut self, bytes: u64) {
        self.bytes_read += bytes;
    }

    pub(super) fn record_truncated_tail(&mut self, padded: u8) {
        self.padded_tail_bytes = padded;
    }

    pub(super) fn record_packet(&mut self, trailer_seen: bool) {
        self.packets_seen += 1;
        if !trailer_seen {
            self.packets_without_trailer += 1;
        }
    }

    pub(super) fn record_fem(&mut self, tally: &FemTally) {
        self.fems_seen += 1;
        self.fems_incomplete_header += u64::from(!tally.header_complete);
        self.fems_integrity_mismatch += u64::from(tally.integrity_mismatch);
        self.fems_full_flag += u64::from(tally.full);
        self.fems_overflow += u64::from(tally.overflow);
        self.channels_seen += u64::from(tally.channels);
        self.channels_populated += u64::from(tally.populated_channels);
        self.bad_frames += u64::from(tally.bad_frames);
        self.channel_mismatches += u64::from(tally.channel_mismatches);
        self.unterminated_channels += u64::from(tally.unterminated_channels);
        self.implausible_samples += u64::from(tally.implausible_samples);
        if tally.header_complete && !self.module_ids.contains(&tally.module_id) {
            self.module_ids.push(tally.module_id);
        }
    }

    pub(super) fn add_orphan_words(&mut self, words: u64) {
        self.orphan_words += words;
    }

    pub(super) fn record_early_termination(&mut self, msg: Box<str>) {
        if self.early_termination.is_none() {
            self.early_termination = Some(msg);
        }
    }

    pub(super) fn finalize(&mut self) {
        self.module_ids.sort_unstable();
    }

    /// Body word format the stream was decoded with.
    pub fn stream_variant(&self) -> Option<StreamVariant> {
        self.stream_variant
    }
    /// Total 32-bit words read.
    pub fn words_read(&self) -> u64 {
        self.words_read
    }
    /// Total bytes read.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
    /// Number of zero bytes appended to complete the last word, 0 if the input was word aligned.
    pub fn padded_tail_bytes(&self) -> u8 {
        self.padded_tail_bytes
    }
    /// Packets emitted.
    pub fn packets_seen(&self) -> u64 {
        self.packets_seen
    }
    /// Packets that ended without a trailer.
    pub fn packets_without_trailer(&self) -> u64 {
        self.packets_without_trailer
    }
    /// FEM records emitted.
    pub fn fems_seen(&self) -> u64 {
        self.fems_seen
    }
    /// FEM records whose header was broken off.
    pub fn fems_incomplete_header(&self) -> u64 {
        self.fems_incomplete_header
    }
    /// FEM records whose word count or checksum did not match.
    pub fn fems_integrity_mismatch(&self) -> u64 {
        self.fems_integrity_mismatch
    }
    /// FEM records reporting the full flag.
    pub fn fems_full_flag(&self) -> u64 {
        self.fems_full_flag
    }
    /// FEM records reporting the overflow flag.
    pub fn fems_overflow(&self) -> u64 {
        self.fems_overflow
    }
    /// Channel headers seen.
    pub fn channels_seen(&self) -> u64 {
        self.channels_seen
    }
    /// Channels holding data when their record was emitted.
    pub fn channels_populated(&self) -> u64 {
        self.channels_populated
    }
    /// Channel headers with mismatching frame bits.
    pub fn bad_frames(&self) -> u64 {
        self.bad_frames
    }
    /// Channel trailers that did not match the open channel.
    pub fn channel_mismatches(&self) -> u64 {
        self.channel_mismatches
    }
    /// Channels never closed by a trailer.
    pub fn unterminated_channels(&self) -> u64 {
        self.unterminated_channels
    }
    /// Samples replaced by the sentinel.
    pub fn implausible_samples(&self) -> u64 {
        self.implausible_samples
    }
    /// Words seen outside any FEM record.
    pub fn orphan_words(&self) -> u64 {
        self.orphan_words
    }
    /// Module ids of the records with a complete header, sorted after finalizing.
    pub fn module_ids_as_slice(&self) -> &[u8] {
        &self.module_ids
    }
    /// The message of the full flag that stopped decoding, if any.
    pub fn early_termination(&self) -> Option<&str> {
        self.early_termination.as_deref()
    }
}
