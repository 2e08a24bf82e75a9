//! The structured output of decoding: [PacketRecord]s holding [FemRecord]s.
//!
//! Declared header values and independently counted values are both kept,
//! a consumer compares them with [FemRecord::word_count_matches] and [FemRecord::checksum_matches].

use crate::util::*;
use crate::words::header::{FemHeader, FIELD_MASK};
use crate::words::{CHANNELS_PER_FEM, SAMPLE_SENTINEL};

/// Mask a counted value to the 24-bit width of the header fields.
#[inline]
pub fn mask_24(value: u32) -> u32 {
    value & FIELD_MASK
}

/// Summary statistics of the samples of one channel, accumulated over all its ROIs.
///
/// Implausible samples are excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Smallest sample.
    pub min: u16,
    /// Largest sample.
    pub max: u16,
    /// Mean of the samples.
    pub mean: f64,
    /// Standard deviation of the samples.
    pub rms: f64,
    /// Number of ROIs folded into the summary.
    pub roi_count: u32,
    /// Number of samples folded into the summary.
    pub sample_count: u64,
    #[serde(skip)]
    sum: f64,
    #[serde(skip)]
    sum_sq: f64,
}

impl ChannelSummary {
    /// Fold the samples of one ROI into the summary.
    pub fn fold_roi(&mut self, samples: &[u16]) {
        self.roi_count += 1;
        for &s in samples.iter().filter(|s| **s != SAMPLE_SENTINEL) {
            if self.sample_count == 0 {
                self.min = s;
                self.max = s;
            } else {
                self.min = self.min.min(s);
                self.max = self.max.max(s);
            }
            self.sample_count += 1;
            self.sum += f64::from(s);
            self.sum_sq += f64::from(s) * f64::from(s);
        }
        if self.sample_count > 0 {
            let n = self.sample_count as f64;
            self.mean = self.sum / n;
            // Rounding can push the variance a hair below zero for constant samples
            self.rms = (self.sum_sq / n - self.mean * self.mean).max(0.0).sqrt();
        }
    }
}

/// What is kept of the channel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelPayload {
    /// The full sample sequence of each channel, indexed by channel id.
    Waveforms(Vec<Vec<u16>>),
    /// Summary statistics per channel, indexed by channel id. `None` for channels that were never closed.
    Summaries(Vec<Option<ChannelSummary>>),
}

impl ChannelPayload {
    /// Empty payload holding the full waveforms.
    pub fn waveforms() -> Self {
        ChannelPayload::Waveforms(vec![Vec::new(); CHANNELS_PER_FEM])
    }

    /// Empty payload holding channel summaries.
    pub fn summaries() -> Self {
        ChannelPayload::Summaries(vec![None; CHANNELS_PER_FEM])
    }

    /// Number of channels that hold data.
    pub fn populated_channels(&self) -> usize {
        match self {
            ChannelPayload::Waveforms(w) => w.iter().filter(|ch| !ch.is_empty()).count(),
            ChannelPayload::Summaries(s) => s.iter().filter(|ch| ch.is_some()).count(),
        }
    }
}

/// One module's contribution to one packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FemRecord {
    /// Byte offset of the `HeaderFirst` word.
    pub mem_pos: u64,
    /// Declared header fields.
    pub header: FemHeader,
    /// All twelve header words were seen in order.
    pub header_complete: bool,
    /// Decoding stopped at this record because of the full flag.
    pub truncated: bool,
    /// Number of words after the header, masked to 24 bits.
    pub counted_word_count: u32,
    /// Sum of the words after the header, masked to 24 bits.
    pub counted_checksum: u32,
    /// Number of channel headers.
    pub channel_count: u32,
    /// Channel headers whose frame bits did not match the frame number.
    pub bad_frame_count: u32,
    /// Channel trailers that did not match the open channel.
    pub channel_mismatch_count: u32,
    /// Channels that were never closed by a trailer.
    pub unterminated_channels: u32,
    /// Samples replaced by the sentinel value.
    pub implausible_samples: u32,
    /// Channel data.
    pub payload: ChannelPayload,
}

impl FemRecord {
    /// A new record opened at `mem_pos`.
    pub fn new(mem_pos: u64, payload: ChannelPayload) -> Self {
        Self {
            mem_pos,
            header: FemHeader::default(),
            header_complete: false,
            truncated: false,
            counted_word_count: 0,
            counted_checksum: 0,
            channel_count: 0,
            bad_frame_count: 0,
            channel_mismatch_count: 0,
            unterminated_channels: 0,
            implausible_samples: 0,
            payload,
        }
    }

    /// Count a body word.
    #[inline]
    pub(crate) fn count_word(&mut self, word: u16) {
        self.counted_word_count = self.counted_word_count.wrapping_add(1);
        self.counted_checksum = self.counted_checksum.wrapping_add(u32::from(word));
    }

    /// Mask the counted values to the header field width.
    pub(crate) fn mask_counted(&mut self) {
        self.counted_word_count = mask_24(self.counted_word_count);
        self.counted_checksum = mask_24(self.counted_checksum);
    }

    /// Declared and counted word counts agree.
    pub fn word_count_matches(&self) -> bool {
        self.header.word_count == mask_24(self.counted_word_count)
    }

    /// Declared and counted checksums agree.
    pub fn checksum_matches(&self) -> bool {
        self.header.checksum == mask_24(self.counted_checksum)
    }

    /// Number of channels that hold data.
    pub fn populated_channels(&self) -> usize {
        self.payload.populated_channels()
    }

    /// The samples of a channel, if the record holds waveforms.
    pub fn waveform(&self, channel: usize) -> Option<&[u16]> {
        match &self.payload {
            ChannelPayload::Waveforms(w) => w.get(channel).map(Vec::as_slice),
            ChannelPayload::Summaries(_) => None,
        }
    }

    /// The summary of a channel, if the record holds summaries and the channel was closed.
    pub fn summary(&self, channel: usize) -> Option<&ChannelSummary> {
        match &self.payload {
            ChannelPayload::Summaries(s) => s.get(channel).and_then(Option::as_ref),
            ChannelPayload::Waveforms(_) => None,
        }
    }
}

/// One transport packet, the FEM records in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Ordinal of the packet in the stream, starting at 0.
    pub index: u64,
    /// Byte offset of the packet header, `None` for data before the first packet header.
    pub mem_pos: Option<u64>,
    /// A packet trailer was seen.
    pub trailer_seen: bool,
    /// FEM records in arrival order.
    pub fems: Vec<FemRecord>,
}

impl PacketRecord {
    /// Returns true if the packet holds no FEM records.
    pub fn is_empty(&self) -> bool {
        self.fems.is_empty()
    }
}
