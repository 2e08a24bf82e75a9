//! Builds [FemRecord]s from classified words.
//!
//! The record lifecycle is driven by a state machine:
//! `AwaitingHeader -> InHeader -> InBody -> Finalized`, with `HeaderFirst` restarting it.
#![allow(non_camel_case_types)]

use self::Fem_Record_Builder::AwaitingHeader_;
use super::anomaly::Anomaly;
use super::DecodeSettings;
use crate::records::{ChannelPayload, ChannelSummary, FemRecord};
use crate::util::*;
use crate::words::header::HeaderFieldAccumulator;
use crate::words::huffman::{reconstruct_into, DecodedHuffman, Reconstructed};
use crate::words::kind::WordKind;
use crate::words::{channel_id, LOW_12_BITS};

sm! {
    // States have the '_' suffix and events the '_' prefix so they show up as `STATE_By_EVENT`
    Fem_Record_Builder {

        InitialStates { AwaitingHeader_ }

        _HeaderFirst {
            AwaitingHeader_ => InHeader_,
            Finalized_ => InHeader_
        }

        // The reserved Lo word was accumulated
        _HeaderComplete {
            InHeader_ => InBody_
        }

        _Finalize {
            InHeader_ => Finalized_,
            InBody_ => Finalized_
        }
    }
}

/// The state of the builder as a plain enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderPhase {
    AwaitingHeader,
    InHeader,
    InBody,
    Finalized,
}

/// A channel opened by a channel header and not yet closed by a trailer.
struct OpenChannel {
    id: u8,
    samples: Vec<u16>,
    /// Last valid sample of the channel, 0 if none. Kept across ROI headers.
    baseline: u16,
    summary: ChannelSummary,
}

impl OpenChannel {
    fn new(id: u8) -> Self {
        Self {
            id,
            samples: Vec::new(),
            baseline: 0,
            summary: ChannelSummary::default(),
        }
    }
}

/// Turns classified words into [FemRecord]s.
///
/// Anomalies are collected and drained by the owner with [FemBuilder::drain_anomalies].
pub struct FemBuilder {
    state_machine: Fem_Record_Builder::Variant,
    settings: DecodeSettings,
    accumulator: HeaderFieldAccumulator,
    expected_slot: u8,
    record: Option<FemRecord>,
    open_channel: Option<OpenChannel>,
    anomalies: Vec<(u64, Anomaly)>,
    orphan_words: u64,
    terminate_requested: bool,
}

impl FemBuilder {
    /// Create a builder awaiting the first header.
    pub fn new(settings: DecodeSettings) -> Self {
        Self {
            state_machine: Fem_Record_Builder::Machine::new(AwaitingHeader_).as_enum(),
            settings,
            accumulator: HeaderFieldAccumulator::new(settings.variant),
            expected_slot: 0,
            record: None,
            open_channel: None,
            anomalies: Vec::new(),
            orphan_words: 0,
            terminate_requested: false,
        }
    }

    /// Current state of the record lifecycle.
    pub fn phase(&self) -> BuilderPhase {
        use Fem_Record_Builder::Variant as state;
        match self.state_machine {
            state::InitialAwaitingHeader_(_) => BuilderPhase::AwaitingHeader,
            state::InHeader_By_HeaderFirst(_) => BuilderPhase::InHeader,
            state::InBody_By_HeaderComplete(_) => BuilderPhase::InBody,
            state::Finalized_By_Finalize(_) => BuilderPhase::Finalized,
        }
    }

    /// Words that arrived while no record was open.
    pub fn orphan_words(&self) -> u64 {
        self.orphan_words
    }

    /// A record with the full flag set was seen and the policy is to stop.
    pub fn termination_requested(&self) -> bool {
        self.terminate_requested
    }

    /// Take the anomalies collected since the last call.
    pub fn drain_anomalies(&mut self) -> Vec<(u64, Anomaly)> {
        mem::take(&mut self.anomalies)
    }

    /// Process one classified 16-bit word located at `mem_pos`.
    ///
    /// Returns the record that the word completed, if any.
    pub fn process(&mut self, kind: WordKind, word: u16, mem_pos: u64) -> Option<FemRecord> {
        if kind == WordKind::HeaderFirst {
            let completed = self.finalize(mem_pos, Some(kind));
            if !self.terminate_requested {
                self.start_record(mem_pos);
            }
            return completed;
        }

        match self.phase() {
            BuilderPhase::AwaitingHeader | BuilderPhase::Finalized => {
                log::trace!("0x{mem_pos:X}: orphan {kind} word {word:#06X}");
                self.orphan_words += 1;
                None
            }
            BuilderPhase::InHeader => self.process_header_word(kind, word, mem_pos),
            BuilderPhase::InBody => {
                self.process_body_word(kind, word, mem_pos);
                None
            }
        }
    }

    /// Close the open record, if any. `found` is the word kind that ended it, `None` at end of stream.
    pub fn finalize(&mut self, mem_pos: u64, found: Option<WordKind>) -> Option<FemRecord> {
        match self.phase() {
            BuilderPhase::AwaitingHeader | BuilderPhase::Finalized => None,
            BuilderPhase::InHeader => {
                self.break_header(mem_pos, found);
                self.close_record(mem_pos)
            }
            BuilderPhase::InBody => self.close_record(mem_pos),
        }
    }

    fn start_record(&mut self, mem_pos: u64) {
        use Fem_Record_Builder as event;
        use Fem_Record_Builder::Variant as state;

        self.accumulator.reset();
        self.expected_slot = 1;
        self.open_channel = None;
        let payload = match self.settings.payload {
            PayloadMode::Waveforms => ChannelPayload::waveforms(),
            PayloadMode::Summary => ChannelPayload::summaries(),
        };
        self.record = Some(FemRecord::new(mem_pos, payload));

        self.state_machine = match self.state_machine.clone() {
            state::InitialAwaitingHeader_(stm) => stm.transition(event::_HeaderFirst).as_enum(),
            state::Finalized_By_Finalize(stm) => stm.transition(event::_HeaderFirst).as_enum(),
            // An open record is finalized before a new one starts
            open => open,
        };
    }

    fn process_header_word(&mut self, kind: WordKind, word: u16, mem_pos: u64) -> Option<FemRecord> {
        use Fem_Record_Builder as event;
        use Fem_Record_Builder::Variant as state;

        if kind.header_slot() != Some(self.expected_slot) {
            self.break_header(mem_pos, Some(kind));
            // The word that broke the header belongs to no record
            self.orphan_words += 1;
            return self.close_record(mem_pos);
        }

        self.expected_slot += 1;
        if self.accumulator.accumulate(kind, word) {
            if let state::InHeader_By_HeaderFirst(stm) = self.state_machine.clone() {
                self.state_machine = stm.transition(event::_HeaderComplete).as_enum();
            }
            if let Some(record) = self.record.as_mut() {
                record.header = *self.accumulator.header();
                record.header_complete = true;
            }
            self.check_full_flag(mem_pos);
        }
        None
    }

    fn break_header(&mut self, mem_pos: u64, found: Option<WordKind>) {
        let expected = WordKind::from_header_slot(self.expected_slot).unwrap_or(WordKind::Unknown);
        self.anomalies
            .push((mem_pos, Anomaly::BrokenHeader { expected, found }));
        self.check_full_flag(mem_pos);
    }

    fn check_full_flag(&mut self, mem_pos: u64) {
        let header = self.accumulator.header();
        if !header.full {
            return;
        }
        match self.settings.on_full {
            FullFlagPolicy::Stop => {
                log::warn!(
                    "0x{mem_pos:X}: FEM {id} has the full flag set, stopping",
                    id = header.module_id
                );
                self.terminate_requested = true;
            }
            FullFlagPolicy::Continue => log::warn!(
                "0x{mem_pos:X}: FEM {id} has the full flag set",
                id = header.module_id
            ),
        }
    }

    fn process_body_word(&mut self, kind: WordKind, word: u16, mem_pos: u64) {
        if let Some(record) = self.record.as_mut() {
            record.count_word(word);
        }
        match kind {
            WordKind::ChannelHeader => self.open_channel(word, mem_pos),
            WordKind::RoiHeader => self.start_roi(word),
            WordKind::AdcSample => self.push_sample(word, mem_pos),
            WordKind::AdcHuffman => self.push_huffman(word, mem_pos),
            WordKind::ChannelTrailer => self.close_channel(word, mem_pos),
            WordKind::Unknown => log::trace!("0x{mem_pos:X}: unknown word {word:#06X}"),
            // Handled before dispatch
            WordKind::HeaderFirst => (),
            // Header pair kinds only follow a header first, packet sentinels never reach the builder
            WordKind::HeaderIdSlot
            | WordKind::HeaderWordCountHi
            | WordKind::HeaderWordCountLo
            | WordKind::HeaderEventHi
            | WordKind::HeaderEventLo
            | WordKind::HeaderFrameHi
            | WordKind::HeaderFrameLo
            | WordKind::HeaderChecksumHi
            | WordKind::HeaderChecksumLo
            | WordKind::HeaderReservedHi
            | WordKind::HeaderReservedLo
            | WordKind::PacketHeader
            | WordKind::PacketTrailer => (),
        }
    }

    fn open_channel(&mut self, word: u16, mem_pos: u64) {
        let id = channel_id(word);
        let Some(record) = self.record.as_mut() else {
            return;
        };
        if let Some(unterminated) = self.open_channel.take() {
            let channel = unterminated.id;
            settle_unterminated(record, unterminated);
            self.anomalies.push((
                mem_pos,
                Anomaly::UnterminatedChannel {
                    channel,
                    next: Some(id),
                },
            ));
        }
        record.channel_count += 1;
        if self.settings.variant.checks_channel_frame() {
            let frame_bits = ((word >> 6) & 0x3F) as u8;
            if u32::from(frame_bits) != record.header.frame & 0x3F {
                record.bad_frame_count += 1;
                self.anomalies.push((
                    mem_pos,
                    Anomaly::BadFrame {
                        channel: id,
                        frame_bits,
                        frame: record.header.frame,
                    },
                ));
            }
        }
        self.open_channel = Some(OpenChannel::new(id));
    }

    fn start_roi(&mut self, word: u16) {
        let Some(channel) = self.open_channel.as_mut() else {
            return;
        };
        log::trace!(
            "Channel {id}: ROI starting at tick {tick}",
            id = channel.id,
            tick = word & LOW_12_BITS
        );
        if self.settings.payload == PayloadMode::Summary && !channel.samples.is_empty() {
            channel.summary.fold_roi(&channel.samples);
            channel.samples.clear();
        }
    }

    fn push_sample(&mut self, word: u16, mem_pos: u64) {
        match self.open_channel.as_mut() {
            Some(channel) => {
                let sample = word & LOW_12_BITS;
                channel.samples.push(sample);
                channel.baseline = sample;
            }
            None => log::trace!("0x{mem_pos:X}: sample outside of a channel"),
        }
    }

    fn push_huffman(&mut self, word: u16, mem_pos: u64) {
        let Some(channel) = self.open_channel.as_mut() else {
            log::trace!("0x{mem_pos:X}: Huffman word outside of a channel");
            return;
        };
        let decoded = DecodedHuffman::decode(word);
        let id = channel.id;
        let mut implausible = 0;
        let anomalies = &mut self.anomalies;
        channel.baseline = reconstruct_into(
            &decoded,
            channel.baseline,
            &mut channel.samples,
            |outcome| {
                implausible += 1;
                let anomaly = match outcome {
                    Reconstructed::OutOfRange(value) => Anomaly::SampleOutOfRange { channel: id, value },
                    _ => Anomaly::InvalidHuffmanRun { channel: id },
                };
                anomalies.push((mem_pos, anomaly));
            },
        );
        if let Some(record) = self.record.as_mut() {
            record.implausible_samples += implausible;
        }
    }

    fn close_channel(&mut self, word: u16, mem_pos: u64) {
        let id = channel_id(word);
        let open = self.open_channel.take();
        let Some(record) = self.record.as_mut() else {
            return;
        };
        match open {
            Some(channel) if channel.id == id => {
                let OpenChannel {
                    samples,
                    mut summary,
                    ..
                } = channel;
                match &mut record.payload {
                    ChannelPayload::Waveforms(waveforms) => {
                        if let Some(slot) = waveforms.get_mut(id as usize) {
                            *slot = samples;
                        }
                    }
                    ChannelPayload::Summaries(summaries) => {
                        if !samples.is_empty() {
                            summary.fold_roi(&samples);
                        }
                        if let Some(slot) = summaries.get_mut(id as usize) {
                            *slot = Some(summary);
                        }
                    }
                }
            }
            mismatched => {
                record.channel_mismatch_count += 1;
                self.anomalies.push((
                    mem_pos,
                    Anomaly::ChannelMismatch {
                        open: mismatched.map(|ch| ch.id),
                        trailer: id,
                    },
                ));
            }
        }
    }

    fn close_record(&mut self, mem_pos: u64) -> Option<FemRecord> {
        use Fem_Record_Builder as event;
        use Fem_Record_Builder::Variant as state;

        self.state_machine = match self.state_machine.clone() {
            state::InHeader_By_HeaderFirst(stm) => stm.transition(event::_Finalize).as_enum(),
            state::InBody_By_HeaderComplete(stm) => stm.transition(event::_Finalize).as_enum(),
            closed => closed,
        };

        let mut record = self.record.take()?;
        if let Some(unterminated) = self.open_channel.take() {
            let channel = unterminated.id;
            settle_unterminated(&mut record, unterminated);
            self.anomalies.push((
                mem_pos,
                Anomaly::UnterminatedChannel {
                    channel,
                    next: None,
                },
            ));
        }
        record.header = *self.accumulator.header();
        record.mask_counted();
        record.truncated = self.terminate_requested;

        if record.header_complete && !record.truncated {
            if !record.word_count_matches() {
                self.anomalies.push((
                    mem_pos,
                    Anomaly::WordCountMismatch {
                        module_id: record.header.module_id,
                        declared: record.header.word_count,
                        counted: record.counted_word_count,
                    },
                ));
            }
            if !record.checksum_matches() {
                self.anomalies.push((
                    mem_pos,
                    Anomaly::ChecksumMismatch {
                        module_id: record.header.module_id,
                        declared: record.header.checksum,
                        counted: record.counted_checksum,
                    },
                ));
            }
        }
        Some(record)
    }
}

/// Count a channel closed without a trailer. In summary mode its buffered samples
/// are folded into its summary slot, a waveform buffer is dropped.
fn settle_unterminated(record: &mut FemRecord, channel: OpenChannel) {
    record.unterminated_channels += 1;
    let OpenChannel {
        id,
        samples,
        mut summary,
        ..
    } = channel;
    if let ChannelPayload::Summaries(summaries) = &mut record.payload {
        if samples.is_empty() && summary.roi_count == 0 {
            return;
        }
        if !samples.is_empty() {
            summary.fold_roi(&samples);
        }
        if let Some(slot) = summaries.get_mut(id as usize) {
            *slot = Some(summary);
        }
    }
}
