//! Contains the [Dissecter] that drives decoding of one stream, and [decode_bytes] for decoding
//! an in-memory buffer without any threads.

use super::anomaly::Anomaly;
use super::fem_builder::FemBuilder;
use super::packet_demux::PacketDemux;
use super::parser_state::{classify, ParserState};
use super::protocol_validator::TransitionReport;
use super::{DecodeSettings, Flow};
use crate::records::PacketRecord;
use crate::stats::stats_collector::decode_stats::FemTally;
use crate::util::*;
use crate::words::kind::WordKind;

/// Decodes one XMIT stream word by word.
///
/// Anomalies are reported as [StatType::Error] messages if a stats channel is attached.
pub struct Dissecter {
    settings: DecodeSettings,
    state: ParserState,
    builder: FemBuilder,
    demux: PacketDemux,
    stats_send: Option<flume::Sender<StatType>>,
    terminated: bool,
    anomalies_reported: u64,
}

impl Dissecter {
    /// Create a new [Dissecter] at the start of a stream.
    pub fn new(settings: DecodeSettings, stats_send: Option<flume::Sender<StatType>>) -> Self {
        Self {
            settings,
            state: ParserState::new(),
            builder: FemBuilder::new(settings),
            demux: PacketDemux::new(),
            stats_send,
            terminated: false,
            anomalies_reported: 0,
        }
    }

    /// The settings the stream is decoded with.
    pub fn settings(&self) -> DecodeSettings {
        self.settings
    }

    /// Returns true once decoding was stopped by the full flag.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Number of anomalies found so far.
    pub fn anomalies_reported(&self) -> u64 {
        self.anomalies_reported
    }

    /// Process one 32-bit XMIT word located at `mem_pos`.
    pub fn process_xmit_word(&mut self, word: u32, mem_pos: u64) -> Flow {
        if self.terminated {
            return Flow::Terminate;
        }
        match classify_xmit_word(word) {
            XmitWordKind::PacketHeader => {
                self.process_packet_sentinel(WordKind::PacketHeader, word, mem_pos);
                self.demux.open_packet(mem_pos);
            }
            XmitWordKind::PacketTrailer => {
                self.process_packet_sentinel(WordKind::PacketTrailer, word, mem_pos);
                self.demux.mark_trailer();
            }
            XmitWordKind::FemWords => {
                for (order, fem_word) in split_fem_words(word).into_iter().enumerate() {
                    let flow =
                        self.process_fem_word(fem_word, order as u8, mem_pos + 2 * order as u64);
                    if flow == Flow::Terminate {
                        return flow;
                    }
                }
            }
        }
        Flow::Continue
    }

    /// Process one 16-bit FEM word, `order` is its half of the 32-bit word (0 = low).
    pub fn process_fem_word(&mut self, word: u16, order: u8, mem_pos: u64) -> Flow {
        if self.terminated {
            return Flow::Terminate;
        }
        let kind = classify(word, order, &mut self.state, self.settings.variant);
        log::trace!("0x{mem_pos:X}: {word:04X} {kind}");
        self.observe_transition(kind, mem_pos);

        let completed = self.builder.process(kind, word, mem_pos);
        self.demux.push_fem(completed);
        self.report_builder_anomalies();

        if self.builder.termination_requested() {
            self.terminate(mem_pos);
            return Flow::Terminate;
        }
        Flow::Continue
    }

    fn process_packet_sentinel(&mut self, kind: WordKind, word: u32, mem_pos: u64) {
        self.state.push_recent_xmit(word);
        // A header in progress is abandoned at a packet boundary
        self.state.reset_header_slot();
        self.observe_transition(kind, mem_pos);
        let completed = self.builder.finalize(mem_pos, Some(kind));
        self.demux.push_fem(completed);
        self.report_builder_anomalies();
    }

    fn observe_transition(&mut self, kind: WordKind, mem_pos: u64) {
        if let Some(prev) = self.state.record_transition(kind) {
            let anomaly = Anomaly::IllegalTransition {
                prev,
                curr: kind,
                recent_words: self.state.recent_words_dump(),
            };
            self.report_anomaly(mem_pos, &anomaly);
        }
    }

    fn report_builder_anomalies(&mut self) {
        for (mem_pos, anomaly) in self.builder.drain_anomalies() {
            self.report_anomaly(mem_pos, &anomaly);
        }
    }

    fn report_anomaly(&mut self, mem_pos: u64, anomaly: &Anomaly) {
        self.anomalies_reported += 1;
        let msg = anomaly.to_error_msg(mem_pos);
        log::debug!("{msg}");
        self.report(StatType::Error(msg.into()));
    }

    fn report(&self, stat: StatType) {
        if let Some(sender) = self.stats_send.as_ref() {
            if let Err(e) = sender.send(stat) {
                log::trace!("Stats channel closed: {e}");
            }
        }
    }

    fn terminate(&mut self, mem_pos: u64) {
        let completed = self.builder.finalize(mem_pos, None);
        self.demux.push_fem(completed);
        self.demux.flush();
        self.report_builder_anomalies();
        self.terminated = true;
        self.report(StatType::EarlyTermination(
            format!("0x{mem_pos:X}: FEM full flag set, decoding stopped").into(),
        ));
    }

    /// Take the packets completed since the last call and report them to the stats controller.
    pub fn take_completed_packets(&mut self) -> Vec<PacketRecord> {
        let packets = self.demux.take_completed();
        for packet in &packets {
            self.report(StatType::PacketSeen {
                fems: packet.fems.len() as u32,
                trailer_seen: packet.trailer_seen,
            });
            for fem in &packet.fems {
                self.report(StatType::FemSeen(FemTally::from_record(fem)));
            }
        }
        packets
    }

    /// End of stream at `mem_pos`: flush the open record and packet and report the stream level stats.
    ///
    /// Returns the packets not yet taken.
    pub fn finish(&mut self, mem_pos: u64) -> Vec<PacketRecord> {
        if !self.terminated {
            let completed = self.builder.finalize(mem_pos, None);
            self.demux.push_fem(completed);
            self.demux.flush();
            self.report_builder_anomalies();
        }
        let packets = self.take_completed_packets();
        self.report(StatType::OrphanWords(self.builder.orphan_words()));
        self.report(StatType::TransitionReport(Box::new(
            self.transition_report(),
        )));
        packets
    }

    /// Summary of the transitions counted so far.
    pub fn transition_report(&self) -> TransitionReport {
        TransitionReport::from_matrix(self.state.transitions())
    }
}

/// Result of decoding an in-memory stream with [decode_bytes].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    /// Packets in stream order.
    pub packets: Vec<PacketRecord>,
    /// Anomaly messages in the order they were found.
    pub errors: Vec<Box<str>>,
    /// Summary of the word transitions.
    pub transitions: TransitionReport,
    /// Decoding was stopped by the full flag.
    pub terminated: bool,
}

/// Decode a complete stream held in memory on the calling thread.
///
/// A trailing partial 32-bit word is zero padded.
pub fn decode_bytes(data: &[u8], settings: DecodeSettings) -> DecodeOutput {
    let (stats_send, stats_recv) = flume::unbounded::<StatType>();
    let mut dissecter = Dissecter::new(settings, Some(stats_send));
    let mut scanner = InputScanner::minimal(Box::new(io::Cursor::new(data)));
    let mut packets = Vec::new();

    'chunks: while let Ok(chunk) = scanner.load_chunk(xmit_protocol_reader::WORD_CHUNK_SIZE) {
        for (word, mem_pos) in chunk.iter_with_mem_pos() {
            if dissecter.process_xmit_word(word, mem_pos) == Flow::Terminate {
                break 'chunks;
            }
        }
        packets.extend(dissecter.take_completed_packets());
    }
    packets.extend(dissecter.finish(scanner.current_mem_pos()));
    let terminated = dissecter.is_terminated();
    let transitions = dissecter.transition_report();
    drop(dissecter);

    let errors = stats_recv
        .drain()
        .filter_map(|stat| match stat {
            StatType::Error(msg) => Some(msg),
            _ => None,
        })
        .collect();

    DecodeOutput {
        packets,
        errors,
        transitions,
        terminated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::decode::{FullFlagPolicy, PayloadMode};
    use crate::words::header::{encode_header, FemHeader};
    use crate::words::variant::StreamVariant;
    use pretty_assertions::assert_eq;

    fn push_u32(bytes: &mut Vec<u8>, word: u32) {
        bytes.extend_from_slice(&word.to_le_bytes());
    }

    /// Pack 16-bit words into little-endian 32-bit words, low half first.
    fn push_fem_words(bytes: &mut Vec<u8>, words: &[u16]) {
        assert_eq!(words.len() % 2, 0, "FEM words must fill whole XMIT words");
        for pair in words.chunks_exact(2) {
            push_u32(bytes, u32::from(pair[0]) | (u32::from(pair[1]) << 16));
        }
    }

    fn header(header: &FemHeader) -> Vec<u16> {
        encode_header(header, StreamVariant::Sn).to_vec()
    }

    fn codes(errors: &[Box<str>]) -> Vec<String> {
        let re = regex::Regex::new(r"\[E(?P<code>[0-9]{2})\]").unwrap();
        errors
            .iter()
            .map(|e| re.captures(e).unwrap()["code"].to_string())
            .collect()
    }

    #[test]
    fn end_to_end_one_packet() {
        let mut body = vec![];
        for sample in [0x2001, 0x2002, 0x2003] {
            body.extend([0x1000, sample, 0x3000]);
        }
        let checksum: u32 = body.iter().map(|w| u32::from(*w)).sum();
        let mut words = header(&FemHeader {
            word_count: 3,
            checksum,
            ..Default::default()
        });
        words.extend(&body);
        // Odd number of body words, fill the last XMIT word with a second trailer.
        // The filler is counted as a tenth body word; the nine word scenario without
        // it is `three_triplets_count_nine_words`.
        words.push(0x3000);

        let mut bytes = vec![];
        push_u32(&mut bytes, PACKET_HEADER);
        push_fem_words(&mut bytes, &words);
        push_u32(&mut bytes, PACKET_TRAILER);

        let out = decode_bytes(&bytes, DecodeSettings::default());
        assert_eq!(out.packets.len(), 1);
        let packet = &out.packets[0];
        assert_eq!(packet.index, 0);
        assert_eq!(packet.mem_pos, Some(0));
        assert!(packet.trailer_seen);
        assert_eq!(packet.fems.len(), 1);
        let fem = &packet.fems[0];
        assert!(fem.header_complete);
        assert_eq!(fem.mem_pos, 4);
        assert_eq!(fem.counted_word_count, 10);
        assert_eq!(fem.channel_count, 3);
        assert_eq!(fem.populated_channels(), 1);
        assert_eq!(fem.waveform(0), Some(&[0x003][..]));
        assert!(!fem.word_count_matches());
        // The second trailer follows a trailer and has no open channel,
        // it is also counted so word count and checksum differ
        assert_eq!(codes(&out.errors), vec!["10", "30", "50", "51"]);
        assert!(!out.terminated);
    }

    #[test]
    fn three_triplets_count_nine_words() {
        let mut dissecter = Dissecter::new(DecodeSettings::default(), None);
        dissecter.process_xmit_word(PACKET_HEADER, 0);
        let mut words = header(&FemHeader {
            word_count: 3,
            ..Default::default()
        });
        for sample in [0x2001, 0x2002, 0x2003] {
            words.extend([0x1000, sample, 0x3000]);
        }
        let mut mem_pos = 4;
        for (i, w) in words.iter().enumerate() {
            let _ = dissecter.process_fem_word(*w, (i % 2) as u8, mem_pos);
            mem_pos += 2;
        }
        dissecter.process_xmit_word(PACKET_TRAILER, mem_pos);
        let packets = dissecter.finish(mem_pos + 4);

        // One packet, one FEM, 3 words x 3 kinds, one channel buffer of length 1
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].fems.len(), 1);
        let fem = &packets[0].fems[0];
        assert!(fem.header_complete);
        assert_eq!(fem.header.word_count, 3);
        assert_eq!(fem.counted_word_count, 9);
        assert_eq!(fem.channel_count, 3);
        assert_eq!(fem.populated_channels(), 1);
        assert_eq!(fem.waveform(0).map(<[u16]>::len), Some(1));
        assert!(!dissecter.transition_report().has_anomalies());
    }

    #[test]
    fn resync_after_missing_header_word() {
        let mut first = header(&FemHeader::default());
        // Drop the frame Lo word
        first.remove(7);
        // Keep the stream 16-bit aligned so the next header starts in a low half
        first.push(0x0000);
        first.extend([0x1000, 0x3000]);
        let second = header(&FemHeader {
            word_count: 2,
            checksum: 0x1000 + 0x3000,
            event: 7,
            ..Default::default()
        });
        let mut words = first;
        words.extend(&second);
        words.extend([0x1000, 0x3000]);

        let mut bytes = vec![];
        push_u32(&mut bytes, PACKET_HEADER);
        push_fem_words(&mut bytes, &words);

        let out = decode_bytes(&bytes, DecodeSettings::default());
        let fems = &out.packets[0].fems;
        assert_eq!(fems.len(), 2);
        assert!(!fems[0].header_complete);
        assert!(fems[1].header_complete);
        assert_eq!(fems[1].header.event, 7);
        assert!(fems[1].word_count_matches());
        assert!(fems[1].checksum_matches());
        let codes = codes(&out.errors);
        assert_eq!(codes.iter().filter(|c| *c == "20").count(), 1);
    }

    #[test]
    fn full_flag_stops_after_second_record() {
        let mut words = header(&FemHeader::default());
        words.extend([0x1000, 0x3000]);
        words.extend(header(&FemHeader {
            full: true,
            ..Default::default()
        }));
        words.extend([0x1000, 0x3000]);
        words.extend(header(&FemHeader::default()));

        let mut bytes = vec![];
        push_u32(&mut bytes, PACKET_HEADER);
        push_fem_words(&mut bytes, &words);
        push_u32(&mut bytes, PACKET_TRAILER);

        let out = decode_bytes(&bytes, DecodeSettings::default());
        assert!(out.terminated);
        assert_eq!(out.packets.len(), 1);
        let fems = &out.packets[0].fems;
        assert_eq!(fems.len(), 2);
        assert!(fems[1].header.full);
        assert!(fems[1].truncated);
        assert_eq!(fems[1].counted_word_count, 0);
        assert!(!out.packets[0].trailer_seen);
    }

    #[test]
    fn full_flag_continue_decodes_everything() {
        let mut words = header(&FemHeader {
            full: true,
            ..Default::default()
        });
        words.extend([0x1000, 0x3000]);
        words.extend(header(&FemHeader::default()));

        let mut bytes = vec![];
        push_fem_words(&mut bytes, &words);

        let settings = DecodeSettings {
            on_full: FullFlagPolicy::Continue,
            ..Default::default()
        };
        let out = decode_bytes(&bytes, settings);
        assert!(!out.terminated);
        assert_eq!(out.packets.len(), 1);
        assert_eq!(out.packets[0].mem_pos, None);
        assert_eq!(out.packets[0].fems.len(), 2);
    }

    #[test]
    fn channel_mismatch_counted() {
        let mut words = header(&FemHeader::default());
        words.extend([0x1005, 0x2001, 0x3007, 0x1001]);
        let mut bytes = vec![];
        push_fem_words(&mut bytes, &words);

        let out = decode_bytes(&bytes, DecodeSettings::default());
        let fem = &out.packets[0].fems[0];
        assert_eq!(fem.channel_mismatch_count, 1);
        assert_eq!(fem.unterminated_channels, 1);
        assert_eq!(fem.populated_channels(), 0);
    }

    #[test]
    fn summary_payload_and_legacy_stream() {
        let mut words = encode_header(&FemHeader::default(), StreamVariant::Legacy).to_vec();
        words.extend([0x4002, 0x0010, 0x0014, 0x5002]);
        let mut bytes = vec![];
        push_fem_words(&mut bytes, &words);

        let settings = DecodeSettings {
            variant: StreamVariant::Legacy,
            payload: PayloadMode::Summary,
            ..Default::default()
        };
        let out = decode_bytes(&bytes, settings);
        let summary = out.packets[0].fems[0].summary(2).unwrap();
        assert_eq!(summary.sample_count, 2);
        assert_eq!(summary.mean, 0x12 as f64);
        assert_eq!(summary.roi_count, 1);
    }

    #[test]
    fn truncated_tail_is_padded() {
        let mut words = header(&FemHeader::default());
        words.extend([0x1000, 0x2005]);
        let mut bytes = vec![];
        push_fem_words(&mut bytes, &words);
        // Half of a channel trailer, the high half is padded with zeros
        bytes.extend_from_slice(&[0x00, 0x30]);

        let out = decode_bytes(&bytes, DecodeSettings::default());
        let fem = &out.packets[0].fems[0];
        assert_eq!(fem.waveform(0), Some(&[0x005][..]));
        // Trailer plus the zero padding word
        assert_eq!(fem.counted_word_count, 4);
    }

    #[test]
    fn illegal_transitions_are_reported_not_fatal() {
        let mut words = header(&FemHeader::default());
        words.extend([0x7777, 0x1000, 0x2001, 0x3000]);
        let mut bytes = vec![];
        push_fem_words(&mut bytes, &words);

        let out = decode_bytes(&bytes, DecodeSettings::default());
        assert_eq!(out.transitions.anomalous, 2);
        let transition_errors: Vec<_> = out
            .errors
            .iter()
            .filter(|e| e.contains("[E10]"))
            .collect();
        assert_eq!(transition_errors.len(), 2);
        assert!(transition_errors[0].contains("7777"));
        assert_eq!(out.packets[0].fems[0].waveform(0), Some(&[0x001][..]));
    }

    #[test]
    fn stats_are_reported() {
        let (send, recv) = flume::unbounded();
        let mut dissecter = Dissecter::new(DecodeSettings::default(), Some(send));
        dissecter.process_xmit_word(PACKET_HEADER, 0);
        for (i, w) in header(&FemHeader::default()).into_iter().enumerate() {
            dissecter.process_fem_word(w, (i % 2) as u8, 4 + 2 * i as u64);
        }
        let packets = dissecter.finish(28);
        assert_eq!(packets.len(), 1);
        drop(dissecter);

        let stats: Vec<StatType> = recv.drain().collect();
        assert!(stats.iter().any(|s| matches!(
            s,
            StatType::PacketSeen {
                fems: 1,
                trailer_seen: false
            }
        )));
        assert!(stats.iter().any(|s| matches!(s, StatType::FemSeen(_))));
        assert!(stats
            .iter()
            .any(|s| matches!(s, StatType::TransitionReport(_))));
        assert!(stats.iter().any(|s| matches!(s, StatType::OrphanWords(0))));
    }
}
