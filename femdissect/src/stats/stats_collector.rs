//! Contains the [StatsCollector] that collects stats from decoding.
pub mod decode_stats;
pub(super) mod error_stats;

use super::StatType;
use crate::analyze::protocol_validator::TransitionReport;
use crate::util::*;
use decode_stats::DecodeStats;
use error_stats::ErrorStats;

/// Collects stats from decoding.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsCollector {
    is_finalized: bool,
    decode_stats: DecodeStats,
    error_stats: ErrorStats,
    transitions: Option<TransitionReport>,
}

impl StatsCollector {
    /// Record a stat.
    pub fn collect(&mut self, stat: StatType) {
        match stat {
            StatType::Fatal(m) => self.error_stats.add_fatal_err(m),
            StatType::Error(m) => self.error_stats.add_err(m),
            StatType::EarlyTermination(m) => self.decode_stats.record_early_termination(m),
            StatType::StreamVariant(v) => self.decode_stats.record_stream_variant(v),
            StatType::WordsRead(w) => self.decode_stats.add_words_read(w),
            StatType::BytesRead(b) => self.decode_stats.add_bytes_read(b),
            StatType::TruncatedTail(p) => self.decode_stats.record_truncated_tail(p),
            StatType::PacketSeen { trailer_seen, .. } => {
                self.decode_stats.record_packet(trailer_seen)
            }
            StatType::FemSeen(tally) => self.decode_stats.record_fem(&tally),
            StatType::OrphanWords(w) => self.decode_stats.add_orphan_words(w),
            StatType::TransitionReport(report) => self.transitions = Some(*report),
        }
    }

    /// Finalize stats collection. Meaning no more stats can be collected.
    ///
    /// Does post-processing on the stats collected which assumes that no more stats are collected.
    /// Does nothing if already finalized.
    pub fn finalize(&mut self, mute_errors: bool) {
        if self.is_finalized {
            return;
        }
        self.error_stats.finalize_stats(mute_errors);
        self.decode_stats.finalize();
        self.is_finalized = true;
    }

    /// Returns a reference to the [DecodeStats].
    pub fn decode_stats(&self) -> &DecodeStats {
        &self.decode_stats
    }

    /// Returns the transition summary if decoding reached the end of the stream.
    pub fn transitions(&self) -> Option<&TransitionReport> {
        self.transitions.as_ref()
    }

    /// Returns if any words were read, if not it's likely an early error occurred.
    pub fn any_words_seen(&self) -> bool {
        self.decode_stats.words_read() > 0 || self.decode_stats.bytes_read() > 0
    }

    /// Returns a reference to the [ErrorStats].
    pub fn error_stats(&self) -> &ErrorStats {
        &self.error_stats
    }

    /// Returns the number of errors reported.
    pub fn err_count(&self) -> u64 {
        self.error_stats.err_count()
    }

    /// Return if any errors were reported.
    pub fn any_errors(&self) -> bool {
        self.error_stats.err_count() > 0
    }

    /// Returns if any fatal errors were reported.
    pub fn any_fatal_err(&self) -> bool {
        self.error_stats.any_fatal_err()
    }

    /// Takes the reported fatal error.
    pub fn take_fatal_err(&mut self) -> Option<Box<str>> {
        self.error_stats.take_fatal_err()
    }

    /// Returns a slice of the unique error codes of reported errors.
    pub fn unique_error_codes_as_slice(&self) -> &[String] {
        self.error_stats.unique_error_codes_as_slice()
    }

    /// Serialize the stats and write them to the given destination.
    pub(crate) fn write_stats(
        &self,
        mode: &DataOutputMode,
        format: DataOutputFormat,
    ) -> io::Result<()> {
        if *mode == DataOutputMode::None {
            return Ok(());
        }
        let stats_str = match format {
            DataOutputFormat::JSON => serde_json::to_string_pretty(&self)?,
            DataOutputFormat::TOML => toml::to_string_pretty(&self)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        };
        write_stats_str(mode, &stats_str)
    }
}

fn write_stats_str(mode: &DataOutputMode, stats_str: &str) -> io::Result<()> {
    match mode {
        DataOutputMode::File(path) => fs::write(path, stats_str),
        DataOutputMode::Stdout => {
            println!("{stats_str}");
            Ok(())
        }
        DataOutputMode::None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::parser_state::TransitionMatrix;
    use crate::records::{ChannelPayload, FemRecord};
    use crate::stats::stats_collector::decode_stats::FemTally;
    use crate::words::kind::WordKind;
    use crate::words::variant::StreamVariant;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn transitions() -> TransitionReport {
        let mut matrix: TransitionMatrix = [[0; WordKind::COUNT]; WordKind::COUNT];
        // One expected and one anomalous transition into HeaderFirst
        matrix[WordKind::HeaderFirst.index()][WordKind::PacketHeader.index()] = 1;
        matrix[WordKind::HeaderFirst.index()][WordKind::AdcSample.index()] = 1;
        TransitionReport::from_matrix(&matrix)
    }

    fn filled_collector() -> StatsCollector {
        let mut fem = FemRecord::new(0, ChannelPayload::Waveforms(vec![Vec::new(); 64]));
        fem.header_complete = true;
        fem.header.module_id = 5;

        let mut stats_collector = StatsCollector::default();
        stats_collector.collect(StatType::StreamVariant(StreamVariant::Legacy));
        stats_collector.collect(StatType::WordsRead(12));
        stats_collector.collect(StatType::BytesRead(48));
        stats_collector.collect(StatType::TruncatedTail(2));
        stats_collector.collect(StatType::PacketSeen {
            fems: 1,
            trailer_seen: true,
        });
        stats_collector.collect(StatType::FemSeen(FemTally::from_record(&fem)));
        stats_collector.collect(StatType::OrphanWords(3));
        stats_collector.collect(StatType::Error("0x8: [E10] error".into()));
        stats_collector.collect(StatType::EarlyTermination("0x10: stopped".into()));
        stats_collector.collect(StatType::TransitionReport(Box::new(transitions())));
        stats_collector.finalize(false);
        stats_collector
    }

    #[test]
    fn collect_counts() {
        let stats_collector = filled_collector();
        let decode = stats_collector.decode_stats();
        assert_eq!(decode.stream_variant(), Some(StreamVariant::Legacy));
        assert_eq!(decode.words_read(), 12);
        assert_eq!(decode.padded_tail_bytes(), 2);
        assert_eq!(decode.packets_seen(), 1);
        assert_eq!(decode.fems_seen(), 1);
        assert_eq!(decode.module_ids_as_slice(), &[5]);
        assert_eq!(decode.orphan_words(), 3);
        assert_eq!(decode.early_termination(), Some("0x10: stopped"));
        assert_eq!(stats_collector.err_count(), 1);
        assert_eq!(stats_collector.unique_error_codes_as_slice(), &["10"]);
        assert_eq!(stats_collector.transitions().unwrap().anomalous, 1);
        assert!(stats_collector.any_words_seen());
    }

    #[test]
    fn test_serde() {
        let stats_collector = filled_collector();

        let json = serde_json::to_string(&stats_collector).unwrap();
        let from_json = serde_json::from_str::<StatsCollector>(&json).unwrap();
        assert_eq!(stats_collector, from_json);

        let toml = toml::to_string(&stats_collector).unwrap();
        let from_toml = toml::from_str::<StatsCollector>(&toml).unwrap();
        assert_eq!(stats_collector, from_toml);
    }

    #[test]
    fn write_stats_to_file() {
        let tmp_d = TempDir::new().unwrap();
        let path = tmp_d.child("stats.json");
        let stats_collector = filled_collector();
        stats_collector
            .write_stats(
                &DataOutputMode::File(path.as_path().into()),
                DataOutputFormat::JSON,
            )
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let from_file: StatsCollector = serde_json::from_str(&content).unwrap();
        assert_eq!(from_file, stats_collector);
    }
}
