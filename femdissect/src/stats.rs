//! All stat collecting functionality: the [StatType] messages sent to the [Controller](crate::controller::Controller),
//! the [StatsCollector](stats_collector::StatsCollector) that accumulates them, and the report printed at the end.

use crate::analyze::protocol_validator::TransitionReport;
use crate::util::*;
use crate::words::variant::StreamVariant;
use stats_collector::decode_stats::FemTally;

pub mod err_printer;
pub mod stats_collector;
pub mod stats_report;

#[derive(Debug, Clone, PartialEq)]
/// Possible stats that can be sent to the Controller.
pub enum StatType {
    /// Fatal error, stop processing.
    Fatal(Box<str>),
    /// Protocol anomaly, reported but processing continues.
    Error(Box<str>),
    /// Decoding was stopped by a FEM reporting the full flag.
    EarlyTermination(Box<str>),
    /// Body word format the stream is decoded with.
    StreamVariant(StreamVariant),
    /// Increment the total 32-bit words read.
    WordsRead(u32),
    /// Increment the total bytes read.
    BytesRead(u64),
    /// The input ended inside a 32-bit word, the number of padded bytes.
    TruncatedTail(u8),
    /// A packet was emitted.
    PacketSeen {
        /// FEM records in the packet.
        fems: u32,
        /// The packet was closed by a trailer.
        trailer_seen: bool,
    },
    /// A FEM record was emitted.
    FemSeen(FemTally),
    /// Words that arrived outside any FEM record.
    OrphanWords(u64),
    /// Summary of the word transitions, sent once at end of stream.
    TransitionReport(Box<TransitionReport>),
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatType::Fatal(e) => write!(f, "Fatal error: {e}"),
            StatType::Error(e) => write!(f, "Error: {e}"),
            StatType::EarlyTermination(msg) => write!(f, "Early termination: {msg}"),
            StatType::StreamVariant(v) => write!(f, "Stream variant: {v}"),
            StatType::WordsRead(val) => write!(f, "{val} words read"),
            StatType::BytesRead(val) => write!(f, "{val} bytes read"),
            StatType::TruncatedTail(val) => write!(f, "Input truncated, {val} bytes padded"),
            StatType::PacketSeen { fems, trailer_seen } => {
                write!(f, "Packet seen with {fems} FEMs (trailer: {trailer_seen})")
            }
            StatType::FemSeen(tally) => write!(f, "FEM seen: module {}", tally.module_id),
            StatType::OrphanWords(val) => write!(f, "{val} orphan words"),
            StatType::TransitionReport(report) => write!(
                f,
                "Transition report: {} of {} anomalous",
                report.anomalous, report.total
            ),
        }
    }
}
