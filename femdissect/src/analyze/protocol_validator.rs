//! Adjacency relation between word kinds and the transition summary built from the
//! counted (current, previous) pairs.
//!
//! Anomalous transitions are diagnostics only, they never change how a word is handled.

use super::parser_state::TransitionMatrix;
use crate::util::*;
use crate::words::kind::WordKind;

/// Returns true if `curr` may follow `prev` in a well formed stream.
pub fn is_adjacent(prev: WordKind, curr: WordKind) -> bool {
    use WordKind::*;
    if prev == Unknown {
        return false;
    }
    match curr {
        HeaderFirst => matches!(prev, PacketHeader | ChannelTrailer | HeaderReservedLo),
        HeaderIdSlot | HeaderWordCountHi | HeaderWordCountLo | HeaderEventHi | HeaderEventLo
        | HeaderFrameHi | HeaderFrameLo | HeaderChecksumHi | HeaderChecksumLo
        | HeaderReservedHi | HeaderReservedLo => match (prev.header_slot(), curr.header_slot()) {
            (Some(p), Some(c)) => p + 1 == c,
            _ => false,
        },
        ChannelHeader => matches!(prev, ChannelHeader | ChannelTrailer | HeaderReservedLo),
        RoiHeader => matches!(prev, ChannelHeader | AdcSample | AdcHuffman),
        AdcSample => matches!(prev, ChannelHeader | RoiHeader | AdcSample | AdcHuffman),
        AdcHuffman => matches!(prev, AdcSample | AdcHuffman),
        ChannelTrailer => matches!(prev, ChannelHeader | AdcSample | AdcHuffman),
        PacketHeader => prev == PacketTrailer,
        PacketTrailer => matches!(prev, ChannelTrailer | HeaderReservedLo),
        Unknown => false,
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Transition counts into one word kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRow {
    /// The current word kind.
    pub kind: WordKind,
    /// Transitions into `kind`.
    pub total: u64,
    /// Transitions from an adjacent kind.
    pub expected: u64,
    /// Transitions from a non-adjacent kind.
    pub anomalous: u64,
    pub expected_pct: f64,
    pub anomalous_pct: f64,
}

/// One anomalous (previous, current) pair and how often it was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalousPair {
    pub prev: WordKind,
    pub curr: WordKind,
    pub count: u64,
}

/// Summary of the transition matrix, per current kind and overall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionReport {
    /// One row per word kind that was observed as a current kind.
    pub rows: Vec<TransitionRow>,
    /// Anomalous pairs, most frequent first.
    pub anomalous_pairs: Vec<AnomalousPair>,
    pub total: u64,
    pub expected: u64,
    pub anomalous: u64,
    pub expected_pct: f64,
    pub anomalous_pct: f64,
}

impl TransitionReport {
    /// Summarize a transition matrix indexed `[current][previous]`.
    pub fn from_matrix(matrix: &TransitionMatrix) -> Self {
        let mut report = Self::default();
        for curr in WordKind::ALL {
            let mut row_expected = 0;
            let mut row_anomalous = 0;
            for prev in WordKind::ALL {
                let count = matrix[curr.index()][prev.index()];
                if count == 0 {
                    continue;
                }
                if is_adjacent(prev, curr) {
                    row_expected += count;
                } else {
                    row_anomalous += count;
                    report.anomalous_pairs.push(AnomalousPair { prev, curr, count });
                }
            }
            let row_total = row_expected + row_anomalous;
            if row_total == 0 {
                continue;
            }
            report.rows.push(TransitionRow {
                kind: curr,
                total: row_total,
                expected: row_expected,
                anomalous: row_anomalous,
                expected_pct: percentage(row_expected, row_total),
                anomalous_pct: percentage(row_anomalous, row_total),
            });
            report.expected += row_expected;
            report.anomalous += row_anomalous;
        }
        report.total = report.expected + report.anomalous;
        report.expected_pct = percentage(report.expected, report.total);
        report.anomalous_pct = percentage(report.anomalous, report.total);
        report
            .anomalous_pairs
            .sort_by(|a, b| b.count.cmp(&a.count).then(a.curr.cmp(&b.curr)));
        report
    }

    /// Returns true if any anomalous transition was counted.
    pub fn has_anomalies(&self) -> bool {
        self.anomalous > 0
    }
}
