//! Builds the [Report] from the collected stats.
pub mod report;
mod table_formatter_utils;

use super::stats_collector::{decode_stats::DecodeStats, StatsCollector};
use crate::analyze::protocol_validator::TransitionReport;
use itertools::Itertools;
use owo_colors::OwoColorize;
use report::{Report, StatSummary, TransitionSummary};

/// Helper function that makes the report
pub fn make_report(
    processing_time: std::time::Duration,
    stats_collector: &mut StatsCollector,
    mute_errors: bool,
) -> Report {
    stats_collector.finalize(mute_errors);

    let mut report = Report::new(processing_time);

    if let Some(fatal) = stats_collector.take_fatal_err() {
        report.add_fatal_error(fatal.into_string());
    }

    add_global_stats_to_report(&mut report, stats_collector);
    add_detected_attributes_to_report(&mut report, stats_collector.decode_stats());
    if let Some(transitions) = stats_collector.transitions() {
        add_transitions_to_report(&mut report, transitions);
    }

    report
}

/// Helper function that adds the global stats to the report
fn add_global_stats_to_report(report: &mut Report, stats_collector: &StatsCollector) {
    if stats_collector.err_count() == 0 {
        report.add_stat(StatSummary::new(
            "Total Errors".green().to_string(),
            stats_collector.err_count().green().to_string(),
            None,
        ));
    } else {
        report.add_stat(StatSummary::new(
            "Total Errors".red().to_string(),
            stats_collector.err_count().red().to_string(),
            Some(format_error_codes(
                stats_collector.unique_error_codes_as_slice(),
            )),
        ));
    }
    let decode = stats_collector.decode_stats();

    if let Some(msg) = decode.early_termination() {
        report.add_stat(StatSummary::new(
            "Early termination".yellow().to_string(),
            "full flag".yellow().to_string(),
            Some(msg.to_string()),
        ));
    }

    report.add_stat(StatSummary::new(
        "Packets".to_string(),
        decode.packets_seen().to_string(),
        (decode.packets_without_trailer() > 0)
            .then(|| format!("{} without trailer", decode.packets_without_trailer())),
    ));
    report.add_stat(summarize_fems(decode));
    report.add_stat(summarize_channels(decode));
    report.add_stat(StatSummary::new(
        "Data size".to_string(),
        format_data_size(decode.bytes_read()),
        Some(format!("{} words", decode.words_read())),
    ));
    if decode.orphan_words() > 0 {
        report.add_stat(StatSummary::new(
            "Orphan words".to_string(),
            decode.orphan_words().to_string(),
            Some("outside any FEM record".to_string()),
        ));
    }
}

fn summarize_fems(decode: &DecodeStats) -> StatSummary {
    let mut notes: Vec<String> = Vec::new();
    if decode.fems_incomplete_header() > 0 {
        notes.push(format!(
            "{} broken headers",
            decode.fems_incomplete_header()
        ));
    }
    if decode.fems_integrity_mismatch() > 0 {
        notes.push(format!(
            "{} word count/checksum mismatches",
            decode.fems_integrity_mismatch()
        ));
    }
    StatSummary::new(
        "FEM records".to_string(),
        decode.fems_seen().to_string(),
        (!notes.is_empty()).then(|| notes.join("\n")),
    )
}

fn summarize_channels(decode: &DecodeStats) -> StatSummary {
    let counted = [
        (decode.bad_frames(), "bad frame bits"),
        (decode.channel_mismatches(), "id mismatches"),
        (decode.unterminated_channels(), "unterminated"),
        (decode.implausible_samples(), "implausible samples"),
    ];
    let notes: Vec<String> = counted
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, what)| format!("{count} {what}"))
        .collect();
    StatSummary::new(
        "Channels".to_string(),
        format!(
            "{} ({} populated)",
            decode.channels_seen(),
            decode.channels_populated()
        ),
        (!notes.is_empty()).then(|| notes.join("\n")),
    )
}

// Helper function that adds the detected attributes to the report
fn add_detected_attributes_to_report(report: &mut Report, decode: &DecodeStats) {
    report.add_detected_attribute(
        "Stream".to_string(),
        match decode.stream_variant() {
            Some(variant) => variant.to_string(),
            None => String::from("none").red().to_string(),
        },
    );
    report.add_detected_attribute(
        "Module IDs".to_string(),
        format_module_ids(decode.module_ids_as_slice()),
    );
    if decode.fems_full_flag() > 0 {
        report.add_detected_attribute(
            "Full flag".to_string(),
            format!("{} records", decode.fems_full_flag()),
        );
    }
    if decode.fems_overflow() > 0 {
        report.add_detected_attribute(
            "Overflow flag".to_string(),
            format!("{} records", decode.fems_overflow()),
        );
    }
    if decode.padded_tail_bytes() > 0 {
        report.add_detected_attribute(
            "Truncated input".to_string(),
            format!("{} bytes padded", decode.padded_tail_bytes())
                .yellow()
                .to_string(),
        );
    }
}

fn add_transitions_to_report(report: &mut Report, transitions: &TransitionReport) {
    for row in &transitions.rows {
        report.add_transition_summary(TransitionSummary {
            kind: row.kind.to_string(),
            total: row.total.to_string(),
            expected: format!("{:.2} %", row.expected_pct),
            anomalous: format_anomalous_pct(row.anomalous, row.anomalous_pct),
        });
    }
    report.add_transition_summary(TransitionSummary {
        kind: "All".to_string(),
        total: transitions.total.to_string(),
        expected: format!("{:.2} %", transitions.expected_pct),
        anomalous: format_anomalous_pct(transitions.anomalous, transitions.anomalous_pct),
    });
}

fn format_anomalous_pct(count: u64, pct: f64) -> String {
    let formatted = format!("{pct:.2} %");
    if count > 0 {
        formatted.red().to_string()
    } else {
        formatted
    }
}

/// Format the error codes, five per line
fn format_error_codes(error_codes: &[String]) -> String {
    error_codes
        .chunks(5)
        .map(|line| line.iter().map(|code| format!("E{code}")).join(" "))
        .join("\n")
}

fn format_module_ids(module_ids: &[u8]) -> String {
    if module_ids.is_empty() {
        return String::from("none").red().to_string();
    }
    module_ids.iter().join(", ")
}

fn format_data_size(size_bytes: u64) -> String {
    match size_bytes {
        0..=1024 => format!("{size_bytes} B"),
        1025..=1048576 => format!("{:.2} KiB", size_bytes as f64 / 1024_f64),
        1048577..=1073741824 => format!("{:.2} MiB", size_bytes as f64 / 1048576_f64),
        _ => format!("{:.2} GiB", size_bytes as f64 / 1073741824_f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatType;
    use crate::words::variant::StreamVariant;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_codes_wrap_after_five() {
        let codes: Vec<String> = ["10", "20", "30", "31", "40", "50"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(format_error_codes(&codes), "E10 E20 E30 E31 E40\nE50");
    }

    #[test]
    fn data_size_units() {
        assert_eq!(format_data_size(12), "12 B");
        assert_eq!(format_data_size(2048), "2.00 KiB");
        assert_eq!(format_data_size(3 * 1048576), "3.00 MiB");
    }

    #[test]
    fn make_report_lists_decode_stats() {
        let mut collector = StatsCollector::default();
        collector.collect(StatType::StreamVariant(StreamVariant::Sn));
        collector.collect(StatType::BytesRead(40));
        collector.collect(StatType::WordsRead(10));
        collector.collect(StatType::PacketSeen {
            fems: 0,
            trailer_seen: false,
        });
        collector.collect(StatType::Error("0x4: [E30] mismatch".into()));
        collector.collect(StatType::EarlyTermination("0x8: FEM full flag set".into()));

        let report = make_report(std::time::Duration::from_millis(1), &mut collector, false);
        let formatted = report.format();
        assert!(formatted.contains("E30"));
        assert!(formatted.contains("1 without trailer"));
        assert!(formatted.contains("FEM full flag set"));
        assert!(formatted.contains("40 B"));
    }
}
