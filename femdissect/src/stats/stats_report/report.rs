//! The [Report] is built by the [Controller](crate::controller::Controller) at the end of execution
//!
//! It holds the global stats, the detected attributes and the word transition summary, each rendered as a sub table.
use tabled::{
    settings::{object::Rows, Alignment, Format, Modify, Panel},
    Table, Tabled,
};

use super::table_formatter_utils::{
    format_global_stats_sub_table, format_sub_table, format_super_table, SubtableColor,
};
use owo_colors::OwoColorize;

/// Describes the columns of the report table
#[derive(Tabled, Debug, Default, Clone, PartialEq, Eq)]
pub struct StatSummary {
    /// Name of the statistic.
    pub statistic: String,
    /// Formatted value.
    pub value: String,
    /// Additional details, may be empty.
    pub notes: String,
}

impl StatSummary {
    /// Create a row, `None` notes become an empty cell.
    pub fn new(statistic: String, value: String, notes: Option<String>) -> Self {
        Self {
            statistic,
            value,
            notes: notes.unwrap_or_default(),
        }
    }
}

/// Describes the columns of the detected attributes table
#[derive(Tabled)]
struct DetectedAttribute {
    attribute: String,
    detected: String,
}

/// One row of the transition summary table
#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
pub struct TransitionSummary {
    /// Current word kind, or `All` for the totals.
    pub kind: String,
    /// Transitions into the kind.
    pub total: String,
    /// Share of transitions from an adjacent kind.
    pub expected: String,
    /// Share of transitions from a non-adjacent kind.
    pub anomalous: String,
}

/// The Report struct is used by the Controller to structure the report printed at the end of execution
///
/// Contains convenience methods to add stats to the report, and to generate the report table
pub struct Report {
    pub(crate) stats: Vec<StatSummary>,
    detected_attributes: Vec<DetectedAttribute>,
    transitions: Vec<TransitionSummary>,
    processing_time: std::time::Duration,
    fatal_error: Option<String>,
}

impl Report {
    /// Create an empty report.
    pub fn new(processing_time: std::time::Duration) -> Self {
        Self {
            stats: Vec::new(),
            detected_attributes: Vec::new(),
            transitions: Vec::new(),
            processing_time,
            fatal_error: None,
        }
    }

    /// Add a row to the global stats.
    pub fn add_stat(&mut self, stat: StatSummary) {
        self.stats.push(stat);
    }

    /// Add a row to the detected attributes.
    pub fn add_detected_attribute(&mut self, attribute: String, detected: String) {
        self.detected_attributes.push(DetectedAttribute {
            attribute,
            detected,
        });
    }

    /// Add a row to the transition summary.
    pub fn add_transition_summary(&mut self, row: TransitionSummary) {
        self.transitions.push(row);
    }

    /// Mark the report as cut short by a fatal error.
    pub fn add_fatal_error(&mut self, error: String) {
        self.fatal_error = Some(error);
    }

    /// Render the report.
    pub fn format(&self) -> String {
        let mut global_stats_table = Table::new(&self.stats);
        format_global_stats_sub_table(&mut global_stats_table);

        let detected_attributes_table = format_sub_table(
            Table::new(&self.detected_attributes),
            "Detected Attributes",
            SubtableColor::Yellow,
        );

        let mut multi_table = if self.transitions.is_empty() {
            tabled::col![global_stats_table, tabled::row![detected_attributes_table]]
        } else {
            let transitions_table = format_sub_table(
                Table::new(&self.transitions),
                "Word Transitions",
                SubtableColor::Purple,
            );
            tabled::col![
                global_stats_table,
                tabled::row![detected_attributes_table, transitions_table]
            ]
        };
        let multi_table = multi_table.with(tabled::settings::Style::rounded());
        let mut report_table = format_super_table(multi_table, self.processing_time);

        if let Some(fatal_error) = &self.fatal_error {
            let _ = report_table
                .with(Panel::header(format!(
                    "FATAL ERROR - EARLY TERMINATION: {fatal_error}"
                )))
                .with(
                    Modify::new(Rows::single(0))
                        .with(Alignment::center())
                        .with(Format::content(|x| x.to_uppercase().red().to_string())),
                );
        }
        report_table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    macro_rules! assert_stdout_contains {
        ($test:expr, $expected:literal) => {{
            use gag::BufferRedirect;
            use std::io::Read;

            let mut buf = BufferRedirect::stdout().unwrap();

            $test;

            let mut output = String::new();
            let _ = buf.read_to_string(&mut output).unwrap();
            drop(buf);

            assert!(output.contains($expected));
        }};
    }

    fn report() -> Report {
        let mut report = Report::new(std::time::Duration::from_millis(3));
        report.add_stat(StatSummary::new(
            "Total Errors".to_string(),
            "0".to_string(),
            None,
        ));
        report.add_stat(StatSummary::new(
            "Packets".to_string(),
            "725800".to_string(),
            None,
        ));
        report.add_detected_attribute("Stream".to_string(), "SN".to_string());
        report
    }

    #[test]
    fn test_report_contains_stats() {
        let formatted = report().format();
        assert!(formatted.contains("Packets"));
        assert!(formatted.contains("725800"));
        assert!(formatted.contains("DETECTED ATTRIBUTES"));
        assert!(!formatted.contains("WORD TRANSITIONS"));
    }

    #[test]
    fn test_report_with_transitions() {
        let mut report = report();
        report.add_transition_summary(TransitionSummary {
            kind: "HeaderFirst".to_string(),
            total: "2".to_string(),
            expected: "50.00 %".to_string(),
            anomalous: "50.00 %".to_string(),
        });
        let formatted = report.format();
        assert!(formatted.contains("WORD TRANSITIONS"));
        assert!(formatted.contains("HeaderFirst"));
    }

    #[test]
    fn test_report_printed() {
        use std::io::Write;
        // Written to the stdout handle directly, the test harness only captures the print macros
        assert_stdout_contains!(
            {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", report().format()).unwrap();
                stdout.flush().unwrap();
            },
            "REPORT"
        );
    }

    #[test]
    fn test_fatal_error_report() {
        let mut report = report();
        report.add_fatal_error("stdin not redirected!".to_string());
        assert!(report.format().contains("FATAL ERROR"));
    }

    #[test]
    fn stats_summary_default() {
        let stats_summary = StatSummary::default();
        assert_eq!(stats_summary.statistic, "");
        assert_eq!(stats_summary.value, "");
        assert_eq!(stats_summary.notes, "");
    }
}
