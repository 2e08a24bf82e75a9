//! Contains the [Config] super trait over the option groups of a run, and the `--help` [styles].

use super::{decode::DecodeOpt, report::ReportOpt, streams::StreamOpt};
use crate::util::*;

/// A complete femdissect configuration: how to decode, what to report and where the data flows.
pub trait Config: Send + Sync + std::marker::Sized
where
    Self: DecodeOpt + ReportOpt + StreamOpt,
{
    /// Reject option combinations that parse but cannot run
    fn validate_args(&self) -> Result<(), String> {
        if self.any_errors_exit_code().is_some_and(|val| val == 0) {
            return Err("Invalid config: Exit code for any errors cannot be 0".to_string());
        }
        if self.packet_output() == DataOutputMode::Stdout
            && self.stats_output_mode() == DataOutputMode::Stdout
        {
            return Err(
                "Invalid config: Packet records and stats cannot both be written to stdout"
                    .to_string(),
            );
        }
        if let (DataOutputMode::File(out), DataOutputMode::File(stats)) =
            (self.packet_output(), self.stats_output_mode())
        {
            if out == stats {
                return Err(format!(
                    "Invalid config: Packet records and stats cannot be written to the same file (got: {})",
                    out.display()
                ));
            }
        }
        if let Some(input) = self.input_file() {
            if !input.is_file() {
                return Err(format!(
                    "Invalid config: Input file does not exist (got: {})",
                    input.to_string_lossy()
                ));
            }
        }
        Ok(())
    }
}

/// Colours of the `--help` output.
pub fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default() | Effects::BOLD)
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}
