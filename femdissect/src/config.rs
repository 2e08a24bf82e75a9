//! Contains the [Cfg] struct that parses and stores the command line arguments
//!
//! [Cfg] uses procedural macros from the `clap` library to implement most of the argument parsing and validation logic.
//! The [Cfg] struct implements the option traits grouped by the [Config] super trait.

use crate::util::*;
use crate::words::variant::StreamVariant;
use clap::Parser;
use clap_complete::Shell;

pub mod decode;
pub mod lib;
pub mod prelude;
pub mod report;
pub mod streams;
pub mod test_util;

/// The [CONFIG] static variable is used to store the [Cfg] created from the parsed command line arguments
pub static CONFIG: OnceLock<Cfg> = OnceLock::new();

/// The [Cfg] struct uses procedural macros and implements the [Config] trait, to provide convenient access to the command line arguments.
#[derive(Parser, Debug)]
#[command(name = "femdissect - FEM data dissector for XMIT transport streams")]
#[command(bin_name = "femdissect", version)]
#[command(about = "femdissect decodes and verifies multiplexed FEM data carried in XMIT streams.")]
#[command(
    long_about = "\nfemdissect decodes and verifies multiplexed FEM data carried in XMIT streams.\n\
It reconstructs the FEM records and their channel waveforms, reports protocol\n\
anomalies, and can write the decoded packets as JSON lines."
)]
#[command(styles = lib::styles())]
pub struct Cfg {
    /// Input file (default: stdin)
    #[arg(name = "XMIT Data", value_hint = clap::ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// Verbosity level 0-4 (Errors, Warnings, Info, Debug, Trace)
    #[arg(short = 'v', long = "verbosity", default_value_t = 1)]
    verbosity: u8,

    /// Max tolerate errors before exiting, if set to 0 -> no limit to errors
    #[arg(
        short = 'e',
        long = "max-tolerate-errors",
        visible_aliases = ["max-errors", "tolerate-errors"],
        default_value_t = 0
    )]
    max_tolerate_errors: u32,

    /// Set the exit code for if any errors are detected in the input data (cannot be 0)
    #[arg(short = 'E', long = "any-errors-exit-code", visible_alias = "exit-code")]
    any_errors_exit_code: Option<u8>,

    /// Body word format of the stream (sn/legacy)
    #[arg(long = "stream", visible_alias = "variant", default_value_t = StreamVariant::Sn)]
    stream: StreamVariant,

    /// Keep every sample (waveforms) or only per-channel statistics (summary) in the packet records
    #[arg(long = "payload", default_value_t = PayloadMode::Waveforms)]
    payload: PayloadMode,

    /// Stop decoding when a FEM reports the full flag, or continue with a warning (stop/continue)
    #[arg(long = "on-full", default_value_t = FullFlagPolicy::Stop)]
    on_full: FullFlagPolicy,

    /// Write the decoded packets as JSON lines to a file or `stdout`. The report is not printed when writing to stdout.
    #[arg(name = "OUTPUT DATA", short = 'o', long = "output", visible_alias = "out")]
    output: Option<DataOutputMode>,

    /// Don't show error messages - helpful if there's a large amount of errors and you just want to see the report
    #[arg(short, long, default_value_t = false)]
    mute_errors: bool,

    /// Output stats (default: none), requires setting a data format option (JSON, TOML)
    #[arg(
        name = "OUTPUT FINAL STATS",
        short = 'S',
        long = "output-stats",
        default_value_t = DataOutputMode::None,
        visible_alias = "output-stats-report",
        requires = "STATS FORMAT",
    )]
    stats_output: DataOutputMode,

    /// Output stats format (JSON/TOML), requires setting a stats output option
    #[arg(
        name = "STATS FORMAT",
        short = 'D',
        long = "stats-format",
        visible_alias = "stats-data-format",
        requires = "OUTPUT FINAL STATS"
    )]
    stats_output_format: Option<DataOutputFormat>,

    /// Print only anomalies with these exact codes, e.g. `-w 30 31` for the channel errors (`30` does not select `E31`)
    #[arg(
        short = 'w',
        long = "show-only-errors-with-codes",
        visible_aliases = ["error-codes", "show-errors-with-codes"],
        value_delimiter = ' ',
        num_args = 1..
    )]
    show_error_codes: Vec<u8>,

    /// Generate completion scripts for the specified shell.
    /// Note: The completion script is printed to stdout
    #[arg(
        long = "generate-completions",
        value_hint = clap::ValueHint::Other,
        value_name = "SHELL"
    )]
    pub generate_completions: Option<Shell>,
}

impl Cfg {
    /// Get a reference to the global config
    ///
    /// Panics if called before [init_config].
    pub fn global() -> &'static Cfg {
        CONFIG.get().expect("Config is not initialized")
    }

    /// Generate completion scripts for the specified shell.
    pub fn generate_completion_script(shell: Shell) {
        clap_complete::generate(
            shell,
            &mut <Cfg as clap::CommandFactory>::command(),
            "femdissect",
            &mut io::stdout(),
        );
    }
}

/// Implementing the config super trait requires implementing all the sub traits
impl Config for Cfg {}

impl StreamOpt for Cfg {
    #[inline]
    fn input_file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
    // Packets are only written if an output is set
    #[inline]
    fn packet_output(&self) -> DataOutputMode {
        self.output.clone().unwrap_or(DataOutputMode::None)
    }
    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output.clone()
    }
    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }
}

impl ReportOpt for Cfg {
    #[inline]
    fn verbosity(&self) -> u8 {
        self.verbosity
    }
    #[inline]
    fn max_tolerate_errors(&self) -> u32 {
        self.max_tolerate_errors
    }
    fn any_errors_exit_code(&self) -> Option<u8> {
        self.any_errors_exit_code
    }
    fn mute_errors(&self) -> bool {
        self.mute_errors
    }
    fn shown_error_codes(&self) -> &[u8] {
        &self.show_error_codes
    }
}

impl DecodeOpt for Cfg {
    fn stream_variant(&self) -> StreamVariant {
        self.stream
    }
    fn payload_mode(&self) -> PayloadMode {
        self.payload
    }
    fn full_flag_policy(&self) -> FullFlagPolicy {
        self.on_full
    }
}

/// Get the [config][super::config::Cfg] from the command line arguments and set the static [CONFIG] variable.
pub fn init_config() -> Result<(), String> {
    let cfg = <Cfg as clap::Parser>::parse();
    cfg.validate_args()?;
    CONFIG
        .set(cfg)
        .map_err(|_| "Config already initialized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let cfg = Cfg::parse_from(["femdissect", "run.xmit"]);
        assert_eq!(cfg.input_file(), Some(Path::new("run.xmit")));
        assert_eq!(cfg.verbosity(), 1);
        assert_eq!(cfg.max_tolerate_errors(), 0);
        assert_eq!(cfg.stream_variant(), StreamVariant::Sn);
        assert_eq!(cfg.payload_mode(), PayloadMode::Waveforms);
        assert_eq!(cfg.full_flag_policy(), FullFlagPolicy::Stop);
        assert_eq!(cfg.packet_output(), DataOutputMode::None);
        assert_eq!(cfg.stats_output_mode(), DataOutputMode::None);
        assert!(cfg.error_code_filter().is_none());
    }

    #[test]
    fn decode_options() {
        let cfg = Cfg::parse_from([
            "femdissect",
            "run.xmit",
            "--stream",
            "legacy",
            "--payload",
            "summary",
            "--on-full",
            "continue",
        ]);
        assert_eq!(cfg.stream_variant(), StreamVariant::Legacy);
        assert_eq!(cfg.payload_mode(), PayloadMode::Summary);
        assert_eq!(cfg.full_flag_policy(), FullFlagPolicy::Continue);
    }

    #[test]
    fn output_modes() {
        let cfg = Cfg::parse_from(["femdissect", "run.xmit", "-o", "stdout"]);
        assert_eq!(cfg.packet_output(), DataOutputMode::Stdout);
        let cfg = Cfg::parse_from(["femdissect", "run.xmit", "-o", "packets.jsonl"]);
        assert_eq!(
            cfg.packet_output(),
            DataOutputMode::File(Path::new("packets.jsonl").into())
        );
    }

    #[test]
    fn stats_output_requires_format() {
        let res = Cfg::try_parse_from(["femdissect", "run.xmit", "-S", "stdout"]);
        assert!(res.is_err());
        let cfg = Cfg::try_parse_from(["femdissect", "run.xmit", "-S", "stdout", "-D", "json"])
            .unwrap();
        assert_eq!(cfg.stats_output_mode(), DataOutputMode::Stdout);
        assert_eq!(cfg.stats_output_format(), Some(DataOutputFormat::JSON));
    }

    #[test]
    fn error_code_filter() {
        let cfg = Cfg::parse_from(["femdissect", "run.xmit", "-w", "30", "31"]);
        assert_eq!(cfg.error_code_filter(), Some(&[30, 31][..]));

        assert!(Cfg::try_parse_from(["femdissect", "run.xmit", "-w", "E30"]).is_err());
    }

    #[test]
    fn invalid_stream_rejected() {
        assert!(Cfg::try_parse_from(["femdissect", "--stream", "mu"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cfg::command().debug_assert();
    }
}
