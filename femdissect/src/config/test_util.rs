#![allow(missing_docs)]

use crate::util::*;
use crate::words::variant::StreamVariant;

#[derive(Debug, Clone)]
/// Complete configurable Mock config for testing
pub struct MockConfig {
    pub verbosity: u8,
    pub max_tolerate_errors: u32,
    pub input_file: Option<PathBuf>,
    pub packet_output: DataOutputMode,
    pub any_errors_exit_code: Option<u8>,
    pub mute_errors: bool,
    pub stats_output_mode: DataOutputMode,
    pub stats_output_format: Option<DataOutputFormat>,
    pub show_error_codes: Vec<u8>,
    pub stream_variant: StreamVariant,
    pub payload_mode: PayloadMode,
    pub full_flag_policy: FullFlagPolicy,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConfig {
    pub fn new() -> Self {
        Self {
            verbosity: 0,
            max_tolerate_errors: 0,
            input_file: None,
            packet_output: DataOutputMode::None,
            any_errors_exit_code: None,
            mute_errors: false,
            stats_output_mode: DataOutputMode::None,
            stats_output_format: None,
            show_error_codes: Vec::new(),
            stream_variant: StreamVariant::default(),
            payload_mode: PayloadMode::default(),
            full_flag_policy: FullFlagPolicy::default(),
        }
    }
}

impl Config for MockConfig {}

impl ReportOpt for MockConfig {
    fn verbosity(&self) -> u8 {
        self.verbosity
    }
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

impl StreamOpt for MockConfig {
    fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }
    fn packet_output(&self) -> DataOutputMode {
        self.packet_output.clone()
    }
    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output_mode.clone()
    }
    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }
}

impl DecodeOpt for MockConfig {
    fn stream_variant(&self) -> StreamVariant {
        self.stream_variant
    }
    fn payload_mode(&self) -> PayloadMode {
        self.payload_mode
    }
    fn full_flag_policy(&self) -> FullFlagPolicy {
        self.full_flag_policy
    }
}
