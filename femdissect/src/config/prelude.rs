//! Re-exports

pub use super::decode::DecodeOpt;
pub use super::decode::FullFlagPolicy;
pub use super::decode::PayloadMode;
pub use super::lib::Config;
pub use super::report::ReportOpt;
pub use super::streams::DataOutputFormat;
pub use super::streams::DataOutputMode;
pub use super::streams::StreamOpt;
pub use super::test_util::MockConfig;
