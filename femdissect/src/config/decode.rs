//! Contains the [DecodeOpt] Trait for the options that change how the FEM words are decoded,
//! and the [PayloadMode] and [FullFlagPolicy] enums.

use crate::util::*;
use crate::words::variant::StreamVariant;

/// Decoding options set by a user
pub trait DecodeOpt {
    /// Bit patterns of the FEM body words.
    fn stream_variant(&self) -> StreamVariant;
    /// Keep full waveforms or only per-channel summaries.
    fn payload_mode(&self) -> PayloadMode;
    /// What to do when a FEM header reports the full flag.
    fn full_flag_policy(&self) -> FullFlagPolicy;
}

/// What a FEM record keeps from its channels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadMode {
    /// Every reconstructed sample, per channel.
    #[default]
    Waveforms,
    /// Min, max, mean, RMS and ROI count per channel.
    Summary,
}

impl fmt::Display for PayloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadMode::Waveforms => write!(f, "waveforms"),
            PayloadMode::Summary => write!(f, "summary"),
        }
    }
}

impl FromStr for PayloadMode {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WAVEFORMS" | "WAVEFORM" | "FULL" => Ok(PayloadMode::Waveforms),
            "SUMMARY" | "SUMMARIES" => Ok(PayloadMode::Summary),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Invalid payload mode, expected `waveforms` or `summary`",
            )),
        }
    }
}

/// Reaction to a FEM that reports its buffers are full.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FullFlagPolicy {
    /// Flush the open record and packet and stop decoding.
    #[default]
    Stop,
    /// Warn and keep decoding.
    Continue,
}

impl fmt::Display for FullFlagPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FullFlagPolicy::Stop => write!(f, "stop"),
            FullFlagPolicy::Continue => write!(f, "continue"),
        }
    }
}

impl FromStr for FullFlagPolicy {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STOP" => Ok(FullFlagPolicy::Stop),
            "CONTINUE" => Ok(FullFlagPolicy::Continue),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Invalid full flag policy, expected `stop` or `continue`",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            "Summary".parse::<PayloadMode>().unwrap(),
            PayloadMode::Summary
        );
        assert_eq!(
            "CONTINUE".parse::<FullFlagPolicy>().unwrap(),
            FullFlagPolicy::Continue
        );
    }

    #[test]
    fn display_parses_back() {
        for mode in [PayloadMode::Waveforms, PayloadMode::Summary] {
            assert_eq!(mode.to_string().parse::<PayloadMode>().unwrap(), mode);
        }
        for policy in [FullFlagPolicy::Stop, FullFlagPolicy::Continue] {
            assert_eq!(
                policy.to_string().parse::<FullFlagPolicy>().unwrap(),
                policy
            );
        }
    }

    #[test]
    fn invalid_values_rejected() {
        assert!("scope".parse::<PayloadMode>().is_err());
        assert!("halt".parse::<FullFlagPolicy>().is_err());
    }
}
