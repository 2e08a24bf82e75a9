//! Contains the [StreamOpt] trait, where the XMIT stream is read from and where the decoded packets and stats go.
//!
//! Also holds the [DataOutputMode] and [DataOutputFormat] shared by both outputs.

use crate::util::*;

/// Sources and sinks of a run.
pub trait StreamOpt {
    /// XMIT stream to decode, stdin if `None`.
    fn input_file(&self) -> Option<&Path>;
    /// Destination of the decoded packets, written as one JSON object per line.
    ///
    /// [DataOutputMode::Stdout] also suppresses the report so the lines can be piped.
    fn packet_output(&self) -> DataOutputMode;
    /// Destination of the final stats.
    fn stats_output_mode(&self) -> DataOutputMode;
    /// Serialization of the final stats, required when [stats_output_mode](Self::stats_output_mode) is set.
    fn stats_output_format(&self) -> Option<DataOutputFormat>;
}

/// Where a stream of output goes.
#[derive(PartialEq, Debug, Clone)]
pub enum DataOutputMode {
    /// A file, created or truncated.
    File(Box<Path>),
    /// Standard output.
    Stdout,
    /// Nowhere.
    None,
}

impl fmt::Display for DataOutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOutputMode::File(p) => write!(f, "File({})", p.display()),
            DataOutputMode::Stdout => write!(f, "Stdout"),
            DataOutputMode::None => write!(f, "None"),
        }
    }
}

impl FromStr for DataOutputMode {
    type Err = io::Error;

    /// `stdout` and `none` in any case, anything else is a file path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STDOUT" => Ok(DataOutputMode::Stdout),
            "NONE" => Ok(DataOutputMode::None),
            _ => Ok(DataOutputMode::File(Path::new(s).into())),
        }
    }
}

/// Serialization of the stats output.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum DataOutputFormat {
    /// Pretty printed JSON.
    JSON,
    /// TOML.
    TOML,
}

impl fmt::Display for DataOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOutputFormat::JSON => write!(f, "JSON"),
            DataOutputFormat::TOML => write!(f, "TOML"),
        }
    }
}

impl FromStr for DataOutputFormat {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "JSON" => Ok(DataOutputFormat::JSON),
            "TOML" => Ok(DataOutputFormat::TOML),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid stats format {s}, expected JSON or TOML"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_mode_from_str() {
        assert_eq!(
            "stdout".parse::<DataOutputMode>().unwrap(),
            DataOutputMode::Stdout
        );
        assert_eq!(
            "None".parse::<DataOutputMode>().unwrap(),
            DataOutputMode::None
        );
        assert_eq!(
            "packets.jsonl".parse::<DataOutputMode>().unwrap(),
            DataOutputMode::File(Path::new("packets.jsonl").into())
        );
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!(
            "toml".parse::<DataOutputFormat>().unwrap(),
            DataOutputFormat::TOML
        );
        assert!("yaml".parse::<DataOutputFormat>().is_err());
    }
}
