//! Miscellaneous utility functions
pub mod lib;

pub(crate) use {
    crate::{
        config::{prelude::*, Cfg},
        stats::{
            stats_collector::{decode_stats::DecodeStats, StatsCollector},
            stats_report::report::{Report, StatSummary},
            StatType,
        },
    },
    clap::builder::{
        styling::{AnsiColor, Effects},
        Styles,
    },
    crossbeam_channel, flume,
    indicatif::{ProgressBar, ProgressStyle},
    itertools::Itertools,
    owo_colors::OwoColorize,
    regex::Regex,
    ringbuffer::{ConstGenericRingBuffer, RingBuffer},
    serde::{Deserialize, Serialize},
    sm::sm,
    std::{
        fmt, fs,
        io,
        mem,
        path::{Path, PathBuf},
        process::ExitCode,
        str::FromStr,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, OnceLock,
        },
        thread::{self, JoinHandle},
        time::{Duration, Instant},
    },
    xmit_protocol_reader::prelude::*,
};
