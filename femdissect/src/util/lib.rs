//! Miscellaneous utility functions

use crate::config::prelude::*;
use std::sync::{atomic::AtomicBool, Arc};

/// Start the [stderrlog] instance, and immediately use it to log the configured [DataOutputMode].
pub fn init_error_logger(cfg: &(impl ReportOpt + StreamOpt + DecodeOpt + std::fmt::Debug)) {
    if let Err(e) = stderrlog::new()
        .module("femdissect")
        .module("xmit_protocol_reader")
        .verbosity(cfg.verbosity() as usize)
        .init()
    {
        eprintln!("Failed to initialize logger: {e}");
    }
    match cfg.packet_output() {
        DataOutputMode::Stdout => log::trace!("Packet output set to stdout"),
        DataOutputMode::File(path) => log::trace!("Packet output set to {}", path.display()),
        DataOutputMode::None => log::trace!("Packet output disabled"),
    }
    log::trace!("Starting femdissect with args: {cfg:#?}");
    log::trace!(
        "Decoding {} stream, {} payload, {} on full flag",
        cfg.stream_variant(),
        cfg.payload_mode(),
        cfg.full_flag_policy()
    );
}

/// Initializes the Ctrl+C handler to facilitate graceful shutdown on Ctrl+C
///
/// Also handles SIGTERM and SIGHUP if the `termination` feature is enabled
pub fn init_ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    // Handles SIGINT, SIGTERM and SIGHUP (as the `termination` feature is  enabled)
    if let Err(e) = ctrlc::set_handler({
        let mut stop_sig_count = 0;
        move || {
            log::warn!(
                "Stop Ctrl+C, SIGTERM, or SIGHUP received, stopping gracefully, please wait..."
            );
            stop_flag.store(true, std::sync::atomic::Ordering::SeqCst);
            stop_sig_count += 1;
            if stop_sig_count > 1 {
                log::warn!("Second stop signal received, ungraceful shutdown.");
                std::process::exit(1);
            }
        }
    }) {
        log::warn!("Failed setting Ctrl+C handler: {e}");
    }
}

/// Exits the program with the appropriate exit code
///
/// A successful run still exits with the configured `any errors` exit code if any errors were found.
pub fn exit(
    exit_code: u8,
    any_errors_flag: &AtomicBool,
    cfg: &impl ReportOpt,
) -> std::process::ExitCode {
    if exit_code == 0 {
        log::debug!("Exit successful from data processing");
        match cfg.any_errors_exit_code() {
            Some(code) if any_errors_flag.load(std::sync::atomic::Ordering::Relaxed) => {
                std::process::ExitCode::from(code)
            }
            _ => std::process::ExitCode::SUCCESS,
        }
    } else {
        std::process::ExitCode::from(exit_code)
    }
}
