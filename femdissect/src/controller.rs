//! Contains the [Controller] that collects stats and reports errors.
//! It also controls the stop flag, which is raised on a fatal error or when the configured number of errors is reached.
//! When every producer has hung up, it prints a summary of the stats collected, using the [Report] struct.
//!
//! Also contains the convenience [init_controller] function, which spawns a thread with the [Controller] running.

use crate::stats::err_printer::ErrPrinter;
use crate::util::*;
use std::io::Write;

/// Handles returned by [init_controller].
pub type ControllerHandles = (
    JoinHandle<()>,
    flume::Sender<StatType>,
    Arc<AtomicBool>,
    Arc<AtomicBool>,
);

/// Spawns a thread with the [Controller] running, and returns the thread handle, the channel to send stats to, the stop flag and the any errors flag.
pub fn init_controller<C: Config + 'static>(config: &'static C) -> io::Result<ControllerHandles> {
    log::trace!("Initializing stats controller");
    let mut controller = Controller::new(config);
    let stats_send_chan = controller.send_channel();
    let thread_stop_flag = controller.end_processing_flag();
    let any_errors_flag = controller.any_errors_flag();

    let stats_thread = thread::Builder::new()
        .name("stats_thread".to_string())
        .spawn(move || {
            controller.run();
        })?;
    Ok((
        stats_thread,
        stats_send_chan,
        thread_stop_flag,
        any_errors_flag,
    ))
}

/// The Controller receives stats and builds a summary report that is printed at the end of execution.
pub struct Controller<C: Config + 'static> {
    stats_collector: StatsCollector,
    /// Time from [Controller] is instantiated, to all decoding threads disconnected their [StatType] producer channel.
    pub processing_time: Instant,
    config: &'static C,
    max_tolerate_errors: u32,
    stats_recv_chan: flume::Receiver<StatType>,
    // Set to None when the event loop starts, the loop only breaks once every sender is dropped
    stats_send_chan: Option<flume::Sender<StatType>>,
    end_processing_flag: Arc<AtomicBool>,
    any_errors_flag: Arc<AtomicBool>,
    spinner: Option<ProgressBar>,
    spinner_message: String,
}

impl<C: Config + 'static> Controller<C> {
    /// Creates a new [Controller] from a [Config].
    pub fn new(global_config: &'static C) -> Self {
        let (stats_send_chan, stats_recv_chan) = flume::unbounded();
        Controller {
            stats_collector: StatsCollector::default(),
            config: global_config,
            processing_time: Instant::now(),
            max_tolerate_errors: global_config.max_tolerate_errors(),
            stats_recv_chan,
            stats_send_chan: Some(stats_send_chan),
            end_processing_flag: Arc::new(AtomicBool::new(false)),
            any_errors_flag: Arc::new(AtomicBool::new(false)),
            spinner: Some(new_styled_spinner()),
            spinner_message: String::new(),
        }
    }

    /// Returns a clone of the channel that is used to send stats to the Controller.
    ///
    /// Once [run](Self::run) is called no new producers are accepted, and the returned channel is already disconnected.
    pub fn send_channel(&self) -> flume::Sender<StatType> {
        match self.stats_send_chan.as_ref() {
            Some(chan) => chan.clone(),
            None => {
                log::error!("Controller is already running and does not accept new producers");
                flume::unbounded().0
            }
        }
    }

    /// Returns a cloned reference to the end processing flag.
    pub fn end_processing_flag(&self) -> Arc<AtomicBool> {
        self.end_processing_flag.clone()
    }

    /// Returns a cloned reference to the any errors flag
    ///
    /// The flag is set if there's any errors in the input data at end of processing.
    pub fn any_errors_flag(&self) -> Arc<AtomicBool> {
        self.any_errors_flag.clone()
    }

    /// Starts the event loop for the Controller
    /// This function will block until the channel is closed
    pub fn run(&mut self) {
        self.stats_send_chan = None;

        while let Ok(stats_update) = self.stats_recv_chan.recv() {
            self.update(stats_update);
        }

        if self.config.packet_output() == DataOutputMode::Stdout {
            // Packets are written to stdout, the report would interleave with them
            log::info!("Output is being piped, skipping report summary printout.");
            self.stats_collector.finalize(self.config.mute_errors());
            if let Some(spinner) = self.spinner.take() {
                spinner.finish_and_clear();
            }
        } else {
            self.process_stats();

            // Without any words it's likely an early error occurred and no data was processed
            if self.stats_collector.any_words_seen() {
                self.new_spinner_with_prefix("Generating report".to_string());
                self.print();
            } else if let Some(spinner) = self.spinner.take() {
                spinner.finish_and_clear();
            }
        }
        if self.stats_collector.any_errors() {
            self.any_errors_flag.store(true, Ordering::SeqCst);
        }

        if let Some(format) = self.config.stats_output_format() {
            let mode = self.config.stats_output_mode();
            if mode != DataOutputMode::None {
                if let Err(e) = self.stats_collector.write_stats(&mode, format) {
                    log::error!("Failed to write stats: {e}");
                }
            }
        }
    }

    fn update(&mut self, stat: StatType) {
        match stat {
            StatType::WordsRead(_) => {
                self.stats_collector.collect(stat);
                self.set_spinner_prefix(format!(
                    "Decoding {words} words",
                    words = self.stats_collector.decode_stats().words_read()
                ));
            }
            StatType::PacketSeen { .. } => {
                self.stats_collector.collect(stat);
                self.set_spinner_prefix(format!(
                    "Decoded {packets} packets",
                    packets = self.stats_collector.decode_stats().packets_seen()
                ));
            }
            StatType::EarlyTermination(msg) => {
                log::warn!("{msg}");
                self.stats_collector.collect(StatType::EarlyTermination(msg));
            }
            StatType::Error(msg) => {
                if self.stats_collector.any_fatal_err() {
                    log::trace!("Fatal error already seen, ignoring error: {msg}");
                    return;
                }

                self.stats_collector.collect(StatType::Error(msg));

                self.set_spinner_msg(
                    format!(
                        "{err_cnt} Errors in data!",
                        err_cnt = self.stats_collector.err_count()
                    )
                    .red()
                    .to_string(),
                );

                if self.max_tolerate_errors > 0
                    && self.stats_collector.err_count() == u64::from(self.max_tolerate_errors)
                {
                    log::trace!("Errors reached maximum tolerated errors, exiting...");
                    self.end_processing_flag.store(true, Ordering::SeqCst);
                }
            }
            StatType::Fatal(err) => {
                if self.stats_collector.any_fatal_err() {
                    log::trace!("Fatal error already seen, ignoring error: {err}");
                    return;
                }
                self.end_processing_flag.store(true, Ordering::SeqCst);
                log::error!("FATAL: {err}\nShutting down...");
                self.stats_collector.collect(StatType::Fatal(err));
            }
            StatType::StreamVariant(_)
            | StatType::BytesRead(_)
            | StatType::TruncatedTail(_)
            | StatType::FemSeen(_)
            | StatType::OrphanWords(_)
            | StatType::TransitionReport(_) => self.stats_collector.collect(stat),
        }
    }

    fn process_stats(&mut self) {
        if self.stats_collector.err_count() > 0 {
            self.new_spinner_with_prefix(
                format!(
                    "Processing {err_count} error messages",
                    err_count = self.stats_collector.err_count()
                )
                .yellow()
                .to_string(),
            );
        }
        self.stats_collector.finalize(self.config.mute_errors());

        if self.stats_collector.any_errors() && !self.config.mute_errors() {
            ErrPrinter::new(
                (self.max_tolerate_errors > 0).then_some(self.max_tolerate_errors),
                self.config.error_code_filter(),
            )
            .print(
                self.stats_collector.error_stats().errors_as_slice_iter(),
                self.stats_collector.unique_error_codes_as_slice(),
            );
        }
    }

    /// Builds and prints the report
    fn print(&mut self) {
        let report = crate::stats::stats_report::make_report(
            self.processing_time.elapsed(),
            &mut self.stats_collector,
            self.config.mute_errors(),
        );
        self.append_spinner_msg("... completed");
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }

        let mut lock = io::stdout().lock();
        if let Err(e) = writeln!(lock, "{}", report.format()).and_then(|_| lock.flush()) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                log::warn!("Broken pipe, stdout was closed before report could be written");
            } else {
                log::error!("Failed to write report to stdout: {e}");
            }
        }
    }

    /// Abandon the current spinner with a completed message and start a new one with `prefix`.
    fn new_spinner_with_prefix(&mut self, prefix: String) {
        self.append_spinner_msg("... completed");
        if let Some(spinner) = self.spinner.take() {
            spinner.abandon();
        }
        let spinner = new_styled_spinner();
        spinner.set_prefix(prefix);
        self.spinner = Some(spinner);
        self.spinner_message.clear();
    }

    fn set_spinner_prefix(&mut self, prefix: String) {
        if let Some(spinner) = self.spinner.as_ref() {
            spinner.set_prefix(prefix);
        }
    }

    fn set_spinner_msg(&mut self, new_msg: String) {
        if let Some(spinner) = self.spinner.as_ref() {
            self.spinner_message = new_msg;
            spinner.set_message(self.spinner_message.clone());
        }
    }

    fn append_spinner_msg(&mut self, to_append: &str) {
        if let Some(spinner) = self.spinner.as_ref() {
            self.spinner_message.push_str(to_append);
            self.spinner_message.push(' ');
            spinner.set_message(self.spinner_message.clone());
        }
    }
}

fn new_styled_spinner() -> ProgressBar {
    let spinner_style = ProgressStyle::with_template("{spinner} [ {prefix:.bold.blue} ] {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▹▹▹▹▹",
            "▸▹▹▹▹",
            "▹▸▹▹▹",
            "▹▹▸▹▹",
            "▹▹▹▸▹",
            "▹▹▹▹▸",
            "▪▪▪▪▪",
        ]);
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::variant::StreamVariant;

    static CONFIG_TEST_INIT_CONTROLLER: OnceLock<MockConfig> = OnceLock::new();
    static CONFIG_TEST_MAX_ERRORS: OnceLock<MockConfig> = OnceLock::new();
    static CONFIG_TEST_EARLY_TERMINATION: OnceLock<MockConfig> = OnceLock::new();

    #[test]
    fn test_init_controller() {
        let cfg = CONFIG_TEST_INIT_CONTROLLER.get_or_init(MockConfig::default);

        let (handle, send_ch, stop_flag, _errors_flag) = init_controller(cfg).unwrap();

        assert!(!stop_flag.load(Ordering::SeqCst));

        send_ch
            .send(StatType::StreamVariant(StreamVariant::Sn))
            .unwrap();
        send_ch.send(StatType::WordsRead(8)).unwrap();
        send_ch
            .send(StatType::PacketSeen {
                fems: 1,
                trailer_seen: true,
            })
            .unwrap();
        send_ch
            .send(StatType::Fatal("Test fatal error".into()))
            .unwrap();

        drop(send_ch);
        handle.join().unwrap();

        assert!(stop_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_stop_at_max_tolerated_errors() {
        let cfg = CONFIG_TEST_MAX_ERRORS.get_or_init(|| MockConfig {
            max_tolerate_errors: 2,
            mute_errors: true,
            ..Default::default()
        });
        let (handle, send_ch, stop_flag, errors_flag) = init_controller(cfg).unwrap();

        send_ch.send(StatType::Error("0x4: [E30] a".into())).unwrap();
        send_ch.send(StatType::Error("0x8: [E30] b".into())).unwrap();
        drop(send_ch);
        handle.join().unwrap();

        assert!(stop_flag.load(Ordering::SeqCst));
        assert!(errors_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_early_termination_is_not_an_error() {
        let cfg = CONFIG_TEST_EARLY_TERMINATION.get_or_init(|| MockConfig {
            packet_output: DataOutputMode::Stdout,
            ..Default::default()
        });
        let (handle, send_ch, stop_flag, errors_flag) = init_controller(cfg).unwrap();

        send_ch
            .send(StatType::EarlyTermination("0x10: FEM full flag set".into()))
            .unwrap();
        drop(send_ch);
        handle.join().unwrap();

        assert!(!stop_flag.load(Ordering::SeqCst));
        assert!(!errors_flag.load(Ordering::SeqCst));
    }
}
