#![warn(unused_extern_crates)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
// Readability lints
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool,
    clippy::single_match_else,
    clippy::range_plus_one,
    clippy::int_plus_one,
    clippy::needless_range_loop,
    clippy::needless_continue,
    clippy::shadow_same,
    clippy::shadow_unrelated
)]
// Performance lints
#![warn(variant_size_differences)]
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]
// Safety lints
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(clippy::map_unwrap_or)]

//! femdissect decodes front-end module (FEM) records multiplexed in raw XMIT transport streams,
//! and reports framing, header and sample anomalies found along the way.
//!
//! # Usage
//!
//! ## Decode a file and print the summary report
//! ```shell
//! $ femdissect <input_file>
//! ```
//!
//! ## Decode a legacy stream and write the packets as JSON lines
//! ```shell
//! $ femdissect <input_file> --stream legacy -o packets.jsonl
//! ```
//!
//! ## Read from stdin, keep only channel summaries and write them to stdout
//! Writing packets to stdout suppresses the report
//! ```shell
//! $ cat <input_file> | femdissect --payload summary -o stdout
//! ```
//!
//! ## Exit with code 3 if any anomaly is found, and only show `E30` errors
//! ```shell
//! $ femdissect <input_file> -E 3 -w "30"
//! ```
//!
//! ## Write the collected stats as JSON
//! ```shell
//! $ femdissect <input_file> -S stats.json -D json
//! ```

use crate::util::*;

/// Write an error message to stderr.
/// All error messages should be written through this function to ensure consistency.
#[inline]
pub fn display_error(err_msg: &str) {
    log::error!("{}", owo_colors::OwoColorize::red(&err_msg));
}

pub mod analyze;
pub mod config;
pub mod controller;
pub mod init;
pub mod records;
pub mod stats;
pub mod util;
pub mod words;
pub mod write;

/// Does the initial setup for input data processing
#[allow(clippy::needless_pass_by_value)] // The stats sender is dropped when processing ends, which lets the controller finish
pub fn init_processing(
    config: &'static impl Config,
    reader: Box<dyn BufferedReaderWrapper>,
    stat_send: flume::Sender<StatType>,
    stop_flag: Arc<AtomicBool>,
) -> io::Result<()> {
    let (input_stats_send, input_stats_recv): (
        flume::Sender<InputStatType>,
        flume::Receiver<InputStatType>,
    ) = flume::unbounded();
    let loader = InputScanner::new(reader, Some(input_stats_send));

    match process(config, loader, Some(&input_stats_recv), &stat_send, stop_flag) {
        Ok(()) => Ok(()),
        Err(e) => {
            if stat_send.send(StatType::Fatal(e.to_string().into())).is_err() {
                log::error!("Stats controller hung up: {e}");
            }
            Err(e)
        }
    }
}

/// Entry point for reading the input and delegating to the decoder and writer depending on [Config]
///
/// Follows these steps:
/// 1. Setup reading (`file` or `stdin`) using [xmit_protocol_reader::spawn_reader].
/// 2. Write decoded packets to `file` or `stdout` with [write::lib::spawn_writer] if an output is set.
/// 3. Decode the words with [analyze::lib::spawn_decoder].
pub fn process(
    config: &'static impl Config,
    loader: InputScanner<impl BufferedReaderWrapper + ?Sized + Send + 'static>,
    input_stats_recv: Option<&flume::Receiver<InputStatType>>,
    stats_send: &flume::Sender<StatType>,
    stop_flag: Arc<AtomicBool>,
) -> io::Result<()> {
    let (reader_handle, reader_data_recv) =
        xmit_protocol_reader::spawn_reader(stop_flag.clone(), loader)?;

    let (packet_send, output_handle) = if config.packet_output() == DataOutputMode::None {
        (None, None)
    } else {
        let (send, recv) = crossbeam_channel::unbounded();
        let handle = write::lib::spawn_writer(config, stop_flag.clone(), recv)?;
        (Some(send), Some(handle))
    };

    let decoder_handle = analyze::lib::spawn_decoder(
        config,
        stop_flag,
        stats_send.clone(),
        reader_data_recv,
        packet_send,
    )?;

    // Loop breaks when the reader drops its end of the input stats channel
    if let Some(input_stats_recv_chan) = input_stats_recv {
        forward_input_stats_to_stats_collector(input_stats_recv_chan, stats_send);
    }
    if let Err(e) = reader_handle.join() {
        log::error!("Reader thread terminated early: {e:?}");
    }
    if let Err(e) = decoder_handle.join() {
        log::error!("Decoder thread terminated early: {e:?}");
    }
    if let Some(output) = output_handle {
        if let Err(e) = output.join() {
            log::error!("Writer thread terminated early: {e:?}");
        }
    }
    Ok(())
}

// Glue between the stats the reader sends and the stats the controller expects
fn forward_input_stats_to_stats_collector(
    input_stats_recv: &flume::Receiver<InputStatType>,
    stats_send: &flume::Sender<StatType>,
) {
    while let Ok(input_stat) = input_stats_recv.recv() {
        let stat = match input_stat {
            InputStatType::WordsRead(val) => StatType::WordsRead(val),
            InputStatType::BytesRead(val) => StatType::BytesRead(val),
            InputStatType::TruncatedTail(val) => StatType::TruncatedTail(val),
            InputStatType::Error(e) => StatType::Error(e),
            InputStatType::Fatal(e) => StatType::Fatal(e),
        };
        if stats_send.send(stat).is_err() {
            log::trace!("Stats controller hung up, input stats dropped");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::header::{encode_header, FemHeader};
    use crate::words::variant::StreamVariant;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    static CFG_TEST_INIT_PROCESSING: OnceLock<MockConfig> = OnceLock::new();

    fn stream_bytes() -> Vec<u8> {
        let header = FemHeader {
            module_id: 5,
            event: 2,
            ..Default::default()
        };
        let hdr = encode_header(&header, StreamVariant::Sn);
        let mut words = vec![PACKET_HEADER];
        words.extend(
            hdr.chunks(2)
                .map(|pair| (u32::from(pair[1]) << 16) | u32::from(pair[0])),
        );
        words.push(PACKET_TRAILER);
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_init_processing() {
        let tmp_d = TempDir::new().unwrap();
        let input = tmp_d.child("one_packet.xmit");
        fs::write(&input, stream_bytes()).unwrap();

        let cfg = CFG_TEST_INIT_PROCESSING.get_or_init(|| MockConfig {
            input_file: Some(input.clone()),
            ..Default::default()
        });
        let reader = xmit_protocol_reader::init_reader(cfg.input_file()).unwrap();
        let (sender, receiver) = flume::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));

        init_processing(cfg, reader, sender, stop_flag.clone()).unwrap();

        let mut words_read = 0;
        let mut packets_seen = 0;
        while let Ok(stat) = receiver.recv() {
            match stat {
                StatType::WordsRead(val) => words_read += val,
                StatType::PacketSeen { .. } => packets_seen += 1,
                StatType::Error(e) | StatType::Fatal(e) => panic!("Error or Fatal: {e}"),
                _ => (),
            }
        }

        assert_eq!(words_read, 8);
        assert_eq!(packets_seen, 1);
        assert!(!stop_flag.load(Ordering::SeqCst));
    }
}
