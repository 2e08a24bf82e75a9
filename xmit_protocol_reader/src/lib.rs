#![forbid(unused_extern_crates)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(missing_copy_implementations)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(variant_size_differences)]
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool
)]
// Performance lints
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]

//! This crate contains mainly the [InputScanner] that reads XMIT transport data, and the [WordChunk] that wraps the words read from the input.
//! Additionally it contains a helper function [spawn_reader] that spawns a thread that reads input and sends it to a channel that is returned from the function.
//!
//! The [InputScanner] is a generic type that can be instantiated with any type that implements the [BufferedReaderWrapper] trait.
//! This trait is implemented for the [StdInReader] and the [BufReader](std::io::BufReader) types,
//! allowing the [InputScanner] to read from both stdin and files.
//!
//! The XMIT stream is a flat sequence of little-endian 32-bit words. Two of them are packet sentinels
//! (see [xmit_word]), every other word carries two 16-bit FEM words.
//!
//! # Example
//! ```no_run
//! use xmit_protocol_reader::prelude::*;
//! use xmit_protocol_reader::init_reader;
//!
//! let reader = init_reader(Some(std::path::Path::new("run.xmit"))).unwrap();
//! let mut input_scanner = InputScanner::minimal(reader);
//!
//! let chunk = input_scanner.load_chunk(1024).unwrap();
//! for (word, mem_pos) in chunk.iter_with_mem_pos() {
//!     match classify_xmit_word(word) {
//!         XmitWordKind::PacketHeader => println!("{mem_pos:#X}: packet header"),
//!         XmitWordKind::PacketTrailer => println!("{mem_pos:#X}: packet trailer"),
//!         XmitWordKind::FemWords => println!("{mem_pos:#X}: {:04X?}", split_fem_words(word)),
//!     }
//! }
//! ```

pub mod bufreader_wrapper;
pub mod input_scanner;
pub mod prelude;
pub mod stats;
pub mod stdin_reader;
pub mod word_chunk;
pub mod xmit_word;

use crossbeam_channel::Receiver;
use prelude::{BufferedReaderWrapper, InputScanner, StdInReader, WordChunk};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Depth of the FIFO where the word chunks are inserted as they are read
const CHANNEL_WORD_CHUNK_CAPACITY: usize = 100;
const READER_BUFFER_SIZE: usize = 1024 * 50; // 50KB
/// Number of 32-bit words per chunk sent from the reader thread
pub const WORD_CHUNK_SIZE: usize = 4096;

/// Initializes the reader based on the input mode (file or stdin) and returns it
///
/// The input mode is determined by the presence of the input file path
#[inline]
pub fn init_reader(
    input_file: Option<&Path>,
) -> Result<Box<dyn BufferedReaderWrapper>, std::io::Error> {
    if let Some(path) = input_file {
        let f = std::fs::OpenOptions::new().read(true).open(path)?;
        Ok(Box::new(std::io::BufReader::with_capacity(
            READER_BUFFER_SIZE,
            f,
        )))
    } else if !std::io::stdin().is_terminal() {
        Ok(Box::new(StdInReader::stdin()))
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "stdin not redirected!",
        ))
    }
}

/// Spawns a reader thread that reads word chunks from the input and sends them to a producer channel
///
/// Returns the thread handle and the receiver channel
#[inline]
pub fn spawn_reader(
    stop_flag: std::sync::Arc<AtomicBool>,
    input_scanner: InputScanner<impl BufferedReaderWrapper + ?Sized + Send + 'static>,
) -> std::io::Result<(std::thread::JoinHandle<()>, Receiver<WordChunk>)> {
    let reader_thread = std::thread::Builder::new().name("Reader".to_string());
    let (send_chan, recv_chan) = crossbeam_channel::bounded(CHANNEL_WORD_CHUNK_CAPACITY);
    let thread_handle = reader_thread.spawn({
        move || {
            let mut input_scanner = input_scanner;

            while !stop_flag.load(Ordering::SeqCst) {
                let chunk = match input_scanner.load_chunk(WORD_CHUNK_SIZE) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        if e.kind() != std::io::ErrorKind::UnexpectedEof {
                            log::error!("Reader stopped: {e}");
                        }
                        break;
                    }
                };
                // The decoder hung up, e.g. after an early termination
                if send_chan.send(chunk).is_err() {
                    break;
                }
            }
        }
    })?;
    Ok((thread_handle, recv_chan))
}
