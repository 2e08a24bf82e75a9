//! Contains functionality for writing decoded packets to disk or stdout.
use super::writer::BufferedWriter;
use super::writer::Writer;
use crate::config::streams::StreamOpt;
use crate::records::PacketRecord;
use crate::util::*;

/// The size of the buffer used by the writer
///
/// This is the maximum amount of serialized data that can be buffered before it is written out.
const BUFFER_SIZE: usize = 1024 * 1024; // 1MB buffer

/// Spawns a thread with the Writer running, and returns the thread handle.
///
/// Fails if the output file cannot be created.
pub fn spawn_writer(
    config: &'static impl StreamOpt,
    stop_flag: Arc<AtomicBool>,
    packet_channel: crossbeam_channel::Receiver<PacketRecord>,
) -> io::Result<JoinHandle<()>> {
    let mut writer = BufferedWriter::new(config, BUFFER_SIZE)?;
    let writer_thread = thread::Builder::new().name("Writer".to_string());
    writer_thread.spawn({
        move || loop {
            // Receive packet from the decoder
            let packet = match packet_channel.recv() {
                Ok(packet) => packet,
                Err(e) => {
                    debug_assert_eq!(e, crossbeam_channel::RecvError);
                    break;
                }
            };
            if stop_flag.load(Ordering::SeqCst) {
                log::trace!("Stopping writer thread");
                break;
            }
            // Buffered until full or until the writer is dropped
            if let Err(e) = writer.push_packet(&packet) {
                crate::display_error(&format!("Failed writing packet {}: {e}", packet.index));
                break;
            }
        }
    })
}
