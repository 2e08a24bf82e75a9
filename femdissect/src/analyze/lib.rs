//! Contains the [spawn_decoder] function that spawns the decoder thread.
use super::dissecter::Dissecter;
use super::{DecodeSettings, Flow};
use crate::records::PacketRecord;
use crate::util::*;

/// Decoder thread that runs a [Dissecter] over the word chunks from the reader.
///
/// Completed packets are forwarded to `packet_send` if a writer is attached.
pub fn spawn_decoder(
    config: &'static impl Config,
    stop_flag: Arc<AtomicBool>,
    stats_send: flume::Sender<StatType>,
    data_recv: crossbeam_channel::Receiver<WordChunk>,
    packet_send: Option<crossbeam_channel::Sender<PacketRecord>>,
) -> Result<JoinHandle<()>, io::Error> {
    let decoder_thread = thread::Builder::new().name("Decoder".to_string());
    decoder_thread.spawn({
        move || {
            let settings = DecodeSettings::from_config(config);
            if stats_send
                .send(StatType::StreamVariant(settings.variant))
                .is_err()
            {
                log::warn!("Stats controller hung up before decoding started");
            }
            let mut dissecter = Dissecter::new(settings, Some(stats_send));
            // Position one past the last word seen, used to finalize at end of stream
            let mut end_pos: u64 = 0;

            'stream: while !stop_flag.load(Ordering::SeqCst) {
                let chunk = match data_recv.recv() {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        debug_assert_eq!(e, crossbeam_channel::RecvError);
                        break;
                    }
                };
                end_pos = chunk.mem_pos() + (chunk.len() * XMIT_WORD_SIZE) as u64;

                for (word, mem_pos) in chunk.iter_with_mem_pos() {
                    if dissecter.process_xmit_word(word, mem_pos) == Flow::Terminate {
                        log::debug!("Decoding terminated at 0x{mem_pos:X}");
                        forward_packets(dissecter.take_completed_packets(), packet_send.as_ref());
                        break 'stream;
                    }
                }
                forward_packets(dissecter.take_completed_packets(), packet_send.as_ref());
            }
            forward_packets(dissecter.finish(end_pos), packet_send.as_ref());
            log::trace!(
                "Decoder done, {} anomalies reported",
                dissecter.anomalies_reported()
            );
            // Hanging up lets the reader stop early if the stream was terminated
            drop(data_recv);
        }
    })
}

fn forward_packets(
    packets: Vec<PacketRecord>,
    packet_send: Option<&crossbeam_channel::Sender<PacketRecord>>,
) {
    let Some(send) = packet_send else {
        return;
    };
    for packet in packets {
        if send.send(packet).is_err() {
            log::trace!("Writer hung up, dropping decoded packets");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_util::MockConfig;
    use crate::words::header::{encode_header, FemHeader};
    use crate::words::variant::StreamVariant;
    use pretty_assertions::assert_eq;
    use std::sync::OnceLock;

    static CFG_TEST_SPAWN_DECODER: OnceLock<MockConfig> = OnceLock::new();

    fn fem_pair(lo: u16, hi: u16) -> u32 {
        (u32::from(hi) << 16) | u32::from(lo)
    }

    fn one_packet_words() -> Vec<u32> {
        let header = FemHeader {
            module_id: 3,
            event: 9,
            frame: 1,
            ..Default::default()
        };
        let hdr = encode_header(&header, StreamVariant::Sn);
        let mut words = vec![PACKET_HEADER];
        words.extend(hdr.chunks(2).map(|pair| fem_pair(pair[0], pair[1])));
        words.push(PACKET_TRAILER);
        words
    }

    #[test]
    fn test_spawn_decoder_forwards_packets() {
        let cfg = CFG_TEST_SPAWN_DECODER.get_or_init(MockConfig::default);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (stats_send, stats_recv) = flume::unbounded();
        let (data_send, data_recv) = crossbeam_channel::unbounded();
        let (packet_send, packet_recv) = crossbeam_channel::unbounded();

        let handle = spawn_decoder(cfg, stop_flag, stats_send, data_recv, Some(packet_send))
            .expect("Failed to spawn decoder");
        data_send
            .send(WordChunk::new(one_packet_words(), 0))
            .unwrap();
        drop(data_send);
        handle.join().unwrap();

        let packets: Vec<PacketRecord> = packet_recv.try_iter().collect();
        assert_eq!(packets.len(), 1);
        assert!(packets[0].trailer_seen);
        assert_eq!(packets[0].fems.len(), 1);
        assert_eq!(packets[0].fems[0].header.module_id, 3);

        let stats: Vec<StatType> = stats_recv.drain().collect();
        assert!(matches!(
            stats.first(),
            Some(StatType::StreamVariant(StreamVariant::Sn))
        ));
        assert!(stats
            .iter()
            .any(|s| matches!(s, StatType::TransitionReport(_))));
    }

    #[test]
    fn test_spawn_decoder_without_writer() {
        let cfg = CFG_TEST_SPAWN_DECODER.get_or_init(MockConfig::default);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (stats_send, stats_recv) = flume::unbounded();
        let (data_send, data_recv) = crossbeam_channel::unbounded();

        let handle =
            spawn_decoder(cfg, stop_flag, stats_send, data_recv, None).expect("Failed to spawn");
        data_send
            .send(WordChunk::new(one_packet_words(), 0))
            .unwrap();
        drop(data_send);
        handle.join().unwrap();

        let packets_seen = stats_recv
            .drain()
            .filter(|s| matches!(s, StatType::PacketSeen { .. }))
            .count();
        assert_eq!(packets_seen, 1);
    }
}
