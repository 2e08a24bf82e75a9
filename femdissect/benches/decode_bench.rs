use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use femdissect::analyze::{dissecter::decode_bytes, DecodeSettings};
use femdissect::config::decode::PayloadMode;
use femdissect::words::header::{encode_header, FemHeader};
use femdissect::words::huffman::{self, DecodedHuffman};
use femdissect::words::variant::StreamVariant;
use xmit_protocol_reader::prelude::{PACKET_HEADER, PACKET_TRAILER};

const FEMS_PER_PACKET: u8 = 4;
const CHANNELS_PER_RECORD: u16 = 16;

// One raw sample followed by Huffman coded deltas, per channel
fn fem_body() -> Vec<u16> {
    let deltas = huffman::encode(&[1, -1, 2, 0], 0xC000).unwrap_or(0xC000);
    let mut body = Vec::new();
    for ch in 0..CHANNELS_PER_RECORD {
        body.extend([0x1000 | ch, 0x2100, deltas, 0x3000 | ch]);
    }
    body
}

fn synthetic_stream(packets: u32) -> Vec<u8> {
    let body = fem_body();
    let checksum: u32 = body.iter().map(|w| u32::from(*w)).sum();
    let mut bytes = Vec::new();
    for event in 0..packets {
        bytes.extend(PACKET_HEADER.to_le_bytes());
        for module_id in 0..FEMS_PER_PACKET {
            let header = FemHeader {
                module_id,
                event,
                word_count: body.len() as u32,
                checksum: checksum & 0xFF_FFFF,
                ..Default::default()
            };
            let mut words = encode_header(&header, StreamVariant::Sn).to_vec();
            words.extend(&body);
            for pair in words.chunks(2) {
                bytes.extend(((u32::from(pair[1]) << 16) | u32::from(pair[0])).to_le_bytes());
            }
        }
        bytes.extend(PACKET_TRAILER.to_le_bytes());
    }
    bytes
}

pub fn bench_decode_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_stream");
    for packets in [100, 1000, 10000] {
        let data = synthetic_stream(packets);
        group.throughput(Throughput::Bytes(data.len() as u64));
        for payload in [PayloadMode::Waveforms, PayloadMode::Summary] {
            let settings = DecodeSettings {
                payload,
                ..Default::default()
            };
            group.bench_with_input(
                BenchmarkId::new(payload.to_string(), packets),
                &data,
                |b, data| b.iter(|| decode_bytes(black_box(data), settings)),
            );
        }
    }
    group.finish();
}

pub fn bench_huffman_decode(c: &mut Criterion) {
    let words: Vec<u16> = (0..4096u16).map(|w| 0xC000 | (w.wrapping_mul(37) & 0x3FFF)).collect();
    let _ = c.bench_function("huffman_decode", |b| {
        b.iter(|| {
            words
                .iter()
                .map(|w| DecodedHuffman::decode(black_box(*w)).symbols().len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_decode_stream, bench_huffman_decode);
criterion_main!(benches);
