#![allow(dead_code)]
/// Re-export some common utilities for system tests
pub use assert_cmd::prelude::*;
pub use assert_cmd::Command;
pub use assert_fs::prelude::*;
pub use assert_fs::TempDir;
pub use femdissect::words::header::{encode_header, FemHeader};
pub use femdissect::words::variant::StreamVariant;
pub use predicates::prelude::*;
#[allow(unused_imports)]
use pretty_assertions::{assert_eq, assert_ne, assert_str_eq};
use xmit_protocol_reader::prelude::{PACKET_HEADER, PACKET_TRAILER};

/// Helper function to match the raw output of stderr or stdout, with a pattern a fixed amount of times, case insensitive
pub fn match_on_out_no_case(
    byte_output: &[u8],
    re_str: &str,
    expect_match: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    let re = fancy_regex::Regex::new(&("(?i)".to_owned() + re_str)).unwrap();
    let match_count = re.find_iter(str_res).count();
    assert_eq!(
        match_count, expect_match,
        "regex: {re_str} - expected match count: {expect_match}, got {match_count}\nFailed to match on:\n{str_res}"
    );
    Ok(())
}

/// Pattern matching a report row `name` followed by `value`, allowing for the colour codes between the cells
pub fn report_row(name: &str, value: &str) -> String {
    format!(r"{name}(?:\x1b\[[0-9;]*m|\s)+{value}(?:\x1b|\s|$)")
}

/// Helper function takes in the output of stderr and asserts that there are no errors or warnings
pub fn assert_no_errors_or_warn(
    stderr_byte_output: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    match_on_out_no_case(stderr_byte_output, "error - ", 0)?;
    match_on_out_no_case(stderr_byte_output, "warn - ", 0)?;
    Ok(())
}

/// Channel 5 with the samples 0x10 and 0x11 in the given variant.
pub fn channel_body(variant: StreamVariant) -> Vec<u16> {
    match variant {
        StreamVariant::Sn => vec![0x1005, 0x2010, 0x2011, 0x3005],
        StreamVariant::Legacy => vec![0x4005, 0x0010, 0x0011, 0x5005],
    }
}

/// A FEM record with a consistent word count and checksum.
///
/// The body must hold an even number of words to fill whole XMIT words.
pub fn fem_record(
    module_id: u8,
    event: u32,
    full: bool,
    body: &[u16],
    variant: StreamVariant,
) -> Vec<u16> {
    assert_eq!(body.len() % 2, 0, "odd body length");
    let header = FemHeader {
        module_id,
        event,
        full,
        word_count: body.len() as u32,
        checksum: body.iter().map(|w| u32::from(*w)).sum(),
        ..Default::default()
    };
    let mut words = encode_header(&header, variant).to_vec();
    words.extend_from_slice(body);
    words
}

/// Wrap FEM words in a packet, two FEM words per XMIT word with the first in the low half.
pub fn packet_bytes(fem_words: &[u16], with_trailer: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend(PACKET_HEADER.to_le_bytes());
    for pair in fem_words.chunks(2) {
        let lo = u32::from(pair[0]);
        let hi = u32::from(*pair.get(1).unwrap_or(&0));
        bytes.extend(((hi << 16) | lo).to_le_bytes());
    }
    if with_trailer {
        bytes.extend(PACKET_TRAILER.to_le_bytes());
    }
    bytes
}

/// Two well formed packets holding one FEM each.
pub fn clean_stream(variant: StreamVariant) -> Vec<u8> {
    let mut bytes = packet_bytes(
        &fem_record(3, 1, false, &channel_body(variant), variant),
        true,
    );
    bytes.extend(packet_bytes(
        &fem_record(4, 2, false, &channel_body(variant), variant),
        true,
    ));
    bytes
}

/// Write `bytes` to a file in a new temporary directory.
pub fn input_file(bytes: &[u8]) -> Result<(TempDir, std::path::PathBuf), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let input = tmp_d.child("input.xmit");
    input.write_binary(bytes)?;
    let path = input.path().to_path_buf();
    Ok((tmp_d, path))
}
