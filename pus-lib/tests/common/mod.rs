use std::path::PathBuf;

use hifitime::Epoch;
use pus::checksum::{checksum, CHECKSUM_LEN};
use pus::dds::{Envelope, TimeQuality};
use pus::packet::{Packet, PrimaryHeader};

pub fn fixture_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

/// Build a checksummed TM packet with a secondary header.
pub fn tm_packet(apid: u16, seq: u8, coarse_time: u32, user_data: &[u8]) -> Vec<u8> {
    let mut dat = vec![
        0x08 | ((apid >> 8) as u8 & 0x7),
        apid as u8,
        0xc0,
        seq & 0x3f,
        0,
        0,
        0x10,
        0x03,
        0x19,
        0x00,
    ];
    dat.extend_from_slice(&coarse_time.to_be_bytes());
    dat.extend_from_slice(&[0x80, 0x00]);
    dat.extend_from_slice(user_data);
    finish(dat)
}

/// Build a checksummed TC packet with a secondary header.
pub fn tc_packet(apid: u16, seq: u8, user_data: &[u8]) -> Vec<u8> {
    let mut dat = vec![
        0x18 | ((apid >> 8) as u8 & 0x7),
        apid as u8,
        0xc0,
        seq & 0x3f,
        0,
        0,
        0x91,
        0x11,
        0x01,
    ];
    dat.extend_from_slice(user_data);
    finish(dat)
}

fn finish(mut dat: Vec<u8>) -> Vec<u8> {
    let len_minus1 = (dat.len() + CHECKSUM_LEN - PrimaryHeader::LEN - 1) as u16;
    dat[4..6].copy_from_slice(&len_minus1.to_be_bytes());
    let crc = checksum(&dat);
    dat.extend_from_slice(&crc.to_be_bytes());
    dat
}

/// Serialize `dat` wrapped in a DDS envelope.
pub fn envelope(dat: &[u8], unix_seconds: f64, station: u16) -> Vec<u8> {
    let packet = Packet::decode(dat).unwrap();
    let env = Envelope::wrap(
        packet,
        Epoch::from_unix_seconds(unix_seconds),
        station,
        2,
        1,
        TimeQuality::Good,
    )
    .unwrap();
    let mut buf = Vec::new();
    env.write_to(&mut buf).unwrap();
    buf
}
