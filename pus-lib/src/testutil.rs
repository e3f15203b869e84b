//! Packet builders shared by unit tests.
use crate::checksum::{checksum, CHECKSUM_LEN};
use crate::packet::PrimaryHeader;

/// Append a checksum to `dat`, fixing up the length field first.
pub(crate) fn finish_packet(mut dat: Vec<u8>) -> Vec<u8> {
    let len_minus1 = (dat.len() + CHECKSUM_LEN - PrimaryHeader::LEN - 1) as u16;
    dat[4..6].copy_from_slice(&len_minus1.to_be_bytes());
    let crc = checksum(&dat);
    dat.extend_from_slice(&crc.to_be_bytes());
    dat
}

/// TM(3,1) packet for APID 1, sequence count 5, time 1e9 s + 30000/65536.
pub(crate) fn tm_packet(user_data: &[u8]) -> Vec<u8> {
    #[rustfmt::skip]
    let mut dat = vec![
        0x08, 0x01, 0xc0, 0x05, 0x00, 0x00,
        0x10, 0x03, 0x01, 0x07, 0x3b, 0x9a, 0xca, 0x00, 0x75, 0x30,
    ];
    dat.extend_from_slice(user_data);
    finish_packet(dat)
}

/// TC(17,1) packet for APID 0x64, sequence count 42, all ack flags set.
pub(crate) fn tc_packet(user_data: &[u8]) -> Vec<u8> {
    let mut dat = vec![0x18, 0x64, 0xc0, 0x2a, 0x00, 0x00, 0x9f, 0x11, 0x01];
    dat.extend_from_slice(user_data);
    finish_packet(dat)
}
