//! Packet error control.
//!
//! PUS packets carry a 16-bit CRC (CRC-16/CCITT-FALSE) over the whole packet in their last
//! two bytes, so running the CRC over a complete, intact packet yields zero.
use crc::{Crc, CRC_16_IBM_3740};

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xffff, no reflection, no final xor.
pub const CRC_CCITT_FALSE: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Number of checksum bytes trailing every packet.
pub const CHECKSUM_LEN: usize = 2;

/// Compute the packet checksum over `dat`.
#[must_use]
pub fn checksum(dat: &[u8]) -> u16 {
    CRC_CCITT_FALSE.checksum(dat)
}
