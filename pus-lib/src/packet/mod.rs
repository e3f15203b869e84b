//! PUS telemetry and telecommand packets.
//!
//! References:
//! * ECSS-E-70-41A Ground systems and operations, Telemetry and telecommand packet utilization
//! * CCSDS Space Packet Protocol 133.0-B-1
mod secondary;
mod stream;
mod summary;
mod timestamp;

use std::fmt::Display;
use std::io::{Read, Write};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::bits;
use crate::bytes::read_full;
use crate::checksum::{checksum, CHECKSUM_LEN};
use crate::{Error, Result};

pub use secondary::*;
pub use stream::*;
pub use summary::*;
pub use timestamp::*;

pub type Apid = u16;

/// Packet type flag, bit 4 of the first header byte.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Tm,
    Tc,
}

impl TryFrom<u8> for PacketKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PacketKind::Tm),
            1 => Ok(PacketKind::Tc),
            _ => Err(Error::UnknownPacketKind(value)),
        }
    }
}

impl Display for PacketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketKind::Tm => write!(f, "TM"),
            PacketKind::Tc => write!(f, "TC"),
        }
    }
}

/// Segmentation of data spread over multiple packets; the sequence flags.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grouping {
    Continuation = 0,
    First = 1,
    Last = 2,
    Standalone = 3,
}

impl Grouping {
    /// Decode from the 2 least significant bits of `bits`.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Grouping::Continuation,
            1 => Grouping::First,
            2 => Grouping::Last,
            _ => Grouping::Standalone,
        }
    }
}

/// Packet category, the 4 least significant bits of the APID.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pcat {
    Time = 0,
    Acknowledge = 1,
    Reserved2 = 2,
    Reserved3 = 3,
    Housekeeping = 4,
    Diagnostic = 5,
    Reserved6 = 6,
    Event = 7,
    MemoryDump = 8,
    Reserved9 = 9,
    Reserved10 = 10,
    Reserved11 = 11,
    Science = 12,
    Private13 = 13,
    Private14 = 14,
    Idle = 15,
}

impl Pcat {
    #[must_use]
    pub fn from_apid(apid: Apid) -> Self {
        use Pcat::*;
        const ALL: [Pcat; 16] = [
            Time,
            Acknowledge,
            Reserved2,
            Reserved3,
            Housekeeping,
            Diagnostic,
            Reserved6,
            Event,
            MemoryDump,
            Reserved9,
            Reserved10,
            Reserved11,
            Science,
            Private13,
            Private14,
            Idle,
        ];
        ALL[usize::from(apid & 0xf)]
    }
}

/// PUS packet primary header.
///
/// This is the CCSDS space packet primary header, except for the sequence count, see
/// [Self::sequence_count].
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub version: u8,
    pub kind: PacketKind,
    pub has_secondary_header: bool,
    pub apid: Apid,
    pub grouping: Grouping,
    /// Sequence count: only the 6 least significant bits of header bytes 2-3, not the full
    /// 14-bit CCSDS sequence count.
    pub sequence_count: u16,
    /// Number of bytes following the primary header, minus 1.
    pub len_minus1: u16,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;
    /// Largest value of the 6-bit sequence count before it rolls over.
    pub const SEQ_MAX: u16 = 0x3f;

    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let d1 = u16::from_be_bytes([buf[0], buf[1]]);
        let d2 = u16::from_be_bytes([buf[2], buf[3]]);
        let d3 = u16::from_be_bytes([buf[4], buf[5]]);

        let kind = if (d1 >> 12) & 0x1 == 0 {
            PacketKind::Tm
        } else {
            PacketKind::Tc
        };

        Some(PrimaryHeader {
            version: ((d1 >> 13) & 0x7) as u8,
            kind,
            has_secondary_header: (d1 >> 11) & 0x1 == 1,
            apid: d1 & 0x7ff,
            grouping: Grouping::from_bits((d2 >> 14) as u8),
            sequence_count: d2 & Self::SEQ_MAX,
            len_minus1: d3,
        })
    }

    /// Number of bytes following the primary header.
    #[must_use]
    pub fn data_len(&self) -> usize {
        usize::from(self.len_minus1) + 1
    }

    /// Total packet length, including this header.
    #[must_use]
    pub fn packet_len(&self) -> usize {
        Self::LEN + self.data_len()
    }
}

/// Calculate the number of missing sequence counts between `last` and `cur`, taking
/// rollover at [PrimaryHeader::SEQ_MAX] into account.
#[must_use]
pub fn missing_packets(cur: u16, last: u16) -> u16 {
    let modulus = PrimaryHeader::SEQ_MAX + 1;
    let expected = (last + 1) % modulus;
    (cur + modulus - expected) % modulus
}

/// Converts [Packet]s into caller defined views, e.g., using a parameter database to
/// calibrate packet contents.
pub trait Interpreter {
    type Tm;
    type Tc;

    /// Interpret a telemetry packet; only called for packets with a secondary header.
    ///
    /// # Errors
    /// Implementation specific.
    fn interpret_tm(&self, packet: &Packet) -> Result<Self::Tm>;

    /// Interpret a telecommand packet.
    ///
    /// # Errors
    /// Implementation specific.
    fn interpret_tc(&self, packet: &Packet) -> Result<Self::Tc>;
}

/// Result of [Packet::interpret].
#[derive(Debug, Clone, PartialEq)]
pub enum Interpreted<TM, TC> {
    Tm(TM),
    Tc(TC),
}

/// Packet represents a single PUS packet.
///
/// The packet bytes are kept exactly as read; decoded header values are derived from them.
///
/// # Example
/// Decode the smallest telemetry packet with a secondary header.
/// ```
/// use pus::packet::{Grouping, Packet, PacketKind};
///
/// let dat: &[u8] = &[
///     // primary header bytes
///     0x08, 0x01, 0xc0, 0x05, 0x00, 0x0b,
///     // TM secondary header bytes
///     0x10, 0x03, 0x01, 0x07, 0x3b, 0x9a, 0xca, 0x00, 0x75, 0x30,
///     // checksum
///     0x42, 0xb7,
/// ];
/// let packet = Packet::decode(dat).unwrap();
/// assert_eq!(packet.header.kind, PacketKind::Tm);
/// assert_eq!(packet.header.apid, 1);
/// assert_eq!(packet.header.grouping, Grouping::Standalone);
/// assert!(packet.payload().is_empty());
/// assert!(packet.checksum_ok());
/// ```
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: PrimaryHeader,
    /// Present when the primary header says there is one.
    pub secondary_header: Option<SecondaryHeader>,
    /// All packet bytes, including headers and the trailing checksum.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Vec<u8>,

    offset: u64,
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Packet {} seq: {} length: {} bytes>",
            self.header.apid,
            self.header.sequence_count,
            self.data.len()
        )
    }
}

impl Packet {
    /// Decode a packet from the start of `dat`. Any bytes beyond the length given in the
    /// primary header are ignored.
    ///
    /// # Errors
    /// [Error::UnexpectedEndOfStream] if `dat` is shorter than the header or the length it
    /// declares, [Error::SecondaryHeaderTooShort] if the secondary header does not fit.
    pub fn decode(dat: &[u8]) -> Result<Packet> {
        let Some(header) = PrimaryHeader::decode(dat) else {
            return Err(Error::UnexpectedEndOfStream {
                actual: dat.len(),
                minimum: PrimaryHeader::LEN,
            });
        };
        let total = header.packet_len();
        if dat.len() < total {
            return Err(Error::UnexpectedEndOfStream {
                actual: dat.len(),
                minimum: total,
            });
        }
        Self::from_parts(header, dat[..total].to_vec())
    }

    /// Read a single packet from `r`.
    ///
    /// # Errors
    /// [Error::UnexpectedEndOfStream] if the stream ends before the primary header or the
    /// declared number of data bytes are read, [Error::SecondaryHeaderTooShort] if the secondary
    /// header does not fit, or any I/O error reading.
    pub fn read<R>(mut r: R) -> Result<Packet>
    where
        R: Read,
    {
        let mut buf = [0u8; PrimaryHeader::LEN];
        let n = read_full(&mut r, &mut buf)?;
        let Some(header) = PrimaryHeader::decode(&buf[..n]) else {
            return Err(Error::UnexpectedEndOfStream {
                actual: n,
                minimum: PrimaryHeader::LEN,
            });
        };

        let mut data = vec![0u8; header.packet_len()];
        data[..PrimaryHeader::LEN].copy_from_slice(&buf);
        let n = read_full(&mut r, &mut data[PrimaryHeader::LEN..])?;
        if n < header.data_len() {
            return Err(Error::UnexpectedEndOfStream {
                actual: n,
                minimum: header.data_len(),
            });
        }

        Self::from_parts(header, data)
    }

    fn from_parts(header: PrimaryHeader, data: Vec<u8>) -> Result<Packet> {
        let secondary_header = if header.has_secondary_header {
            Some(SecondaryHeader::decode(
                header.kind,
                &data[PrimaryHeader::LEN..],
            )?)
        } else {
            None
        };
        Ok(Packet {
            header,
            secondary_header,
            data,
            offset: 0,
        })
    }

    /// Byte offset of this packet in the stream it was read from. Zero unless the packet was
    /// produced by one of the stream readers.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Total number of bytes in the packet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn is_tm(&self) -> bool {
        self.header.kind == PacketKind::Tm
    }

    #[must_use]
    pub fn is_tc(&self) -> bool {
        self.header.kind == PacketKind::Tc
    }

    #[must_use]
    pub fn has_secondary_header(&self) -> bool {
        self.secondary_header.is_some()
    }

    /// Process id, the 7 most significant bits of the APID.
    #[must_use]
    pub fn prid(&self) -> u8 {
        ((self.header.apid >> 4) & 0x7f) as u8
    }

    #[must_use]
    pub fn pcat(&self) -> Pcat {
        Pcat::from_apid(self.header.apid)
    }

    /// True if the checksum over the whole packet evaluates to zero.
    #[must_use]
    pub fn checksum_ok(&self) -> bool {
        checksum(&self.data) == 0
    }

    /// Offset of the user data, right after the secondary header if there is one.
    #[must_use]
    pub fn payload_offset(&self) -> usize {
        PrimaryHeader::LEN + self.secondary_header.as_ref().map_or(0, SecondaryHeader::len)
    }

    /// User data between the headers and the checksum.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let start = self.payload_offset();
        let end = self.data.len().saturating_sub(CHECKSUM_LEN).max(start);
        &self.data[start..end]
    }

    /// Packet time; only telemetry packets with a secondary header have one.
    #[must_use]
    pub fn timestamp(&self) -> Option<PacketTimestamp> {
        self.secondary_header
            .as_ref()
            .and_then(SecondaryHeader::as_tm)
            .map(PacketTimestamp::from_header)
    }

    /// Key ordering packets by time, then by sequence count. Packets without a timestamp
    /// sort before those with one.
    #[must_use]
    pub fn sort_key(&self) -> (Option<PacketTimestamp>, u16) {
        (self.timestamp(), self.header.sequence_count)
    }

    /// Extract a `bit_count` wide field, see [bits::extract]. `byte_offset` counts from the
    /// first byte of the primary header, and the checksum bytes are never part of the field.
    ///
    /// # Errors
    /// [Error::InsufficientData] if the field extends into the checksum or past the end of the
    /// packet, [Error::InvalidBitField] for invalid bit arguments.
    pub fn extract_field(
        &self,
        bit_count: usize,
        byte_offset: usize,
        bit_offset: usize,
    ) -> Result<Vec<u8>> {
        bits::extract(self.without_checksum(), bit_count, byte_offset, bit_offset)
    }

    /// Same as [Self::extract_field], returning an integer.
    ///
    /// # Errors
    /// See [Self::extract_field].
    pub fn extract_uint(
        &self,
        bit_count: usize,
        byte_offset: usize,
        bit_offset: usize,
    ) -> Result<u64> {
        bits::extract_uint(self.without_checksum(), bit_count, byte_offset, bit_offset)
    }

    fn without_checksum(&self) -> &[u8] {
        &self.data[..self.data.len().saturating_sub(CHECKSUM_LEN)]
    }

    /// Hex string of the packet bytes.
    #[must_use]
    pub fn hex(&self) -> String {
        self.data.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Write the packet bytes, exactly as they were decoded, to `w`.
    ///
    /// # Errors
    /// Any I/O error writing.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.data)?;
        Ok(())
    }

    /// Hand this packet to `interpreter`.
    ///
    /// # Errors
    /// [Error::MissingSecondaryHeader] for a telemetry packet without a secondary header,
    /// otherwise whatever the interpreter returns.
    pub fn interpret<I>(&self, interpreter: &I) -> Result<Interpreted<I::Tm, I::Tc>>
    where
        I: Interpreter,
    {
        match self.header.kind {
            PacketKind::Tm => {
                if !self.has_secondary_header() {
                    return Err(Error::MissingSecondaryHeader);
                }
                Ok(Interpreted::Tm(interpreter.interpret_tm(self)?))
            }
            PacketKind::Tc => Ok(Interpreted::Tc(interpreter.interpret_tc(self)?)),
        }
    }
}
