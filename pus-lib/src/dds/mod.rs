//! DDS archive envelopes.
//!
//! Packets archived by a ground segment's data distribution system are each preceded by an
//! 18 byte header giving the reception time, the ground station, and the virtual channel the
//! packet was received on.
mod stations;
mod stream;

use std::io::{Read, Write};

use hifitime::{Duration, Epoch};
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::bytes::read_full;
use crate::packet::{Packet, PrimaryHeader};
use crate::{Error, Result};

pub use stations::*;
pub use stream::*;

/// Quality of the reception time in a [DdsHeader].
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeQuality {
    Good,
    Inaccurate,
    Bad,
    /// Any other value, kept as read.
    Unknown(u8),
}

impl From<u8> for TimeQuality {
    fn from(value: u8) -> Self {
        match value {
            0 => TimeQuality::Good,
            1 => TimeQuality::Inaccurate,
            2 => TimeQuality::Bad,
            other => TimeQuality::Unknown(other),
        }
    }
}

impl From<TimeQuality> for u8 {
    fn from(value: TimeQuality) -> Self {
        match value {
            TimeQuality::Good => 0,
            TimeQuality::Inaccurate => 1,
            TimeQuality::Bad => 2,
            TimeQuality::Unknown(value) => value,
        }
    }
}

/// DDS envelope header.
///
/// All fields are big-endian.
/// ```text
/// bytes 0-3    coarse_time        unix seconds
/// bytes 4-7    fine_time          microseconds
/// bytes 8-11   payload_length     bytes of packet following the header
/// bytes 12-13  ground_station_id
/// bytes 14-15  virtual_channel
/// byte  16     sle
/// byte  17     time_quality
/// ```
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsHeader {
    pub coarse_time: u32,
    pub fine_time: u32,
    pub payload_length: u32,
    pub ground_station_id: u16,
    pub virtual_channel: u16,
    pub sle: u8,
    pub time_quality: TimeQuality,
}

impl DdsHeader {
    pub const LEN: usize = 18;

    /// Decode from bytes. Returns `None` if there are fewer than [Self::LEN] bytes.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        Some(DdsHeader {
            coarse_time: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            fine_time: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            payload_length: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            ground_station_id: u16::from_be_bytes([buf[12], buf[13]]),
            virtual_channel: u16::from_be_bytes([buf[14], buf[15]]),
            sle: buf[16],
            time_quality: TimeQuality::from(buf[17]),
        })
    }

    /// Read exactly one header from `r`. The packet following the header is not read.
    ///
    /// # Errors
    /// [Error::UnexpectedEndOfStream] if fewer than [Self::LEN] bytes are available, or any
    /// I/O error reading.
    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut buf = [0u8; Self::LEN];
        let n = read_full(&mut r, &mut buf)?;
        Self::decode(&buf[..n]).ok_or(Error::UnexpectedEndOfStream {
            actual: n,
            minimum: Self::LEN,
        })
    }

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[0..4].copy_from_slice(&self.coarse_time.to_be_bytes());
        buf[4..8].copy_from_slice(&self.fine_time.to_be_bytes());
        buf[8..12].copy_from_slice(&self.payload_length.to_be_bytes());
        buf[12..14].copy_from_slice(&self.ground_station_id.to_be_bytes());
        buf[14..16].copy_from_slice(&self.virtual_channel.to_be_bytes());
        buf[16] = self.sle;
        buf[17] = self.time_quality.into();
        buf
    }

    /// Reception time.
    #[must_use]
    pub fn time(&self) -> Epoch {
        let micros = i128::from(self.coarse_time) * 1_000_000 + i128::from(self.fine_time);
        Epoch::from_unix_duration(Duration::from_total_nanoseconds(micros * 1_000))
    }

    #[must_use]
    pub fn ground_station(&self) -> &'static GroundStation {
        GroundStation::lookup(self.ground_station_id)
    }
}

/// A [Packet] together with the [DdsHeader] it was archived with.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub header: DdsHeader,
    pub packet: Packet,

    offset: u64,
}

impl Envelope {
    /// Wrap `packet` in an envelope.
    ///
    /// `time` is split into whole unix seconds and microseconds; `payload_length` is the
    /// length of the packet.
    ///
    /// # Errors
    /// [Error::TimestampOutOfRange] if `time` is before the unix epoch or its seconds do not
    /// fit in 32 bits, [Error::LengthMismatch] if the packet is longer than a 32-bit length.
    pub fn wrap(
        packet: Packet,
        time: Epoch,
        ground_station_id: u16,
        virtual_channel: u16,
        sle: u8,
        time_quality: TimeQuality,
    ) -> Result<Self> {
        let nanos = time.to_unix_duration().total_nanoseconds();
        let coarse = u32::try_from(nanos.div_euclid(1_000_000_000))
            .map_err(|_| Error::TimestampOutOfRange)?;
        let fine = u32::try_from(nanos.rem_euclid(1_000_000_000) / 1_000)
            .map_err(|_| Error::TimestampOutOfRange)?;
        let payload_length = u32::try_from(packet.len()).map_err(|_| Error::LengthMismatch {
            declared: u32::MAX as usize,
            actual: packet.len(),
        })?;

        Ok(Envelope {
            header: DdsHeader {
                coarse_time: coarse,
                fine_time: fine,
                payload_length,
                ground_station_id,
                virtual_channel,
                sle,
                time_quality,
            },
            packet,
            offset: 0,
        })
    }

    /// Read one header and the packet it wraps.
    ///
    /// # Errors
    /// [Error::UnexpectedEndOfStream] for a short header, [Error::PrematureEndOfFile] if the
    /// stream ends before `payload_length` bytes, [Error::LengthMismatch] if the packet does
    /// not fill exactly `payload_length` bytes, or any error decoding the packet.
    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let header = DdsHeader::read(&mut r)?;
        let payload = read_payload(&mut r, &header)?;
        Ok(Envelope {
            header,
            packet: decode_payload(&header, &payload)?,
            offset: 0,
        })
    }

    /// Byte offset of the envelope header in the stream it was read from.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn ground_station(&self) -> &'static GroundStation {
        self.header.ground_station()
    }

    /// Total number of bytes, header and packet.
    #[must_use]
    pub fn len(&self) -> usize {
        DdsHeader::LEN + self.packet.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Write the header followed by the packet bytes.
    ///
    /// # Errors
    /// Any I/O error writing.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.header.encode())?;
        self.packet.write_to(w)
    }
}

/// Largest packet a primary header can declare.
const MAX_PACKET_LEN: usize = PrimaryHeader::LEN + 0x10000;

/// Read the `payload_length` bytes following `header`. The buffer only grows with the bytes
/// actually read, so a corrupt length cannot force a huge allocation.
fn read_payload<R: Read>(r: &mut R, header: &DdsHeader) -> Result<Vec<u8>> {
    let declared = header.payload_length as usize;
    let mut payload = Vec::with_capacity(declared.min(MAX_PACKET_LEN));
    let n = r
        .by_ref()
        .take(u64::from(header.payload_length))
        .read_to_end(&mut payload)?;
    if n < declared {
        return Err(Error::PrematureEndOfFile {
            declared,
            actual: n,
        });
    }
    Ok(payload)
}

fn decode_payload(header: &DdsHeader, payload: &[u8]) -> Result<Packet> {
    let packet = Packet::decode(payload)?;
    if packet.len() != payload.len() {
        return Err(Error::LengthMismatch {
            declared: header.payload_length as usize,
            actual: packet.len(),
        });
    }
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::tm_packet;
    use test_case::test_case;

    fn epoch(nanos: i128) -> Epoch {
        Epoch::from_unix_duration(Duration::from_total_nanoseconds(nanos))
    }

    #[test]
    fn decode_header() {
        let dat = hex::decode("3b9aca00000f424000000012001700020305").unwrap();
        let hdr = DdsHeader::decode(&dat).unwrap();

        assert_eq!(hdr.coarse_time, 1_000_000_000);
        assert_eq!(hdr.fine_time, 1_000_000);
        assert_eq!(hdr.payload_length, 18);
        assert_eq!(hdr.ground_station_id, 0x17);
        assert_eq!(hdr.virtual_channel, 2);
        assert_eq!(hdr.sle, 3);
        assert_eq!(hdr.time_quality, TimeQuality::Unknown(5));
        assert_eq!(hdr.ground_station().name, "New Norcia");
        assert_eq!(hdr.encode().to_vec(), dat);
    }

    #[test]
    fn unknown_ground_station_is_not_an_error() {
        let dat = hex::decode("3b9aca000000000000000012ff0000000000").unwrap();
        let hdr = DdsHeader::read(&dat[..]).unwrap();
        assert_eq!(hdr.ground_station_id, 0xff00);
        assert!(hdr.ground_station().is_unknown());

        let dat = hex::decode("3b9aca00000000000000001200ff00000000").unwrap();
        let hdr = DdsHeader::read(&dat[..]).unwrap();
        assert_eq!(hdr.ground_station_id, 0xff);
        assert_eq!(hdr.ground_station().name, "Unknown");
    }

    #[test_case(0, TimeQuality::Good)]
    #[test_case(1, TimeQuality::Inaccurate)]
    #[test_case(2, TimeQuality::Bad)]
    #[test_case(3, TimeQuality::Unknown(3))]
    #[test_case(5, TimeQuality::Unknown(5))]
    #[test_case(0xff, TimeQuality::Unknown(0xff))]
    fn time_quality(value: u8, expected: TimeQuality) {
        assert_eq!(TimeQuality::from(value), expected);
        assert_eq!(u8::from(expected), value);
    }

    #[test]
    fn header_round_trip_keeps_unknown_time_quality() {
        let mut dat = hex::decode("3b9aca00000000000000001200000000").unwrap();
        dat.extend([0x01, 0x05]);
        let hdr = DdsHeader::decode(&dat).unwrap();
        assert_eq!(hdr.time_quality, TimeQuality::Unknown(5));
        assert_eq!(hdr.encode().to_vec(), dat);
    }

    #[test]
    fn short_header() {
        let zult = DdsHeader::read(&[0u8; 17][..]);
        assert!(matches!(
            zult,
            Err(Error::UnexpectedEndOfStream {
                actual: 17,
                minimum: 18
            })
        ));
    }

    #[test]
    fn wrap_sets_payload_length_and_time() {
        let packet = Packet::decode(&tm_packet(&[])).unwrap();
        let time = epoch(1_000_000_000_123_456_789);
        let env = Envelope::wrap(packet.clone(), time, 0x10, 5, 1, TimeQuality::Good).unwrap();

        assert_eq!(env.header.payload_length, 18);
        assert_eq!(env.header.coarse_time, 1_000_000_000);
        assert_eq!(env.header.fine_time, 123_456);
        assert_eq!(env.header.time(), epoch(1_000_000_000_123_456_000));
        assert_eq!(env.ground_station().name, "Kourou");
        assert_eq!(env.len(), 36);
        assert_eq!(env.packet, packet);
    }

    #[test]
    fn wrap_rejects_unrepresentable_times() {
        let packet = Packet::decode(&tm_packet(&[])).unwrap();
        let before_unix = epoch(-1);
        assert!(matches!(
            Envelope::wrap(packet.clone(), before_unix, 0, 0, 0, TimeQuality::Good),
            Err(Error::TimestampOutOfRange)
        ));
        let too_late = epoch((i128::from(u32::MAX) + 1) * 1_000_000_000);
        assert!(matches!(
            Envelope::wrap(packet, too_late, 0, 0, 0, TimeQuality::Good),
            Err(Error::TimestampOutOfRange)
        ));
    }

    #[test]
    fn wrap_then_read() {
        let dat = tm_packet(&[1, 2, 3]);
        let packet = Packet::decode(&dat).unwrap();
        let env = Envelope::wrap(packet, epoch(0), 0x11, 1, 0, TimeQuality::Bad).unwrap();

        let mut buf = Vec::new();
        env.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), DdsHeader::LEN + dat.len());

        // header only, then the payload by hand
        let hdr = DdsHeader::read(&buf[..]).unwrap();
        assert_eq!(hdr.payload_length as usize, dat.len());
        let end = DdsHeader::LEN + hdr.payload_length as usize;
        let packet = Packet::decode(&buf[DdsHeader::LEN..end]).unwrap();
        assert_eq!(packet.data, dat);

        let read = Envelope::read(&buf[..]).unwrap();
        assert_eq!(read, env);
    }

    #[test]
    fn read_truncated_payload() {
        let packet = Packet::decode(&tm_packet(&[1, 2, 3])).unwrap();
        let env = Envelope::wrap(packet, epoch(0), 0, 0, 0, TimeQuality::Good).unwrap();
        let mut buf = Vec::new();
        env.write_to(&mut buf).unwrap();

        let zult = Envelope::read(&buf[..buf.len() - 4]);
        assert!(matches!(
            zult,
            Err(Error::PrematureEndOfFile {
                declared: 21,
                actual: 17
            })
        ));
    }

    #[test]
    fn read_huge_declared_payload() {
        let mut hdr = DdsHeader::decode(&[0u8; 18]).unwrap();
        hdr.coarse_time = 1_000_000_000;
        hdr.payload_length = 0xffff_fff0;
        let mut buf = hdr.encode().to_vec();
        buf.extend([0x08, 0x01, 0xc0, 0x05]);

        assert!(matches!(
            Envelope::read(&buf[..]),
            Err(Error::PrematureEndOfFile {
                declared: 0xffff_fff0,
                actual: 4
            })
        ));
    }

    #[test]
    fn read_length_mismatch() {
        let dat = tm_packet(&[]);
        let mut hdr = DdsHeader::decode(&[0u8; 18]).unwrap();
        hdr.payload_length = dat.len() as u32 + 2;
        let mut buf = hdr.encode().to_vec();
        buf.extend(&dat);
        buf.extend([0, 0]);

        assert!(matches!(
            Envelope::read(&buf[..]),
            Err(Error::LengthMismatch {
                declared: 20,
                actual: 18
            })
        ));
    }
}
