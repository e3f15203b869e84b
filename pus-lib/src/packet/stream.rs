use std::io::{Read, Seek};

use tracing::{debug, trace};

use super::Packet;
use crate::bytes::Bytes;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// More packets may be available.
    Ready,
    /// The end of the stream was reached, or a packet failed to decode.
    Exhausted,
}

/// Reads a contiguous sequence of [Packet]s from a byte stream.
///
/// Each packet gets the byte offset it was read from, see [Packet::offset]. A stream that
/// ends exactly at a packet boundary ends iteration. A stream that ends inside a packet, or
/// a packet that cannot be decoded, produces an error after which the reader is exhausted,
/// since there is no way to find the start of the next packet.
///
/// A reader holds the only cursor into its stream; it is not meant to be shared between
/// threads.
pub struct PacketReader<R> {
    bytes: Bytes<R>,
    state: ReaderState,
}

impl<R> PacketReader<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Self {
        PacketReader {
            bytes: Bytes::new(reader),
            state: ReaderState::Ready,
        }
    }

    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Offset of the next byte to be read.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.bytes.offset()
    }

    /// Read the next packet, or `None` if the stream has no more packets.
    ///
    /// # Errors
    /// Any error from [Packet::read]. The reader is exhausted afterwards.
    pub fn read_next(&mut self) -> Result<Option<Packet>> {
        if self.state == ReaderState::Exhausted {
            return Ok(None);
        }
        if self.bytes.peek()?.is_none() {
            trace!(offset = self.offset(), "end of packet stream");
            self.state = ReaderState::Exhausted;
            return Ok(None);
        }

        let offset = self.offset();
        match Packet::read(&mut self.bytes) {
            Ok(packet) => {
                trace!(offset, apid = packet.header.apid, len = packet.len(), "packet");
                Ok(Some(packet.with_offset(offset)))
            }
            Err(err) => {
                debug!(offset, "failed to read packet: {err}");
                self.state = ReaderState::Exhausted;
                Err(err)
            }
        }
    }
}

impl<R> PacketReader<R>
where
    R: Read + Seek,
{
    /// Move the cursor to `position`, making the reader ready again. Positions and record
    /// offsets count from where the stream was when the reader was created.
    ///
    /// # Errors
    /// Any I/O error seeking.
    pub fn seek(&mut self, position: u64) -> Result<u64> {
        let pos = self.bytes.seek(position)?;
        debug!(position = pos, "seek");
        self.state = ReaderState::Ready;
        Ok(pos)
    }
}

impl<R> Iterator for PacketReader<R>
where
    R: Read,
{
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Return an iterator providing [Packet] data read from a byte synchronized packet stream.
///
/// # Examples
/// ```
/// use pus::packet::decode_packets;
///
/// let dat: &[u8] = &[
///     // primary header bytes
///     0x08, 0x01, 0xc0, 0x05, 0x00, 0x0b,
///     // TM secondary header bytes
///     0x10, 0x03, 0x01, 0x07, 0x3b, 0x9a, 0xca, 0x00, 0x75, 0x30,
///     // checksum
///     0x42, 0xb7,
/// ];
///
/// decode_packets(dat).for_each(|zult| {
///     let packet = zult.unwrap();
///     assert_eq!(packet.header.apid, 1);
/// });
/// ```
pub fn decode_packets<R>(reader: R) -> PacketReader<R>
where
    R: Read,
{
    PacketReader::new(reader)
}
