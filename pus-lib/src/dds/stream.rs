use std::io::{Read, Seek};

use tracing::{debug, trace, warn};

use super::{decode_payload, read_payload, DdsHeader, Envelope};
use crate::bytes::Bytes;
use crate::packet::ReaderState;
use crate::{Error, Result};

/// Reads [Envelope]s from a DDS archive stream.
///
/// Runs of zero bytes between records are padding and are skipped. A stream that ends,
/// possibly after padding, where the next header would start ends iteration.
///
/// A truncated header or payload always ends the stream with an error. What happens when a
/// complete record holds a packet that cannot be decoded depends on `lenient`:
/// * strict (the default): the error is returned and the reader is exhausted.
/// * lenient: an [Error::MalformedRecord] is returned for just that record and reading
///   continues with the next record, since the payload length keeps the stream in sync.
pub struct EnvelopeReader<R> {
    bytes: Bytes<R>,
    lenient: bool,
    state: ReaderState,
}

impl<R> EnvelopeReader<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Self {
        EnvelopeReader {
            bytes: Bytes::new(reader),
            lenient: false,
            state: ReaderState::Ready,
        }
    }

    /// Skip, rather than stop at, records whose packet cannot be decoded.
    #[must_use]
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
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

    /// Read the next envelope, or `None` if the stream has no more records.
    ///
    /// # Errors
    /// [Error::UnexpectedEndOfStream] for a truncated header, [Error::PrematureEndOfFile] for a
    /// truncated payload, [Error::MalformedRecord] for a record whose packet cannot be
    /// decoded, or any I/O error. Only [Error::MalformedRecord] in lenient mode leaves the
    /// reader ready for more records.
    pub fn read_next(&mut self) -> Result<Option<Envelope>> {
        if self.state == ReaderState::Exhausted {
            return Ok(None);
        }
        match self.read_record() {
            Ok(Some(env)) => Ok(Some(env)),
            Ok(None) => {
                trace!(offset = self.offset(), "end of envelope stream");
                self.state = ReaderState::Exhausted;
                Ok(None)
            }
            Err(Error::MalformedRecord { offset, source }) if self.lenient => {
                warn!(offset, "skipping malformed record: {source}");
                Err(Error::MalformedRecord { offset, source })
            }
            Err(err) => {
                debug!(offset = self.offset(), "failed to read envelope: {err}");
                self.state = ReaderState::Exhausted;
                Err(err)
            }
        }
    }

    fn read_record(&mut self) -> Result<Option<Envelope>> {
        let skipped = self.bytes.skip_while(0)?;
        if skipped > 0 {
            debug!(offset = self.offset(), skipped, "skipped padding");
        }
        if self.bytes.peek()?.is_none() {
            return Ok(None);
        }

        let offset = self.offset();
        let header = DdsHeader::read(&mut self.bytes)?;
        let payload = read_payload(&mut self.bytes, &header)?;
        let packet = decode_payload(&header, &payload).map_err(|err| Error::MalformedRecord {
            offset,
            source: Box::new(err),
        })?;
        trace!(
            offset,
            apid = packet.header.apid,
            station = header.ground_station_id,
            "envelope"
        );

        Ok(Some(Envelope {
            header,
            packet: packet.with_offset(offset + DdsHeader::LEN as u64),
            offset,
        }))
    }
}

impl<R> EnvelopeReader<R>
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

impl<R> Iterator for EnvelopeReader<R>
where
    R: Read,
{
    type Item = Result<Envelope>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Return an iterator providing [Envelope]s read from a DDS archive stream in strict mode.
/// See [EnvelopeReader::with_lenient] to keep reading past malformed packets.
pub fn decode_envelopes<R>(reader: R) -> EnvelopeReader<R>
where
    R: Read,
{
    EnvelopeReader::new(reader)
}
