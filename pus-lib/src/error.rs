use crate::packet::PacketKind;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A header, or the data a header declares, is cut short by the end of the stream.
    #[error("unexpected end of stream; got {actual} bytes, needed {minimum}")]
    UnexpectedEndOfStream {
        /// Number of bytes we got
        actual: usize,
        /// Minimum number of expected bytes
        minimum: usize,
    },

    /// A DDS envelope declares more payload than the file has left.
    #[error("premature end of file; envelope declares {declared} bytes, only {actual} available")]
    PrematureEndOfFile { declared: usize, actual: usize },

    #[error("unknown packet kind {0}")]
    UnknownPacketKind(u8),

    #[error("packet has no secondary header")]
    MissingSecondaryHeader,

    /// Bit field extraction ran past the end of the available data. Counts are in bits.
    #[error("insufficient data; {actual} bits available, {minimum} required")]
    InsufficientData { actual: usize, minimum: usize },

    #[error("invalid bit field; bit_count={bit_count} bit_offset={bit_offset}")]
    InvalidBitField { bit_count: usize, bit_offset: usize },

    #[error("{kind} secondary header too short; got {actual} bytes, needed {minimum}")]
    SecondaryHeaderTooShort {
        kind: PacketKind,
        actual: usize,
        minimum: usize,
    },

    /// The envelope payload length and the wrapped packet's length disagree.
    #[error("envelope declares {declared} bytes but packet is {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("timestamp cannot be represented as u32 unix seconds")]
    TimestampOutOfRange,

    /// A single envelope record could not be decoded. The stream itself is still in sync.
    #[error("malformed record at offset {offset}")]
    MalformedRecord {
        offset: u64,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
