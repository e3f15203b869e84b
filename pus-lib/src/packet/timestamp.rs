use std::cmp::Ordering;
use std::fmt::Display;

use hifitime::{Duration, Epoch};
#[cfg(feature = "serde")]
use serde::Serialize;

use super::TmSecondaryHeader;

const FINE_TICKS_PER_SEC: i128 = 0x10000;
const NANOS_PER_SEC: i128 = 1_000_000_000;
const ABSOLUTE_FLAG: u32 = 0x8000_0000;

/// The CUC time of a telemetry packet, from the coarse and fine time fields of its
/// secondary header.
///
/// Bit 31 of the coarse time is a flag rather than part of the seconds count. A **clear** bit
/// marks the time as absolute (seconds since the unix epoch); a set bit marks it as relative
/// to some mission specific offset. Note this is the inverse of conventions where a set bit
/// signals a valid/synchronized time.
///
/// Timestamps compare by the time they represent, [Self::as_duration].
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy)]
pub struct PacketTimestamp {
    coarse_time: u32,
    fine_time: u16,
}

impl PacketTimestamp {
    #[must_use]
    pub fn new(coarse_time: u32, fine_time: u16) -> Self {
        PacketTimestamp {
            coarse_time,
            fine_time,
        }
    }

    #[must_use]
    pub fn from_header(hdr: &TmSecondaryHeader) -> Self {
        Self::new(hdr.coarse_time, hdr.fine_time)
    }

    /// Whole seconds, the low 31 bits of the coarse time field.
    #[must_use]
    pub fn coarse(&self) -> u32 {
        self.coarse_time & !ABSOLUTE_FLAG
    }

    /// Fractional seconds numerator over 65536.
    #[must_use]
    pub fn fine(&self) -> u16 {
        self.fine_time
    }

    /// True when bit 31 of the coarse time is clear.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.coarse_time & ABSOLUTE_FLAG == 0
    }

    /// Time as an interval, `coarse + fine / 65536` seconds. Sub-nanosecond fractions are
    /// truncated.
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_total_nanoseconds(self.total_nanoseconds())
    }

    /// Time relative to the unix epoch. Only meaningful if [Self::is_absolute].
    #[must_use]
    pub fn as_epoch(&self) -> Epoch {
        Epoch::from_unix_duration(self.as_duration())
    }

    /// Time relative to `offset`, e.g., a mission reference time for relative timestamps.
    #[must_use]
    pub fn as_epoch_since(&self, offset: Epoch) -> Epoch {
        offset + self.as_duration()
    }

    fn total_nanoseconds(&self) -> i128 {
        let coarse = i128::from(self.coarse()) * NANOS_PER_SEC;
        let fine = i128::from(self.fine_time) * NANOS_PER_SEC / FINE_TICKS_PER_SEC;
        coarse + fine
    }
}

impl From<&TmSecondaryHeader> for PacketTimestamp {
    fn from(hdr: &TmSecondaryHeader) -> Self {
        Self::from_header(hdr)
    }
}

impl PartialEq for PacketTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.total_nanoseconds() == other.total_nanoseconds()
    }
}

impl Eq for PacketTimestamp {}

impl PartialOrd for PacketTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PacketTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_nanoseconds().cmp(&other.total_nanoseconds())
    }
}

impl Display for PacketTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_absolute() {
            write!(f, "{}", self.as_epoch())
        } else {
            write!(f, "+{}", self.as_duration())
        }
    }
}
