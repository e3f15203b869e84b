#[cfg(feature = "serde")]
use serde::Serialize;

use super::PacketKind;
use crate::{Error, Result};

/// Telecommand acknowledgement flags, bits 3-0 of the first TC secondary header byte.
///
/// Only the raw flags are kept; no verification state is tracked.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AckFlags(u8);

impl AckFlags {
    pub const ACCEPTED: AckFlags = AckFlags(0b0001);
    pub const START_EXEC: AckFlags = AckFlags(0b0010);
    pub const PROGRESS: AckFlags = AckFlags(0b0100);
    pub const EXECUTED: AckFlags = AckFlags(0b1000);

    /// Construct from the low 4 bits of `bits`; other bits are ignored.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        AckFlags(bits & 0xf)
    }

    #[must_use]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True if all the flags set in `other` are also set in `self`.
    #[must_use]
    pub fn contains(&self, other: AckFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for AckFlags {
    type Output = AckFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        AckFlags(self.0 | rhs.0)
    }
}

/// Data field header of a telemetry packet.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmSecondaryHeader {
    pub pus_version: u8,
    pub service_type: u8,
    pub service_subtype: u8,
    pub destination: u8,
    /// Seconds; bit 31 is the absolute/relative time flag, see
    /// [PacketTimestamp](super::PacketTimestamp).
    pub coarse_time: u32,
    /// Fractional seconds in units of 1/65536 s.
    pub fine_time: u16,
}

impl TmSecondaryHeader {
    pub const LEN: usize = 10;

    /// Decode from the bytes immediately following the primary header.
    ///
    /// # Errors
    /// [Error::SecondaryHeaderTooShort] if there are fewer than [Self::LEN] bytes.
    pub fn decode(dat: &[u8]) -> Result<Self> {
        if dat.len() < Self::LEN {
            return Err(Error::SecondaryHeaderTooShort {
                kind: PacketKind::Tm,
                actual: dat.len(),
                minimum: Self::LEN,
            });
        }
        Ok(TmSecondaryHeader {
            pus_version: (dat[0] >> 4) & 0x7,
            service_type: dat[1],
            service_subtype: dat[2],
            destination: dat[3],
            coarse_time: u32::from_be_bytes([dat[4], dat[5], dat[6], dat[7]]),
            fine_time: u16::from_be_bytes([dat[8], dat[9]]),
        })
    }
}

/// Data field header of a telecommand packet.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcSecondaryHeader {
    pub header_flag: bool,
    pub pus_version: u8,
    pub service_type: u8,
    pub service_subtype: u8,
    pub ack_flags: AckFlags,
}

impl TcSecondaryHeader {
    /// Length of the fixed part of the header. Mission specific optional fields (source id,
    /// spare) are not decoded and are part of the packet payload.
    pub const LEN: usize = 3;

    /// Decode from the bytes immediately following the primary header.
    ///
    /// # Errors
    /// [Error::SecondaryHeaderTooShort] if there are fewer than [Self::LEN] bytes.
    pub fn decode(dat: &[u8]) -> Result<Self> {
        if dat.len() < Self::LEN {
            return Err(Error::SecondaryHeaderTooShort {
                kind: PacketKind::Tc,
                actual: dat.len(),
                minimum: Self::LEN,
            });
        }
        Ok(TcSecondaryHeader {
            header_flag: (dat[0] >> 7) & 0x1 == 1,
            pus_version: (dat[0] >> 4) & 0x7,
            service_type: dat[1],
            service_subtype: dat[2],
            ack_flags: AckFlags::from_bits(dat[0]),
        })
    }
}

/// The secondary (data field) header of a packet, whose shape depends on the packet kind.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryHeader {
    Tm(TmSecondaryHeader),
    Tc(TcSecondaryHeader),
}

impl SecondaryHeader {
    /// Decode the secondary header shape for `kind` from `dat`.
    ///
    /// # Errors
    /// [Error::SecondaryHeaderTooShort] if `dat` is too short for the shape.
    pub fn decode(kind: PacketKind, dat: &[u8]) -> Result<Self> {
        match kind {
            PacketKind::Tm => Ok(SecondaryHeader::Tm(TmSecondaryHeader::decode(dat)?)),
            PacketKind::Tc => Ok(SecondaryHeader::Tc(TcSecondaryHeader::decode(dat)?)),
        }
    }

    /// Number of bytes this header occupies in the packet.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            SecondaryHeader::Tm(_) => TmSecondaryHeader::LEN,
            SecondaryHeader::Tc(_) => TcSecondaryHeader::LEN,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn pus_version(&self) -> u8 {
        match self {
            SecondaryHeader::Tm(h) => h.pus_version,
            SecondaryHeader::Tc(h) => h.pus_version,
        }
    }

    #[must_use]
    pub fn service_type(&self) -> u8 {
        match self {
            SecondaryHeader::Tm(h) => h.service_type,
            SecondaryHeader::Tc(h) => h.service_type,
        }
    }

    #[must_use]
    pub fn service_subtype(&self) -> u8 {
        match self {
            SecondaryHeader::Tm(h) => h.service_subtype,
            SecondaryHeader::Tc(h) => h.service_subtype,
        }
    }

    #[must_use]
    pub fn as_tm(&self) -> Option<&TmSecondaryHeader> {
        match self {
            SecondaryHeader::Tm(h) => Some(h),
            SecondaryHeader::Tc(_) => None,
        }
    }

    #[must_use]
    pub fn as_tc(&self) -> Option<&TcSecondaryHeader> {
        match self {
            SecondaryHeader::Tc(h) => Some(h),
            SecondaryHeader::Tm(_) => None,
        }
    }
}
