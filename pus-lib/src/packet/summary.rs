use std::collections::HashMap;

use hifitime::Epoch;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::{missing_packets, Apid, Packet, PrimaryHeader};

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Default, Clone)]
pub struct ApidSummary {
    pub count: usize,
    pub bytes: usize,
    pub missing: usize,
    /// Packets where [Packet::checksum_ok] is false.
    pub bad_checksum: usize,
    pub first_time: Option<Epoch>,
    pub last_time: Option<Epoch>,
}

impl ApidSummary {
    fn add_time(&mut self, epoch: Epoch) {
        self.first_time = Some(self.first_time.map_or(epoch, |cur| cur.min(epoch)));
        self.last_time = Some(self.last_time.map_or(epoch, |cur| cur.max(epoch)));
    }
}

/// Tracks stats on packet iteration.
///
/// Only absolute packet timestamps contribute to the first and last times.
///
/// # Example
/// ```
/// use pus::packet::{decode_packets, Packet, Summary};
/// let dat: &[u8] = &[
///     0x08, 0x01, 0xc0, 0x05, 0x00, 0x0b,
///     0x10, 0x03, 0x01, 0x07, 0x3b, 0x9a, 0xca, 0x00, 0x75, 0x30,
///     0x42, 0xb7,
/// ];
///
/// let mut summary = Summary::default();
/// let packets: Vec<Packet> = decode_packets(dat)
///     .filter_map(Result::ok)
///     .inspect(|p| {
///         summary.add(p);
///     })
///     .collect();
/// assert_eq!(summary.total.count, 1);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Default, Clone)]
pub struct Summary {
    pub total: ApidSummary,
    pub apids: HashMap<Apid, ApidSummary>,

    #[cfg_attr(feature = "serde", serde(skip))]
    seen_headers: HashMap<Apid, PrimaryHeader>,
}

impl Summary {
    pub fn add(&mut self, packet: &Packet) {
        let hdr = packet.header;
        let missing = match self.seen_headers.get(&hdr.apid) {
            Some(last) => usize::from(missing_packets(hdr.sequence_count, last.sequence_count)),
            None => 0,
        };
        self.seen_headers.insert(hdr.apid, hdr);

        let epoch = packet
            .timestamp()
            .filter(|ts| ts.is_absolute())
            .map(|ts| ts.as_epoch());
        let bad_checksum = usize::from(!packet.checksum_ok());

        let apid = self.apids.entry(hdr.apid).or_default();
        for summary in [&mut self.total, apid] {
            summary.count += 1;
            summary.bytes += packet.len();
            summary.missing += missing;
            summary.bad_checksum += bad_checksum;
            if let Some(epoch) = epoch {
                summary.add_time(epoch);
            }
        }
    }
}
