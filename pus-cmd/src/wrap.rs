use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use hifitime::Epoch;
use pus::dds::{Envelope, TimeQuality};
use pus::packet::decode_packets;
use tracing::{debug, info};

pub struct WrapOpts {
    pub ground_station_id: u16,
    pub virtual_channel: u16,
    pub sle: u8,
    pub time_quality: TimeQuality,
    /// Time for packets without an absolute timestamp; defaults to now.
    pub time: Option<Epoch>,
}

pub fn wrap(input: &Path, output: &Path, opts: &WrapOpts) -> Result<()> {
    let src = BufReader::new(File::open(input).context("opening input")?);
    let mut dest = BufWriter::new(
        File::create(output).with_context(|| format!("failed to create output {output:?}"))?,
    );
    info!("wrapping {input:?} to {output:?}");

    let count = wrap_packets(src, &mut dest, opts)?;
    dest.flush().context("writing output")?;
    info!("wrote {count} records");
    Ok(())
}

fn wrap_packets<R: Read, W: Write>(src: R, mut dest: W, opts: &WrapOpts) -> Result<usize> {
    let fallback = match opts.time {
        Some(time) => time,
        None => Epoch::now().map_err(|err| anyhow!("getting current time: {err}"))?,
    };

    let mut count = 0;
    for zult in decode_packets(src) {
        let packet = zult.context("reading packets")?;
        let time = packet
            .timestamp()
            .filter(|ts| ts.is_absolute())
            .map_or(fallback, |ts| ts.as_epoch());
        debug!(offset = packet.offset(), %time, "wrapping packet");

        let env = Envelope::wrap(
            packet,
            time,
            opts.ground_station_id,
            opts.virtual_channel,
            opts.sle,
            opts.time_quality,
        )
        .context("creating dds header")?;
        env.write_to(&mut dest).context("writing output")?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pus::dds::decode_envelopes;

    // APID 1, absolute time 1_000_000_000s
    const TM: &[u8] = &[
        0x08, 0x01, 0xc0, 0x05, 0x00, 0x0b, 0x10, 0x03, 0x01, 0x07, 0x3b, 0x9a, 0xca, 0x00, 0x75,
        0x30, 0x42, 0xb7,
    ];

    #[test]
    fn wraps_with_packet_time() {
        let opts = WrapOpts {
            ground_station_id: 0x16,
            virtual_channel: 3,
            sle: 1,
            time_quality: TimeQuality::Inaccurate,
            time: Some(Epoch::from_unix_seconds(5.0)),
        };
        let mut src = TM.to_vec();
        src.extend(TM);

        let mut dest = Vec::new();
        assert_eq!(wrap_packets(&src[..], &mut dest, &opts).unwrap(), 2);

        let envs: Vec<Envelope> = decode_envelopes(&dest[..]).map(Result::unwrap).collect();
        assert_eq!(envs.len(), 2);
        for env in &envs {
            assert_eq!(env.packet.data, TM);
            assert_eq!(env.header.coarse_time, 1_000_000_000);
            assert_eq!(env.header.ground_station_id, 0x16);
            assert_eq!(env.header.virtual_channel, 3);
            assert_eq!(env.header.time_quality, TimeQuality::Inaccurate);
        }
    }

    #[test]
    fn relative_time_uses_fallback() {
        let mut pkt = TM.to_vec();
        // set the relative time flag, then fix the checksum
        pkt[10] |= 0x80;
        pkt.truncate(pkt.len() - 2);
        let crc = pus::checksum::checksum(&pkt);
        pkt.extend(crc.to_be_bytes());

        let opts = WrapOpts {
            ground_station_id: 0,
            virtual_channel: 0,
            sle: 0,
            time_quality: TimeQuality::Good,
            time: Some(Epoch::from_unix_seconds(1_500_000_000.0)),
        };
        let mut dest = Vec::new();
        wrap_packets(&pkt[..], &mut dest, &opts).unwrap();

        let env = decode_envelopes(&dest[..]).next().unwrap().unwrap();
        assert_eq!(env.header.coarse_time, 1_500_000_000);
        assert!(env.packet.checksum_ok());
    }
}
