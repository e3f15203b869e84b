use std::fs::File;
use std::io::{stdout, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use hifitime::Epoch;
use pus::dds::{EnvelopeReader, TimeQuality};
use pus::packet::{decode_packets, Apid, Packet, Pcat};
use pus::Error;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
struct Record<'a> {
    offset: u64,
    kind: String,
    apid: Apid,
    prid: u8,
    pcat: Pcat,
    sequence_count: u16,
    length: usize,
    service_type: Option<u8>,
    service_subtype: Option<u8>,
    time: Option<String>,
    checksum_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    dds: Option<DdsRecord<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
}

#[derive(Debug, Serialize)]
struct DdsRecord<'a> {
    offset: u64,
    time: Epoch,
    station: &'a str,
    virtual_channel: u16,
    time_quality: TimeQuality,
}

impl<'a> Record<'a> {
    fn new(packet: &Packet, payload: bool) -> Self {
        let sh = packet.secondary_header.as_ref();
        Record {
            offset: packet.offset(),
            kind: packet.header.kind.to_string(),
            apid: packet.header.apid,
            prid: packet.prid(),
            pcat: packet.pcat(),
            sequence_count: packet.header.sequence_count,
            length: packet.len(),
            service_type: sh.map(|sh| sh.service_type()),
            service_subtype: sh.map(|sh| sh.service_subtype()),
            time: packet.timestamp().map(|ts| ts.to_string()),
            checksum_ok: packet.checksum_ok(),
            dds: None,
            payload: payload.then(|| packet.payload().iter().map(|b| format!("{b:02x}")).collect()),
        }
    }
}

fn write_record<W: Write>(w: &mut W, record: &Record) -> Result<()> {
    serde_json::to_writer(&mut *w, record).context("serializing to json")?;
    w.write_all(b"\n").context("writing to stdout")
}

pub fn dump(fpath: &Path, dds: bool, lenient: bool, payload: bool) -> Result<()> {
    let reader = BufReader::new(File::open(fpath).context("opening input")?);
    let mut out = BufWriter::new(stdout().lock());

    if dds {
        for zult in EnvelopeReader::new(reader).with_lenient(lenient) {
            let env = match zult {
                Ok(env) => env,
                Err(Error::MalformedRecord { offset, source }) if lenient => {
                    warn!(offset, "malformed record: {source}");
                    continue;
                }
                Err(err) => return Err(err).context("reading dds records"),
            };
            let mut record = Record::new(&env.packet, payload);
            record.dds = Some(DdsRecord {
                offset: env.offset(),
                time: env.header.time(),
                station: env.ground_station().name,
                virtual_channel: env.header.virtual_channel,
                time_quality: env.header.time_quality,
            });
            write_record(&mut out, &record)?;
        }
    } else {
        for zult in decode_packets(reader) {
            let packet = zult.context("reading packets")?;
            write_record(&mut out, &Record::new(&packet, payload))?;
        }
    }

    out.flush().context("writing to stdout")
}
