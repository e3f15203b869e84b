use std::io::{stdout, Write};

use anyhow::{Context, Result};
use pus::dds::GROUND_STATIONS;

use crate::info::Format;

pub fn stations(format: &Format) -> Result<()> {
    let mut out = stdout().lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, GROUND_STATIONS).context("serializing to json")
        }
        Format::Text => {
            writeln!(out, "{:>4}  {:<14}  Name", "ID", "Organisation")?;
            for gs in GROUND_STATIONS {
                writeln!(out, "0x{:02x}  {:<14}  {}", gs.id, gs.organisation, gs.name)?;
            }
            Ok(())
        }
    }
}
