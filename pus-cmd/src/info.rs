use std::collections::BTreeMap;
use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use handlebars::handlebars_helper;
use hifitime::Duration;
use pus::dds::EnvelopeReader;
use pus::packet::{decode_packets, Summary};
use pus::Error;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Info {
    filename: String,
    duration: Option<Duration>,
    summary: Summary,
    /// DDS records skipped because their packet could not be decoded.
    malformed: usize,
    /// Record count per ground station, DDS input only.
    stations: BTreeMap<String, usize>,
    /// Error that ended reading before the end of the file.
    error: Option<String>,
}

fn summarize(fpath: &Path, dds: bool, lenient: bool) -> Result<Info> {
    let reader = BufReader::new(File::open(fpath).context("opening input")?);
    let mut info = Info {
        filename: fpath.to_string_lossy().to_string(),
        ..Default::default()
    };

    if dds {
        for zult in EnvelopeReader::new(reader).with_lenient(lenient) {
            match zult {
                Ok(env) => {
                    info.summary.add(&env.packet);
                    *info
                        .stations
                        .entry(env.ground_station().to_string())
                        .or_default() += 1;
                }
                Err(Error::MalformedRecord { offset, source }) if lenient => {
                    debug!(offset, "malformed record: {source}");
                    info.malformed += 1;
                }
                Err(err) => {
                    let err = anyhow::Error::from(err);
                    warn!("stopped reading: {err:#}");
                    info.error = Some(format!("{err:#}"));
                }
            }
        }
    } else {
        for zult in decode_packets(reader) {
            match zult {
                Ok(packet) => info.summary.add(&packet),
                Err(err) => {
                    let err = anyhow::Error::from(err);
                    warn!("stopped reading: {err:#}");
                    info.error = Some(format!("{err:#}"));
                }
            }
        }
    }

    if let (Some(first), Some(last)) = (info.summary.total.first_time, info.summary.total.last_time)
    {
        info.duration = Some(last - first);
    }

    Ok(info)
}

pub fn info(fpath: &Path, dds: bool, lenient: bool, format: &Format) -> Result<()> {
    let info = summarize(fpath, dds, lenient)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(data.as_bytes())
                .context("writing to stdout")
        }
    }
}

handlebars_helper!(left_pad: |num: u64, v: Json| {
    let v = match v {
        serde_json::Value::String(s) => s.to_owned(),
        serde_json::Value::Null => String::new(),
        _ => v.to_string()
    };
    let width = usize::try_from(num).unwrap_or(0);
    format!("{v:>width$}")
});

fn register_helpers(hb: &mut handlebars::Handlebars) {
    hb.register_helper("lpad", Box::new(left_pad));
}

fn render_text(info: &Info) -> Result<String> {
    let mut hb = handlebars::Handlebars::new();
    register_helpers(&mut hb);
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================================================================
First:     {{ summary.total.first_time }}
Last:      {{ summary.total.last_time }}
Duration:  {{ duration }}
APIDS:     {{ #each summary.apids }}{{ @key }}{{ #if @last }}{{ else }}, {{ /if }}{{ /each }}
Count:     {{ summary.total.count }}
Bytes:     {{ summary.total.bytes }}
Missing:   {{ summary.total.missing }}
Checksum:  {{ summary.total.bad_checksum }} bad
{{ #if malformed }}Malformed: {{ malformed }}
{{ /if }}{{ #each stations }}Station:   {{ @key }} {{ this }}
{{ /each }}{{ #if error }}Error:     {{ error }}
{{ /if }}-----------------------------------------------------------------------------------------------
APID    First                          Last                             Count  Missing  Bad CRC
-----------------------------------------------------------------------------------------------
{{ #each summary.apids }}{{ lpad 4 @key }}  {{ lpad 29 first_time }}  {{ lpad 29 last_time }}  {{ lpad 7 count }}  {{ lpad 7 missing }}  {{ lpad 7 bad_checksum }}
{{/each }}
";
