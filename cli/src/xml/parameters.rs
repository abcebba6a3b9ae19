//! `<Parameters>`: the outer/mechanical time steps and the static/dynamic
//! directory hints.

use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::{attr, required_f64};

#[derive(Debug, Clone)]
pub struct Parameters {
    pub dt: f64,
    pub dt_mech: f64,
    pub static_dir: Option<String>,
    pub dynamic_dir: Option<String>,
}

pub fn load(path: &Path) -> Result<Parameters> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut reader = Reader::from_str(&text);
    let mut buf = Vec::new();

    let mut dt = None;
    let mut dt_mech = None;
    let mut static_dir = None;
    let mut dynamic_dir = None;

    loop {
        match reader.read_event_into(&mut buf).with_context(|| format!("parsing {}", path.display()))? {
            Event::Empty(tag) | Event::Start(tag) => match tag.name().as_ref() {
                b"Times" => {
                    dt = Some(required_f64(&tag, "TimeStep", "Times")?);
                    dt_mech = Some(required_f64(&tag, "TimeStepMechanical", "Times")?);
                }
                b"Directories" => {
                    static_dir = attr(&tag, "Static");
                    dynamic_dir = attr(&tag, "Dynamic");
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Parameters {
        dt: dt.context("<Parameters> is missing <Times TimeStep=\"...\"/>")?,
        dt_mech: dt_mech.context("<Parameters> is missing <Times TimeStepMechanical=\"...\"/>")?,
        static_dir,
        dynamic_dir,
    })
}
