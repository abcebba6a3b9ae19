//! `<Materials>`: intrinsic per-material scalars and binary contact rows.

use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use throng_core::model::{BinaryContact, Material, MaterialTable};

use super::{required_f64, required_u32};

pub fn load(path: &Path) -> Result<MaterialTable> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut reader = Reader::from_str(&text);
    let mut buf = Vec::new();
    let mut table = MaterialTable::new();

    loop {
        match reader.read_event_into(&mut buf).with_context(|| format!("parsing {}", path.display()))? {
            Event::Empty(tag) | Event::Start(tag) => match tag.name().as_ref() {
                b"Material" => {
                    let id = required_u32(&tag, "Id", "Material")?;
                    let young = required_f64(&tag, "YoungModulus", "Material")?;
                    let shear = required_f64(&tag, "ShearModulus", "Material")?;
                    table.insert_intrinsic(id, Material { young, shear });
                }
                b"Contact" => {
                    let id1 = required_u32(&tag, "Id1", "Contact")?;
                    let id2 = required_u32(&tag, "Id2", "Contact")?;
                    let gamma_n = required_f64(&tag, "GammaNormal", "Contact")?;
                    let gamma_t = required_f64(&tag, "GammaTangential", "Contact")?;
                    let mu = required_f64(&tag, "KineticFriction", "Contact")?;
                    table.insert_binary(id1, id2, BinaryContact { gamma_n, gamma_t, mu });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(table)
}
