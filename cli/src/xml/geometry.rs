//! `<Geometry>`: the arena bounds and wall obstacles.

use std::path::Path;

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use throng_core::model::Obstacle;

use super::{required_f64, required_pair, required_u32};

#[derive(Debug, Clone)]
pub struct Geometry {
    pub lx: f64,
    pub ly: f64,
    pub obstacles: Vec<Obstacle>,
}

pub fn load(path: &Path) -> Result<Geometry> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut reader = Reader::from_str(&text);
    let mut buf = Vec::new();

    let mut lx = None;
    let mut ly = None;
    let mut obstacles: Vec<Obstacle> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).with_context(|| format!("parsing {}", path.display()))? {
            Event::Empty(tag) | Event::Start(tag) => match tag.name().as_ref() {
                b"Dimensions" => {
                    lx = Some(required_f64(&tag, "Lx", "Dimensions")?);
                    ly = Some(required_f64(&tag, "Ly", "Dimensions")?);
                }
                b"Wall" => {
                    let material = required_u32(&tag, "MaterialId", "Wall")?;
                    obstacles.push(Obstacle { material, vertices: Vec::new() });
                }
                b"Corner" => {
                    let position = required_pair(&tag, "Coordinates", "Corner")?;
                    let obstacle = obstacles
                        .last_mut()
                        .ok_or_else(|| anyhow::anyhow!("<Corner> appears outside of any <Wall>"))?;
                    obstacle.vertices.push(position);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    for obstacle in &obstacles {
        if obstacle.vertices.len() < 2 {
            bail!("a <Wall> must declare at least two <Corner> vertices");
        }
    }

    Ok(Geometry {
        lx: lx.context("<Geometry> is missing <Dimensions Lx=\"...\"/>")?,
        ly: ly.context("<Geometry> is missing <Dimensions Ly=\"...\"/>")?,
        obstacles,
    })
}
