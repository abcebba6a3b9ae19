//! `<Agents>` (static): per-agent mass/inertia/damping and welded shapes.
//! Kinematics live in the separate Dynamics file — this file only ever
//! establishes identity and the parameters that never change.

use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use throng_core::model::Shape;

use super::{required_f64, required_pair, required_u32};

#[derive(Debug, Clone)]
pub struct AgentStatic {
    pub id: u32,
    pub mass: f64,
    pub inertia: f64,
    pub zeta_t: f64,
    pub zeta_r: f64,
    pub shapes: Vec<Shape>,
}

pub fn load(path: &Path) -> Result<Vec<AgentStatic>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut reader = Reader::from_str(&text);
    let mut buf = Vec::new();
    let mut agents: Vec<AgentStatic> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).with_context(|| format!("parsing {}", path.display()))? {
            Event::Empty(tag) | Event::Start(tag) => match tag.name().as_ref() {
                b"Agent" => {
                    let id = required_u32(&tag, "Id", "Agent")?;
                    let mass = required_f64(&tag, "Mass", "Agent")?;
                    let inertia = required_f64(&tag, "MomentOfInertia", "Agent")?;
                    let zeta_t = required_f64(&tag, "FloorDamping", "Agent")?;
                    let zeta_r = required_f64(&tag, "AngularDamping", "Agent")?;
                    agents.push(AgentStatic { id, mass, inertia, zeta_t, zeta_r, shapes: Vec::new() });
                }
                b"Shape" => {
                    let material = required_u32(&tag, "MaterialId", "Shape")?;
                    let radius = required_f64(&tag, "Radius", "Shape")?;
                    let base_offset = required_pair(&tag, "Position", "Shape")?;
                    let agent = agents
                        .last_mut()
                        .ok_or_else(|| anyhow::anyhow!("<Shape> appears outside of any <Agent>"))?;
                    agent.shapes.push(Shape { material, base_offset, radius });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(agents)
}
