//! `<Agents>` (dynamics): per-call kinematics and driving input, read on
//! entry and rewritten (kinematics only) on exit.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use throng_core::model::Domain;
use throng_core::Vec2;

use super::{format_pair, required_pair, required_u32};

#[derive(Debug, Clone)]
pub struct AgentDynamicsInput {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub theta: f64,
    pub omega: f64,
    pub fp: Vec2,
    pub mp: f64,
}

pub fn load(path: &Path) -> Result<Vec<AgentDynamicsInput>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut reader = Reader::from_str(&text);
    let mut buf = Vec::new();
    let mut agents: Vec<AgentDynamicsInput> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).with_context(|| format!("parsing {}", path.display()))? {
            Event::Empty(tag) | Event::Start(tag) => match tag.name().as_ref() {
                b"Agent" => {
                    let id = required_u32(&tag, "Id", "Agent")?;
                    agents.push(AgentDynamicsInput {
                        id,
                        position: Vec2::ZERO,
                        velocity: Vec2::ZERO,
                        theta: 0.0,
                        omega: 0.0,
                        fp: Vec2::ZERO,
                        mp: 0.0,
                    });
                }
                b"Kinematics" => {
                    let position = required_pair(&tag, "Position", "Kinematics")?;
                    let velocity = required_pair(&tag, "Velocity", "Kinematics")?;
                    let theta = super::required_f64(&tag, "theta", "Kinematics")?;
                    let omega = super::required_f64(&tag, "omega", "Kinematics")?;
                    let agent = agents.last_mut().ok_or_else(|| anyhow::anyhow!("<Kinematics> appears outside of any <Agent>"))?;
                    agent.position = position;
                    agent.velocity = velocity;
                    agent.theta = theta;
                    agent.omega = omega;
                }
                b"Dynamics" => {
                    let fp = required_pair(&tag, "Fp", "Dynamics")?;
                    let mp = super::required_f64(&tag, "Mp", "Dynamics")?;
                    let agent = agents.last_mut().ok_or_else(|| anyhow::anyhow!("<Dynamics> appears outside of any <Agent>"))?;
                    agent.fp = fp;
                    agent.mp = mp;
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

/// Rewrite the Dynamics file with only the committed kinematics — the
/// `<Dynamics>` driving-input child is omitted on output.
pub fn save(path: &Path, domain: &Domain) -> Result<()> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Start(BytesStart::new("Agents")))?;
    for agent in domain.agents() {
        writer.write_event(Event::Start(BytesStart::new("Agent").with_attributes([("Id", agent.id.to_string().as_str())])))?;

        let mut kinematics = BytesStart::new("Kinematics");
        kinematics.push_attribute(("Position", format_pair(agent.position).as_str()));
        kinematics.push_attribute(("Velocity", format_pair(agent.velocity).as_str()));
        kinematics.push_attribute(("theta", agent.theta.to_string().as_str()));
        kinematics.push_attribute(("omega", agent.omega.to_string().as_str()));
        writer.write_event(Event::Empty(kinematics))?;

        writer.write_event(Event::End(BytesEnd::new("Agent")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Agents")))?;

    let bytes = writer.into_inner().into_inner();
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
