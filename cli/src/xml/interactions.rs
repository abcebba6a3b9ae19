//! AgentInteractions: the persistent tangential-slip history. Read on entry
//! if present, rewritten on exit only when any contact survived the step.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use throng_core::history::InteractionRecord;
use throng_core::{AgentId, InteractionStore, Vec2};

use super::{attr, format_pair, parse_vec2, required_usize};

pub fn load(path: &Path) -> Result<InteractionStore> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut reader = Reader::from_str(&text);
    let mut buf = Vec::new();
    let mut store = InteractionStore::new();
    let mut agent_stack: Vec<AgentId> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).with_context(|| format!("parsing {}", path.display()))? {
            Event::Start(tag) => {
                if tag.name().as_ref() == b"Agent" {
                    agent_stack.push(super::required_u32(&tag, "Id", "Agent")?);
                }
            }
            Event::End(tag) => {
                if tag.name().as_ref() == b"Agent" {
                    agent_stack.pop();
                }
            }
            Event::Empty(tag) => match tag.name().as_ref() {
                b"Agent" => {
                    // A childless agent block carries nothing to load, but
                    // still establishes (and immediately closes) a frame.
                    super::required_u32(&tag, "Id", "Agent")?;
                }
                b"Interaction" => {
                    let &parent_agent = agent_stack
                        .first()
                        .context("<Interaction> appears outside of any <Agent><Agent> pair")?;
                    let &child_agent = agent_stack
                        .get(1)
                        .context("<Interaction> is missing its parent agent-pair nesting")?;
                    let parent_shape = required_usize(&tag, "ParentShape", "Interaction")?;
                    let child_shape = required_usize(&tag, "ChildShape", "Interaction")?;
                    let slip = optional_pair(&tag, "TangentialRelativeDisplacement")?;
                    let normal_force = optional_pair(&tag, "Fn")?;
                    let tangential_force = optional_pair(&tag, "Ft")?;
                    store.load_pair(parent_agent, child_agent, parent_shape, child_shape, slip, normal_force, tangential_force);
                }
                b"Wall" => {
                    let &agent = agent_stack.first().context("<Wall> appears outside of any <Agent>")?;
                    let shape = required_usize(&tag, "ShapeId", "Wall")?;
                    let obstacle = required_usize(&tag, "WallId", "Wall")?;
                    let segment = required_usize(&tag, "CornerId", "Wall")?;
                    let slip = optional_pair(&tag, "TangentialRelativeDisplacement")?;
                    let normal_force = optional_pair(&tag, "Fn")?;
                    let tangential_force = optional_pair(&tag, "Ft")?;
                    store.load_wall(agent, shape, obstacle, segment, slip, normal_force, tangential_force);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(store)
}

fn optional_pair(tag: &BytesStart, name: &str) -> Result<Vec2> {
    match attr(tag, name) {
        Some(raw) => parse_vec2(&raw),
        None => Ok(Vec2::ZERO),
    }
}

fn push_if_nonzero(tag: &mut BytesStart, name: &str, v: Vec2) {
    if v != Vec2::ZERO {
        tag.push_attribute((name, format_pair(v).as_str()));
    }
}

fn write_record_attrs(tag: &mut BytesStart, record: &InteractionRecord) {
    push_if_nonzero(tag, "TangentialRelativeDisplacement", record.slip);
    push_if_nonzero(tag, "Fn", record.normal_force);
    push_if_nonzero(tag, "Ft", record.tangential_force);
}

pub fn save(path: &Path, store: &InteractionStore) -> Result<()> {
    let mut pairs: BTreeMap<AgentId, BTreeMap<AgentId, Vec<(usize, usize, InteractionRecord)>>> = BTreeMap::new();
    for (key, record) in store.pair_entries() {
        pairs.entry(key.parent.agent).or_default().entry(key.child.agent).or_default().push((key.parent.shape, key.child.shape, record));
    }

    let mut walls: BTreeMap<AgentId, Vec<(usize, usize, usize, InteractionRecord)>> = BTreeMap::new();
    for (key, record) in store.wall_entries() {
        walls.entry(key.shape.agent).or_default().push((key.shape.shape, key.obstacle, key.segment, record));
    }

    let mut outer_agents: BTreeSet<AgentId> = pairs.keys().copied().collect();
    outer_agents.extend(walls.keys().copied());

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("Interactions")))?;

    for agent_id in outer_agents {
        writer.write_event(Event::Start(BytesStart::new("Agent").with_attributes([("Id", agent_id.to_string().as_str())])))?;

        if let Some(children) = pairs.get(&agent_id) {
            for (child_id, entries) in children {
                writer.write_event(Event::Start(BytesStart::new("Agent").with_attributes([("Id", child_id.to_string().as_str())])))?;
                for (parent_shape, child_shape, record) in entries {
                    let mut tag = BytesStart::new("Interaction");
                    tag.push_attribute(("ParentShape", parent_shape.to_string().as_str()));
                    tag.push_attribute(("ChildShape", child_shape.to_string().as_str()));
                    write_record_attrs(&mut tag, record);
                    writer.write_event(Event::Empty(tag))?;
                }
                writer.write_event(Event::End(BytesEnd::new("Agent")))?;
            }
        }

        if let Some(entries) = walls.get(&agent_id) {
            for (shape, obstacle, segment, record) in entries {
                let mut tag = BytesStart::new("Wall");
                tag.push_attribute(("ShapeId", shape.to_string().as_str()));
                tag.push_attribute(("WallId", obstacle.to_string().as_str()));
                tag.push_attribute(("CornerId", segment.to_string().as_str()));
                write_record_attrs(&mut tag, record);
                writer.write_event(Event::Empty(tag))?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new("Agent")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Interactions")))?;
    std::fs::write(path, writer.into_inner().into_inner()).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
