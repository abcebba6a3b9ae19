//! XML decoding/encoding for the five external formats, plus the shared
//! "x,y" coordinate-pair convention all of them use in attribute values.
//!
//! None of this lives in `throng-core`: the core only ever sees
//! [`throng_core::model::Domain`] and [`throng_core::InteractionStore`]
//! values, already validated.

pub mod agents;
pub mod dynamics;
pub mod geometry;
pub mod interactions;
pub mod materials;
pub mod parameters;

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::BytesStart;
use throng_core::Vec2;

pub(crate) fn attr(tag: &BytesStart, name: &str) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

pub(crate) fn required_attr(tag: &BytesStart, name: &str, tag_name: &str) -> Result<String> {
    attr(tag, name).ok_or_else(|| anyhow!("<{tag_name}> missing required attribute `{name}`"))
}

pub(crate) fn required_f64(tag: &BytesStart, name: &str, tag_name: &str) -> Result<f64> {
    required_attr(tag, name, tag_name)?
        .parse::<f64>()
        .with_context(|| format!("<{tag_name}> attribute `{name}` is not a number"))
}

pub(crate) fn required_u32(tag: &BytesStart, name: &str, tag_name: &str) -> Result<u32> {
    required_attr(tag, name, tag_name)?
        .parse::<u32>()
        .with_context(|| format!("<{tag_name}> attribute `{name}` is not an integer"))
}

pub(crate) fn required_usize(tag: &BytesStart, name: &str, tag_name: &str) -> Result<usize> {
    required_attr(tag, name, tag_name)?
        .parse::<usize>()
        .with_context(|| format!("<{tag_name}> attribute `{name}` is not an integer"))
}

/// Parse a `"x,y"` coordinate pair — the one wire convention shared by
/// `Position`, `Velocity`, `Fp`, and `TangentialRelativeDisplacement`.
pub(crate) fn parse_pair(raw: &str) -> Result<(f64, f64)> {
    let mut parts = raw.split(',');
    let x = parts
        .next()
        .context("coordinate pair missing x component")?
        .trim()
        .parse::<f64>()
        .with_context(|| format!("coordinate pair `{raw}` has a non-numeric x component"))?;
    let y = parts
        .next()
        .context("coordinate pair missing y component")?
        .trim()
        .parse::<f64>()
        .with_context(|| format!("coordinate pair `{raw}` has a non-numeric y component"))?;
    if parts.next().is_some() {
        bail!("coordinate pair `{raw}` has more than two components");
    }
    Ok((x, y))
}

pub(crate) fn parse_vec2(raw: &str) -> Result<Vec2> {
    let (x, y) = parse_pair(raw)?;
    Ok(Vec2::new(x, y))
}

pub(crate) fn required_pair(tag: &BytesStart, name: &str, tag_name: &str) -> Result<Vec2> {
    parse_vec2(&required_attr(tag, name, tag_name)?)
}

pub(crate) fn format_pair(v: Vec2) -> String {
    format!("{},{}", v.x, v.y)
}
