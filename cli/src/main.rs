use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use throng_cli::xml;
use throng_core::model::{Agent, Domain};
use throng_core::InteractionStore;

/// Advance a crowd-mechanics domain by one outer time step.
///
/// Reads the five XML inputs, runs `throng_core::advance` once, and rewrites
/// the Dynamics file and (if any contact survived the step) the sibling
/// AgentInteractions file next to it.
#[derive(Parser)]
#[command(name = "throng")]
struct Cli {
    parameters: PathBuf,
    materials: PathBuf,
    geometry: PathBuf,
    agents: PathBuf,
    dynamics: PathBuf,
}

fn interactions_path(dynamics: &Path) -> PathBuf {
    dynamics.with_file_name("AgentInteractions.xml")
}

fn build_domain(materials_path: &Path, geometry_path: &Path, agents_path: &Path, dynamics_path: &Path) -> Result<Domain> {
    let materials = xml::materials::load(materials_path)?;
    let geometry = xml::geometry::load(geometry_path)?;
    let statics = xml::agents::load(agents_path)?;
    let dynamics = xml::dynamics::load(dynamics_path)?;

    if statics.len() != dynamics.len() || statics.iter().map(|a| a.id).ne(dynamics.iter().map(|a| a.id)) {
        bail!(
            "Dynamics file names a different agent set than Agents: {} static vs {} dynamic entries",
            statics.len(),
            dynamics.len()
        );
    }

    let mut domain = Domain::new(materials, geometry.obstacles);
    for (s, d) in statics.into_iter().zip(dynamics.into_iter()) {
        let fp_accel = if s.mass != 0.0 { d.fp / s.mass } else { throng_core::Vec2::ZERO };
        let mp_accel = if s.inertia != 0.0 { d.mp / s.inertia } else { 0.0 };
        let mut agent = Agent::new(s.id, s.shapes, s.mass, s.inertia, d.theta, s.zeta_t, s.zeta_r, d.position);
        agent.velocity = d.velocity;
        agent.omega = d.omega;
        agent.fp_accel = fp_accel;
        agent.mp_accel = mp_accel;
        domain.insert_agent(agent);
    }

    Ok(domain)
}

fn load_history(path: &Path) -> InteractionStore {
    if !path.exists() {
        return InteractionStore::new();
    }
    match xml::interactions::load(path) {
        Ok(store) => store,
        Err(err) => {
            log::warn!("discarding corrupt AgentInteractions file {}: {err:#}", path.display());
            InteractionStore::new()
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let params = xml::parameters::load(&cli.parameters)?;
    let mut domain = build_domain(&cli.materials, &cli.geometry, &cli.agents, &cli.dynamics)
        .with_context(|| "building domain from static and dynamic inputs")?;
    let history_path = interactions_path(&cli.dynamics);
    let mut history = load_history(&history_path);

    let was_active = throng_core::advance(&mut domain, &mut history, params.dt, params.dt_mech)?;
    log::debug!("advance complete, {} agent(s), active={was_active}", domain.agents().len());

    xml::dynamics::save(&cli.dynamics, &domain)?;
    if !history.is_empty() {
        xml::interactions::save(&history_path, &history)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}
