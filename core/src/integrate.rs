//! Integrator (C6): one velocity-Verlet sub-step over the active set, with
//! semi-implicit translational damping and explicit rotational damping
//! toward the desired angular velocity.

use std::collections::BTreeMap;

use crate::contact::{resolve_agent_pair, resolve_agent_wall, ContactContribution, ShapeState};
use crate::error::{CoreError, CoreResult};
use crate::history::{InteractionStore, WallKey};
use crate::model::{AgentId, Domain};
use crate::neighbours::Neighbours;
use crate::vector::{point_segment_distance, Vec2};

/// Per-agent kinematic snapshot at one time label, shapes already rotated to
/// that label's orientation. Built once from the committed state for pass A
/// and once from the trial drift result for pass B; the contact-accumulation
/// code itself does not know or care which.
struct AgentFrame {
    position: Vec2,
    offsets: Vec<Vec2>,
    velocity: Vec2,
    omega: f64,
}

impl AgentFrame {
    fn shape_center(&self, local_index: usize) -> Vec2 {
        self.position + self.offsets[local_index]
    }

    fn at_n(domain: &Domain, id: AgentId) -> Self {
        let agent = domain.agent(id).expect("active id resolves to a live agent");
        AgentFrame { position: agent.position, offsets: agent.rotated_offsets.clone(), velocity: agent.velocity, omega: agent.omega }
    }
}

/// Forces and torque already scaled to accelerations (`1/m`, `1/I`) as they
/// are accumulated, not after the sum.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    accel_n: Vec2,
    accel_t: Vec2,
    ang_accel: f64,
}

impl Accumulator {
    fn add(&mut self, c: ContactContribution, mass: f64, inertia: f64) {
        self.accel_n += c.force_n / mass;
        self.accel_t += c.force_t / mass;
        self.ang_accel += c.torque / inertia;
    }

    fn is_finite(&self) -> bool {
        self.accel_n.is_finite() && self.accel_t.is_finite() && self.ang_accel.is_finite()
    }
}

fn shape_state(domain: &Domain, id: AgentId, local_index: usize, frame: &AgentFrame) -> ShapeState {
    let agent = domain.agent(id).expect("active id resolves to a live agent");
    let shape = &agent.shapes[local_index];
    ShapeState {
        shape_ref: crate::history::ShapeRef::new(id, local_index),
        center: frame.shape_center(local_index),
        radius: shape.radius,
        delta_rot: frame.offsets[local_index],
        cm_velocity: frame.velocity,
        omega: frame.omega,
    }
}

/// Accumulate every agent-agent and agent-wall contact incident to an
/// active shape, for one time label's frames, into `out`.
fn accumulate_contacts(
    domain: &Domain,
    active: &[AgentId],
    neighbours: &Neighbours,
    history: &mut InteractionStore,
    dt_mech: f64,
    frames: &BTreeMap<AgentId, AgentFrame>,
    out: &mut BTreeMap<AgentId, Accumulator>,
) {
    for &id in active {
        let agent_a = domain.agent(id).expect("active id resolves to a live agent");
        let mass_a = agent_a.mass;
        let inertia_a = agent_a.inertia;

        for &neighbour_id in neighbours.of_agent(id) {
            if neighbour_id <= id {
                continue; // each unordered pair processed once, from the lower id
            }
            let agent_b = domain.agent(neighbour_id).expect("neighbour id resolves to a live agent");
            let mass_b = agent_b.mass;
            let inertia_b = agent_b.inertia;
            let frame_a = &frames[&id];
            let frame_b = &frames[&neighbour_id];

            for i in 0..agent_a.shapes.len() {
                for j in 0..agent_b.shapes.len() {
                    let mat_i = agent_a.shapes[i].material;
                    let mat_j = agent_b.shapes[j].material;
                    let Some((k_n, k_t)) = domain.materials.stiffness(mat_i, mat_j) else {
                        continue;
                    };
                    let row = domain.materials.binary(mat_i, mat_j).unwrap_or_default();

                    let a_state = shape_state(domain, id, i, frame_a);
                    let b_state = shape_state(domain, neighbour_id, j, frame_b);
                    let (contrib_a, contrib_b) = resolve_agent_pair(&a_state, &b_state, k_n, k_t, row, history, dt_mech);

                    out.entry(id).or_default().add(contrib_a, mass_a, inertia_a);
                    out.entry(neighbour_id).or_default().add(contrib_b, mass_b, inertia_b);
                }
            }
        }

        let frame_a = &frames[&id];
        for edge in neighbours.walls_of_agent(id) {
            let obstacle = &domain.obstacles[edge.obstacle];
            let (seg_a, seg_b) = {
                let verts = &obstacle.vertices;
                (verts[edge.segment], verts[edge.segment + 1])
            };
            for i in 0..agent_a.shapes.len() {
                let shape = shape_state(domain, id, i, frame_a);
                let (_, wall_point) = point_segment_distance(shape.center, seg_a, seg_b);
                let mat_i = agent_a.shapes[i].material;
                let Some((k_n, k_t)) = domain.materials.stiffness(mat_i, obstacle.material) else {
                    continue;
                };
                let row = domain.materials.binary(mat_i, obstacle.material).unwrap_or_default();
                let wall_key = WallKey { shape: shape.shape_ref, obstacle: edge.obstacle, segment: edge.segment };
                let contribution = resolve_agent_wall(&shape, wall_point, wall_key, k_n, k_t, row, history, dt_mech);
                out.entry(id).or_default().add(contribution, mass_a, inertia_a);
            }
        }
    }
}

/// Run exactly one mechanical sub-step over `active` (already the closed,
/// sorted active set from the activation gate). Leaves domain state
/// untouched if a non-finite value is produced anywhere.
pub fn sub_step(domain: &mut Domain, active: &[AgentId], neighbours: &Neighbours, history: &mut InteractionStore, dt_mech: f64) -> CoreResult<()> {
    if active.is_empty() {
        return Ok(());
    }

    let frames_n: BTreeMap<AgentId, AgentFrame> = active.iter().map(|&id| (id, AgentFrame::at_n(domain, id))).collect();
    let mut pass_a: BTreeMap<AgentId, Accumulator> = active.iter().map(|&id| (id, Accumulator::default())).collect();
    accumulate_contacts(domain, active, neighbours, history, dt_mech, &frames_n, &mut pass_a);

    struct Trial {
        position: Vec2,
        theta: f64,
        delta_theta: f64,
        velocity: Vec2,
        omega: f64,
        drift_tau: f64,
    }

    let mut trials: BTreeMap<AgentId, Trial> = BTreeMap::new();
    for &id in active {
        let agent = domain.agent(id).expect("active id resolves to a live agent");
        let acc = pass_a[&id];
        if !acc.is_finite() {
            return Err(CoreError::NumericAnomaly(format!("non-finite pass-A accumulator for agent {id}")));
        }

        let restoring = (agent.omega_des() - agent.omega) * agent.zeta_r;
        let drift_tau = acc.ang_accel + restoring;

        let position = agent.position + agent.velocity * ((1.0 - 0.5 * dt_mech * agent.zeta_t) * dt_mech)
            + (agent.fp_accel + acc.accel_n + acc.accel_t) * (0.5 * dt_mech * dt_mech);
        let theta = agent.theta + agent.omega * dt_mech + 0.5 * dt_mech * dt_mech * drift_tau;
        let delta_theta = theta - agent.theta;

        let velocity = agent.velocity * (1.0 - dt_mech * agent.zeta_t)
            + (agent.fp_accel + acc.accel_n + acc.accel_t) * dt_mech;
        let omega = agent.omega + dt_mech * drift_tau;

        if !position.is_finite() || !theta.is_finite() || !velocity.is_finite() || !omega.is_finite() {
            return Err(CoreError::NumericAnomaly(format!("non-finite trial state for agent {id}")));
        }

        trials.insert(id, Trial { position, theta, delta_theta, velocity, omega, drift_tau });
    }

    let frames_trial: BTreeMap<AgentId, AgentFrame> = active
        .iter()
        .map(|&id| {
            let agent = domain.agent(id).expect("active id resolves to a live agent");
            let trial = &trials[&id];
            let offsets = agent.rotated_offsets.iter().map(|o| o.rotate(trial.delta_theta)).collect();
            (id, AgentFrame { position: trial.position, offsets, velocity: trial.velocity, omega: trial.omega })
        })
        .collect();

    let mut pass_b: BTreeMap<AgentId, Accumulator> = active.iter().map(|&id| (id, Accumulator::default())).collect();
    accumulate_contacts(domain, active, neighbours, history, dt_mech, &frames_trial, &mut pass_b);

    let mut committed: BTreeMap<AgentId, (Vec2, f64, Vec2, f64, f64)> = BTreeMap::new();
    for &id in active {
        let agent = domain.agent(id).expect("active id resolves to a live agent");
        let acc_b = pass_b[&id];
        if !acc_b.is_finite() {
            return Err(CoreError::NumericAnomaly(format!("non-finite pass-B accumulator for agent {id}")));
        }
        let trial = &trials[&id];

        let restoring_trial = (agent.omega_des() - trial.omega) * agent.zeta_r;
        let tau_b = acc_b.ang_accel + restoring_trial;

        let zeta_half = 0.5 * dt_mech * agent.zeta_t;
        let velocity = (agent.velocity * (1.0 - zeta_half)
            + (agent.fp_accel * 2.0 + pass_a[&id].accel_n + pass_a[&id].accel_t + acc_b.accel_n + acc_b.accel_t) * (0.5 * dt_mech))
            / (1.0 + zeta_half);
        let omega = agent.omega + 0.5 * dt_mech * (trial.drift_tau + tau_b);

        if !velocity.is_finite() || !omega.is_finite() {
            return Err(CoreError::NumericAnomaly(format!("non-finite committed velocity for agent {id}")));
        }

        committed.insert(id, (trial.position, trial.theta, velocity, omega, trial.delta_theta));
    }

    for &id in active {
        let (position, theta, velocity, omega, delta_theta) = committed[&id];
        let agent = domain.agent_mut(id).expect("active id resolves to a live agent");
        agent.position = position;
        agent.theta = theta;
        agent.velocity = velocity;
        agent.omega = omega;
        for offset in agent.rotated_offsets.iter_mut() {
            *offset = offset.rotate(delta_theta);
        }
    }

    Ok(())
}
