//! Outer-call orchestration: wires the neighbourhood layer, activation
//! gate, sub-stepping loop and non-active relaxation together into the
//! single entry point the collaborator crate calls once per outer step.

use std::collections::BTreeSet;

use crate::activation;
use crate::error::{CoreError, CoreResult};
use crate::history::InteractionStore;
use crate::integrate;
use crate::model::{AgentId, Domain};
use crate::neighbours::Neighbours;
use crate::relax;

/// Advance every agent in `domain` by one outer step `dt`, internally
/// sub-stepping the active set at `dt_mech`. On success, `domain` reflects
/// the committed kinematics and `history` reflects the surviving contacts.
/// On failure, neither is touched: the whole call operates on a working
/// copy of `domain` and only swaps it in once every sub-step has validated
/// clean — a numeric anomaly must leave state unchanged, not just the
/// sub-step that triggered it.
pub fn advance(domain: &mut Domain, history: &mut InteractionStore, dt: f64, dt_mech: f64) -> CoreResult<bool> {
    let mut working = domain.clone();
    let mut working_history = history.clone();

    for agent in working.agents_mut() {
        agent.refresh_rotated_offsets();
    }

    let neighbours = Neighbours::rebuild(&working, dt);
    let active_set = activation::active_agents(&working, &neighbours, dt);
    let active: Vec<AgentId> = active_set.iter().copied().collect();
    let any_active = !active.is_empty();

    if any_active {
        let sub_steps = (dt / dt_mech).floor().max(0.0) as u64;
        for _ in 0..sub_steps {
            integrate::sub_step(&mut working, &active, &neighbours, &mut working_history, dt_mech)?;
        }
    }

    let active_lookup: BTreeSet<AgentId> = active_set;
    for agent in working.agents_mut() {
        if !active_lookup.contains(&agent.id) {
            relax::relax(agent, dt);
        }
    }

    for agent in working.agents() {
        if !agent.position.is_finite() || !agent.velocity.is_finite() || !agent.theta.is_finite() || !agent.omega.is_finite() {
            return Err(CoreError::NumericAnomaly(format!("non-finite committed state for agent {}", agent.id)));
        }
    }

    *domain = working;
    *history = working_history;
    Ok(any_active)
}
