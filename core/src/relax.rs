//! Non-active path (C8): analytic exponential relaxation toward the desired
//! velocity for agents the activation gate skipped this outer step.

use crate::model::Agent;

/// Advance one non-active agent by the full outer step `dt`. No contact
/// resolution, no sub-stepping: this is the cheap path.
pub fn relax(agent: &mut Agent, dt: f64) {
    let v_des = agent.v_des();
    let omega_des = agent.omega_des();

    let decay_t = (-dt * agent.zeta_t).exp();
    let decay_r = (-dt * agent.zeta_r).exp();

    let new_velocity = v_des + (agent.velocity - v_des) * decay_t;
    let new_omega = omega_des + (agent.omega - omega_des) * decay_r;

    agent.position += agent.velocity * dt;
    agent.theta += agent.omega * dt;
    agent.velocity = new_velocity;
    agent.omega = new_omega;
}
