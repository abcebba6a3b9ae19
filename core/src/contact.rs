//! Contact resolver (C5): normal/tangential force, torque and slip-history
//! maintenance for one shape against one candidate (another shape, or a
//! wall segment).
//!
//! Purely a force/torque/slip calculator: nothing in this module decides
//! when a shape is evaluated or what happens to the result afterwards —
//! that is the integrator's job (C6).

use crate::history::{InteractionStore, ShapeRef, WallKey};
use crate::model::BinaryContact;
use crate::vector::{angular_cross, Vec2};

/// Everything the resolver needs about one shape at the time label (`t` or
/// trial `t+dt_mech`) the caller is currently evaluating.
#[derive(Debug, Clone, Copy)]
pub struct ShapeState {
    pub shape_ref: ShapeRef,
    pub center: Vec2,
    pub radius: f64,
    /// `δ_rot`: offset from the owning agent's centre of mass to this
    /// shape's centre, at the current orientation.
    pub delta_rot: Vec2,
    pub cm_velocity: Vec2,
    pub omega: f64,
}

/// Force and torque contributed to one shape's owning agent by one contact.
/// Not yet scaled by `1/m` / `1/I` — the integrator does that when it sums
/// contributions from all of an agent's shapes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactContribution {
    pub force_n: Vec2,
    pub force_t: Vec2,
    pub torque: f64,
}

impl ContactContribution {
    pub fn is_zero(&self) -> bool {
        *self == ContactContribution::default()
    }
}

/// Indentation, unit normal (from `b` toward `a`), and the lever arm from
/// `a`'s agent centre of mass to the contact point. `None` when the shapes
/// no longer overlap.
struct Geometry {
    n: Vec2,
    h: f64,
    arm_a: Vec2,
}

fn geometry(a_center: Vec2, a_radius: f64, a_delta: Vec2, b_center: Vec2, b_radius: f64) -> Option<Geometry> {
    let separation = a_center - b_center;
    let d = separation.norm();
    let h = a_radius + b_radius - d;
    if h <= 0.0 {
        return None;
    }
    // Coincident centres: zero the normal rather than divide by zero,
    // collapsing the contact to a zero contribution.
    let n = if d > 0.0 { separation / d } else { Vec2::ZERO };
    let arm_a = a_delta + n * (h / 2.0 - a_radius);
    Some(Geometry { n, h, arm_a })
}

/// Slip rotation (anti-rotation of the tangent-plane reference frame),
/// force computation and Coulomb clamp — identical algebra for agent-agent
/// and agent-wall contacts.
fn forces_and_new_slip(
    k_n: f64,
    k_t: f64,
    contact: BinaryContact,
    h: f64,
    n: Vec2,
    v_rel: Vec2,
    prior_slip: Vec2,
    dt_mech: f64,
) -> (Vec2, Vec2, Vec2) {
    let v_n = n * v_rel.dot(n);
    let v_t = v_rel - v_n;

    let slip_perp = prior_slip - n * prior_slip.dot(n);
    let slip_perp_norm = slip_perp.norm();
    let reframed_slip = if slip_perp_norm > 0.0 {
        slip_perp * (prior_slip.norm() / slip_perp_norm)
    } else {
        prior_slip
    };
    let mut new_slip = reframed_slip + v_t * dt_mech;

    let f_n = n * (k_n * h) - v_n * contact.gamma_n;
    let f_t_stick = new_slip * (-k_t) - v_t * contact.gamma_t;

    let f_n_mag = f_n.norm();
    let f_t_stick_mag = f_t_stick.norm();
    let limit = contact.mu * f_n_mag;

    let f_t = if f_t_stick_mag > limit && f_t_stick_mag > 0.0 {
        let t_hat = f_t_stick / f_t_stick_mag;
        let clamped = t_hat * limit;
        new_slip = (clamped + v_t * contact.gamma_t) * (-1.0 / k_t);
        clamped
    } else {
        f_t_stick
    };

    (f_n, f_t, new_slip)
}

/// Resolve one agent-agent shape pair, returning the contribution to each
/// side's owning agent (`b`'s is the exact Newton's-third-law negation of
/// `a`'s normal/tangential force, with its own torque about its own lever
/// arm). Evicts the slip entry and returns zero contributions once the
/// shapes separate.
pub fn resolve_agent_pair(
    a: &ShapeState,
    b: &ShapeState,
    k_n: f64,
    k_t: f64,
    contact: BinaryContact,
    history: &mut InteractionStore,
    dt_mech: f64,
) -> (ContactContribution, ContactContribution) {
    let Some(geom) = geometry(a.center, a.radius, a.delta_rot, b.center, b.radius) else {
        history.remove_pair(a.shape_ref, b.shape_ref);
        return (ContactContribution::default(), ContactContribution::default());
    };

    let v_a = a.cm_velocity + angular_cross(a.omega, geom.arm_a);
    let arm_b = b.delta_rot + geom.n * (-(geom.h / 2.0 - b.radius));
    let v_b = b.cm_velocity + angular_cross(b.omega, arm_b);
    let v_rel = v_a - v_b;

    let prior_slip = history.pair_slip(a.shape_ref, b.shape_ref);
    let (f_n, f_t, new_slip) = forces_and_new_slip(k_n, k_t, contact, geom.h, geom.n, v_rel, prior_slip, dt_mech);

    let torque_a = geom.arm_a.cross(f_n + f_t);
    let torque_b = arm_b.cross(-(f_n + f_t));

    history.set_pair(a.shape_ref, b.shape_ref, new_slip, f_n, f_t);

    (
        ContactContribution { force_n: f_n, force_t: f_t, torque: torque_a },
        ContactContribution { force_n: -f_n, force_t: -f_t, torque: torque_b },
    )
}

/// Resolve one agent-wall contact. The wall is immobile: its side of the
/// relative-velocity computation contributes nothing, and it receives no
/// torque.
pub fn resolve_agent_wall(
    shape: &ShapeState,
    wall_point: Vec2,
    wall_key: WallKey,
    k_n: f64,
    k_t: f64,
    contact: BinaryContact,
    history: &mut InteractionStore,
    dt_mech: f64,
) -> ContactContribution {
    let Some(geom) = geometry(shape.center, shape.radius, shape.delta_rot, wall_point, 0.0) else {
        history.remove_wall(wall_key);
        return ContactContribution::default();
    };

    let v_rel = shape.cm_velocity + angular_cross(shape.omega, geom.arm_a);

    let prior_slip = history.wall_slip(wall_key);
    let (f_n, f_t, new_slip) = forces_and_new_slip(k_n, k_t, contact, geom.h, geom.n, v_rel, prior_slip, dt_mech);

    let torque = geom.arm_a.cross(f_n + f_t);
    history.set_wall(wall_key, new_slip, f_n, f_t);

    ContactContribution { force_n: f_n, force_t: f_t, torque }
}
