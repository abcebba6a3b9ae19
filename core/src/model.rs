//! Static and mutable domain state: agents, their discs, obstacles, and the
//! material tables that parametrize contact stiffness, damping and friction.

use std::collections::BTreeMap;

use crate::vector::Vec2;

pub type AgentId = u32;
pub type MaterialId = u32;

/// A disc rigidly welded to one agent. `base_offset` is `δᵢ`, the offset
/// from the agent's centre of mass measured at the agent's initial
/// orientation `θ₀`; it never changes. The world-space offset at the
/// current orientation is tracked separately at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub material: MaterialId,
    pub base_offset: Vec2,
    pub radius: f64,
}

/// Intrinsic scalars for one material: Young's modulus and shear modulus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub young: f64,
    pub shear: f64,
}

/// Binary (pairwise) contact parameters between two materials.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BinaryContact {
    pub gamma_n: f64,
    pub gamma_t: f64,
    pub mu: f64,
}

/// Normal stiffness `k_n(i,j) = 1 / ((4G_i−E_i)/(4G_i²) + (4G_j−E_j)/(4G_j²))`.
pub fn normal_stiffness(i: Material, j: Material) -> f64 {
    let term = |m: Material| (4.0 * m.shear - m.young) / (4.0 * m.shear * m.shear);
    1.0 / (term(i) + term(j))
}

/// Tangential stiffness `k_t(i,j) = 1 / ((6G_i−E_i)/(8G_i²) + (6G_j−E_j)/(8G_j²))`.
pub fn tangential_stiffness(i: Material, j: Material) -> f64 {
    let term = |m: Material| (6.0 * m.shear - m.young) / (8.0 * m.shear * m.shear);
    1.0 / (term(i) + term(j))
}

fn canonical_pair(a: MaterialId, b: MaterialId) -> (MaterialId, MaterialId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Intrinsic and binary material parameters, keyed by material id. Binary
/// rows are stored once under the canonical (smaller-first) key, which is
/// how the table's symmetry invariant is enforced structurally rather than
/// by convention.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    intrinsic: BTreeMap<MaterialId, Material>,
    binary: BTreeMap<(MaterialId, MaterialId), BinaryContact>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_intrinsic(&mut self, id: MaterialId, material: Material) {
        self.intrinsic.insert(id, material);
    }

    pub fn insert_binary(&mut self, a: MaterialId, b: MaterialId, row: BinaryContact) {
        self.binary.insert(canonical_pair(a, b), row);
    }

    pub fn intrinsic(&self, id: MaterialId) -> Option<Material> {
        self.intrinsic.get(&id).copied()
    }

    pub fn binary(&self, a: MaterialId, b: MaterialId) -> Option<BinaryContact> {
        self.binary.get(&canonical_pair(a, b)).copied()
    }

    /// Normal and tangential stiffness for the material pair, `None` if
    /// either material is undeclared.
    pub fn stiffness(&self, a: MaterialId, b: MaterialId) -> Option<(f64, f64)> {
        let ma = self.intrinsic(a)?;
        let mb = self.intrinsic(b)?;
        Some((normal_stiffness(ma, mb), tangential_stiffness(ma, mb)))
    }
}

/// A rigid 2-D body made of one or more welded discs. Static parameters
/// (mass, inertia, shapes, damping) are set at construction and never
/// change; kinematics and per-step driving inputs are mutated every call.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub shapes: Vec<Shape>,
    pub mass: f64,
    pub inertia: f64,
    pub theta0: f64,
    /// Translational damping rate `ζ_t = 1/τ_t`.
    pub zeta_t: f64,
    /// Rotational damping rate `ζ_r = 1/τ_r`.
    pub zeta_r: f64,
    pub bounding_radius: f64,

    pub position: Vec2,
    pub theta: f64,
    pub velocity: Vec2,
    pub omega: f64,

    /// Driving acceleration `F_p/m`, set from the Dynamics file's `Fp`
    /// force for the duration of one outer call.
    pub fp_accel: Vec2,
    /// Driving angular acceleration `M_p/I`.
    pub mp_accel: f64,

    /// Shape offsets at the current orientation, `R(θ−θ₀)·δᵢ`. Refreshed
    /// from `theta0`/`theta` at the start of every outer call and then
    /// incrementally rotated sub-step by sub-step rather than recomputed
    /// from scratch.
    pub rotated_offsets: Vec<Vec2>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        shapes: Vec<Shape>,
        mass: f64,
        inertia: f64,
        theta0: f64,
        zeta_t: f64,
        zeta_r: f64,
        position: Vec2,
    ) -> Self {
        let bounding_radius = shapes
            .iter()
            .map(|s| s.base_offset.norm() + s.radius)
            .fold(0.0, f64::max);
        let rotated_offsets = shapes.iter().map(|s| s.base_offset).collect();
        Self {
            id,
            shapes,
            mass,
            inertia,
            theta0,
            zeta_t,
            zeta_r,
            bounding_radius,
            position,
            theta: theta0,
            velocity: Vec2::ZERO,
            omega: 0.0,
            fp_accel: Vec2::ZERO,
            mp_accel: 0.0,
            rotated_offsets,
        }
    }

    /// Recompute `rotated_offsets` from scratch for the current `theta`.
    /// Called once at the start of every outer call, before any sub-step
    /// incrementally rotates them further.
    pub fn refresh_rotated_offsets(&mut self) {
        let delta = self.theta - self.theta0;
        for (shape, offset) in self.shapes.iter().zip(self.rotated_offsets.iter_mut()) {
            *offset = shape.base_offset.rotate(delta);
        }
    }

    /// Desired linear velocity `v_des = F_p·τ_t/m`, expressed via the
    /// precomputed acceleration `fp_accel = F_p/m` as `fp_accel/ζ_t`.
    pub fn v_des(&self) -> Vec2 {
        if self.zeta_t > 0.0 { self.fp_accel / self.zeta_t } else { Vec2::ZERO }
    }

    /// Desired angular velocity `ω_des = M_p·τ_r/I`.
    pub fn omega_des(&self) -> f64 {
        if self.zeta_r > 0.0 { self.mp_accel / self.zeta_r } else { 0.0 }
    }

    /// `θ_des = atan2(v_des_y, v_des_x)`, `0` if `v_des` is zero.
    pub fn theta_des(&self) -> f64 {
        let v = self.v_des();
        if v == Vec2::ZERO { 0.0 } else { v.y.atan2(v.x) }
    }

    /// World-space centre of shape `local_index`.
    pub fn shape_center(&self, local_index: usize) -> Vec2 {
        self.position + self.rotated_offsets[local_index]
    }
}

/// An obstacle polyline: an ordered list of vertices, implicitly a sequence
/// of wall segments between consecutive vertices, sharing one material.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub material: MaterialId,
    pub vertices: Vec<Vec2>,
}

impl Obstacle {
    /// Iterate over `(segment_index, a, b)` for each consecutive vertex
    /// pair. A polyline with `n` vertices has `n - 1` segments.
    pub fn segments(&self) -> impl Iterator<Item = (usize, Vec2, Vec2)> + '_ {
        self.vertices
            .windows(2)
            .enumerate()
            .map(|(i, pair)| (i, pair[0], pair[1]))
    }
}

/// All static and mutable state the core operates on for the lifetime of a
/// process: agents (created once, kinematics overwritten per call),
/// materials, and obstacles.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    agents: Vec<Agent>,
    index_by_id: BTreeMap<AgentId, usize>,
    pub materials: MaterialTable,
    pub obstacles: Vec<Obstacle>,
}

impl Domain {
    pub fn new(materials: MaterialTable, obstacles: Vec<Obstacle>) -> Self {
        Self { agents: Vec::new(), index_by_id: BTreeMap::new(), materials, obstacles }
    }

    /// Insert an agent, keeping `agents` sorted by id so iteration order is
    /// deterministic and matches ascending-identifier processing order.
    pub fn insert_agent(&mut self, agent: Agent) {
        let pos = self.agents.partition_point(|a| a.id < agent.id);
        self.agents.insert(pos, agent);
        self.index_by_id.clear();
        for (i, a) in self.agents.iter().enumerate() {
            self.index_by_id.insert(a.id, i);
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn agent_index(&self, id: AgentId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agent_index(id).map(|i| &self.agents[i])
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let i = self.agent_index(id)?;
        Some(&mut self.agents[i])
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.iter().map(|a| a.id)
    }
}
