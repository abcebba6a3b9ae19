//! Persistent tangential-slip history (C7): the only state that survives
//! across invocations besides agent kinematics.
//!
//! Entries are keyed by shape, never by agent alone, and stored once under
//! a canonical (smaller-first) key — the antisymmetry `slip[a,b] = −slip[b,a]`
//! is a read-time negation rather than a second stored entry.

use std::collections::BTreeMap;

use crate::model::AgentId;
use crate::vector::Vec2;

/// A shape identified by its owning agent and its local (per-agent) index.
/// Ordering agent-id-first, then local index, is what makes "the ordered
/// pair with the smaller shape index first" well defined across agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeRef {
    pub agent: AgentId,
    pub shape: usize,
}

impl ShapeRef {
    pub fn new(agent: AgentId, shape: usize) -> Self {
        Self { agent, shape }
    }
}

/// Canonical (smaller-first) key for an agent-agent shape-pair contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub parent: ShapeRef,
    pub child: ShapeRef,
}

impl PairKey {
    /// Build the canonical key for `(a, b)`, returning it together with a
    /// sign: `1.0` if `a` is the canonical parent, `-1.0` if the arguments
    /// had to be swapped (so a vector stored under the canonical key must
    /// be multiplied by the returned sign to recover `slip[a, b]`).
    fn canonical(a: ShapeRef, b: ShapeRef) -> (PairKey, f64) {
        if a <= b { (PairKey { parent: a, child: b }, 1.0) } else { (PairKey { parent: b, child: a }, -1.0) }
    }
}

/// Key for an agent-wall contact: the shape, and the obstacle/segment it
/// touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallKey {
    pub shape: ShapeRef,
    pub obstacle: usize,
    pub segment: usize,
}

/// Everything the AgentInteractions file carries for one live contact: the
/// accumulated tangential slip (the only part that must survive a reload)
/// plus the most recently computed normal/tangential force (output-only,
/// recomputed every sub-step a contact is active).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionRecord {
    pub slip: Vec2,
    pub normal_force: Vec2,
    pub tangential_force: Vec2,
}

/// The persistent slip store plus the current step's force bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct InteractionStore {
    pairs: BTreeMap<PairKey, InteractionRecord>,
    walls: BTreeMap<WallKey, InteractionRecord>,
}

impl InteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `slip[a, b]`, zero if no contact is on record.
    pub fn pair_slip(&self, a: ShapeRef, b: ShapeRef) -> Vec2 {
        let (key, sign) = PairKey::canonical(a, b);
        self.pairs.get(&key).map_or(Vec2::ZERO, |r| r.slip * sign)
    }

    /// Overwrite the slip and force for contact `(a, b)`. `slip` and
    /// `forces` are expressed in the `a -> b` convention; they are
    /// transparently flipped onto the canonical key.
    pub fn set_pair(&mut self, a: ShapeRef, b: ShapeRef, slip: Vec2, normal_force: Vec2, tangential_force: Vec2) {
        let (key, sign) = PairKey::canonical(a, b);
        self.pairs.insert(key, InteractionRecord { slip: slip * sign, normal_force: normal_force * sign, tangential_force: tangential_force * sign });
    }

    pub fn remove_pair(&mut self, a: ShapeRef, b: ShapeRef) {
        let (key, _) = PairKey::canonical(a, b);
        self.pairs.remove(&key);
    }

    pub fn has_pair(&self, a: ShapeRef, b: ShapeRef) -> bool {
        let (key, _) = PairKey::canonical(a, b);
        self.pairs.contains_key(&key)
    }

    pub fn wall_slip(&self, key: WallKey) -> Vec2 {
        self.walls.get(&key).map_or(Vec2::ZERO, |r| r.slip)
    }

    pub fn set_wall(&mut self, key: WallKey, slip: Vec2, normal_force: Vec2, tangential_force: Vec2) {
        self.walls.insert(key, InteractionRecord { slip, normal_force, tangential_force });
    }

    pub fn remove_wall(&mut self, key: WallKey) {
        self.walls.remove(&key);
    }

    pub fn has_wall(&self, key: WallKey) -> bool {
        self.walls.contains_key(&key)
    }

    /// Load a sparse `(agent_i, agent_j, shape_i, shape_j, slip, Fn, Ft)`
    /// entry. All vectors are given in the `i -> j` convention.
    pub fn load_pair(&mut self, agent_i: AgentId, agent_j: AgentId, shape_i: usize, shape_j: usize, slip: Vec2, normal_force: Vec2, tangential_force: Vec2) {
        self.set_pair(ShapeRef::new(agent_i, shape_i), ShapeRef::new(agent_j, shape_j), slip, normal_force, tangential_force);
    }

    pub fn load_wall(&mut self, agent: AgentId, shape: usize, obstacle: usize, segment: usize, slip: Vec2, normal_force: Vec2, tangential_force: Vec2) {
        let key = WallKey { shape: ShapeRef::new(agent, shape), obstacle, segment };
        self.walls.insert(key, InteractionRecord { slip, normal_force, tangential_force });
    }

    /// All canonical agent-agent entries, parent first, in ascending key
    /// order (deterministic serialization order).
    pub fn pair_entries(&self) -> impl Iterator<Item = (PairKey, InteractionRecord)> + '_ {
        self.pairs.iter().map(|(k, v)| (*k, *v))
    }

    pub fn wall_entries(&self) -> impl Iterator<Item = (WallKey, InteractionRecord)> + '_ {
        self.walls.iter().map(|(k, v)| (*k, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.walls.is_empty()
    }
}
