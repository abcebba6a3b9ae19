//! Neighbourhood layer (C3): per-outer-step candidate lists, rebuilt from
//! scratch by a quadratic scan and pruned by how far an agent can possibly
//! travel before the next rebuild.

use std::collections::BTreeMap;

use crate::model::{AgentId, Domain};
use crate::vector::point_segment_distance;

/// Model constant: no agent exceeds this speed, so a pair further apart
/// than `2 * dt * V_MAX` cannot close into contact within one outer step.
pub const V_MAX: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallEdge {
    pub obstacle: usize,
    pub segment: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Neighbours {
    agents: BTreeMap<AgentId, Vec<AgentId>>,
    walls: BTreeMap<AgentId, Vec<WallEdge>>,
}

impl Neighbours {
    /// Rebuild both lists from the current agent positions. `O(N^2)` over
    /// agent pairs plus `O(N*W)` over wall segments — this engine makes no
    /// attempt at a spatial broadphase.
    pub fn rebuild(domain: &Domain, dt: f64) -> Self {
        let mut agents: BTreeMap<AgentId, Vec<AgentId>> = BTreeMap::new();
        let mut walls: BTreeMap<AgentId, Vec<WallEdge>> = BTreeMap::new();

        let agent_threshold = 2.0 * dt * V_MAX;
        let wall_threshold = dt * V_MAX;

        let all = domain.agents();
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                let a = &all[i];
                let b = &all[j];
                let dist = (a.position - b.position).norm();
                if dist < agent_threshold {
                    agents.entry(a.id).or_default().push(b.id);
                    agents.entry(b.id).or_default().push(a.id);
                }
            }
        }

        for agent in all {
            for (obstacle_idx, obstacle) in domain.obstacles.iter().enumerate() {
                for (segment_idx, a, b) in obstacle.segments() {
                    let (dist, _) = point_segment_distance(agent.position, a, b);
                    if dist < wall_threshold {
                        walls.entry(agent.id).or_default().push(WallEdge { obstacle: obstacle_idx, segment: segment_idx });
                    }
                }
            }
        }

        for list in agents.values_mut() {
            list.sort_unstable();
        }
        for list in walls.values_mut() {
            list.sort_unstable();
        }

        Self { agents, walls }
    }

    pub fn of_agent(&self, id: AgentId) -> &[AgentId] {
        self.agents.get(&id).map_or(&[], |v| v.as_slice())
    }

    pub fn walls_of_agent(&self, id: AgentId) -> &[WallEdge] {
        self.walls.get(&id).map_or(&[], |v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Agent, MaterialTable, Obstacle};
    use crate::vector::Vec2;

    fn bare_agent(id: AgentId, pos: Vec2) -> Agent {
        Agent::new(id, vec![], 1.0, 1.0, 0.0, 1.0, 1.0, pos)
    }

    #[test]
    fn agent_agent_edges_are_symmetric() {
        let mut domain = Domain::new(MaterialTable::new(), vec![]);
        domain.insert_agent(bare_agent(1, Vec2::new(0.0, 0.0)));
        domain.insert_agent(bare_agent(2, Vec2::new(0.5, 0.0)));
        let n = Neighbours::rebuild(&domain, 0.1);
        assert_eq!(n.of_agent(1), &[2]);
        assert_eq!(n.of_agent(2), &[1]);
    }

    #[test]
    fn far_agents_are_not_neighbours() {
        let mut domain = Domain::new(MaterialTable::new(), vec![]);
        domain.insert_agent(bare_agent(1, Vec2::new(0.0, 0.0)));
        domain.insert_agent(bare_agent(2, Vec2::new(1000.0, 0.0)));
        let n = Neighbours::rebuild(&domain, 0.1);
        assert!(n.of_agent(1).is_empty());
    }

    #[test]
    fn wall_edge_uses_point_segment_distance() {
        let obstacle = Obstacle { material: 0, vertices: vec![Vec2::new(-5.0, -1.0), Vec2::new(5.0, -1.0)] };
        let mut domain = Domain::new(MaterialTable::new(), vec![obstacle]);
        domain.insert_agent(bare_agent(1, Vec2::new(0.0, -0.9)));
        let n = Neighbours::rebuild(&domain, 0.1);
        assert_eq!(n.walls_of_agent(1), &[WallEdge { obstacle: 0, segment: 0 }]);
    }
}
