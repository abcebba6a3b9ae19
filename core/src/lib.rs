//! Two-dimensional granular mechanics for crowds of rigid, multi-disc
//! agents: contact forces via a Hertz-like spring-dashpot model with
//! Coulomb friction, velocity-Verlet integration, and a persistent
//! tangential-slip history across calls.
//!
//! This crate has no file I/O and no XML knowledge; it operates purely on
//! in-memory [`model::Domain`] and [`history::InteractionStore`] values.
//! Decoding/encoding the external XML formats is the collaborator crate's
//! job (`throng-cli`).

pub mod activation;
pub mod contact;
pub mod engine;
pub mod error;
pub mod history;
pub mod integrate;
pub mod model;
pub mod neighbours;
pub mod relax;
pub mod vector;

pub use engine::advance;
pub use error::{ContactInputCorrupt, CoreError, CoreResult};
pub use history::InteractionStore;
pub use model::{Agent, AgentId, Domain, Material, MaterialId, MaterialTable, Obstacle, Shape};
pub use vector::Vec2;
