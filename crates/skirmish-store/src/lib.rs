//! Entity records, collision filters, and the spatial store that owns them.
//!
//! The store keeps one table per entity class (mobile agents, static terrain
//! features, projectiles) and mirrors the indexed classes into a broad-phase
//! spatial index so proximity queries stay cheap at simulation-tick rates.
//! Pairwise interaction eligibility lives in [`filters`] as pure functions
//! over entity references; the flag bitmask those rules read is validated on
//! every construction and mutation.

use std::fmt;
use std::hash::Hash;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use skirmish_geom::Aabb;

mod agent;
mod feature;
pub mod filters;
mod flags;
mod projectile;
mod store;

pub use agent::{Agent, AgentSpec};
pub use feature::{Feature, FeatureSpec};
pub use flags::{EntityFlags, MoveMode, SizeClass};
pub use projectile::{Projectile, ProjectileSpec};
pub use store::{BoxedIndex, EntityClass, EntityStore, StoreError};

/// Handle for an agent record, unique within a store's lifetime and never
/// reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for a terrain feature record. Feature handles share nothing with
/// agent handles; every class counts from zero independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(u64);

impl FeatureId {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for a projectile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(u64);

impl ProjectileId {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team tag compared by the teammate and squish filters. Distinct from any
/// faction or player notion a driver may layer on top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team(pub u8);

impl Team {
    /// Tag for unaffiliated entities.
    pub const NEUTRAL: Self = Self(0);
}

/// Read capabilities shared by every entity class.
pub trait Entity {
    /// Handle type identifying the entity within its class.
    type Id: Copy + Eq + Ord + Hash + fmt::Display;

    /// Stable identity within the owning store.
    fn id(&self) -> Self::Id;

    /// World position; for rectangular entities, the box center.
    fn position(&self) -> DVec2;

    /// Size and terrain bitmask.
    fn flags(&self) -> EntityFlags;

    /// Team tag.
    fn team(&self) -> Team;

    /// Bounding box derived from the current geometry.
    fn aabb(&self) -> Aabb;
}
