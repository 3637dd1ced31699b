//! Mobile circle-shaped entities and their construction rules.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use skirmish_geom::{Aabb, Polar};

use crate::flags::{EntityFlags, MoveMode, SizeClass};
use crate::store::StoreError;
use crate::{AgentId, Entity, Team};

/// Construction options for [`Agent`]. The default is a small land walker
/// at rest at the origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Initial world position.
    pub position: DVec2,
    /// Navigation goal position.
    pub target_position: DVec2,
    /// Initial tick-to-tick velocity.
    pub velocity: DVec2,
    /// Velocity the steering collaborator works toward.
    pub target_velocity: DVec2,
    /// Facing direction; unit magnitude by convention.
    pub heading: Polar,
    /// Collision radius; must be positive.
    pub radius: f64,
    /// Mass consumed by motion integration; must be nonzero.
    pub mass: f64,
    /// Speed cap, advisory to motion integration.
    pub max_velocity: f64,
    /// Turn rate cap, advisory to motion integration.
    pub max_angular_velocity: f64,
    /// Acceleration cap, advisory to motion integration.
    pub max_acceleration: f64,
    /// Size and terrain bitmask.
    pub flags: EntityFlags,
    /// Steering intent bit-set.
    pub move_mode: MoveMode,
    /// Team tag.
    pub team: Team,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            target_position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            target_velocity: DVec2::ZERO,
            heading: Polar::unit(0.0),
            radius: 1.0,
            mass: 1.0,
            max_velocity: 0.0,
            max_angular_velocity: 0.0,
            max_acceleration: 0.0,
            flags: EntityFlags::SIZE_SMALL | EntityFlags::ACCESS_LAND | EntityFlags::TERRAIN_LAND,
            move_mode: MoveMode::NONE,
            team: Team::NEUTRAL,
        }
    }
}

/// Mobile entity with circular collision geometry.
///
/// Records are created and owned by the store; position moves only through
/// the store so the spatial index mirror can never fall behind. Everything
/// else mutates through the typed setters, which re-run validation where an
/// invariant is at stake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    position: DVec2,
    target_position: DVec2,
    velocity: DVec2,
    target_velocity: DVec2,
    heading: Polar,
    radius: f64,
    mass: f64,
    max_velocity: f64,
    max_angular_velocity: f64,
    max_acceleration: f64,
    flags: EntityFlags,
    move_mode: MoveMode,
    team: Team,
}

impl Agent {
    /// Validate `spec` and build the record under the given handle.
    pub(crate) fn new(id: AgentId, spec: AgentSpec) -> Result<Self, StoreError> {
        if !spec.flags.validate() {
            return Err(StoreError::InvalidEntity(
                "agent flags violate size or terrain invariants",
            ));
        }
        if !spec.move_mode.validate() {
            return Err(StoreError::InvalidEntity(
                "seek and arrival may not be combined",
            ));
        }
        if !(spec.radius > 0.0) {
            return Err(StoreError::InvalidEntity("agent radius must be positive"));
        }
        if spec.mass == 0.0 {
            return Err(StoreError::InvalidEntity("agent mass must be nonzero"));
        }
        Ok(Self {
            id,
            position: spec.position,
            target_position: spec.target_position,
            velocity: spec.velocity,
            target_velocity: spec.target_velocity,
            heading: spec.heading,
            radius: spec.radius,
            mass: spec.mass,
            max_velocity: spec.max_velocity,
            max_angular_velocity: spec.max_angular_velocity,
            max_acceleration: spec.max_acceleration,
            flags: spec.flags,
            move_mode: spec.move_mode,
            team: spec.team,
        })
    }

    /// Stable handle assigned at insertion.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.position
    }

    /// Navigation goal position.
    #[must_use]
    pub const fn target_position(&self) -> DVec2 {
        self.target_position
    }

    /// Tick-to-tick velocity.
    #[must_use]
    pub const fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Velocity the steering collaborator works toward.
    #[must_use]
    pub const fn target_velocity(&self) -> DVec2 {
        self.target_velocity
    }

    /// Facing direction.
    #[must_use]
    pub const fn heading(&self) -> Polar {
        self.heading
    }

    /// Collision radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Mass consumed by motion integration.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Speed cap, advisory.
    #[must_use]
    pub const fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    /// Turn rate cap, advisory.
    #[must_use]
    pub const fn max_angular_velocity(&self) -> f64 {
        self.max_angular_velocity
    }

    /// Acceleration cap, advisory.
    #[must_use]
    pub const fn max_acceleration(&self) -> f64 {
        self.max_acceleration
    }

    /// Size and terrain bitmask.
    #[must_use]
    pub const fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Steering intent bit-set.
    #[must_use]
    pub const fn move_mode(&self) -> MoveMode {
        self.move_mode
    }

    /// Team tag.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Size ordinal from the flag mask, if a size bit is set.
    #[must_use]
    pub const fn size_class(&self) -> Option<SizeClass> {
        self.flags.size_class()
    }

    /// Bounding box of the collision circle at the current position.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extent(self.position, self.radius)
    }

    /// Replace the tick-to-tick velocity.
    pub fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    /// Replace the steering target velocity.
    pub fn set_target_velocity(&mut self, target_velocity: DVec2) {
        self.target_velocity = target_velocity;
    }

    /// Replace the navigation goal position.
    pub fn set_target_position(&mut self, target_position: DVec2) {
        self.target_position = target_position;
    }

    /// Replace the facing direction.
    pub fn set_heading(&mut self, heading: Polar) {
        self.heading = heading;
    }

    /// Replace the team tag.
    pub fn set_team(&mut self, team: Team) {
        self.team = team;
    }

    /// Replace the flag mask, re-running the structural validation. On
    /// failure the previous mask is kept.
    pub fn set_flags(&mut self, flags: EntityFlags) -> Result<(), StoreError> {
        if !flags.validate() {
            return Err(StoreError::InvalidEntity(
                "agent flags violate size or terrain invariants",
            ));
        }
        self.flags = flags;
        Ok(())
    }

    /// Replace the steering intent, re-running the exclusivity validation.
    /// On failure the previous mode is kept.
    pub fn set_move_mode(&mut self, move_mode: MoveMode) -> Result<(), StoreError> {
        if !move_mode.validate() {
            return Err(StoreError::InvalidEntity(
                "seek and arrival may not be combined",
            ));
        }
        self.move_mode = move_mode;
        Ok(())
    }

    // Position is crate-private so geometry moves only through the store,
    // which refreshes the index mirror in the same call.
    pub(crate) fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }
}

impl Entity for Agent {
    type Id = AgentId;

    fn id(&self) -> AgentId {
        self.id
    }

    fn position(&self) -> DVec2 {
        self.position
    }

    fn flags(&self) -> EntityFlags {
        self.flags
    }

    fn team(&self) -> Team {
        self.team
    }

    fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extent(self.position, self.radius)
    }
}
