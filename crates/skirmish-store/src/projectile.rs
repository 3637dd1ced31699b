//! Projectile entities; tracked but never spatially indexed.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use skirmish_geom::{Aabb, Polar};

use crate::flags::EntityFlags;
use crate::store::StoreError;
use crate::{Entity, ProjectileId, Team};

/// Construction options for [`Projectile`]. The default is a neutral air
/// round at the origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Initial world position.
    pub position: DVec2,
    /// Flight goal position.
    pub target_position: DVec2,
    /// Initial velocity.
    pub velocity: DVec2,
    /// Velocity the flight model works toward.
    pub target_velocity: DVec2,
    /// Facing direction; unit magnitude by convention.
    pub heading: Polar,
    /// Collision radius; must be positive.
    pub radius: f64,
    /// Size and terrain bitmask; the projectile size bit is mandatory.
    pub flags: EntityFlags,
    /// Team tag.
    pub team: Team,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            target_position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            target_velocity: DVec2::ZERO,
            heading: Polar::unit(0.0),
            radius: 0.125,
            flags: EntityFlags::SIZE_PROJECTILE
                | EntityFlags::ACCESS_AIR
                | EntityFlags::TERRAIN_AIR,
            team: Team::NEUTRAL,
        }
    }
}

/// Short-lived entity with circular collision geometry.
///
/// Projectiles move every tick and die within a few, so the store keeps them
/// out of the spatial index; collision against them is resolved by their
/// flight path, not by region queries. That also means position is an
/// ordinary setter here rather than a store operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    id: ProjectileId,
    position: DVec2,
    target_position: DVec2,
    velocity: DVec2,
    target_velocity: DVec2,
    heading: Polar,
    radius: f64,
    flags: EntityFlags,
    team: Team,
}

impl Projectile {
    /// Validate `spec` and build the record under the given handle.
    pub(crate) fn new(id: ProjectileId, spec: ProjectileSpec) -> Result<Self, StoreError> {
        if !spec.flags.contains(EntityFlags::SIZE_PROJECTILE) {
            return Err(StoreError::InvalidEntity(
                "projectiles must carry the projectile size bit",
            ));
        }
        if !spec.flags.validate() {
            return Err(StoreError::InvalidEntity(
                "projectile flags violate size or terrain invariants",
            ));
        }
        if !(spec.radius > 0.0) {
            return Err(StoreError::InvalidEntity(
                "projectile radius must be positive",
            ));
        }
        Ok(Self {
            id,
            position: spec.position,
            target_position: spec.target_position,
            velocity: spec.velocity,
            target_velocity: spec.target_velocity,
            heading: spec.heading,
            radius: spec.radius,
            flags: spec.flags,
            team: spec.team,
        })
    }

    /// Stable handle assigned at insertion.
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.position
    }

    /// Flight goal position.
    #[must_use]
    pub const fn target_position(&self) -> DVec2 {
        self.target_position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Velocity the flight model works toward.
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

    /// Size and terrain bitmask.
    #[must_use]
    pub const fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Team tag.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Bounding box of the collision circle at the current position.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extent(self.position, self.radius)
    }

    /// Replace the world position. No index mirror exists for projectiles,
    /// so this needs nothing from the store.
    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    /// Replace the flight goal position.
    pub fn set_target_position(&mut self, target_position: DVec2) {
        self.target_position = target_position;
    }

    /// Replace the current velocity.
    pub fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    /// Replace the flight model target velocity.
    pub fn set_target_velocity(&mut self, target_velocity: DVec2) {
        self.target_velocity = target_velocity;
    }

    /// Replace the facing direction.
    pub fn set_heading(&mut self, heading: Polar) {
        self.heading = heading;
    }

    /// Replace the team tag.
    pub fn set_team(&mut self, team: Team) {
        self.team = team;
    }

    /// Replace the flag mask, re-running projectile validation. On failure
    /// the previous mask is kept.
    pub fn set_flags(&mut self, flags: EntityFlags) -> Result<(), StoreError> {
        if !flags.contains(EntityFlags::SIZE_PROJECTILE) || !flags.validate() {
            return Err(StoreError::InvalidEntity(
                "projectile flags violate size or terrain invariants",
            ));
        }
        self.flags = flags;
        Ok(())
    }
}

impl Entity for Projectile {
    type Id = ProjectileId;

    fn id(&self) -> ProjectileId {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_builds() {
        let round =
            Projectile::new(ProjectileId::new(0), ProjectileSpec::default()).expect("projectile");
        assert!(round.flags().contains(EntityFlags::SIZE_PROJECTILE));
    }

    #[test]
    fn missing_projectile_bit_is_rejected() {
        let spec = ProjectileSpec {
            flags: EntityFlags::SIZE_SMALL | EntityFlags::ACCESS_AIR | EntityFlags::TERRAIN_AIR,
            ..ProjectileSpec::default()
        };
        assert!(matches!(
            Projectile::new(ProjectileId::new(0), spec),
            Err(StoreError::InvalidEntity(_))
        ));
    }

    #[test]
    fn set_flags_revalidates_and_keeps_old_mask_on_failure() {
        let mut round =
            Projectile::new(ProjectileId::new(0), ProjectileSpec::default()).expect("projectile");
        let before = round.flags();

        // An otherwise valid mask without the projectile size bit is still
        // rejected, as is an invalid occupancy with the bit present.
        let sizeless = EntityFlags::ACCESS_AIR | EntityFlags::TERRAIN_AIR;
        assert!(round.set_flags(sizeless).is_err());
        let grounded = EntityFlags::SIZE_PROJECTILE | EntityFlags::TERRAIN_LAND;
        assert!(round.set_flags(grounded).is_err());
        assert_eq!(round.flags(), before);

        let shell = EntityFlags::SIZE_PROJECTILE
            | EntityFlags::ACCESS_LAND
            | EntityFlags::TERRAIN_LAND;
        round.set_flags(shell).expect("valid mask");
        assert_eq!(round.flags(), shell);
    }

    #[test]
    fn position_moves_without_store_involvement() {
        let mut round =
            Projectile::new(ProjectileId::new(0), ProjectileSpec::default()).expect("projectile");
        round.set_position(DVec2::new(12.0, -3.0));
        assert_eq!(round.position(), DVec2::new(12.0, -3.0));
        assert_eq!(round.aabb().min(), DVec2::new(11.875, -3.125));
    }
}
