//! Static rectangular terrain features.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use skirmish_geom::Aabb;

use crate::flags::EntityFlags;
use crate::store::StoreError;
use crate::{Entity, FeatureId, Team};

/// Construction options for [`Feature`]. The default is a neutral unit
/// square of land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Rectangle the feature occupies; corners must be ordered.
    pub bounds: Aabb,
    /// Terrain bitmask; features carry no size class.
    pub flags: EntityFlags,
    /// Team tag.
    pub team: Team,
}

impl Default for FeatureSpec {
    fn default() -> Self {
        Self {
            bounds: Aabb::new(DVec2::ZERO, DVec2::ONE),
            flags: EntityFlags::ACCESS_LAND | EntityFlags::TERRAIN_LAND,
            team: Team::NEUTRAL,
        }
    }
}

/// Immobile entity whose rectangle is its collision geometry outright;
/// unlike circle entities there is no derivation step between the stored
/// shape and the indexed box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    id: FeatureId,
    bounds: Aabb,
    flags: EntityFlags,
    team: Team,
}

impl Feature {
    /// Validate `spec` and build the record under the given handle.
    pub(crate) fn new(id: FeatureId, spec: FeatureSpec) -> Result<Self, StoreError> {
        if !spec.flags.validate() {
            return Err(StoreError::InvalidEntity(
                "feature flags violate terrain invariants",
            ));
        }
        if spec.flags.has_size() {
            return Err(StoreError::InvalidEntity(
                "features carry no size class",
            ));
        }
        if !spec.bounds.is_valid() {
            return Err(StoreError::InvalidEntity(
                "feature bounds must be ordered min to max",
            ));
        }
        Ok(Self {
            id,
            bounds: spec.bounds,
            flags: spec.flags,
            team: spec.team,
        })
    }

    /// Stable handle assigned at insertion.
    #[must_use]
    pub const fn id(&self) -> FeatureId {
        self.id
    }

    /// Rectangle the feature occupies.
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Terrain bitmask.
    #[must_use]
    pub const fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Team tag.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Replace the flag mask, re-running feature validation. On failure the
    /// previous mask is kept.
    pub fn set_flags(&mut self, flags: EntityFlags) -> Result<(), StoreError> {
        if !flags.validate() || flags.has_size() {
            return Err(StoreError::InvalidEntity(
                "feature flags violate terrain invariants",
            ));
        }
        self.flags = flags;
        Ok(())
    }

    /// Replace the team tag.
    pub fn set_team(&mut self, team: Team) {
        self.team = team;
    }
}

impl Entity for Feature {
    type Id = FeatureId;

    fn id(&self) -> FeatureId {
        self.id
    }

    fn position(&self) -> DVec2 {
        self.bounds.center()
    }

    fn flags(&self) -> EntityFlags {
        self.flags
    }

    fn team(&self) -> Team {
        self.team
    }

    fn aabb(&self) -> Aabb {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_builds() {
        let feature = Feature::new(FeatureId::new(0), FeatureSpec::default()).expect("feature");
        assert_eq!(feature.bounds().min(), DVec2::ZERO);
        assert_eq!(feature.position(), DVec2::new(0.5, 0.5));
    }

    #[test]
    fn size_bits_are_rejected() {
        let spec = FeatureSpec {
            flags: EntityFlags::SIZE_LARGE | EntityFlags::ACCESS_LAND | EntityFlags::TERRAIN_LAND,
            ..FeatureSpec::default()
        };
        assert!(matches!(
            Feature::new(FeatureId::new(0), spec),
            Err(StoreError::InvalidEntity(_))
        ));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let spec = FeatureSpec {
            bounds: Aabb::new(DVec2::new(5.0, 5.0), DVec2::new(1.0, 1.0)),
            ..FeatureSpec::default()
        };
        assert!(Feature::new(FeatureId::new(0), spec).is_err());
    }

    #[test]
    fn occupancy_without_access_is_rejected() {
        let spec = FeatureSpec {
            flags: EntityFlags::TERRAIN_SEA,
            ..FeatureSpec::default()
        };
        assert!(Feature::new(FeatureId::new(0), spec).is_err());
    }

    #[test]
    fn set_flags_revalidates_and_keeps_old_mask_on_failure() {
        let mut feature = Feature::new(FeatureId::new(0), FeatureSpec::default()).expect("feature");
        let before = feature.flags();

        // Size bits stay rejected after construction, as does occupying a
        // layer without access to it.
        let sized = EntityFlags::SIZE_LARGE | EntityFlags::ACCESS_LAND | EntityFlags::TERRAIN_LAND;
        assert!(feature.set_flags(sized).is_err());
        assert!(feature.set_flags(EntityFlags::TERRAIN_SEA).is_err());
        assert_eq!(feature.flags(), before);

        let coastline = EntityFlags::ACCESS_SEA | EntityFlags::TERRAIN_SEA;
        feature.set_flags(coastline).expect("valid mask");
        assert_eq!(feature.flags(), coastline);
    }
}
