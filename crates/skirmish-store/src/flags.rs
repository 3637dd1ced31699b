//! Bit-set flags describing entity size, terrain layers, and movement
//! intent.

use std::ops::{BitOr, BitOrAssign, BitXor};

use serde::{Deserialize, Serialize};

/// Size and terrain bitmask carried by every entity.
///
/// Three groups share the mask. The size bits place the entity in a single
/// collision weight class. The access bits say which terrain layers the
/// entity can ever occupy. The terrain bits say which single layer it
/// occupies right now, and occupying a layer without access to it is
/// invalid; tanks hold `ACCESS_LAND` and can never activate `TERRAIN_AIR`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityFlags(u16);

impl EntityFlags {
    /// Empty mask.
    pub const NONE: Self = Self(0);

    /// Bullets and missiles. At most one size bit may be active.
    pub const SIZE_PROJECTILE: Self = Self(1 << 0);
    /// Infantry-scale entities.
    pub const SIZE_SMALL: Self = Self(1 << 1);
    /// Vehicle-scale entities.
    pub const SIZE_MEDIUM: Self = Self(1 << 2);
    /// Structure-scale entities.
    pub const SIZE_LARGE: Self = Self(1 << 3);

    /// The entity can fly.
    pub const ACCESS_AIR: Self = Self(1 << 4);
    /// The entity can traverse land.
    pub const ACCESS_LAND: Self = Self(1 << 5);
    /// The entity can traverse open water.
    pub const ACCESS_SEA: Self = Self(1 << 6);

    /// Currently occupying the air layer.
    pub const TERRAIN_AIR: Self = Self(1 << 7);
    /// Currently occupying the land layer.
    pub const TERRAIN_LAND: Self = Self(1 << 8);
    /// Currently occupying the sea layer.
    pub const TERRAIN_SEA: Self = Self(1 << 9);

    const SIZE_MASK: u16 = Self::SIZE_PROJECTILE.0
        | Self::SIZE_SMALL.0
        | Self::SIZE_MEDIUM.0
        | Self::SIZE_LARGE.0;

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether all bits of `other` are set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any size bit is set.
    #[must_use]
    pub const fn has_size(self) -> bool {
        self.0 & Self::SIZE_MASK != 0
    }

    /// Size ordinal encoded in the mask, if any.
    #[must_use]
    pub const fn size_class(self) -> Option<SizeClass> {
        if self.contains(Self::SIZE_PROJECTILE) {
            Some(SizeClass::Projectile)
        } else if self.contains(Self::SIZE_SMALL) {
            Some(SizeClass::Small)
        } else if self.contains(Self::SIZE_MEDIUM) {
            Some(SizeClass::Medium)
        } else if self.contains(Self::SIZE_LARGE) {
            Some(SizeClass::Large)
        } else {
            None
        }
    }

    /// Whether the mask satisfies the structural invariants: at most one
    /// size bit, and every occupied terrain layer is also accessible.
    /// Per-class construction layers further checks on top of this.
    #[must_use]
    pub const fn validate(self) -> bool {
        if (self.0 & Self::SIZE_MASK).count_ones() > 1 {
            return false;
        }
        if self.0 & (Self::ACCESS_AIR.0 | Self::TERRAIN_AIR.0) == Self::TERRAIN_AIR.0 {
            return false;
        }
        if self.0 & (Self::ACCESS_LAND.0 | Self::TERRAIN_LAND.0) == Self::TERRAIN_LAND.0 {
            return false;
        }
        if self.0 & (Self::ACCESS_SEA.0 | Self::TERRAIN_SEA.0) == Self::TERRAIN_SEA.0 {
            return false;
        }
        true
    }
}

impl BitOr for EntityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntityFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitXor for EntityFlags {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

/// Collision weight classes in squish order; larger classes run over
/// smaller ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    /// Bullets and missiles.
    Projectile,
    /// Infantry scale.
    Small,
    /// Vehicle scale.
    Medium,
    /// Structure scale.
    Large,
}

/// Movement intent bit-set consumed by steering collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveMode(u8);

impl MoveMode {
    /// No steering intent.
    pub const NONE: Self = Self(0);
    /// Steer around nearby obstacles.
    pub const AVOIDANCE: Self = Self(1 << 0);
    /// Head for the target at full speed.
    pub const SEEK: Self = Self(1 << 1);
    /// Head for the target, decelerating on approach.
    pub const ARRIVAL: Self = Self(1 << 2);
    /// Match heading with nearby group members.
    pub const ALIGNMENT: Self = Self(1 << 3);
    /// Steer toward the local group center.
    pub const COHERENCE: Self = Self(1 << 4);
    /// Keep clear of crowded neighbors.
    pub const SEPARATION: Self = Self(1 << 5);

    /// All three flocking behaviours together.
    pub const FLOCKING: Self = Self(Self::ALIGNMENT.0 | Self::COHERENCE.0 | Self::SEPARATION.0);

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether all bits of `other` are set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the combination is usable. Seek and arrival steer toward the
    /// same target with conflicting speed profiles and may not both be set.
    #[must_use]
    pub const fn validate(self) -> bool {
        !(self.contains(Self::SEEK) && self.contains(Self::ARRIVAL))
    }
}

impl BitOr for MoveMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MoveMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
