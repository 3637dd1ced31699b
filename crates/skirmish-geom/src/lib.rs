//! Planar geometry value types shared by the skirmish entity store.
//!
//! Everything here is plain data over `f64` coordinates: axis-aligned boxes,
//! polar vectors for headings, and the two exact circle/rectangle predicates
//! the collision filters are built on.

use std::ops::{BitOr, BitOrAssign};

use approx::abs_diff_eq;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Magnitudes below this are treated as zero when classifying degenerate
/// corner geometry.
const ZERO_TOLERANCE: f64 = 1e-10;

/// Axis-aligned bounding box in world coordinates.
///
/// Corners are expected to be ordered (`min` componentwise at most `max`);
/// construction does not enforce this so callers validating external input
/// can check [`Aabb::is_valid`] and report their own error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: DVec2,
    max: DVec2,
}

impl Aabb {
    /// Construct a box from its minimum and maximum corners.
    #[must_use]
    pub const fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Construct the square box spanning `half_extent` on each side of
    /// `center`. This is the bounding box of a circle with radius
    /// `half_extent`.
    #[must_use]
    pub fn from_center_half_extent(center: DVec2, half_extent: f64) -> Self {
        let he = DVec2::splat(half_extent);
        Self {
            min: center - he,
            max: center + he,
        }
    }

    /// Minimum corner.
    #[must_use]
    pub const fn min(&self) -> DVec2 {
        self.min
    }

    /// Maximum corner.
    #[must_use]
    pub const fn max(&self) -> DVec2 {
        self.max
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether the corners are ordered componentwise.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Whether `point` lies inside the box, boundary included.
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Whether the boxes share any point. Touching faces count as overlap so
    /// broad-phase pairing never drops a grazing contact.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Whether the boxes share no point at all.
    #[must_use]
    pub fn disjoint(&self, other: &Self) -> bool {
        !self.overlaps(other)
    }

    /// The four corners in counterclockwise order starting at `min`.
    #[must_use]
    pub const fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Polar vector with the angle measured counterclockwise from the positive
/// X axis.
///
/// Headings are unit polar vectors by convention; the magnitude is carried
/// rather than enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polar {
    magnitude: f64,
    angle: f64,
}

impl Polar {
    /// Construct from magnitude and angle in radians.
    #[must_use]
    pub const fn new(magnitude: f64, angle: f64) -> Self {
        Self { magnitude, angle }
    }

    /// Unit vector at `angle` radians.
    #[must_use]
    pub const fn unit(angle: f64) -> Self {
        Self {
            magnitude: 1.0,
            angle,
        }
    }

    /// Polar form of a Cartesian vector. The zero vector maps to a zero
    /// magnitude at angle zero.
    #[must_use]
    pub fn from_cartesian(v: DVec2) -> Self {
        Self {
            magnitude: v.length(),
            angle: v.y.atan2(v.x),
        }
    }

    /// Radial component.
    #[must_use]
    pub const fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Angular component in radians.
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Cartesian form.
    #[must_use]
    pub fn cartesian(&self) -> DVec2 {
        DVec2::new(
            self.magnitude * self.angle.cos(),
            self.magnitude * self.angle.sin(),
        )
    }
}

impl Default for Polar {
    fn default() -> Self {
        Self::unit(0.0)
    }
}

/// Bitmask of the half-planes outside a box's edges that a point falls in.
///
/// A single bit means the point sits beyond one edge; two adjacent bits mean
/// it sits in a corner region. Points on an edge are counted as outside, so
/// the mask is empty only for strictly interior points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Side(u8);

impl Side {
    /// Strictly interior.
    pub const NONE: Self = Self(0);
    /// At or beyond the maximum Y edge.
    pub const N: Self = Self(1 << 0);
    /// At or beyond the maximum X edge.
    pub const E: Self = Self(1 << 1);
    /// At or beyond the minimum Y edge.
    pub const S: Self = Self(1 << 2);
    /// At or beyond the minimum X edge.
    pub const W: Self = Self(1 << 3);

    /// Northeast corner region.
    pub const NE: Self = Self(Self::N.0 | Self::E.0);
    /// Southeast corner region.
    pub const SE: Self = Self(Self::S.0 | Self::E.0);
    /// Southwest corner region.
    pub const SW: Self = Self(Self::S.0 | Self::W.0);
    /// Northwest corner region.
    pub const NW: Self = Self(Self::N.0 | Self::W.0);

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

    /// Whether no bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Side {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Side {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Classify `point` against the edges of `rect`. Comparisons are inclusive,
/// so points on the boundary carry the bits of the edges they touch.
#[must_use]
pub fn side_of(rect: &Aabb, point: DVec2) -> Side {
    let mut side = Side::NONE;
    if point.y >= rect.max().y {
        side |= Side::N;
    }
    if point.y <= rect.min().y {
        side |= Side::S;
    }
    if point.x >= rect.max().x {
        side |= Side::E;
    }
    if point.x <= rect.min().x {
        side |= Side::W;
    }
    side
}

/// Distance and outward unit normal from the nearest boundary of `rect` to
/// `point`, or `None` when `point` is strictly inside.
///
/// Beyond a single edge the normal is that edge's axis normal and the
/// distance is perpendicular. In a corner region the normal points from the
/// corner to `point` and the distance is Euclidean; a point sitting exactly
/// on the corner gets the corner's unit diagonal so the normal never
/// degenerates to zero.
#[must_use]
pub fn boundary_normal(rect: &Aabb, point: DVec2) -> Option<(f64, DVec2)> {
    let side = side_of(rect, point);
    if side.is_empty() {
        return None;
    }

    // The side bits use the same inclusive comparisons, so every flagged
    // edge has a nonnegative overshoot.
    let (min, max) = (rect.min(), rect.max());
    let mut dist_sq = 0.0;
    if side.contains(Side::N) {
        let north = point.y - max.y;
        dist_sq += north * north;
    }
    if side.contains(Side::S) {
        let south = min.y - point.y;
        dist_sq += south * south;
    }
    if side.contains(Side::E) {
        let east = point.x - max.x;
        dist_sq += east * east;
    }
    if side.contains(Side::W) {
        let west = min.x - point.x;
        dist_sq += west * west;
    }

    let normal = match side {
        Side::N => DVec2::new(0.0, 1.0),
        Side::E => DVec2::new(1.0, 0.0),
        Side::S => DVec2::new(0.0, -1.0),
        Side::W => DVec2::new(-1.0, 0.0),
        Side::NE => corner_normal(point, max, DVec2::new(1.0, 1.0)),
        Side::SE => corner_normal(point, DVec2::new(max.x, min.y), DVec2::new(1.0, -1.0)),
        Side::SW => corner_normal(point, min, DVec2::new(-1.0, -1.0)),
        Side::NW => corner_normal(point, DVec2::new(min.x, max.y), DVec2::new(-1.0, 1.0)),
        _ => return None,
    };

    Some((dist_sq.sqrt(), normal))
}

/// Unit vector from `corner` toward `point`, with `fallback` (a diagonal)
/// taking over when the two coincide.
fn corner_normal(point: DVec2, corner: DVec2, fallback: DVec2) -> DVec2 {
    let offset = point - corner;
    if abs_diff_eq!(offset.length(), 0.0, epsilon = ZERO_TOLERANCE) {
        fallback.normalize()
    } else {
        offset.normalize()
    }
}

/// Whether the circle at `center` with `radius` overlaps `rect`.
///
/// Decomposed into three checks: the center lies inside the rectangle, a
/// rectangle corner lies inside the circle, or one of the edge lines passes
/// within `radius` of the center. The edge lines extend without bound, so
/// the test is conservative: every true overlap is reported, and a circle
/// sitting diagonally past a corner within reach of an edge line is
/// reported as well. All comparisons are inclusive, so tangent contact
/// counts as overlap.
#[must_use]
pub fn intersects_circle(rect: &Aabb, center: DVec2, radius: f64) -> bool {
    if rect.contains(center) {
        return true;
    }

    let radius_sq = radius * radius;
    if rect
        .corners()
        .iter()
        .any(|corner| center.distance_squared(*corner) <= radius_sq)
    {
        return true;
    }

    let (min, max) = (rect.min(), rect.max());
    (center.x - min.x).abs() <= radius
        || (center.x - max.x).abs() <= radius
        || (center.y - min.y).abs() <= radius
        || (center.y - max.y).abs() <= radius
}
