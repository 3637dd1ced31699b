//! Pairwise interaction eligibility rules.
//!
//! Pure predicates over entity references, meant to run on broad-phase
//! candidates; a spatial query narrows the world to nearby pairs and these
//! decide which of them may actually interact. Everything reads current
//! entity state and keeps no state of its own.

use skirmish_geom::intersects_circle;

use crate::flags::EntityFlags;
use crate::{Agent, Entity, Feature};

/// Whether exactly one of the two entities occupies the air layer.
///
/// Entities split this way pass over each other; land and sea layers do not
/// get the same exemption because both rest on the surface.
#[must_use]
pub fn on_different_layers<A: Entity, B: Entity>(a: &A, b: &B) -> bool {
    let exclusive = a.flags() ^ b.flags();
    exclusive.contains(EntityFlags::TERRAIN_AIR)
}

/// Whether the two entities share a team tag.
#[must_use]
pub fn is_teammate<A: Entity, B: Entity>(a: &A, b: &B) -> bool {
    a.team() == b.team()
}

/// Whether two agents physically overlap.
///
/// False for an agent against itself and for agents split across the air
/// exemption; otherwise an inclusive circle test, so grazing contact
/// counts. Distances stay squared to keep the square root off the hot
/// path.
#[must_use]
pub fn is_colliding(a: &Agent, b: &Agent) -> bool {
    if a.id() == b.id() {
        return false;
    }
    if on_different_layers(a, b) {
        return false;
    }

    let reach = a.radius() + b.radius();
    a.position().distance_squared(b.position()) <= reach * reach
}

/// Whether `a` may be run over by `b`.
///
/// Teammates never squish each other and the air exemption applies;
/// otherwise `a` must sit strictly below `b` in the size ordering. An
/// entity with no size bit orders below every sized entity.
#[must_use]
pub fn is_squishable(a: &Agent, b: &Agent) -> bool {
    if is_teammate(a, b) {
        return false;
    }
    if on_different_layers(a, b) {
        return false;
    }
    a.size_class() < b.size_class()
}

/// Whether the pair overlaps and `a` cannot simply be run over; these are
/// the contacts a collision resolver must separate.
#[must_use]
pub fn is_colliding_not_squishable(a: &Agent, b: &Agent) -> bool {
    !is_squishable(a, b) && is_colliding(a, b)
}

/// Whether an agent's collision circle overlaps a terrain feature.
///
/// The air exemption applies first, then a cheap box rejection, and only
/// surviving pairs pay for the exact circle test.
#[must_use]
pub fn is_colliding_with_feature(agent: &Agent, feature: &Feature) -> bool {
    if on_different_layers(agent, feature) {
        return false;
    }

    let bounds = feature.bounds();
    if agent.aabb().disjoint(&bounds) {
        return false;
    }

    intersects_circle(&bounds, agent.position(), agent.radius())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentId, AgentSpec, FeatureId, FeatureSpec, Team};
    use glam::DVec2;
    use skirmish_geom::Aabb;

    fn flyer(id: u64, position: DVec2, radius: f64) -> Agent {
        let spec = AgentSpec {
            position,
            radius,
            flags: EntityFlags::SIZE_SMALL | EntityFlags::ACCESS_AIR | EntityFlags::TERRAIN_AIR,
            ..AgentSpec::default()
        };
        Agent::new(AgentId::new(id), spec).expect("flyer")
    }

    fn walker(id: u64, position: DVec2, radius: f64) -> Agent {
        let spec = AgentSpec {
            position,
            radius,
            ..AgentSpec::default()
        };
        Agent::new(AgentId::new(id), spec).expect("walker")
    }

    fn sized_walker(id: u64, size: EntityFlags, team: Team) -> Agent {
        let spec = AgentSpec {
            flags: size | EntityFlags::ACCESS_LAND | EntityFlags::TERRAIN_LAND,
            team,
            ..AgentSpec::default()
        };
        Agent::new(AgentId::new(id), spec).expect("sized walker")
    }

    fn land_feature(id: u64, bounds: Aabb) -> Feature {
        let spec = FeatureSpec {
            bounds,
            ..FeatureSpec::default()
        };
        Feature::new(FeatureId::new(id), spec).expect("feature")
    }

    #[test]
    fn identical_identity_never_collides() {
        let a = flyer(1, DVec2::new(1.0, 1.0), 1.0);
        assert!(!is_colliding(&a, &a));
    }

    #[test]
    fn exclusive_air_overlap_is_exempt() {
        let a = flyer(1, DVec2::new(1.0, 1.0), 1.0);
        let b = walker(2, DVec2::new(1.0, 1.0), 1.0);
        assert!(on_different_layers(&a, &b));
        assert!(!is_colliding(&a, &b));
    }

    #[test]
    fn coincident_flyers_collide() {
        let a = flyer(1, DVec2::new(1.0, 1.0), 1.0);
        let b = flyer(2, DVec2::new(1.0, 1.0), 1.0);
        assert!(!on_different_layers(&a, &b));
        assert!(is_colliding(&a, &b));
    }

    #[test]
    fn touching_circles_collide_inclusively() {
        let a = walker(1, DVec2::ZERO, 1.0);
        let b = walker(2, DVec2::new(2.0, 0.0), 1.0);
        let c = walker(3, DVec2::new(2.1, 0.0), 1.0);
        assert!(is_colliding(&a, &b));
        assert!(!is_colliding(&a, &c));
    }

    #[test]
    fn squish_follows_strict_size_ordering() {
        let small = sized_walker(1, EntityFlags::SIZE_SMALL, Team(1));
        let medium = sized_walker(2, EntityFlags::SIZE_MEDIUM, Team(2));
        assert!(is_squishable(&small, &medium));
        assert!(!is_squishable(&medium, &small));
        assert!(!is_squishable(&small, &small));
    }

    #[test]
    fn teammates_are_never_squishable() {
        let small = sized_walker(1, EntityFlags::SIZE_SMALL, Team(1));
        let medium = sized_walker(2, EntityFlags::SIZE_MEDIUM, Team(1));
        assert!(!is_squishable(&small, &medium));
    }

    #[test]
    fn sizeless_orders_below_every_sized_entity() {
        let sizeless = sized_walker(1, EntityFlags::NONE, Team(1));
        let projectile_sized = sized_walker(2, EntityFlags::SIZE_PROJECTILE, Team(2));
        assert!(is_squishable(&sizeless, &projectile_sized));
        assert!(!is_squishable(&projectile_sized, &sizeless));
    }

    #[test]
    fn colliding_not_squishable_composes_both_rules() {
        // Equal sizes on opposing teams, overlapping: must be resolved.
        let a = sized_walker(1, EntityFlags::SIZE_MEDIUM, Team(1));
        let b = sized_walker(2, EntityFlags::SIZE_MEDIUM, Team(2));
        assert!(is_colliding_not_squishable(&a, &b));

        // Smaller entity overlapped by a larger enemy: squished instead.
        let small = sized_walker(3, EntityFlags::SIZE_SMALL, Team(1));
        let large = sized_walker(4, EntityFlags::SIZE_LARGE, Team(2));
        assert!(is_colliding(&small, &large));
        assert!(!is_colliding_not_squishable(&small, &large));
    }

    #[test]
    fn feature_collision_respects_the_air_exemption() {
        let bounds = Aabb::new(DVec2::ZERO, DVec2::new(10.0, 10.0));
        let feature = land_feature(0, bounds);
        let over = flyer(1, DVec2::new(5.0, 5.0), 1.0);
        let on = walker(2, DVec2::new(5.0, 5.0), 1.0);
        assert!(!is_colliding_with_feature(&over, &feature));
        assert!(is_colliding_with_feature(&on, &feature));
    }

    #[test]
    fn feature_collision_requires_circle_overlap() {
        let bounds = Aabb::new(DVec2::ZERO, DVec2::new(10.0, 10.0));
        let feature = land_feature(0, bounds);

        // Straddling an edge reaches the rectangle.
        let at_edge = walker(1, DVec2::new(-0.9, 5.0), 1.0);
        assert!(is_colliding_with_feature(&at_edge, &feature));

        // Fully inside counts.
        let inside = walker(2, DVec2::new(5.0, 5.0), 1.0);
        assert!(is_colliding_with_feature(&inside, &feature));

        // Far away fails the cheap box gate outright.
        let far = walker(3, DVec2::new(50.0, 50.0), 1.0);
        assert!(!is_colliding_with_feature(&far, &feature));
    }
}
