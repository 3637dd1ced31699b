//! Per-class entity tables, identity assignment, and index mirroring.

use std::collections::BTreeMap;
use std::fmt;

use glam::DVec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_geom::Aabb;
use skirmish_index::{BruteForceIndex, IndexError, SpatialIndex};
use thiserror::Error;
use tracing::{debug, trace};

use crate::agent::{Agent, AgentSpec};
use crate::feature::{Feature, FeatureSpec};
use crate::projectile::{Projectile, ProjectileSpec};
use crate::{AgentId, FeatureId, ProjectileId};

/// Entity classes tracked by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    /// Mobile circle entities.
    Agent,
    /// Static rectangular terrain.
    Feature,
    /// Unindexed short-lived rounds.
    Projectile,
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Agent => "agent",
            Self::Feature => "feature",
            Self::Projectile => "projectile",
        };
        f.write_str(name)
    }
}

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A spec failed class validation; the store was left untouched.
    #[error("invalid entity: {0}")]
    InvalidEntity(&'static str),
    /// The identity was never assigned, or the record was deleted.
    #[error("no {class} with id {id}")]
    NotFound {
        /// Class whose table was consulted.
        class: EntityClass,
        /// Raw handle value that missed.
        id: u64,
    },
    /// The spatial index rejected a mirror operation. The pairing between a
    /// table and its index can no longer be trusted after this; the store
    /// makes no repair attempt.
    #[error("spatial index failure: {0}")]
    Index(#[from] IndexError),
}

/// Index trait object the store mirrors an entity class into.
pub type BoxedIndex<K> = Box<dyn SpatialIndex<K> + Send + Sync>;

/// Owner of every entity record and of identity assignment.
///
/// One table per class, iterated in ascending handle order. Agents and
/// features are mirrored into spatial indexes keyed by their handles;
/// projectiles are tracked in their table only. Handles count up from zero
/// per class and are never reused, so a stale handle reliably misses
/// instead of aliasing a newer record.
///
/// Sharing follows the receiver types: any number of threads may run
/// `&self` reads concurrently, while inserts, deletes, and position moves
/// take `&mut self` and therefore exclusive access. Per-entity field
/// mutation on distinct records can run in parallel inside
/// [`EntityStore::par_agents_mut`].
pub struct EntityStore {
    agents: BTreeMap<AgentId, Agent>,
    features: BTreeMap<FeatureId, Feature>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    agent_index: BoxedIndex<AgentId>,
    feature_index: BoxedIndex<FeatureId>,
    next_agent: u64,
    next_feature: u64,
    next_projectile: u64,
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("agent_count", &self.agents.len())
            .field("feature_count", &self.features.len())
            .field("projectile_count", &self.projectiles.len())
            .field("next_agent", &self.next_agent)
            .field("next_feature", &self.next_feature)
            .field("next_projectile", &self.next_projectile)
            .finish_non_exhaustive()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// Create a store backed by brute-force indexes. Suitable for small
    /// populations and as the reference behaviour for index comparisons.
    #[must_use]
    pub fn new() -> Self {
        Self::with_indexes(
            Box::new(BruteForceIndex::new()),
            Box::new(BruteForceIndex::new()),
        )
    }

    /// Create a store backed by caller-provided indexes, e.g. a uniform
    /// grid sized to the world, or an external tree structure.
    #[must_use]
    pub fn with_indexes(
        agent_index: BoxedIndex<AgentId>,
        feature_index: BoxedIndex<FeatureId>,
    ) -> Self {
        Self {
            agents: BTreeMap::new(),
            features: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            agent_index,
            feature_index,
            next_agent: 0,
            next_feature: 0,
            next_projectile: 0,
        }
    }

    /// Validate `spec`, assign the next agent handle, and insert the record
    /// and its index mirror. Nothing changes on failure, including the
    /// handle counter.
    pub fn insert_agent(&mut self, spec: AgentSpec) -> Result<AgentId, StoreError> {
        let id = AgentId::new(self.next_agent);
        let agent = Agent::new(id, spec)?;
        self.agent_index.insert(id, agent.aabb())?;
        self.agents.insert(id, agent);
        self.next_agent += 1;
        debug!(%id, "inserted agent");
        Ok(id)
    }

    /// Shared read access to an agent.
    pub fn agent(&self, id: AgentId) -> Result<&Agent, StoreError> {
        self.agents.get(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Agent,
            id: id.value(),
        })
    }

    /// Exclusive access to an agent for per-entity mutation. Position is
    /// deliberately unreachable through the record; move agents with
    /// [`EntityStore::set_agent_position`] so the index mirror moves too.
    pub fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent, StoreError> {
        self.agents.get_mut(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Agent,
            id: id.value(),
        })
    }

    /// Remove an agent and its index mirror, returning the record. The
    /// handle is retired, never reassigned.
    pub fn delete_agent(&mut self, id: AgentId) -> Result<Agent, StoreError> {
        let agent = self.agents.remove(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Agent,
            id: id.value(),
        })?;
        self.agent_index.remove(id)?;
        debug!(%id, "deleted agent");
        Ok(agent)
    }

    /// Move an agent and refresh its index mirror within the same exclusive
    /// call, so no reader can observe the two disagreeing.
    pub fn set_agent_position(&mut self, id: AgentId, position: DVec2) -> Result<(), StoreError> {
        let agent = self.agents.get_mut(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Agent,
            id: id.value(),
        })?;
        agent.set_position(position);
        let aabb = agent.aabb();
        self.agent_index.update(id, aabb);
        trace!(%id, "moved agent");
        Ok(())
    }

    /// Agents whose current state passes `filter`, gathered from the
    /// broad-phase candidates for `region`, in ascending handle order.
    pub fn query_agents(&self, region: &Aabb, filter: impl Fn(&Agent) -> bool) -> Vec<&Agent> {
        let candidates = self.agent_index.broad_phase(region);
        let mut results = Vec::with_capacity(candidates.len());
        for id in candidates {
            debug_assert!(
                self.agents.contains_key(&id),
                "index returned unknown agent {id}"
            );
            if let Some(agent) = self.agents.get(&id)
                && filter(agent)
            {
                results.push(agent);
            }
        }
        results
    }

    /// Iterate agents in ascending handle order. Restartable; any number of
    /// concurrent iterations may run, and mutation waits until every borrow
    /// is dropped.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Exclusive iteration over agents in ascending handle order.
    pub fn agents_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    /// Parallel exclusive iteration over agents. Records are disjoint, so
    /// per-entity mutation of distinct identities proceeds concurrently.
    pub fn par_agents_mut(&mut self) -> impl ParallelIterator<Item = &mut Agent> {
        self.agents.par_iter_mut().map(|(_, agent)| agent)
    }

    /// Number of live agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Validate `spec`, assign the next feature handle, and insert the
    /// record and its index mirror. Nothing changes on failure.
    pub fn insert_feature(&mut self, spec: FeatureSpec) -> Result<FeatureId, StoreError> {
        let id = FeatureId::new(self.next_feature);
        let feature = Feature::new(id, spec)?;
        self.feature_index.insert(id, feature.bounds())?;
        self.features.insert(id, feature);
        self.next_feature += 1;
        debug!(%id, "inserted feature");
        Ok(id)
    }

    /// Shared read access to a feature.
    pub fn feature(&self, id: FeatureId) -> Result<&Feature, StoreError> {
        self.features.get(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Feature,
            id: id.value(),
        })
    }

    /// Exclusive access to a feature for flag and team mutation. Feature
    /// geometry is fixed at insertion.
    pub fn feature_mut(&mut self, id: FeatureId) -> Result<&mut Feature, StoreError> {
        self.features.get_mut(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Feature,
            id: id.value(),
        })
    }

    /// Remove a feature and its index mirror, returning the record.
    pub fn delete_feature(&mut self, id: FeatureId) -> Result<Feature, StoreError> {
        let feature = self.features.remove(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Feature,
            id: id.value(),
        })?;
        self.feature_index.remove(id)?;
        debug!(%id, "deleted feature");
        Ok(feature)
    }

    /// Features whose current state passes `filter`, gathered from the
    /// broad-phase candidates for `region`, in ascending handle order.
    pub fn query_features(
        &self,
        region: &Aabb,
        filter: impl Fn(&Feature) -> bool,
    ) -> Vec<&Feature> {
        let candidates = self.feature_index.broad_phase(region);
        let mut results = Vec::with_capacity(candidates.len());
        for id in candidates {
            debug_assert!(
                self.features.contains_key(&id),
                "index returned unknown feature {id}"
            );
            if let Some(feature) = self.features.get(&id)
                && filter(feature)
            {
                results.push(feature);
            }
        }
        results
    }

    /// Iterate features in ascending handle order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Number of live features.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Validate `spec`, assign the next projectile handle, and insert the
    /// record. Projectiles have no index mirror to keep in step.
    pub fn insert_projectile(&mut self, spec: ProjectileSpec) -> Result<ProjectileId, StoreError> {
        let id = ProjectileId::new(self.next_projectile);
        let projectile = Projectile::new(id, spec)?;
        self.projectiles.insert(id, projectile);
        self.next_projectile += 1;
        debug!(%id, "inserted projectile");
        Ok(id)
    }

    /// Shared read access to a projectile.
    pub fn projectile(&self, id: ProjectileId) -> Result<&Projectile, StoreError> {
        self.projectiles.get(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Projectile,
            id: id.value(),
        })
    }

    /// Exclusive access to a projectile, position included; with no index
    /// mirror there is nothing else to keep in step.
    pub fn projectile_mut(&mut self, id: ProjectileId) -> Result<&mut Projectile, StoreError> {
        self.projectiles.get_mut(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Projectile,
            id: id.value(),
        })
    }

    /// Remove a projectile, returning the record.
    pub fn delete_projectile(&mut self, id: ProjectileId) -> Result<Projectile, StoreError> {
        let projectile = self.projectiles.remove(&id).ok_or(StoreError::NotFound {
            class: EntityClass::Projectile,
            id: id.value(),
        })?;
        debug!(%id, "deleted projectile");
        Ok(projectile)
    }

    /// Iterate projectiles in ascending handle order.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    /// Exclusive iteration over projectiles in ascending handle order.
    pub fn projectiles_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.projectiles.values_mut()
    }

    /// Parallel exclusive iteration over projectiles.
    pub fn par_projectiles_mut(&mut self) -> impl ParallelIterator<Item = &mut Projectile> {
        self.projectiles.par_iter_mut().map(|(_, projectile)| projectile)
    }

    /// Number of live projectiles.
    #[must_use]
    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::EntityFlags;

    fn sample_store() -> EntityStore {
        EntityStore::new()
    }

    #[test]
    fn handles_count_up_from_zero_per_class() {
        let mut store = sample_store();
        let a0 = store.insert_agent(AgentSpec::default()).expect("agent 0");
        let a1 = store.insert_agent(AgentSpec::default()).expect("agent 1");
        let f0 = store
            .insert_feature(FeatureSpec::default())
            .expect("feature 0");
        let p0 = store
            .insert_projectile(ProjectileSpec::default())
            .expect("projectile 0");

        assert_eq!(a0, AgentId::new(0));
        assert_eq!(a1, AgentId::new(1));
        assert_eq!(f0, FeatureId::new(0));
        assert_eq!(p0, ProjectileId::new(0));
    }

    #[test]
    fn failed_insert_leaves_no_trace() {
        let mut store = sample_store();
        let bad = AgentSpec {
            radius: 0.0,
            ..AgentSpec::default()
        };
        assert!(store.insert_agent(bad).is_err());
        assert_eq!(store.agent_count(), 0);
        assert_eq!(store.agents().count(), 0);

        // The failed attempt must not burn a handle.
        let id = store.insert_agent(AgentSpec::default()).expect("agent");
        assert_eq!(id, AgentId::new(0));
    }

    #[test]
    fn deleted_handles_miss_and_are_never_reassigned() {
        let mut store = sample_store();
        let first = store.insert_agent(AgentSpec::default()).expect("agent");
        let removed = store.delete_agent(first).expect("delete");
        assert_eq!(removed.id(), first);

        assert!(matches!(
            store.agent(first),
            Err(StoreError::NotFound {
                class: EntityClass::Agent,
                id: 0,
            })
        ));
        assert!(matches!(
            store.delete_agent(first),
            Err(StoreError::NotFound { .. })
        ));

        let second = store.insert_agent(AgentSpec::default()).expect("agent");
        assert_ne!(second, first);
        assert_eq!(second, AgentId::new(1));
    }

    #[test]
    fn debug_reports_counts_without_walking_records() {
        let mut store = sample_store();
        store.insert_agent(AgentSpec::default()).expect("agent");
        let rendered = format!("{store:?}");
        assert!(rendered.contains("agent_count: 1"), "{rendered}");
    }

    #[test]
    fn flag_mutation_through_the_store_revalidates() {
        let mut store = sample_store();
        let id = store.insert_agent(AgentSpec::default()).expect("agent");
        let agent = store.agent_mut(id).expect("agent");
        assert!(agent.set_flags(EntityFlags::TERRAIN_LAND).is_err());
        assert_eq!(
            store.agent(id).expect("agent").flags(),
            EntityFlags::SIZE_SMALL | EntityFlags::ACCESS_LAND | EntityFlags::TERRAIN_LAND
        );
    }
}
