use criterion::{Criterion, criterion_group, criterion_main};
use glam::DVec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use skirmish_geom::Aabb;
use skirmish_index::UniformGridIndex;
use skirmish_store::{AgentSpec, EntityStore, filters};

fn populated_store(agents: usize, grid: bool) -> EntityStore {
    let mut store = if grid {
        EntityStore::with_indexes(
            Box::new(UniformGridIndex::new(32.0).expect("agent grid")),
            Box::new(UniformGridIndex::new(32.0).expect("feature grid")),
        )
    } else {
        EntityStore::new()
    };

    let mut rng = SmallRng::seed_from_u64(0x5EED);
    for _ in 0..agents {
        let spec = AgentSpec {
            position: DVec2::new(
                rng.random_range(-400.0..400.0),
                rng.random_range(-400.0..400.0),
            ),
            radius: rng.random_range(0.5..3.0),
            ..AgentSpec::default()
        };
        store.insert_agent(spec).expect("insert");
    }
    store
}

fn bench_region_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_query");
    for &agents in &[1_000_usize, 5_000] {
        for (label, grid) in [("brute", false), ("grid", true)] {
            let store = populated_store(agents, grid);
            let mut rng = SmallRng::seed_from_u64(0xBEEF);
            group.bench_function(format!("{label}_agents{agents}"), |b| {
                b.iter(|| {
                    let center = DVec2::new(
                        rng.random_range(-400.0..400.0),
                        rng.random_range(-400.0..400.0),
                    );
                    let probe = Aabb::from_center_half_extent(center, 25.0);
                    store.query_agents(&probe, |_| true).len()
                });
            });
        }
    }
    group.finish();
}

fn bench_collision_sweep(c: &mut Criterion) {
    let store = populated_store(1_000, true);
    c.bench_function("collision_sweep_agents1000", |b| {
        b.iter(|| {
            let mut contacts = 0_usize;
            for subject in store.agents() {
                contacts += store
                    .query_agents(&subject.aabb(), |other| {
                        filters::is_colliding_not_squishable(subject, other)
                    })
                    .len();
            }
            contacts
        });
    });
}

criterion_group!(benches, bench_region_queries, bench_collision_sweep);
criterion_main!(benches);
