//! Multi-threaded soak run of the tracking index.
//!
//! Entities random-walk inside a square world. Every tick each entity is
//! moved (or occasionally despawned and respawned) from a rayon worker, all
//! workers sharing one [`Synchronized`] index. After each tick the index is
//! checked against the entities' actual positions.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::{Context, bail, ensure};
use beacon_core::{ChunkTracker, InterestUpdate, Synchronized, TrackedEntity, TrackingConfig};
use beacon_utils::{ChunkPos, locks::SyncMutex, math::Vector3};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};

use crate::config::SimulationConfig;

/// Observers whose nearby query is cross-checked after every tick.
const CHECKED_OBSERVERS: usize = 4;

/// A random-walking entity.
pub struct Walker {
    id: i32,
    position: SyncMutex<Vector3<f64>>,
    view_distance: Option<u8>,
    rng: SyncMutex<StdRng>,
}

impl TrackedEntity for Walker {
    fn entity_id(&self) -> i32 {
        self.id
    }

    fn position(&self) -> Vector3<f64> {
        *self.position.lock()
    }

    fn view_distance(&self) -> Option<u8> {
        self.view_distance
    }
}

type Index = Synchronized<ChunkTracker<Arc<Walker>>>;

#[derive(Default)]
struct Counters {
    entered: AtomicU64,
    exited: AtomicU64,
    crossings: AtomicU64,
    respawns: AtomicU64,
}

/// Counts visibility changes without keeping them.
struct Counting<'a>(&'a Counters);

impl<E> InterestUpdate<E> for Counting<'_> {
    fn on_entered(&mut self, _entity: &E) {
        self.0.entered.fetch_add(1, Ordering::Relaxed);
    }

    fn on_exited(&mut self, _entity: &E) {
        self.0.exited.fetch_add(1, Ordering::Relaxed);
    }
}

/// Totals of a finished run.
#[derive(Debug)]
pub struct SimulationReport {
    pub ticks: u32,
    pub entered: u64,
    pub exited: u64,
    pub crossings: u64,
    pub respawns: u64,
    pub populated_chunks: usize,
    pub elapsed: Duration,
}

pub struct Simulation {
    config: SimulationConfig,
    index: Index,
    walkers: Vec<Arc<Walker>>,
    pool: ThreadPool,
    counters: Counters,
}

impl Simulation {
    pub fn new(tracking: &TrackingConfig, config: SimulationConfig) -> anyhow::Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("beacon-worker-{i}"))
            .build()
            .context("failed to build worker pool")?;

        let mut seeder = StdRng::seed_from_u64(config.seed);
        let walkers = (0..config.entities)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seeder.random());
                let position = random_position(&mut rng, config.world_radius);
                Arc::new(Walker {
                    id: i as i32,
                    position: SyncMutex::new(position),
                    view_distance: (i < config.observers).then_some(config.observer_view_distance),
                    rng: SyncMutex::new(rng),
                })
            })
            .collect();

        Ok(Self {
            index: Synchronized::new(ChunkTracker::new(tracking)),
            walkers,
            pool,
            counters: Counters::default(),
            config,
        })
    }

    /// Spawns every entity, runs all ticks and returns the totals.
    pub fn run(&self) -> anyhow::Result<SimulationReport> {
        let start = Instant::now();
        tracing::info!(
            entities = self.walkers.len(),
            observers = self.config.observers,
            threads = self.pool.current_num_threads(),
            "Starting simulation"
        );

        self.pool.install(|| {
            self.walkers.par_iter().for_each(|walker| {
                let mut counting = Counting(&self.counters);
                self.index
                    .register(walker.clone(), walker.position(), Some(&mut counting));
            });
        });
        self.verify().context("after spawning")?;

        for tick in 0..self.config.ticks {
            let _span = tracing::debug_span!("tick", tick).entered();
            self.pool.install(|| {
                self.walkers
                    .par_iter()
                    .for_each(|walker| self.advance(walker));
            });
            self.verify().with_context(|| format!("after tick {tick}"))?;
            tracing::debug!(
                populated_chunks = self.index.populated_chunks(),
                "Tick complete"
            );
        }

        Ok(SimulationReport {
            ticks: self.config.ticks,
            entered: self.counters.entered.load(Ordering::Relaxed),
            exited: self.counters.exited.load(Ordering::Relaxed),
            crossings: self.counters.crossings.load(Ordering::Relaxed),
            respawns: self.counters.respawns.load(Ordering::Relaxed),
            populated_chunks: self.index.populated_chunks(),
            elapsed: start.elapsed(),
        })
    }

    /// Moves one entity for one tick. Only one worker touches a walker per tick.
    fn advance(&self, walker: &Arc<Walker>) {
        let mut rng = walker.rng.lock();
        let mut counting = Counting(&self.counters);
        let old = walker.position();

        if rng.random_bool(self.config.respawn_chance) {
            self.index.unregister(walker, old, Some(&mut counting));
            let new = random_position(&mut rng, self.config.world_radius);
            *walker.position.lock() = new;
            self.index.register(walker.clone(), new, Some(&mut counting));
            self.counters.respawns.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let step = Vector3::new(
            rng.random_range(-1.0..=1.0),
            0.0,
            rng.random_range(-1.0..=1.0),
        ) * self.config.max_step;
        let new = clamp_to_world(old + step, self.config.world_radius);
        *walker.position.lock() = new;

        if ChunkPos::from_position(&old) != ChunkPos::from_position(&new) {
            self.counters.crossings.fetch_add(1, Ordering::Relaxed);
        }
        self.index.move_entity(walker, old, new, Some(&mut counting));
    }

    /// Checks the index against the walkers while no worker is running.
    fn verify(&self) -> anyhow::Result<()> {
        let tracked = self.index.entity_count();
        ensure!(
            tracked == self.walkers.len(),
            "{tracked} entities tracked, expected {}",
            self.walkers.len()
        );

        for walker in &self.walkers {
            let expected = walker.chunk_pos();
            match self.index.tracked_chunk(walker.id) {
                Some(chunk) if chunk == expected => {}
                Some(chunk) => bail!(
                    "entity {} tracked in {chunk}, but it is in {expected}",
                    walker.id
                ),
                None => bail!("entity {} is not tracked", walker.id),
            }
        }

        for observer in self.walkers.iter().filter(|w| w.is_observer()).take(CHECKED_OBSERVERS) {
            let center = observer.position();
            let range = self.config.max_step * 4.0;
            let mut found = 0_usize;
            self.index.nearby_entities(center, range, |_| found += 1);
            let expected = self
                .walkers
                .iter()
                .filter(|w| w.position().distance_squared(&center) < range * range)
                .count();
            ensure!(
                found == expected,
                "nearby query around entity {} found {found}, expected {expected}",
                observer.id
            );
        }
        Ok(())
    }
}

fn random_position(rng: &mut StdRng, world_radius: f64) -> Vector3<f64> {
    Vector3::new(
        rng.random_range(-world_radius..world_radius),
        64.0,
        rng.random_range(-world_radius..world_radius),
    )
}

fn clamp_to_world(position: Vector3<f64>, world_radius: f64) -> Vector3<f64> {
    Vector3::new(
        position.x.clamp(-world_radius, world_radius),
        position.y,
        position.z.clamp(-world_radius, world_radius),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            threads: 4,
            entities: 300,
            observers: 20,
            observer_view_distance: 3,
            ticks: 25,
            world_radius: 200.0,
            max_step: 9.0,
            respawn_chance: 0.05,
            seed: 7,
        }
    }

    #[test]
    fn test_small_run_keeps_index_consistent() {
        let simulation = Simulation::new(&TrackingConfig::default(), small_config()).unwrap();
        let report = simulation.run().unwrap();

        assert_eq!(report.ticks, 25);
        assert!(report.crossings > 0);
        assert!(report.entered > 0);
        assert!(report.populated_chunks > 0);
    }

    #[test]
    fn test_copy_on_write_run() {
        let tracking = TrackingConfig {
            bucket_kind: beacon_core::BucketKind::CopyOnWrite,
            ..TrackingConfig::default()
        };
        let report = Simulation::new(&tracking, small_config()).unwrap().run().unwrap();
        assert!(report.respawns > 0);
    }

    #[test]
    fn test_walkers_stay_in_world() {
        let config = small_config();
        let simulation = Simulation::new(&TrackingConfig::default(), config.clone()).unwrap();
        simulation.run().unwrap();
        for walker in &simulation.walkers {
            let pos = walker.position();
            assert!(pos.x.abs() <= config.world_radius);
            assert!(pos.z.abs() <= config.world_radius);
        }
    }
}
