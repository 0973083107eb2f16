//! crowd — ring-swap demo for the rust_nav navigation core.
//!
//! Movers start evenly spaced on a circle and each walks to the opposite
//! side, so every route crosses the centre where two short walls stand.
//! A patrol loops around the outside and a chaser follows it.  Positions
//! and events are written to `output/crowd/`.
//!
//! Run with `RUST_LOG=info` to see snapshot rebuilds and path failures.

use std::f32::consts::TAU;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use nv_agent::{MoverParams, MoverStore};
use nv_core::{NavConfig, Triangle, Vec3};
use nv_mobility::NavEvent;
use nv_nav::{NavContextBuilder, NavObserver, NavStepStats};
use nv_output::{CsvWriter, OutputWriter, RecordingObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const RING_MOVERS:     usize = 24;
const RING_RADIUS:     f32   = 12.0;
const SEED:            u64   = 42;
const DT:              f32   = 1.0 / 30.0;
const STEPS:           u64   = 1_500;
const OUTPUT_INTERVAL: u64   = 5;
const OUTPUT_DIR:      &str  = "output/crowd";

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Vertical wall quad from `a` to `b`, 3 units tall.
fn wall(a: Vec3, b: Vec3) -> [Triangle; 2] {
    let up = Vec3::new(0.0, 3.0, 0.0);
    [Triangle::new(a, b, b + up), Triangle::new(a, b + up, a + up)]
}

fn level() -> Vec<Triangle> {
    let mut tris = Vec::new();
    tris.extend(wall(Vec3::new(-3.0, 0.0, 1.5), Vec3::new(3.0, 0.0, 1.5)));
    tris.extend(wall(Vec3::new(-3.0, 0.0, -1.5), Vec3::new(3.0, 0.0, -1.5)));
    tris
}

// ── Observer wrapper ──────────────────────────────────────────────────────────

/// Tallies events and step counters on top of the CSV recording.
struct CountingObserver<W: OutputWriter> {
    inner:        RecordingObserver<W>,
    finished:     usize,
    failed:       usize,
    waypoints:    usize,
    approximated: usize,
    reindexed:    usize,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: RecordingObserver<W>) -> Self {
        Self { inner, finished: 0, failed: 0, waypoints: 0, approximated: 0, reindexed: 0 }
    }
}

impl<W: OutputWriter> NavObserver for CountingObserver<W> {
    fn on_event(&mut self, event: &NavEvent) {
        match event {
            NavEvent::Finished { .. } => self.finished += 1,
            NavEvent::PathfindingFailed { .. } => self.failed += 1,
            NavEvent::WaypointPassed { .. } => self.waypoints += 1,
            _ => {}
        }
        self.inner.on_event(event);
    }

    fn on_step_end(&mut self, stats: &NavStepStats, movers: &MoverStore) {
        self.approximated += stats.avoidance_approximated;
        self.reindexed += stats.reindexed;
        self.inner.on_step_end(stats, movers);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();

    println!("=== crowd — rust_nav ring swap ===");
    println!("Ring movers: {RING_MOVERS}  |  Steps: {STEPS}  |  Seed: {SEED}");
    println!();

    let config = NavConfig::default();
    let mut nav = NavContextBuilder::new(config).obstacles(level()).build()?;

    // 1. Ring movers, with a little jitter in speed and size.
    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut ring = Vec::with_capacity(RING_MOVERS);
    for i in 0..RING_MOVERS {
        let angle = TAU * i as f32 / RING_MOVERS as f32;
        let start = Vec3::new(angle.cos(), 0.0, angle.sin()) * RING_RADIUS;
        let params = MoverParams {
            radius:    rng.gen_range(0.35..0.5),
            max_speed: rng.gen_range(2.5..3.5),
            ..MoverParams::default()
        };
        let id = nav.register_mover(start, &params)?;
        nav.move_to(id, -start)?;
        ring.push(id);
    }

    // 2. A looping patrol outside the ring and a chaser on its heels.
    let r = RING_RADIUS + 4.0;
    let patrol = nav.register_mover(Vec3::new(r, 0.0, r), &MoverParams::default())?;
    nav.move_to_points(
        patrol,
        vec![Vec3::new(r, 0.0, -r), Vec3::new(-r, 0.0, -r), Vec3::new(-r, 0.0, r), Vec3::new(r, 0.0, r)],
        true,
    )?;
    let chaser = nav.register_mover(Vec3::new(r + 3.0, 0.0, r), &MoverParams::default())?;
    nav.follow_target(chaser, patrol, 1.5, true)?;
    info!("{} movers registered", nav.movers().len());

    // 3. Output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = CountingObserver::new(RecordingObserver::new(writer, OUTPUT_INTERVAL));

    // 4. Run.  The short sleep stands in for the rest of a frame and gives
    //    the path workers time to deliver.
    let t0 = Instant::now();
    for _ in 0..STEPS {
        nav.step(DT, &mut obs)?;
        thread::sleep(Duration::from_micros(500));
    }
    let elapsed = t0.elapsed();
    nav.shutdown();

    obs.inner.finish();
    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Summary.
    println!("Run complete in {:.3} s ({} ticks)", elapsed.as_secs_f64(), nav.tick().0);
    println!("  finished            : {}", obs.finished);
    println!("  pathfinding failed  : {}", obs.failed);
    println!("  waypoints passed    : {}", obs.waypoints);
    println!("  approximate solves  : {}", obs.approximated);
    println!("  index re-registers  : {}", obs.reindexed);
    println!();

    println!("{:<8} {:<10} {:>8}", "Mover", "State", "Error");
    println!("{}", "-".repeat(28));
    for (i, &id) in ring.iter().enumerate() {
        let state = match nav.state(id) {
            Some(s) if s.is_arrived() => "arrived",
            Some(s) if s.is_seeking() => "seeking",
            _ => "idle",
        };
        let angle = TAU * i as f32 / RING_MOVERS as f32;
        let goal = -Vec3::new(angle.cos(), 0.0, angle.sin()) * RING_RADIUS;
        let error = nav.mover(id).map_or(f32::NAN, |m| m.position.distance(goal));
        println!("{:<8} {:<10} {:>8.2}", id.0, state, error);
    }

    Ok(())
}
