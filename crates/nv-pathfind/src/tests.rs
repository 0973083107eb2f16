//! Unit tests for nv-pathfind.
//!
//! Scheduler tests use real rayon workers; every wait is a bounded polling
//! loop so a regression fails instead of hanging.

#[cfg(test)]
mod helpers {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use nv_core::{MoverId, ObstacleId, Tick, Triangle, Vec3};

    use crate::{
        CancelToken, CompletedPath, ObstacleSnapshot, Path, PathConstraints, PathPlanner,
        PathRequest, PathResult, PathScheduler,
    };

    pub fn request(requester: u32, start: Vec3, goal: Vec3) -> PathRequest {
        PathRequest::new(MoverId(requester), start, goal, PathConstraints::default())
    }

    /// Vertical wall quad from `a` to `b` (XZ), 3 units tall.
    pub fn wall(a: Vec3, b: Vec3) -> [Triangle; 2] {
        let up = Vec3::new(0.0, 3.0, 0.0);
        [Triangle::new(a, b, b + up), Triangle::new(a, b + up, a + up)]
    }

    /// Closed square box of walls centred on `c` with half-size `h`.
    pub fn walled_box(c: Vec3, h: f32) -> ObstacleSnapshot {
        let corners = [
            c + Vec3::new(-h, 0.0, -h),
            c + Vec3::new(h, 0.0, -h),
            c + Vec3::new(h, 0.0, h),
            c + Vec3::new(-h, 0.0, h),
        ];
        let tris = (0..4)
            .flat_map(|i| wall(corners[i], corners[(i + 1) % 4]))
            .enumerate()
            .map(|(i, t)| (ObstacleId(i as u32), t));
        ObstacleSnapshot::from_triangles(tris, 1, Tick::ZERO)
    }

    /// Straight-line planner that sleeps and records concurrency.
    #[derive(Default)]
    pub struct SlowPlanner {
        pub delay:     Duration,
        pub in_flight: AtomicUsize,
        pub max_seen:  AtomicUsize,
        pub calls:     AtomicUsize,
        pub goals:     Mutex<Vec<Vec3>>,
    }

    impl SlowPlanner {
        pub fn new(delay_ms: u64) -> Self {
            Self { delay: Duration::from_millis(delay_ms), ..Self::default() }
        }
    }

    impl PathPlanner for SlowPlanner {
        fn plan(&self, request: &PathRequest, _: &ObstacleSnapshot, _: &CancelToken) -> PathResult<Path> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.goals.lock().unwrap().push(request.goal);
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Path::new(vec![request.goal]))
        }
    }

    pub struct PanickingPlanner;

    impl PathPlanner for PanickingPlanner {
        fn plan(&self, _: &PathRequest, _: &ObstacleSnapshot, _: &CancelToken) -> PathResult<Path> {
            panic!("planner blew up");
        }
    }

    /// Poll until `want` results arrived or ~5 s elapsed.
    pub fn drain<P: PathPlanner + 'static>(s: &mut PathScheduler<P>, want: usize) -> Vec<CompletedPath> {
        let mut out = Vec::new();
        for _ in 0..5_000 {
            out.extend(s.poll_completed());
            if out.len() >= want {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        out
    }

    /// Poll until the scheduler has no queued or running tasks.
    pub fn drain_until_idle<P: PathPlanner + 'static>(s: &mut PathScheduler<P>) -> Vec<CompletedPath> {
        let mut out = Vec::new();
        for _ in 0..5_000 {
            out.extend(s.poll_completed());
            if s.is_idle() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        out
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod errors {
    use crate::{PathErrorKind, PathfindingError};

    #[test]
    fn display_carries_kind_and_message() {
        let e = PathfindingError::timed_out("budget 50ms");
        assert_eq!(e.kind, PathErrorKind::TimedOut);
        assert_eq!(e.to_string(), "timed out: budget 50ms");
    }
}

// ── Grid planner ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod planner {
    use nv_core::{ObstacleId, Tick, Vec3};

    use super::helpers::{request, wall, walled_box};
    use crate::{CancelToken, GridPlanner, ObstacleSnapshot, PathErrorKind, PathPlanner};

    #[test]
    fn open_ground_gives_straight_path_to_exact_goal() {
        let goal = Vec3::new(10.0, 0.0, 0.0);
        let path = GridPlanner::default()
            .plan(&request(0, Vec3::ZERO, goal), &ObstacleSnapshot::empty(), &CancelToken::new())
            .unwrap();
        assert_eq!(path.last(), Some(goal));
        // Collinear cells merge into (nearly) a single leg.
        assert!(path.len() <= 2, "waypoints: {:?}", path.waypoints());
    }

    #[test]
    fn same_cell_goal_is_single_waypoint() {
        let goal = Vec3::new(0.1, 0.0, 0.1);
        let path = GridPlanner::default()
            .plan(&request(0, Vec3::ZERO, goal), &ObstacleSnapshot::empty(), &CancelToken::new())
            .unwrap();
        assert_eq!(path.waypoints(), &[goal]);
    }

    #[test]
    fn detours_around_wall() {
        let tris = wall(Vec3::new(5.0, 0.0, -3.0), Vec3::new(5.0, 0.0, 3.0));
        let snapshot = ObstacleSnapshot::from_triangles(
            tris.into_iter().enumerate().map(|(i, t)| (ObstacleId(i as u32), t)),
            1,
            Tick::ZERO,
        );
        let goal = Vec3::new(10.0, 0.0, 0.0);
        let path = GridPlanner::default()
            .plan(&request(0, Vec3::ZERO, goal), &snapshot, &CancelToken::new())
            .unwrap();

        assert_eq!(path.last(), Some(goal));
        assert!(path.len() >= 2);
        assert!(path.length_from(Vec3::ZERO) > 10.5, "should go around the wall");
        // No waypoint sits on the wall line within the wall's span.
        for w in path.waypoints() {
            assert!(!((w.x - 5.0).abs() < 0.5 && w.z.abs() < 3.0), "waypoint {w} inside wall");
        }
    }

    #[test]
    fn wide_wall_widens_the_search_area() {
        // Far wider than the default margin around start and goal.
        let tris = wall(Vec3::new(-20.0, 0.0, 5.0), Vec3::new(20.0, 0.0, 5.0));
        let snapshot = ObstacleSnapshot::from_triangles(
            tris.into_iter().enumerate().map(|(i, t)| (ObstacleId(i as u32), t)),
            1,
            Tick::ZERO,
        );
        let goal = Vec3::new(0.0, 0.0, 10.0);
        let path = GridPlanner::default()
            .plan(&request(0, Vec3::ZERO, goal), &snapshot, &CancelToken::new())
            .unwrap();

        assert_eq!(path.last(), Some(goal));
        assert!(path.length_from(Vec3::ZERO) > 40.0, "should go around a wall end");
        assert!(path.waypoints().iter().any(|w| w.x.abs() > 20.0));
    }

    #[test]
    fn snapshot_bounds_cover_every_triangle() {
        assert_eq!(ObstacleSnapshot::empty().bounds(), None);
        let snapshot = walled_box(Vec3::new(10.0, 0.0, 10.0), 2.0);
        let bounds = snapshot.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(8.0, 0.0, 8.0));
        assert_eq!(bounds.max, Vec3::new(12.0, 3.0, 12.0));
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        let goal = Vec3::new(10.0, 0.0, 10.0);
        let err = GridPlanner::default()
            .plan(&request(0, Vec3::ZERO, goal), &walled_box(goal, 2.0), &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind, PathErrorKind::Unreachable);
    }

    #[test]
    fn goal_inside_geometry_is_unreachable() {
        let goal = Vec3::new(5.0, 0.0, 0.0);
        let tris = wall(Vec3::new(5.0, 0.0, -1.0), Vec3::new(5.0, 0.0, 1.0));
        let snapshot = ObstacleSnapshot::from_triangles(
            tris.into_iter().enumerate().map(|(i, t)| (ObstacleId(i as u32), t)),
            1,
            Tick::ZERO,
        );
        let err = GridPlanner::default()
            .plan(&request(0, Vec3::ZERO, goal), &snapshot, &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind, PathErrorKind::Unreachable);
    }

    #[test]
    fn expansion_cap_times_out() {
        let planner = GridPlanner { max_expansions: 5, ..GridPlanner::default() };
        let err = planner
            .plan(
                &request(0, Vec3::ZERO, Vec3::new(30.0, 0.0, 30.0)),
                &ObstacleSnapshot::empty(),
                &CancelToken::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind, PathErrorKind::TimedOut);
    }

    #[test]
    fn floor_geometry_is_walkable() {
        let floor = nv_core::Triangle::new(
            Vec3::new(-50.0, 0.0, -50.0),
            Vec3::new(50.0, 0.0, -50.0),
            Vec3::new(0.0, 0.0, 50.0),
        );
        let snapshot = ObstacleSnapshot::from_triangles([(ObstacleId(0), floor)], 1, Tick::ZERO);
        let goal = Vec3::new(6.0, 0.0, 0.0);
        let path = GridPlanner::default()
            .plan(&request(0, Vec3::ZERO, goal), &snapshot, &CancelToken::new())
            .unwrap();
        assert_eq!(path.last(), Some(goal));
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::Duration;

    use nv_core::{MoverId, NavError, Vec3};

    use super::helpers::{
        PanickingPlanner, SlowPlanner, drain, drain_until_idle, request, walled_box,
    };
    use crate::{GridPlanner, PathErrorKind, PathScheduler, PathService};

    const BUDGET: Duration = Duration::from_millis(200);

    #[test]
    fn zero_slots_rejected() {
        let r = PathScheduler::new(SlowPlanner::new(0), 0, BUDGET);
        assert!(matches!(r, Err(NavError::InvalidConfiguration(_))));
    }

    #[test]
    fn never_more_than_k_running() {
        let mut s = PathScheduler::new(SlowPlanner::new(15), 3, BUDGET).unwrap();
        let handles: Vec<_> = (0..12)
            .map(|i| s.submit(request(i, Vec3::ZERO, Vec3::new(i as f32, 0.0, 0.0))))
            .collect();
        assert!(s.running_count() <= 3);
        assert_eq!(s.queued_count(), 9);

        let done = drain(&mut s, 12);
        assert_eq!(done.len(), 12);
        assert!(s.planner().max_seen.load(Ordering::SeqCst) <= 3);

        let mut got: Vec<_> = done.iter().map(|c| c.handle).collect();
        got.sort();
        assert_eq!(got, handles);
    }

    #[test]
    fn queued_tasks_start_in_submission_order() {
        let mut s = PathScheduler::new(SlowPlanner::new(2), 1, BUDGET).unwrap();
        for i in 0..5 {
            s.submit(request(i, Vec3::ZERO, Vec3::new(i as f32, 0.0, 0.0)));
        }
        drain(&mut s, 5);
        let goals = s.planner().goals.lock().unwrap().clone();
        let xs: Vec<f32> = goals.iter().map(|g| g.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn cancelling_queued_task_never_runs_it() {
        let mut s = PathScheduler::new(SlowPlanner::new(20), 1, BUDGET).unwrap();
        let a = s.submit(request(0, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)));
        let b = s.submit(request(1, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)));
        let c = s.submit(request(2, Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0)));
        assert!(s.cancel(b));
        assert!(!s.cancel(b), "second cancel is a no-op");

        let done = drain_until_idle(&mut s);
        let handles: Vec<_> = done.iter().map(|d| d.handle).collect();
        assert_eq!(handles, vec![a, c]);
        assert_eq!(s.planner().calls.load(Ordering::SeqCst), 2);
        assert!(!s.planner().goals.lock().unwrap().contains(&Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(s.stats().dequeued, 1);
    }

    #[test]
    fn cancelling_running_task_discards_result() {
        let mut s = PathScheduler::new(SlowPlanner::new(20), 1, BUDGET).unwrap();
        let a = s.submit(request(0, Vec3::ZERO, Vec3::X));
        assert_eq!(s.running_count(), 1);
        assert!(s.cancel(a));

        let done = drain_until_idle(&mut s);
        assert!(done.is_empty());
        assert_eq!(s.stats().discarded, 1);

        let b = s.submit(request(0, Vec3::ZERO, Vec3::Z));
        let done = drain(&mut s, 1);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].handle, b);
    }

    #[test]
    fn each_result_delivered_once() {
        let mut s = PathScheduler::new(SlowPlanner::new(1), 2, BUDGET).unwrap();
        s.submit(request(0, Vec3::ZERO, Vec3::X));
        let first = drain(&mut s, 1);
        assert_eq!(first.len(), 1);
        thread::sleep(Duration::from_millis(20));
        assert!(s.poll_completed().is_empty());
    }

    #[test]
    fn unreachable_goal_reported_to_its_requester_only() {
        let mut s = PathScheduler::new(GridPlanner::default(), 2, Duration::from_secs(2)).unwrap();
        let enclosed = Vec3::new(10.0, 0.0, 10.0);
        s.set_snapshot(Arc::new(walled_box(enclosed, 2.0)));

        let bad = s.submit(request(7, Vec3::ZERO, enclosed));
        let good = s.submit(request(8, Vec3::ZERO, Vec3::new(-5.0, 0.0, 3.0)));
        let done = drain(&mut s, 2);
        assert_eq!(done.len(), 2);

        for c in &done {
            if c.handle == bad {
                assert_eq!(c.requester, MoverId(7));
                assert_eq!(c.result.as_ref().unwrap_err().kind, PathErrorKind::Unreachable);
            } else {
                assert_eq!(c.handle, good);
                assert_eq!(c.requester, MoverId(8));
                assert!(c.result.is_ok());
            }
        }
    }

    #[test]
    fn planner_panic_becomes_internal_error() {
        let mut s = PathScheduler::new(PanickingPlanner, 1, BUDGET).unwrap();
        s.submit(request(3, Vec3::ZERO, Vec3::X));
        let done = drain(&mut s, 1);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].result.as_ref().unwrap_err().kind, PathErrorKind::Internal);

        // The scheduler keeps working afterwards.
        s.submit(request(3, Vec3::ZERO, Vec3::X));
        assert_eq!(drain(&mut s, 1).len(), 1);
    }

    #[test]
    fn shutdown_drops_queue_and_running_results() {
        let mut s = PathScheduler::new(SlowPlanner::new(20), 1, BUDGET).unwrap();
        for i in 0..4 {
            s.submit(request(i, Vec3::ZERO, Vec3::X));
        }
        s.shutdown();
        assert_eq!(s.queued_count(), 0);
        let done = drain_until_idle(&mut s);
        assert!(done.is_empty());
        // Only the task already handed to a worker may have run.
        assert!(s.planner().calls.load(Ordering::SeqCst) <= 1);
    }

    #[test]
    fn default_budget_is_filled_in() {
        use crate::{CancelToken, ObstacleSnapshot, Path, PathPlanner, PathRequest, PathResult};

        struct BudgetEcho;
        impl PathPlanner for BudgetEcho {
            fn plan(&self, r: &PathRequest, _: &ObstacleSnapshot, _: &CancelToken) -> PathResult<Path> {
                let ms = r.constraints.time_budget.map_or(0, |b| b.as_millis()) as f32;
                Ok(Path::new(vec![Vec3::new(ms, 0.0, 0.0)]))
            }
        }

        let mut s = PathScheduler::new(BudgetEcho, 1, Duration::from_millis(75)).unwrap();
        s.submit(request(0, Vec3::ZERO, Vec3::X));
        let done = drain(&mut s, 1);
        let path = done[0].result.as_ref().unwrap();
        assert_eq!(path.get(0), Some(Vec3::new(75.0, 0.0, 0.0)));
    }
}
