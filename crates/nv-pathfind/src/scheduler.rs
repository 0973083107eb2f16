//! `PathScheduler` — bounded-concurrency background path computation.
//!
//! # Slot accounting
//!
//! A task occupies one of `max_concurrent` slots from the moment it is
//! handed to the worker pool until its result is drained by
//! [`PathScheduler::poll_completed`].  Queued requests start, in submission
//! order, only when a drain frees a slot, so no more than `max_concurrent`
//! planners ever execute at once regardless of the pool's own size.
//!
//! # Cancellation
//!
//! | Task state when cancelled | Effect                                          |
//! |---------------------------|-------------------------------------------------|
//! | queued                    | removed from the queue; the planner never runs |
//! | running                   | token set; the result is discarded on drain    |
//! | finished / unknown        | no-op                                           |

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use nv_core::{MoverId, NavConfig, NavError, NavResult, TaskHandle};

use crate::{ObstacleSnapshot, Path, PathPlanner, PathRequest, PathResult, PathfindingError};

// ── CancelToken ───────────────────────────────────────────────────────────────

/// Cooperative cancellation flag shared between the scheduler and one task.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ── PathService ───────────────────────────────────────────────────────────────

/// The submit/cancel half of the scheduler, as seen by movement controllers.
pub trait PathService {
    /// Queue `request` and return its handle.
    fn submit(&mut self, request: PathRequest) -> TaskHandle;

    /// Cancel a queued or running task.  Returns `false` when the handle is
    /// unknown or already delivered.
    fn cancel(&mut self, handle: TaskHandle) -> bool;
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One delivered result.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedPath {
    pub handle:    TaskHandle,
    pub requester: MoverId,
    pub result:    PathResult<Path>,
}

/// Lifetime counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub submitted: u64,
    pub started:   u64,
    pub delivered: u64,
    /// Cancelled before starting.
    pub dequeued:  u64,
    /// Finished after cancellation; result dropped.
    pub discarded: u64,
}

struct QueuedTask {
    handle:  TaskHandle,
    request: PathRequest,
}

struct RunningTask {
    requester: MoverId,
    token:     CancelToken,
    cancelled: bool,
}

struct TaskOutcome {
    handle: TaskHandle,
    result: PathResult<Path>,
}

// ── PathScheduler ─────────────────────────────────────────────────────────────

/// Runs [`PathPlanner`] invocations on a dedicated rayon pool and hands the
/// results back to the main step without blocking it.
pub struct PathScheduler<P: PathPlanner + 'static> {
    planner:        Arc<P>,
    /// `None` when the dedicated pool could not be built; tasks then go to
    /// rayon's global pool, still limited by slot accounting.
    pool:           Option<rayon::ThreadPool>,
    max_concurrent: usize,
    time_budget:    Duration,
    queue:          VecDeque<QueuedTask>,
    running:        FxHashMap<TaskHandle, RunningTask>,
    sender:         SyncSender<TaskOutcome>,
    receiver:       Receiver<TaskOutcome>,
    snapshot:       Arc<ObstacleSnapshot>,
    next_handle:    TaskHandle,
    stats:          SchedulerStats,
}

impl<P: PathPlanner + 'static> PathScheduler<P> {
    /// Create a scheduler with `max_concurrent` worker slots.
    ///
    /// `time_budget` is applied to requests that carry none of their own.
    pub fn new(planner: P, max_concurrent: usize, time_budget: Duration) -> NavResult<Self> {
        if max_concurrent == 0 {
            return Err(NavError::InvalidConfiguration(
                "max_concurrent_tasks must be at least 1".into(),
            ));
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrent)
            .thread_name(|i| format!("nv-path-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("failed to build path worker pool: {e}; using the global rayon pool");
                None
            }
        };
        info!("path scheduler ready with {max_concurrent} worker slot(s)");

        // Every running task sends exactly one outcome and at most
        // `max_concurrent` tasks are undrained, so sends never block.
        let (sender, receiver) = mpsc::sync_channel(max_concurrent);
        Ok(Self {
            planner: Arc::new(planner),
            pool,
            max_concurrent,
            time_budget,
            queue: VecDeque::new(),
            running: FxHashMap::default(),
            sender,
            receiver,
            snapshot: Arc::new(ObstacleSnapshot::empty()),
            next_handle: TaskHandle(0),
            stats: SchedulerStats::default(),
        })
    }

    pub fn from_config(planner: P, config: &NavConfig) -> NavResult<Self> {
        Self::new(planner, config.max_concurrent_tasks, config.path_time_budget)
    }

    #[inline]
    pub fn planner(&self) -> &P {
        &self.planner
    }

    #[inline]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    #[inline]
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Requests waiting for a slot.
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Tasks holding a slot (running, or finished but not yet drained).
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.running.is_empty()
    }

    pub fn snapshot(&self) -> &Arc<ObstacleSnapshot> {
        &self.snapshot
    }

    /// Publish new obstacle geometry.  Only tasks started afterwards see it.
    pub fn set_snapshot(&mut self, snapshot: Arc<ObstacleSnapshot>) {
        debug!(
            "obstacle snapshot v{} published ({} triangles)",
            snapshot.version(),
            snapshot.len()
        );
        self.snapshot = snapshot;
    }

    /// Non-blocking drain of every finished task.
    ///
    /// Frees the drained slots and starts queued requests into them.
    /// Results of cancelled tasks are dropped here and never returned.
    pub fn poll_completed(&mut self) -> Vec<CompletedPath> {
        let mut delivered = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(outcome) => {
                    let Some(task) = self.running.remove(&outcome.handle) else {
                        warn!("result for unknown path task {}", outcome.handle);
                        continue;
                    };
                    if task.cancelled {
                        self.stats.discarded += 1;
                        debug!("discarding result of cancelled task {}", outcome.handle);
                        continue;
                    }
                    self.stats.delivered += 1;
                    delivered.push(CompletedPath {
                        handle:    outcome.handle,
                        requester: task.requester,
                        result:    outcome.result,
                    });
                }
                Err(TryRecvError::Empty) => break,
                // Unreachable while `self.sender` is alive.
                Err(TryRecvError::Disconnected) => break,
            }
        }
        self.pump();
        delivered
    }

    /// Drop every queued request and cancel every running one.  Running
    /// workers finish naturally; their results are discarded on drain.
    pub fn shutdown(&mut self) {
        let dropped = self.queue.len();
        self.stats.dequeued += dropped as u64;
        self.queue.clear();
        for task in self.running.values_mut() {
            task.cancelled = true;
            task.token.cancel();
        }
        if dropped > 0 || !self.running.is_empty() {
            info!(
                "path scheduler shut down: {dropped} queued dropped, {} running cancelled",
                self.running.len()
            );
        }
    }

    fn pump(&mut self) {
        while self.running.len() < self.max_concurrent {
            let Some(task) = self.queue.pop_front() else { break };
            self.start(task);
        }
    }

    fn start(&mut self, task: QueuedTask) {
        let QueuedTask { handle, mut request } = task;
        request.constraints.time_budget.get_or_insert(self.time_budget);

        let token = CancelToken::new();
        self.running.insert(
            handle,
            RunningTask { requester: request.requester, token: token.clone(), cancelled: false },
        );
        self.stats.started += 1;
        debug!("path task {handle} started for {}", request.requester);

        let planner = Arc::clone(&self.planner);
        let snapshot = Arc::clone(&self.snapshot);
        let sender = self.sender.clone();
        let job = move || {
            let result = if token.is_cancelled() {
                Err(PathfindingError::stale("cancelled before start"))
            } else {
                panic::catch_unwind(AssertUnwindSafe(|| planner.plan(&request, &snapshot, &token)))
                    .unwrap_or_else(|_| Err(PathfindingError::internal("path planner panicked")))
            };
            // The receiver is gone only if the scheduler was dropped.
            let _ = sender.send(TaskOutcome { handle, result });
        };

        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }
}

impl<P: PathPlanner + 'static> PathService for PathScheduler<P> {
    fn submit(&mut self, request: PathRequest) -> TaskHandle {
        let handle = self.next_handle;
        self.next_handle = handle.next();
        self.stats.submitted += 1;
        self.queue.push_back(QueuedTask { handle, request });
        self.pump();
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        if let Some(pos) = self.queue.iter().position(|t| t.handle == handle) {
            self.queue.remove(pos);
            self.stats.dequeued += 1;
            debug!("path task {handle} removed from queue");
            return true;
        }
        match self.running.get_mut(&handle) {
            Some(task) if !task.cancelled => {
                task.cancelled = true;
                task.token.cancel();
                debug!("path task {handle} cancelled while running");
                true
            }
            _ => false,
        }
    }
}

impl<P: PathPlanner + 'static> Drop for PathScheduler<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
