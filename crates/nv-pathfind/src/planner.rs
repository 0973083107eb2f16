//! Path planning trait and the default grid A* planner.
//!
//! # Pluggability
//!
//! The scheduler only knows the [`PathPlanner`] trait, so a navmesh or voxel
//! planner can replace [`GridPlanner`] without touching the scheduler or the
//! movement controller.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use log::debug;

use nv_core::geom::{FLOOR_CLEARANCE, ground};
use nv_core::{Aabb, Triangle, Vec2, Vec3};

use crate::{CancelToken, ObstacleSnapshot, Path, PathRequest, PathResult, PathfindingError};

// ── PathPlanner trait ─────────────────────────────────────────────────────────

/// The "find a route between two points given obstacle geometry" primitive.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: one planner instance is shared by
/// every worker thread of the scheduler.
pub trait PathPlanner: Send + Sync {
    /// Compute a path for `request` against `snapshot`.
    ///
    /// Long searches should poll `cancel` and give up early when it fires;
    /// the scheduler discards the result of a cancelled task either way.
    fn plan(
        &self,
        request: &PathRequest,
        snapshot: &ObstacleSnapshot,
        cancel: &CancelToken,
    ) -> PathResult<Path>;
}

// ── GridPlanner ───────────────────────────────────────────────────────────────

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;
const MIN_CELL_SIZE: f32 = 0.01;
/// Upper bound on grid cells; larger areas coarsen the grid instead.
const MAX_GRID_CELLS: usize = 1 << 22;
/// Expansions between two deadline/cancellation checks.
const CHECK_INTERVAL: usize = 256;

const NEIGHBOURS: [(i32, i32, u32); 8] = [
    (1, 0, STRAIGHT_COST),
    (-1, 0, STRAIGHT_COST),
    (0, 1, STRAIGHT_COST),
    (0, -1, STRAIGHT_COST),
    (1, 1, DIAGONAL_COST),
    (1, -1, DIAGONAL_COST),
    (-1, 1, DIAGONAL_COST),
    (-1, -1, DIAGONAL_COST),
];

/// 8-connected A* over an XZ grid spanning the start/goal box plus a margin.
///
/// A cell is blocked when the footprint of an obstacle triangle that
/// overlaps the agent's vertical band comes within `agent_radius` of the
/// cell centre.  Diagonal moves never cut a blocked corner.
///
/// When the frontier runs dry after touching the edge of the grid while some
/// geometry still lies outside it, the margin is doubled and the search runs
/// again, until the grid encloses every obstacle.  Expansions and the time
/// budget are shared across those attempts.
///
/// | Outcome                                       | Result         |
/// |-----------------------------------------------|----------------|
/// | goal point inside inflated geometry           | `Unreachable`  |
/// | frontier exhausted, all geometry inside grid  | `Unreachable`  |
/// | `max_expansions` or time budget exceeded      | `TimedOut`     |
#[derive(Clone, Debug, PartialEq)]
pub struct GridPlanner {
    pub cell_size:      f32,
    /// Initial room around the start/goal box the search may use.
    pub margin:         f32,
    pub max_expansions: usize,
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self { cell_size: 0.5, margin: 4.0, max_expansions: 250_000 }
    }
}

impl PathPlanner for GridPlanner {
    fn plan(
        &self,
        request: &PathRequest,
        snapshot: &ObstacleSnapshot,
        cancel: &CancelToken,
    ) -> PathResult<Path> {
        let deadline = request.constraints.time_budget.map(|b| Instant::now() + b);
        if !(request.start.is_finite() && request.goal.is_finite()) {
            return Err(PathfindingError::unreachable("non-finite start or goal"));
        }

        let mut margin = self.margin.max(0.0);
        let mut expansions = 0usize;
        loop {
            let mut grid = Grid::new(self, request, snapshot, margin);
            if grid.point_blocked(ground(request.goal)) {
                return Err(PathfindingError::unreachable(format!(
                    "goal {} lies inside obstacle geometry",
                    request.goal
                )));
            }

            let start = grid.cell_of(ground(request.start));
            let goal = grid.cell_of(ground(request.goal));
            if start == goal {
                return Ok(Path::new(vec![request.goal]));
            }
            grid.force_free(start);
            grid.force_free(goal);

            if let Some(cells) = self.search(&mut grid, start, goal, deadline, cancel, &mut expansions)? {
                return Ok(grid.to_path(&cells, request));
            }
            if !grid.edge_reached || grid.encloses(snapshot.bounds()) || !margin.is_finite() {
                return Err(PathfindingError::unreachable("no route to the goal"));
            }
            margin = margin * 2.0 + grid.cell;
            debug!("{}: widening search margin to {margin}", request.requester);
        }
    }
}

impl GridPlanner {
    fn search(
        &self,
        grid: &mut Grid<'_>,
        start: usize,
        goal: usize,
        deadline: Option<Instant>,
        cancel: &CancelToken,
        expansions: &mut usize,
    ) -> PathResult<Option<Vec<usize>>> {
        let n = grid.width * grid.depth;
        let mut g = vec![u32::MAX; n];
        let mut parent = vec![usize::MAX; n];
        let mut closed = vec![false; n];

        // Min-heap keyed by (f, h, cell); the trailing keys make ties
        // deterministic.
        let mut heap: BinaryHeap<Reverse<(u32, u32, usize)>> = BinaryHeap::new();
        g[start] = 0;
        heap.push(Reverse((grid.heuristic(start, goal), grid.heuristic(start, goal), start)));

        while let Some(Reverse((_, _, cell))) = heap.pop() {
            if closed[cell] {
                continue;
            }
            closed[cell] = true;
            if cell == goal {
                return Ok(Some(reconstruct(&parent, start, goal)));
            }

            *expansions += 1;
            let expansions = *expansions;
            if expansions > self.max_expansions {
                return Err(PathfindingError::timed_out(format!(
                    "search exceeded {} expansions",
                    self.max_expansions
                )));
            }
            if expansions % CHECK_INTERVAL == 0 {
                if cancel.is_cancelled() {
                    return Err(PathfindingError::stale("cancelled during search"));
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Err(PathfindingError::timed_out(format!(
                        "search exceeded its time budget after {expansions} expansions"
                    )));
                }
            }

            let (x, z) = grid.coords(cell);
            for &(dx, dz, cost) in &NEIGHBOURS {
                let Some(next) = grid.offset(x, z, dx, dz) else {
                    grid.edge_reached = true;
                    continue;
                };
                if closed[next] || grid.blocked(next) {
                    continue;
                }
                if dx != 0 && dz != 0 {
                    let side_x = grid.offset(x, z, dx, 0);
                    let side_z = grid.offset(x, z, 0, dz);
                    if side_x.is_none_or(|c| grid.blocked(c)) || side_z.is_none_or(|c| grid.blocked(c)) {
                        continue;
                    }
                }
                let tentative = g[cell].saturating_add(cost);
                if tentative < g[next] {
                    g[next] = tentative;
                    parent[next] = cell;
                    let h = grid.heuristic(next, goal);
                    heap.push(Reverse((tentative.saturating_add(h), h, next)));
                }
            }
        }

        Ok(None)
    }
}

/// Cells from the one after `start` up to and including `goal`.
fn reconstruct(parent: &[usize], start: usize, goal: usize) -> Vec<usize> {
    let mut cells = Vec::new();
    let mut cur = goal;
    while cur != start && cur != usize::MAX {
        cells.push(cur);
        cur = parent[cur];
    }
    cells.reverse();
    cells
}

// ── Grid ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq)]
enum CellState {
    Unknown,
    Free,
    Blocked,
}

/// Lazily classified search grid for one request.
struct Grid<'a> {
    snapshot:  &'a ObstacleSnapshot,
    origin:    Vec2,
    cell:      f32,
    width:     usize,
    depth:     usize,
    clearance: f32,
    band:      (f32, f32),
    state:     Vec<CellState>,
    /// The search tried to step off the grid at least once.
    edge_reached: bool,
}

impl<'a> Grid<'a> {
    fn new(planner: &GridPlanner, request: &PathRequest, snapshot: &'a ObstacleSnapshot, margin: f32) -> Self {
        let (s, g) = (ground(request.start), ground(request.goal));
        let margin = Vec2::splat(margin);
        let lo = s.min(g) - margin;
        let hi = s.max(g) + margin;
        let extent = (hi - lo).max(Vec2::splat(MIN_CELL_SIZE));

        let mut cell = planner.cell_size.max(MIN_CELL_SIZE);
        let area_cells = (extent.x / cell).ceil() * (extent.y / cell).ceil();
        if area_cells > MAX_GRID_CELLS as f32 {
            cell = (extent.x * extent.y / MAX_GRID_CELLS as f32).sqrt();
        }
        let width = ((extent.x / cell).ceil() as usize).max(1);
        let depth = ((extent.y / cell).ceil() as usize).max(1);

        let base = request.start.y.min(request.goal.y);
        let top = request.start.y.max(request.goal.y) + request.constraints.agent_height;
        Self {
            snapshot,
            origin: lo,
            cell,
            width,
            depth,
            clearance: request.constraints.agent_radius.max(0.0),
            band: (base + FLOOR_CLEARANCE, top),
            state: vec![CellState::Unknown; width * depth],
            edge_reached: false,
        }
    }

    /// `true` when all of `bounds`, inflated by the clearance and one cell,
    /// lies inside the grid, so nothing outside it can open a route.
    fn encloses(&self, bounds: Option<Aabb>) -> bool {
        let Some(bounds) = bounds else { return true };
        let b = bounds.expanded(self.clearance + self.cell);
        let hi = self.origin + Vec2::new(self.width as f32, self.depth as f32) * self.cell;
        self.origin.x <= b.min.x && self.origin.y <= b.min.z && hi.x >= b.max.x && hi.y >= b.max.z
    }

    #[inline]
    fn coords(&self, cell: usize) -> (usize, usize) {
        (cell % self.width, cell / self.width)
    }

    fn cell_of(&self, p: Vec2) -> usize {
        let local = (p - self.origin) / self.cell;
        let x = (local.x.floor().max(0.0) as usize).min(self.width - 1);
        let z = (local.y.floor().max(0.0) as usize).min(self.depth - 1);
        z * self.width + x
    }

    fn center(&self, cell: usize) -> Vec2 {
        let (x, z) = self.coords(cell);
        self.origin + Vec2::new(x as f32 + 0.5, z as f32 + 0.5) * self.cell
    }

    fn offset(&self, x: usize, z: usize, dx: i32, dz: i32) -> Option<usize> {
        let nx = x.checked_add_signed(dx as isize)?;
        let nz = z.checked_add_signed(dz as isize)?;
        (nx < self.width && nz < self.depth).then_some(nz * self.width + nx)
    }

    /// Octile distance in cost units.
    fn heuristic(&self, from: usize, to: usize) -> u32 {
        let (ax, az) = self.coords(from);
        let (bx, bz) = self.coords(to);
        let dx = ax.abs_diff(bx) as u32;
        let dz = az.abs_diff(bz) as u32;
        STRAIGHT_COST * dx.max(dz) + (DIAGONAL_COST - STRAIGHT_COST) * dx.min(dz)
    }

    fn force_free(&mut self, cell: usize) {
        self.state[cell] = CellState::Free;
    }

    fn blocked(&mut self, cell: usize) -> bool {
        match self.state[cell] {
            CellState::Free => false,
            CellState::Blocked => true,
            CellState::Unknown => {
                let blocked = self.point_blocked(self.center(cell));
                self.state[cell] = if blocked { CellState::Blocked } else { CellState::Free };
                blocked
            }
        }
    }

    fn point_blocked(&self, p: Vec2) -> bool {
        let r = self.clearance;
        let region = Aabb::new(
            Vec3::new(p.x - r, self.band.0, p.y - r),
            Vec3::new(p.x + r, self.band.1, p.y + r),
        );
        self.snapshot
            .triangles_in(&region)
            .into_iter()
            .any(|(_, tri)| footprint_distance_sq(tri, p) <= r * r)
    }

    fn to_path(&self, cells: &[usize], request: &PathRequest) -> Path {
        let mut kept: Vec<usize> = Vec::with_capacity(cells.len());
        let start = self.cell_of(ground(request.start));
        let step = |a: usize, b: usize| {
            let (ax, az) = self.coords(a);
            let (bx, bz) = self.coords(b);
            (bx as i64 - ax as i64, bz as i64 - az as i64)
        };
        for i in 0..cells.len() {
            let prev = if i == 0 { start } else { cells[i - 1] };
            let is_last = i + 1 == cells.len();
            if is_last || step(prev, cells[i]) != step(cells[i], cells[i + 1]) {
                kept.push(cells[i]);
            }
        }

        let n = kept.len();
        let waypoints = kept
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if i + 1 == n {
                    request.goal
                } else {
                    let t = (i + 1) as f32 / n as f32;
                    let y = request.start.y + (request.goal.y - request.start.y) * t;
                    let p = self.center(c);
                    Vec3::new(p.x, y, p.y)
                }
            })
            .collect();
        Path::new(waypoints)
    }
}

// ── Footprint geometry ────────────────────────────────────────────────────────

/// Squared XZ distance from `p` to the triangle's ground footprint.
fn footprint_distance_sq(tri: &Triangle, p: Vec2) -> f32 {
    let (a, b, c) = (ground(tri.a), ground(tri.b), ground(tri.c));
    let area2 = (b - a).perp_dot(c - a);
    if area2.abs() > f32::EPSILON {
        let d1 = (b - a).perp_dot(p - a);
        let d2 = (c - b).perp_dot(p - b);
        let d3 = (a - c).perp_dot(p - c);
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        if !(has_neg && has_pos) {
            return 0.0;
        }
    }
    segment_distance_sq(p, a, b)
        .min(segment_distance_sq(p, b, c))
        .min(segment_distance_sq(p, c, a))
}

fn segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > 0.0 { ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
    (a + ab * t - p).length_squared()
}
