//! Linear programs over ORCA half-planes bounded by a speed disk.
//!
//! `solve_2d` finds the point of the feasible region closest to the
//! optimisation velocity.  When the region is empty, `solve_3d` takes over
//! from the first failing line and minimises the largest violation instead,
//! which always yields some velocity inside the speed disk.

use nv_core::Vec2;

use crate::{EPSILON, OrcaLine};

/// Optimise along line `line_no`, respecting lines `0..line_no` and the disk.
///
/// With `direction_opt`, `opt` is a direction to go as far as possible in;
/// otherwise the result is the point on the line closest to `opt`.
fn solve_1d(
    lines: &[OrcaLine],
    line_no: usize,
    radius: f32,
    opt: Vec2,
    direction_opt: bool,
) -> Option<Vec2> {
    let line = &lines[line_no];
    let dot = line.point.dot(line.direction);
    let discriminant = dot * dot + radius * radius - line.point.length_squared();
    if discriminant < 0.0 {
        // The line misses the speed disk entirely.
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let mut t_left = -dot - sqrt_disc;
    let mut t_right = -dot + sqrt_disc;

    for other in &lines[..line_no] {
        let denominator = line.direction.perp_dot(other.direction);
        let numerator = other.direction.perp_dot(line.point - other.point);

        if denominator.abs() <= EPSILON {
            // Parallel boundaries.
            if numerator < 0.0 {
                return None;
            }
            continue;
        }

        let t = numerator / denominator;
        if denominator >= 0.0 {
            t_right = t_right.min(t);
        } else {
            t_left = t_left.max(t);
        }
        if t_left > t_right {
            return None;
        }
    }

    let t = if direction_opt {
        if opt.dot(line.direction) > 0.0 { t_right } else { t_left }
    } else {
        line.direction.dot(opt - line.point).clamp(t_left, t_right)
    };
    Some(line.point + line.direction * t)
}

/// Closest point to `opt` satisfying every line and `|v| <= radius`.
///
/// Returns the best velocity found and the index of the first line that
/// could not be satisfied (`lines.len()` on success).
pub fn solve_2d(lines: &[OrcaLine], radius: f32, opt: Vec2, direction_opt: bool) -> (Vec2, usize) {
    let mut result = if direction_opt {
        // `opt` is a unit direction here.
        opt * radius
    } else if opt.length_squared() > radius * radius {
        opt.normalize_or_zero() * radius
    } else {
        opt
    };

    for i in 0..lines.len() {
        if lines[i].violation(result) > 0.0 {
            match solve_1d(lines, i, radius, opt, direction_opt) {
                Some(v) => result = v,
                None => return (result, i),
            }
        }
    }
    (result, lines.len())
}

/// Relax lines `begin..` to minimise the maximum violation.
///
/// Used only after [`solve_2d`] failed at `begin`; `current` is its partial
/// result.
pub fn solve_3d(lines: &[OrcaLine], begin: usize, radius: f32, current: Vec2) -> Vec2 {
    let mut result = current;
    let mut distance = 0.0_f32;
    let mut projected: Vec<OrcaLine> = Vec::with_capacity(lines.len());

    for i in begin..lines.len() {
        if lines[i].violation(result) <= distance {
            continue;
        }

        projected.clear();
        for j in 0..i {
            let determinant = lines[i].direction.perp_dot(lines[j].direction);
            let point = if determinant.abs() <= EPSILON {
                if lines[i].direction.dot(lines[j].direction) > 0.0 {
                    // Same direction: line j adds nothing here.
                    continue;
                }
                (lines[i].point + lines[j].point) * 0.5
            } else {
                let t = lines[j].direction.perp_dot(lines[i].point - lines[j].point) / determinant;
                lines[i].point + lines[i].direction * t
            };
            let direction = (lines[j].direction - lines[i].direction).normalize_or_zero();
            projected.push(OrcaLine { point, direction });
        }

        let previous = result;
        let towards = Vec2::new(-lines[i].direction.y, lines[i].direction.x);
        let (candidate, failed_at) = solve_2d(&projected, radius, towards, true);
        // Failure here only comes from rounding; keep the previous point.
        result = if failed_at < projected.len() { previous } else { candidate };
        distance = lines[i].violation(result);
    }
    result
}
