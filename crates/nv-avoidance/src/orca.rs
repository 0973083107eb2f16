//! ORCA half-plane construction.
//!
//! A line admits every velocity `v` with `det(direction, point - v) <= 0`,
//! i.e. the permitted half-plane lies to the left of `direction`.

use nv_core::Vec2;

use crate::EPSILON;

/// One half-plane constraint in velocity space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrcaLine {
    pub point:     Vec2,
    /// Unit direction of the boundary.
    pub direction: Vec2,
}

impl OrcaLine {
    /// Signed violation of `v`; positive means `v` is outside the half-plane.
    #[inline]
    pub fn violation(&self, v: Vec2) -> f32 {
        self.direction.perp_dot(self.point - v)
    }

    #[inline]
    pub fn admits(&self, v: Vec2) -> bool {
        self.violation(v) <= 0.0
    }
}

/// Relative state of one neighbour as seen from the agent.
#[derive(Copy, Clone, Debug)]
pub struct Encounter {
    /// Neighbour position minus agent position.
    pub relative_position: Vec2,
    /// Agent velocity minus neighbour velocity.
    pub relative_velocity: Vec2,
    pub combined_radius:   f32,
    /// Look-ahead horizon for this pair.
    pub tau:               f32,
    /// Share of the avoidance effort taken by the agent: 0.5 when both
    /// sides yield, 1.0 when the neighbour will not.
    pub responsibility:    f32,
    /// Escape direction used when the pair is exactly coincident.
    pub tie_break:         Vec2,
}

/// Build the ORCA line for `encounter`, given the agent's current velocity
/// and the simulation step `dt`.
///
/// Overlapping pairs use the step itself as the horizon so the line pushes
/// them apart within one step.
pub fn orca_line(encounter: &Encounter, velocity: Vec2, dt: f32) -> OrcaLine {
    let rp = encounter.relative_position;
    let rv = encounter.relative_velocity;
    let r = encounter.combined_radius;
    let dist_sq = rp.length_squared();
    let r_sq = r * r;

    let (direction, u) = if dist_sq > r_sq {
        let inv_tau = 1.0 / encounter.tau;
        // Vector from the cutoff centre to the relative velocity.
        let w = rv - rp * inv_tau;
        let w_len_sq = w.length_squared();
        let dot1 = w.dot(rp);

        if dot1 < 0.0 && dot1 * dot1 > r_sq * w_len_sq {
            // Closest boundary point lies on the cutoff circle.
            let w_len = w_len_sq.sqrt();
            let unit_w = w / w_len;
            (Vec2::new(unit_w.y, -unit_w.x), unit_w * (r * inv_tau - w_len))
        } else {
            // Closest boundary point lies on one of the cone legs.
            let leg = (dist_sq - r_sq).sqrt();
            let direction = if rp.perp_dot(w) > 0.0 {
                Vec2::new(rp.x * leg - rp.y * r, rp.x * r + rp.y * leg) / dist_sq
            } else {
                -Vec2::new(rp.x * leg + rp.y * r, -rp.x * r + rp.y * leg) / dist_sq
            };
            let dot2 = rv.dot(direction);
            (direction, direction * dot2 - rv)
        }
    } else {
        let inv_dt = 1.0 / dt;
        let w = rv - rp * inv_dt;
        let w_len = w.length();
        let unit_w = if w_len > EPSILON { w / w_len } else { encounter.tie_break };
        (Vec2::new(unit_w.y, -unit_w.x), unit_w * (r * inv_dt - w_len))
    };

    OrcaLine { point: velocity + u * encounter.responsibility, direction }
}
