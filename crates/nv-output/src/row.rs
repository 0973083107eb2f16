//! Plain data row types written by output backends.

/// One mover's kinematic state at the end of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoverPositionRow {
    pub tick:     u64,
    pub mover_id: u32,
    pub x:        f32,
    pub y:        f32,
    pub z:        f32,
    /// Length of the velocity applied this step.
    pub speed:    f32,
}

/// One navigation event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub tick:     u64,
    /// `u32::MAX` for events not tied to a mover.
    pub mover_id: u32,
    /// Stable event name, e.g. `waypoint_passed`.
    pub kind:     &'static str,
    /// Free-form, event-specific detail.
    pub detail:   String,
}
