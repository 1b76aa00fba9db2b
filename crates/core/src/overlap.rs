/// Position and motion of a scrolling comment along its direction of travel.
///
/// Coordinates are normalized so travel is always towards decreasing `x`:
/// the comment enters at `x = viewport_width` and has exited once
/// `x + width < 0`. Left-to-right comments are mirrored into this frame
/// before prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub x: f64,
    pub width: f64,
    /// Pixels per frame, always positive.
    pub speed: f64,
}

/// Frames until the occupant's trailing edge crosses the exit boundary.
pub fn exit_time(occupant: &Kinematics) -> f64 {
    (occupant.x + occupant.width) / occupant.speed
}

/// Frames until a candidate spawned at the entry edge with `candidate_speed`
/// reaches the occupant's trailing edge. Only meaningful when the candidate
/// is faster.
pub fn catch_up_time(occupant: &Kinematics, candidate_speed: f64, viewport_width: f64) -> f64 {
    (viewport_width - occupant.width - occupant.x) / (candidate_speed - occupant.speed)
}

/// Whether a candidate entering now would run into `occupant` before the
/// occupant leaves the viewport.
///
/// A slower or equally fast candidate never closes the gap, and an occupant
/// that has already left cannot be hit. Otherwise collision is predicted
/// only if catching up takes strictly less time than exiting; a tie admits.
pub fn will_overlap(occupant: &Kinematics, candidate_speed: f64, viewport_width: f64) -> bool {
    if candidate_speed <= occupant.speed || occupant.x + occupant.width < 0.0 {
        return false;
    }
    catch_up_time(occupant, candidate_speed, viewport_width) < exit_time(occupant)
}
