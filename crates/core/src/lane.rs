use danmaku_protocol::CommentKind;

use crate::active_list::ActiveList;
use crate::overlap;
use crate::placed::PlacedComment;

/// One horizontal placement slot.
///
/// Scroll and fixed comments share the `active` list; a lane holds at most
/// one fixed comment, tracked by `has_fixed_occupant`. Admission writes into
/// `pending` and the frame step moves it into `active`, so admission never
/// touches a list that may be mid-traversal.
#[derive(Debug, Default)]
pub struct Lane {
    pub index: usize,
    /// Top of the lane in viewport pixels.
    pub y: f64,
    has_fixed_occupant: bool,
    pending: Option<PlacedComment>,
    active: ActiveList<PlacedComment>,
}

impl Lane {
    pub fn new(index: usize, y: f64) -> Self {
        Self {
            index,
            y,
            ..Self::default()
        }
    }

    pub fn has_fixed_occupant(&self) -> bool {
        self.has_fixed_occupant
    }

    pub fn pending(&self) -> Option<&PlacedComment> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn active(&self) -> &ActiveList<PlacedComment> {
        &self.active
    }

    pub(crate) fn active_mut(&mut self) -> &mut ActiveList<PlacedComment> {
        &mut self.active
    }

    /// Most recently admitted scrolling comment still in the lane.
    pub fn last_scroll_occupant(&self) -> Option<&PlacedComment> {
        self.active.iter().rev().find(|p| p.is_scroll())
    }

    pub fn can_admit_fixed(&self) -> bool {
        !self.has_fixed_occupant && self.pending.is_none()
    }

    /// Whether `candidate` (a scroll comment spawning at its entry edge)
    /// can enter this lane now.
    pub fn can_admit_scroll(
        &self,
        candidate: &PlacedComment,
        viewport_width: f64,
        avoid_overlap: bool,
    ) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let Some(last) = self.last_scroll_occupant() else {
            return true;
        };
        if last.has_exited(viewport_width) {
            return true;
        }
        // Opposite directions are bound to cross.
        if last.direction() != candidate.direction() {
            return false;
        }
        if !last.has_fully_entered(viewport_width) {
            return false;
        }
        !avoid_overlap
            || !overlap::will_overlap(
                &last.kinematics(viewport_width),
                candidate.speed,
                viewport_width,
            )
    }

    /// Stage `placed` for the next frame. The caller has checked
    /// admissibility; a fixed comment claims the lane immediately.
    pub(crate) fn stage(&mut self, mut placed: PlacedComment) {
        debug_assert!(self.pending.is_none(), "lane {} staged twice", self.index);
        placed.lane = self.index;
        if !placed.is_scroll() {
            self.has_fixed_occupant = true;
        }
        self.pending = Some(placed);
    }

    /// Move the staged comment into `active`. Returns whether one was staged.
    pub(crate) fn commit_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(placed) => {
                self.active.push_back(placed);
                true
            }
            None => false,
        }
    }

    pub(crate) fn release_fixed(&mut self) {
        self.has_fixed_occupant = false;
    }

    /// Empty the lane, returning everything it held.
    pub(crate) fn drain(&mut self) -> Vec<PlacedComment> {
        let mut out = self.active.take_all();
        out.extend(self.pending.take());
        self.has_fixed_occupant = false;
        out
    }

    /// Empty the lane, dropping everything it held.
    pub(crate) fn clear(&mut self) {
        self.active = ActiveList::new();
        self.pending = None;
        self.has_fixed_occupant = false;
    }

    pub fn len(&self) -> usize {
        self.active.len() + usize::from(self.pending.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The ordered lanes covering the viewport.
#[derive(Debug, Default)]
pub struct LaneSet {
    lanes: Vec<Lane>,
    line_height: f64,
    margin: f64,
}

impl LaneSet {
    /// Lay out as many lanes of `line_height` as fit strictly inside
    /// `viewport_height`, up to `max_lanes`, spreading the leftover height
    /// evenly above and below each lane.
    pub fn measure(viewport_height: f64, line_height: f64, max_lanes: usize) -> Self {
        let mut count = 0usize;
        let mut total = 0.0;
        if line_height > 0.0 {
            while total + line_height < viewport_height && count < max_lanes {
                total += line_height;
                count += 1;
            }
        }
        if count == 0 {
            tracing::debug!(viewport_height, line_height, "viewport fits no lanes");
            return Self {
                lanes: Vec::new(),
                line_height,
                margin: 0.0,
            };
        }

        let margin = (viewport_height - total) / (count as f64 * 2.0);
        let lanes = (0..count)
            .map(|i| Lane::new(i, margin + i as f64 * (line_height + 2.0 * margin)))
            .collect();
        tracing::debug!(count, line_height, margin, "measured lanes");
        Self {
            lanes,
            line_height,
            margin,
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Lane> {
        self.lanes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Lane> {
        self.lanes.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Lane> {
        self.lanes.get_mut(index)
    }

    /// Pick the lane for `candidate`, or `None` if no lane can take it.
    ///
    /// Scroll comments and top-fixed comments take the lowest admissible
    /// index; bottom-fixed comments scan from the bottom up, so the two fixed
    /// families fill the screen from opposite ends.
    pub fn find_lane(
        &self,
        candidate: &PlacedComment,
        viewport_width: f64,
        avoid_overlap: bool,
    ) -> Option<usize> {
        match candidate.kind()? {
            CommentKind::ScrollR2L | CommentKind::ScrollL2R => self
                .lanes
                .iter()
                .position(|l| l.can_admit_scroll(candidate, viewport_width, avoid_overlap)),
            CommentKind::TopFixed => self.lanes.iter().position(Lane::can_admit_fixed),
            CommentKind::BottomFixed => self.lanes.iter().rposition(Lane::can_admit_fixed),
        }
    }

    /// Empty every lane, returning everything they held.
    pub(crate) fn drain(&mut self) -> Vec<PlacedComment> {
        self.lanes.iter_mut().flat_map(Lane::drain).collect()
    }

    /// Empty every lane without handing back what they held.
    pub(crate) fn clear(&mut self) {
        self.lanes.iter_mut().for_each(Lane::clear);
    }

    pub fn live_count(&self) -> usize {
        self.lanes.iter().map(Lane::len).sum()
    }
}
