use danmaku_protocol::Comment;

/// Monotonic read position in a source sorted ascending by `time_ms`.
///
/// Everything before `next` has been emitted. The source's ordering is a
/// precondition and is not re-checked here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionCursor {
    next: usize,
}

impl IngestionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the last emitted comment, if any.
    pub fn last_emitted(&self) -> Option<usize> {
        self.next.checked_sub(1)
    }

    /// Index the next call to [`Self::next_due`] will look at.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Emit the next comment whose arrival time has been reached, in source
    /// order. Stops at the first comment still in the future.
    pub fn next_due(&mut self, source: &[Comment], now_ms: u64) -> Option<usize> {
        let comment = source.get(self.next)?;
        if comment.time_ms > now_ms {
            return None;
        }
        let idx = self.next;
        self.next += 1;
        Some(idx)
    }

    /// Reposition so the next emitted comment is the first one with
    /// `time_ms >= target_ms`.
    pub fn seek(&mut self, source: &[Comment], target_ms: u64) {
        self.next = source.partition_point(|c| c.time_ms < target_ms);
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}
