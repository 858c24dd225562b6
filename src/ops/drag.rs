use std::time::{Duration, Instant};

use tracing::debug;

use crate::model::ItemId;

/// Ephemeral state of an in-progress drag.
///
/// While active, the dragged item's subtree is hidden from the visible
/// projection. The collapsing id is never persisted; it is cleared on drop,
/// cancel, a competing interaction, or once `timeout` has elapsed, so a lost
/// drop signal cannot leave the projection collapsed.
#[derive(Debug, Clone)]
pub struct DragSession {
    active: Option<ActiveDrag>,
    timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDrag {
    pub item: ItemId,
    /// Row of the item in the projection when the drag began
    pub source_row: usize,
    pub started: Instant,
}

impl DragSession {
    pub fn new(timeout: Duration) -> Self {
        DragSession {
            active: None,
            timeout,
        }
    }

    /// Start dragging `item`. Any drag already in progress is dropped.
    pub fn begin(&mut self, item: ItemId, source_row: usize, now: Instant) {
        if let Some(prev) = self.active.take() {
            debug!(item = %prev.item, "drag superseded by a new drag");
        }
        self.active = Some(ActiveDrag {
            item,
            source_row,
            started: now,
        });
    }

    /// The id whose subtree should be hidden right now, if any.
    /// Expired drags read as no drag.
    pub fn collapsing_id(&self, now: Instant) -> Option<ItemId> {
        self.current(now).map(|d| d.item)
    }

    /// The active drag, unless it has timed out
    pub fn current(&self, now: Instant) -> Option<ActiveDrag> {
        self.active
            .filter(|d| now.saturating_duration_since(d.started) < self.timeout)
    }

    /// Clear the drag if it has outlived the timeout. Returns true if it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.active.is_some() && self.current(now).is_none() {
            if let Some(stale) = self.active.take() {
                debug!(item = %stale.item, "drag timed out");
            }
            return true;
        }
        false
    }

    /// End the drag for a drop. Returns the drag if it was still live;
    /// the session is cleared either way.
    pub fn finish(&mut self, now: Instant) -> Option<ActiveDrag> {
        let live = self.current(now);
        self.active = None;
        live
    }

    /// Abandon the drag (gesture cancelled, or another interaction started)
    pub fn cancel(&mut self) {
        if let Some(d) = self.active.take() {
            debug!(item = %d.item, "drag cancelled");
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.current(now).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(3);

    #[test]
    fn test_begin_sets_collapsing_id() {
        let now = Instant::now();
        let mut drag = DragSession::new(TIMEOUT);
        assert_eq!(drag.collapsing_id(now), None);
        drag.begin(ItemId(4), 2, now);
        assert_eq!(drag.collapsing_id(now), Some(ItemId(4)));
        assert_eq!(drag.current(now).unwrap().source_row, 2);
    }

    #[test]
    fn test_finish_clears() {
        let now = Instant::now();
        let mut drag = DragSession::new(TIMEOUT);
        drag.begin(ItemId(4), 2, now);
        let d = drag.finish(now + Duration::from_millis(10)).unwrap();
        assert_eq!(d.item, ItemId(4));
        assert!(!drag.is_active(now));
        assert!(drag.finish(now).is_none());
    }

    #[test]
    fn test_cancel_clears() {
        let now = Instant::now();
        let mut drag = DragSession::new(TIMEOUT);
        drag.begin(ItemId(4), 0, now);
        drag.cancel();
        assert_eq!(drag.collapsing_id(now), None);
    }

    #[test]
    fn test_competing_drag_replaces() {
        let now = Instant::now();
        let mut drag = DragSession::new(TIMEOUT);
        drag.begin(ItemId(4), 0, now);
        drag.begin(ItemId(5), 3, now);
        assert_eq!(drag.collapsing_id(now), Some(ItemId(5)));
    }

    #[test]
    fn test_timeout_expires_collapse() {
        let now = Instant::now();
        let mut drag = DragSession::new(TIMEOUT);
        drag.begin(ItemId(4), 0, now);
        let later = now + TIMEOUT;
        assert_eq!(drag.collapsing_id(later), None);
        assert!(drag.finish(later).is_none());

        drag.begin(ItemId(4), 0, now);
        assert!(!drag.expire(now + Duration::from_secs(1)));
        assert!(drag.expire(later));
        assert!(!drag.expire(later));
        assert!(!drag.is_active(now));
    }
}
