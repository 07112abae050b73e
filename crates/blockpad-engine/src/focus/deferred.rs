//! Deferred focus requests.
//!
//! A block created a moment ago is not in the document until the view layer
//! commits its next render. Requests wait two animation frames (one is not
//! enough to cover a commit scheduled by the current frame), or until the
//! view layer reports a commit, whichever comes first.

use std::cell::Cell;
use std::rc::Rc;

use crate::focus::{FocusEvent, FocusOptions};
use crate::model::BlockId;

pub const FRAMES_BEFORE_FOCUS: u8 = 2;

/// Cancels one deferred request. Cancelling after it ran is a no-op.
#[derive(Debug, Clone)]
pub struct DeferredHandle {
    cancelled: Rc<Cell<bool>>,
}

impl DeferredHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DeferredFocus {
    pub block_id: BlockId,
    pub event: FocusEvent,
    pub options: FocusOptions,
    frames_remaining: u8,
    cancelled: Rc<Cell<bool>>,
}

#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    entries: Vec<DeferredFocus>,
}

impl DeferredQueue {
    pub fn push(&mut self, block_id: BlockId, event: FocusEvent, options: FocusOptions) -> DeferredHandle {
        let cancelled = Rc::new(Cell::new(false));
        self.entries.push(DeferredFocus {
            block_id,
            event,
            options,
            frames_remaining: FRAMES_BEFORE_FOCUS,
            cancelled: Rc::clone(&cancelled),
        });
        DeferredHandle { cancelled }
    }

    /// Count one animation frame down and hand out the requests now due
    pub fn tick(&mut self) -> Vec<DeferredFocus> {
        for entry in &mut self.entries {
            entry.frames_remaining = entry.frames_remaining.saturating_sub(1);
        }
        self.take_where(|entry| entry.frames_remaining == 0)
    }

    /// Hand out every request regardless of remaining frames
    pub fn drain(&mut self) -> Vec<DeferredFocus> {
        self.take_where(|_| true)
    }

    pub fn cancel_block(&mut self, block_id: BlockId) {
        for entry in &self.entries {
            if entry.block_id == block_id {
                entry.cancelled.set(true);
            }
        }
        self.entries.retain(|entry| entry.block_id != block_id);
    }

    /// Requests still waiting that have not been cancelled
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.cancelled.get())
            .count()
    }

    fn take_where(&mut self, due: impl Fn(&DeferredFocus) -> bool) -> Vec<DeferredFocus> {
        let (ready, waiting): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(|entry| due(entry));
        self.entries = waiting;
        ready
            .into_iter()
            .filter(|entry| !entry.cancelled.get())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_wait_two_frames() {
        let mut queue = DeferredQueue::default();
        queue.push(BlockId(1), FocusEvent::Created, FocusOptions::default());
        assert!(queue.tick().is_empty());
        let due = queue.tick();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].block_id, BlockId(1));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_later_request_waits_its_own_frames() {
        let mut queue = DeferredQueue::default();
        queue.push(BlockId(1), FocusEvent::Created, FocusOptions::default());
        queue.tick();
        queue.push(BlockId(2), FocusEvent::Split, FocusOptions::default());
        let due: Vec<_> = queue.tick().into_iter().map(|entry| entry.block_id).collect();
        assert_eq!(due, vec![BlockId(1)]);
        let due: Vec<_> = queue.tick().into_iter().map(|entry| entry.block_id).collect();
        assert_eq!(due, vec![BlockId(2)]);
    }

    #[test]
    fn test_cancelled_request_never_fires() {
        let mut queue = DeferredQueue::default();
        let handle = queue.push(BlockId(1), FocusEvent::Created, FocusOptions::default());
        handle.cancel();
        assert_eq!(queue.len(), 0);
        queue.tick();
        assert!(queue.tick().is_empty());
    }

    #[test]
    fn test_cancel_block_drops_its_requests() {
        let mut queue = DeferredQueue::default();
        let handle = queue.push(BlockId(1), FocusEvent::Created, FocusOptions::default());
        queue.push(BlockId(2), FocusEvent::Created, FocusOptions::default());
        queue.cancel_block(BlockId(1));
        assert!(handle.is_cancelled());
        let due: Vec<_> = queue.drain().into_iter().map(|entry| entry.block_id).collect();
        assert_eq!(due, vec![BlockId(2)]);
    }
}
