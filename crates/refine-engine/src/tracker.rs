//! Live-region offset tracking under concurrent edits
//!
//! While a stream is being written into a document the user may keep
//! editing elsewhere. The tracker owns one contiguous region and keeps
//! its boundaries correct across those foreign edits. It is only told
//! about foreign edits; its own writes are reported via [`OffsetTracker::after_write`].

use std::ops::Range;

use tracing::trace;

use crate::document::EditEvent;

/// The live document region currently owned by a writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveAnchor {
    pub start: usize,
    pub end: usize,
}

/// Tracks one contiguous region through foreign edits.
///
/// Invariant: `start <= end` and both boundaries stay within the
/// document. A foreign deletion covering the whole region collapses it to
/// an empty region; the next write inserts at that point.
#[derive(Debug)]
pub struct OffsetTracker {
    anchor: Option<LiveAnchor>,
}

impl OffsetTracker {
    /// Start tracking an empty region at `at`
    pub fn new(at: usize) -> Self {
        Self {
            anchor: Some(LiveAnchor { start: at, end: at }),
        }
    }

    /// Current anchor, `None` once detached
    pub fn anchor(&self) -> Option<LiveAnchor> {
        self.anchor
    }

    /// Current region as a range, `None` once detached
    pub fn range(&self) -> Option<Range<usize>> {
        self.anchor.map(|a| a.start..a.end)
    }

    /// Whether the tracker has been detached
    pub fn is_detached(&self) -> bool {
        self.anchor.is_none()
    }

    /// Adjust both boundaries for one foreign edit.
    ///
    /// For a boundary `B` with `offset < B`: the part of the deletion that
    /// fell before `B` pulls it back, capped at the edit position, and the
    /// insertion pushes it forward. Edits at or after a boundary leave it
    /// alone. Simultaneous multi-cursor edits must be delivered as
    /// separate sequential events.
    pub fn on_external_edit(&mut self, event: &EditEvent) {
        let Some(anchor) = self.anchor.as_mut() else {
            return;
        };
        anchor.start = shift(anchor.start, event);
        anchor.end = shift(anchor.end, event);
        trace!(
            "anchor now {}..{} after edit at {} (-{} +{})",
            anchor.start,
            anchor.end,
            event.offset,
            event.deleted_len,
            event.inserted_len
        );
        debug_assert!(anchor.start <= anchor.end);
    }

    /// After the writer replaced the region, it spans exactly the written
    /// text
    pub fn after_write(&mut self, written_len: usize) {
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.end = anchor.start + written_len;
        }
    }

    /// Stop tracking; the region is no longer owned by any writer
    pub fn detach(&mut self) {
        self.anchor = None;
    }
}

fn shift(boundary: usize, event: &EditEvent) -> usize {
    if event.offset >= boundary {
        return boundary;
    }
    // Deletion overshoot past the boundary does not move it further back.
    let consumed = (event.offset + event.deleted_len).saturating_sub(boundary);
    (boundary + event.inserted_len + consumed).saturating_sub(event.deleted_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn edit(offset: usize, deleted_len: usize, inserted_len: usize) -> EditEvent {
        EditEvent {
            offset,
            deleted_len,
            inserted_len,
        }
    }

    #[test]
    fn edits_before_the_region_shift_it() {
        let mut tracker = OffsetTracker::new(10);
        tracker.after_write(5); // region 10..15

        tracker.on_external_edit(&edit(2, 0, 4));
        assert_eq!(tracker.range(), Some(14..19));

        tracker.on_external_edit(&edit(0, 3, 0));
        assert_eq!(tracker.range(), Some(11..16));
    }

    #[test]
    fn edits_after_the_region_leave_it_alone() {
        let mut tracker = OffsetTracker::new(10);
        tracker.after_write(5);

        tracker.on_external_edit(&edit(15, 3, 7));
        assert_eq!(tracker.range(), Some(10..15));

        // An insertion exactly at the end boundary stays outside.
        tracker.on_external_edit(&edit(15, 0, 2));
        assert_eq!(tracker.range(), Some(10..15));
    }

    #[test]
    fn straddling_deletions_shrink_the_region() {
        let mut tracker = OffsetTracker::new(10);
        tracker.after_write(5); // region 10..15

        // Deletes 8..13: two bytes before the start, three inside.
        tracker.on_external_edit(&edit(8, 5, 0));
        assert_eq!(tracker.range(), Some(8..10));
    }

    #[test]
    fn deleting_the_whole_region_collapses_it() {
        let mut tracker = OffsetTracker::new(10);
        tracker.after_write(5);

        tracker.on_external_edit(&edit(5, 20, 0));
        assert_eq!(tracker.range(), Some(5..5));
    }

    #[test]
    fn edits_inside_the_region_move_only_the_end() {
        let mut tracker = OffsetTracker::new(10);
        tracker.after_write(5); // region 10..15

        tracker.on_external_edit(&edit(12, 1, 4));
        assert_eq!(tracker.range(), Some(10..18));
    }

    #[test]
    fn writes_resize_the_region_without_edit_semantics() {
        let mut tracker = OffsetTracker::new(7);
        tracker.after_write(3);
        assert_eq!(tracker.range(), Some(7..10));
        tracker.after_write(12);
        assert_eq!(tracker.range(), Some(7..19));
    }

    #[test]
    fn detached_trackers_ignore_everything() {
        let mut tracker = OffsetTracker::new(3);
        tracker.detach();
        assert!(tracker.is_detached());

        tracker.on_external_edit(&edit(0, 0, 10));
        tracker.after_write(5);
        assert_eq!(tracker.range(), None);
    }

    proptest! {
        /// Under any interleaving of foreign edits and writes the anchor
        /// stays ordered and inside the document.
        #[test]
        fn anchor_stays_ordered_and_in_bounds(
            initial_len in 0usize..200,
            ops in prop::collection::vec(
                (0usize..200, 0usize..50, 0usize..50, prop::bool::ANY),
                0..40,
            ),
        ) {
            let mut doc_len = initial_len;
            let mut tracker = OffsetTracker::new(doc_len / 2);

            for (offset, deleted, inserted, is_write) in ops {
                if is_write {
                    // Writes replace the tracked region with `inserted`
                    // bytes of new text.
                    if let Some(range) = tracker.range() {
                        doc_len = doc_len - (range.end - range.start) + inserted;
                        tracker.after_write(inserted);
                    }
                } else {
                    let offset = offset.min(doc_len);
                    let deleted = deleted.min(doc_len - offset);
                    doc_len = doc_len - deleted + inserted;
                    tracker.on_external_edit(&edit(offset, deleted, inserted));
                }

                if let Some(anchor) = tracker.anchor() {
                    prop_assert!(anchor.start <= anchor.end);
                    prop_assert!(anchor.end <= doc_len);
                }
            }
        }
    }
}
