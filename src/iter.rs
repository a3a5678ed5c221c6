//! Iterator adapters that report progress on a child node.
//!
//! [`ProgressIteratorExt::progress_in`] spawns a child of the given node and ticks it once
//! per item:
//!
//! * If [`Iterator::size_hint`] is exact, the child gets a bar with that total.
//! * Otherwise the child is indeterminate and shows the number of items seen so far.
//!
//! ```
//! use tree_progress::{ProgressIteratorExt, ProgressNode};
//!
//! let root = ProgressNode::new("Hashing");
//! let sum: u32 = [1, 2, 3].into_iter().progress_in(&root).sum();
//!
//! assert_eq!(sum, 6);
//! assert!(root.children()[0].is_complete());
//! ```

use crate::ProgressNode;

/// An iterator adapter that ticks a node on every item.
pub struct ProgressIter<I> {
    iter: I,
    node: ProgressNode,
}

impl<I> ProgressIter<I> {
    /// Creates a new `ProgressIter`.
    ///
    /// Usually constructed via [`ProgressIteratorExt`].
    pub const fn new(iter: I, node: ProgressNode) -> Self {
        Self { iter, node }
    }

    /// Returns the node being ticked.
    pub const fn node(&self) -> &ProgressNode {
        &self.node
    }
}

impl<I: Iterator> Iterator for ProgressIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next()?;
        if self.node.shows_bar() {
            self.node.tick();
        } else {
            let seen = self.node.current() + 1;
            self.node.tick_with_message(format!("{seen} items"));
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to attach progress reporting to any Iterator.
pub trait ProgressIteratorExt: Iterator + Sized {
    /// Spawns a child of `parent` sized from `size_hint` and ticks it per item.
    fn progress_in(self, parent: &ProgressNode) -> ProgressIter<Self> {
        let child = match self.size_hint() {
            (lower, Some(upper)) if lower == upper => parent.spawn(upper as u64),
            _ => parent.spawn_indeterminate(),
        };
        ProgressIter::new(self, child)
    }

    /// Ticks an existing node per item.
    fn progress_with(self, node: ProgressNode) -> ProgressIter<Self> {
        ProgressIter::new(self, node)
    }
}

impl<I: Iterator> ProgressIteratorExt for I {}
