//! Append-only child list shared between spawning producers and the renderer.
//!
//! # Synchronization Strategy
//!
//! The list is protected by a coarse-grained [`RwLock`](parking_lot::RwLock). Counter and
//! message updates on the children themselves never touch this lock.
//!
//! * **Producers:** Take the write lock only for the duration of a single `push`.
//! * **Renderer:** Takes a read lock once per node per frame to clone the handles, then walks
//!   the clones without holding anything.

use std::fmt;

use parking_lot::RwLock;

use crate::ProgressNode;

/// A thread-safe, insertion-ordered sequence of child nodes that only ever grows.
#[derive(Default)]
pub(crate) struct ChildList {
    inner: RwLock<Vec<ProgressNode>>,
}

impl fmt::Debug for ChildList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildList")
            .field("count", &self.len())
            .finish()
    }
}

impl ChildList {
    pub(crate) fn push(&self, child: ProgressNode) {
        self.inner.write().push(child);
    }

    /// Clones the current handles in insertion order.
    pub(crate) fn items(&self) -> Vec<ProgressNode> {
        self.inner.read().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::ChildList;
    use crate::ProgressNode;

    #[test]
    fn test_items_keep_insertion_order() {
        let list = ChildList::default();
        list.push(ProgressNode::new("a"));
        list.push(ProgressNode::new("b"));
        list.push(ProgressNode::new("c"));

        let messages: Vec<_> = list.items().iter().map(ProgressNode::message).collect();
        assert_eq!(messages, ["a", "b", "c"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_items_is_detached_copy() {
        let list = ChildList::default();
        list.push(ProgressNode::new("a"));

        let before = list.items();
        list.push(ProgressNode::new("b"));

        assert_eq!(before.len(), 1, "Old handle list should not grow");
        assert_eq!(list.items().len(), 2);
    }
}
