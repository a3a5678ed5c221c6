//! Core primitives for tracking progress state.
//!
//! This module defines [`ProgressNode`], a handle to one node of a progress tree. Like every
//! handle in this crate it is built around a "Hot/Cold" split:
//!
//! * **Hot Data:** `current` and `total` live in `Atomic` primitives, so producers can tick
//!   from tight loops on any number of threads without contention.
//! * **Cold Data:** The message text is guarded by its own [`RwLock`](parking_lot::RwLock),
//!   and the child list by another. Replacing the message never blocks a counter update and
//!   vice versa.
//!
//! Every mutation that changes what would be drawn asks the owning renderer for a redraw.
//! Requests are coalesced, so ticking never waits on the terminal.
//!
//! # Snapshots
//!
//! [`ProgressNode::snapshot`] copies the whole subtree into a [`NodeSnapshot`], an owned value
//! that can be inspected or drawn without holding any lock.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use compact_str::CompactString;
use parking_lot::RwLock;
use web_time::Instant;

use crate::{children::ChildList, signal::RedrawSignal};

/// Depth added to a child's indent relative to its parent.
pub(crate) const INDENT_STEP: usize = 2;

/// A thread-safe, cloneable handle to one node of a progress tree.
///
/// Cloning a `ProgressNode` is cheap (Arc bump) and points to the same underlying state.
///
/// # Examples
///
/// ```
/// use tree_progress::ProgressNode;
///
/// let root = ProgressNode::new("Downloading files...");
/// let file = root.spawn(3);
///
/// file.tick();
/// file.tick();
/// assert!(file.tick());
/// assert!(!file.tick(), "a finished node does not advance");
///
/// assert_eq!(file.current(), 3);
/// assert_eq!(root.height(), 1 + 2);
/// ```
#[derive(Clone)]
pub struct ProgressNode {
    inner: Arc<Inner>,
}

struct Inner {
    show_bar: bool,
    indent: usize,
    start: Instant,

    current: AtomicU64,
    total: AtomicU64,

    message: RwLock<CompactString>,
    children: ChildList,

    redraw: Arc<RedrawSignal>,
}

impl fmt::Debug for ProgressNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressNode")
            .field("message", &self.message())
            .field("current", &self.current())
            .field("total", &self.total())
            .field("show_bar", &self.inner.show_bar)
            .field("indent", &self.inner.indent)
            .field("children", &self.inner.children)
            .finish()
    }
}

impl ProgressNode {
    /// Creates a free-standing root node that is not attached to any renderer.
    ///
    /// The node and its descendants behave exactly like rendered ones; their redraw requests
    /// simply go nowhere. Use [`ProgressRenderer::create_root`](crate::ProgressRenderer::create_root)
    /// to get a node that is drawn on the terminal.
    #[must_use]
    pub fn new(message: impl Into<CompactString>) -> Self {
        Self::with_signal(
            message.into(),
            0,
            true,
            0,
            Arc::new(RedrawSignal::new()),
        )
    }

    pub(crate) fn root(message: CompactString, indent: usize, redraw: Arc<RedrawSignal>) -> Self {
        Self::with_signal(message, indent, true, 0, redraw)
    }

    fn with_signal(
        message: CompactString,
        indent: usize,
        show_bar: bool,
        total: u64,
        redraw: Arc<RedrawSignal>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                show_bar,
                indent,
                start: Instant::now(),
                current: AtomicU64::new(0),
                total: AtomicU64::new(total),
                message: RwLock::new(message),
                children: ChildList::default(),
                redraw,
            }),
        }
    }

    // ========================================================================
    // Ticking (Hot Path)
    // ========================================================================

    /// Advances `current` by one.
    ///
    /// Returns `false` once the node has reached its total: the counter stays clamped and no
    /// redraw is requested. Indeterminate nodes (`total == 0`) always advance.
    pub fn tick(&self) -> bool {
        self.advance(1)
    }

    /// Advances `current` by `amount`, clamped to the total.
    ///
    /// Returns whether the counter moved.
    pub fn advance(&self, amount: u64) -> bool {
        let changed = self.step(amount);
        if changed {
            self.request_redraw();
        }
        changed
    }

    /// Sets `current` to an absolute value, clamped to the total when one is known.
    ///
    /// Returns whether the stored value changed. Indeterminate nodes always report a change,
    /// since there is nothing to compare against.
    pub fn tick_to(&self, value: u64) -> bool {
        let changed = self.store(value);
        if changed {
            self.request_redraw();
        }
        changed
    }

    /// Sets `current` to an absolute value and replaces the message.
    ///
    /// Always requests a redraw: the message itself is progress.
    pub fn tick_to_with_message(&self, value: u64, message: impl Into<CompactString>) {
        self.store(value);
        self.replace_message(message.into());
        self.request_redraw();
    }

    /// Advances `current` by one and replaces the message.
    ///
    /// Always requests a redraw, even when the counter is already clamped.
    pub fn tick_with_message(&self, message: impl Into<CompactString>) {
        self.step(1);
        self.replace_message(message.into());
        self.request_redraw();
    }

    /// Replaces the message as a whole string.
    ///
    /// Readers observe either the old or the new text, never a mix.
    pub fn set_message(&self, message: impl Into<CompactString>) {
        self.replace_message(message.into());
        self.request_redraw();
    }

    /// Updates the target count.
    ///
    /// Lowering the total below `current` clamps `current`. Setting it to `0` turns the
    /// counter into an unbounded one.
    pub fn set_total(&self, total: u64) {
        self.inner.total.store(total, Ordering::SeqCst);
        if total > 0 {
            self.inner.current.fetch_min(total, Ordering::SeqCst);
        }
        self.request_redraw();
    }

    fn step(&self, amount: u64) -> bool {
        if amount == 0 {
            return false;
        }

        let limit = &self.inner.total;
        let advanced = self
            .inner
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                match limit.load(Ordering::SeqCst) {
                    0 => Some(current.saturating_add(amount)),
                    total if current < total => Some(current.saturating_add(amount).min(total)),
                    _ => None,
                }
            })
            .is_ok();
        self.clamp_to_total();
        advanced
    }

    fn store(&self, value: u64) -> bool {
        let total = self.inner.total.load(Ordering::SeqCst);
        let changed = if total == 0 {
            self.inner.current.swap(value, Ordering::SeqCst);
            true
        } else {
            let value = value.min(total);
            self.inner.current.swap(value, Ordering::SeqCst) != value
        };
        self.clamp_to_total();
        changed
    }

    /// Re-applies the total after a write that may have raced with [`set_total`](Self::set_total).
    ///
    /// Both sides write with `SeqCst` before reading the other's field, so at least one of
    /// them observes the other and clamps.
    fn clamp_to_total(&self) {
        let total = self.inner.total.load(Ordering::SeqCst);
        if total > 0 {
            self.inner.current.fetch_min(total, Ordering::SeqCst);
        }
    }

    fn replace_message(&self, message: CompactString) {
        *self.inner.message.write() = message;
    }

    fn request_redraw(&self) {
        self.inner.redraw.request();
    }

    // ========================================================================
    // Tree
    // ========================================================================

    /// Creates a child with a progress bar and the given total, and appends it to this node.
    ///
    /// A redraw is requested right away so the new child shows up before its first tick.
    #[must_use]
    pub fn spawn(&self, total: u64) -> Self {
        self.attach(true, total)
    }

    /// Creates a child without a bar, driven purely by message updates.
    #[must_use]
    pub fn spawn_indeterminate(&self) -> Self {
        self.attach(false, 0)
    }

    fn attach(&self, show_bar: bool, total: u64) -> Self {
        let child = Self::with_signal(
            CompactString::default(),
            self.inner.indent.saturating_add(INDENT_STEP),
            show_bar,
            total,
            Arc::clone(&self.inner.redraw),
        );
        self.inner.children.push(child.clone());
        self.request_redraw();
        child
    }

    /// Returns handles to the children, in insertion (and draw) order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.inner.children.items()
    }

    /// Number of terminal rows this node and all of its descendants occupy.
    ///
    /// Computed on every call so it always reflects children spawned in the meantime.
    #[must_use]
    pub fn height(&self) -> usize {
        own_height(self.inner.show_bar)
            + self
                .inner
                .children
                .items()
                .iter()
                .map(Self::height)
                .sum::<usize>()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Gets the current counter value.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.inner.current.load(Ordering::SeqCst)
    }

    /// Gets the target count. `0` means indeterminate.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::SeqCst)
    }

    /// Returns `current / total` in `0.0..=1.0`, or `0.0` for indeterminate nodes.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        fraction(self.current(), self.total())
    }

    /// Whether a known total has been reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let total = self.total();
        total > 0 && self.current() >= total
    }

    /// Gets a copy of the current message.
    #[must_use]
    pub fn message(&self) -> CompactString {
        self.inner.message.read().clone()
    }

    /// Rendering depth, fixed at creation.
    #[must_use]
    pub fn indent(&self) -> usize {
        self.inner.indent
    }

    /// Whether this node draws a bar row above its message.
    #[must_use]
    pub fn shows_bar(&self) -> bool {
        self.inner.show_bar
    }

    /// Time since this node was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.inner.start.elapsed()
    }

    /// Copies this node and all of its descendants into an owned [`NodeSnapshot`].
    #[must_use]
    pub fn snapshot(&self) -> NodeSnapshot {
        self.into()
    }
}

const fn own_height(show_bar: bool) -> usize {
    if show_bar { 2 } else { 1 }
}

#[allow(clippy::cast_precision_loss)]
fn fraction(current: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (current as f64 / total as f64).min(1.0)
    }
}

/// A plain-data copy of a progress subtree at a specific point in time.
///
/// The renderer draws from snapshots so that no lock is held during terminal I/O.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSnapshot {
    message: CompactString,
    current: u64,
    total: u64,
    show_bar: bool,
    indent: usize,
    children: Vec<NodeSnapshot>,
}

impl From<&ProgressNode> for NodeSnapshot {
    fn from(node: &ProgressNode) -> Self {
        // Clone the handles first, then recurse without holding the list lock.
        let children = node.inner.children.items();

        Self {
            message: node.message(),
            current: node.current(),
            total: node.total(),
            show_bar: node.inner.show_bar,
            indent: node.inner.indent,
            children: children.iter().map(Self::from).collect(),
        }
    }
}

impl NodeSnapshot {
    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the counter value.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Returns the target count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns `current / total` in `0.0..=1.0`, or `0.0` when indeterminate.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        fraction(self.current, self.total)
    }

    /// Returns whether a bar row is drawn.
    #[must_use]
    pub const fn shows_bar(&self) -> bool {
        self.show_bar
    }

    /// Returns the rendering depth.
    #[must_use]
    pub const fn indent(&self) -> usize {
        self.indent
    }

    /// Returns the children in draw order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Rows occupied by this node and its descendants.
    #[must_use]
    pub fn height(&self) -> usize {
        own_height(self.show_bar) + self.children.iter().map(Self::height).sum::<usize>()
    }
}
