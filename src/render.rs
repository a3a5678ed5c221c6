//! In-place terminal rendering of a progress tree.
//!
//! A [`ProgressRenderer`] owns one root node, a background thread, and the terminal. Nodes
//! ask for redraws through a coalescing signal; the thread wakes on a request (or after the
//! fallback interval), snapshots the tree, and repaints it starting from the anchor row that
//! was captured when the renderer was built. The cursor is put back on the anchor after every
//! frame, so the next frame overwrites the same region instead of scrolling.
//!
//! Rendering is decoration over the real work. Every terminal failure is contained in
//! `Painter::attempt_frame`: the frame is dropped and nothing reaches the producers.

use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use compact_str::CompactString;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    Error, NodeSnapshot, ProgressNode, RendererBuilder, Result, Style, Terminal,
    signal::RedrawSignal,
    style::single_row,
};

/// Rows kept free at the bottom of the window; children past this line wait for a later frame.
const BOTTOM_MARGIN: u16 = 2;

/// Draws a tree of [`ProgressNode`]s on the terminal until shut down.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tree_progress::{RendererBuilder, VirtualTerminal};
///
/// let screen = VirtualTerminal::new(40, 10);
/// let renderer = RendererBuilder::new()
///     .terminal(screen.clone())
///     .fallback_interval(Duration::from_millis(50))
///     .build()
///     .unwrap();
///
/// let root = renderer.create_root("Copying");
/// root.set_total(1);
/// let step = root.spawn_indeterminate();
/// step.set_message("a.txt");
/// root.tick();
///
/// renderer.shutdown();
/// assert_eq!(screen.row_text(1), "Copying");
/// assert_eq!(screen.row_text(2), "| a.txt");
/// assert_eq!(screen.cursor(), (0, 3));
/// ```
pub struct ProgressRenderer {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    root: OnceLock<ProgressNode>,
    redraw: Arc<RedrawSignal>,
    painter: Mutex<Painter>,
    stopping: AtomicBool,
    frames_drawn: AtomicU64,
    frames_dropped: AtomicU64,
}

impl ProgressRenderer {
    /// Starts a renderer on stdout with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the render thread cannot be started.
    pub fn new() -> Result<Self> {
        RendererBuilder::new().build()
    }

    pub(crate) fn start(
        terminal: Box<dyn Terminal>,
        style: Style,
        fallback_interval: Duration,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            root: OnceLock::new(),
            redraw: Arc::new(RedrawSignal::new()),
            painter: Mutex::new(Painter::new(terminal, style)),
            stopping: AtomicBool::new(false),
            frames_drawn: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        });

        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("progress-render".into())
                .spawn(move || run(&shared, fallback_interval))
                .map_err(Error::Spawn)?
        };

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Installs the root node and draws it immediately.
    ///
    /// Only the first call creates a node; later calls ignore their arguments and return the
    /// existing root.
    pub fn create_root(&self, message: impl Into<CompactString>) -> ProgressNode {
        self.create_root_with_indent(message, 0)
    }

    /// Like [`create_root`](Self::create_root), with a starting indent for the whole tree.
    pub fn create_root_with_indent(
        &self,
        message: impl Into<CompactString>,
        indent: usize,
    ) -> ProgressNode {
        let root = self
            .shared
            .root
            .get_or_init(|| {
                ProgressNode::root(message.into(), indent, Arc::clone(&self.shared.redraw))
            })
            .clone();
        self.shared.draw();
        root
    }

    /// Returns the root node, if one was installed.
    #[must_use]
    pub fn root(&self) -> Option<ProgressNode> {
        self.shared.root.get().cloned()
    }

    /// Asks the render thread for another frame without waiting for it.
    pub fn request_redraw(&self) {
        self.shared.redraw.request();
    }

    /// Frames painted completely so far.
    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.shared.frames_drawn.load(Ordering::Relaxed)
    }

    /// Frames abandoned because the terminal failed.
    #[must_use]
    pub fn frames_dropped(&self) -> u64 {
        self.shared.frames_dropped.load(Ordering::Relaxed)
    }

    /// Stops rendering and leaves the cursor just below the tree.
    ///
    /// Blocks until the render thread has exited, draws one last frame with the latest
    /// state, then moves the cursor to the row after the rendered region. Failures while
    /// positioning are ignored. Nothing is written to the terminal after this returns.
    ///
    /// Calling it again is a no-op. Dropping the renderer calls it too.
    pub fn shutdown(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        self.shared.stopping.store(true, Ordering::Release);
        self.shared.redraw.request();
        if worker.join().is_err() {
            warn!("progress render thread panicked");
        }

        // Nothing else draws now; one last frame in case the loop was mid-frame on old state.
        self.shared.draw();

        let height = self.shared.root.get().map_or(0, ProgressNode::height);
        let mut painter = self.shared.painter.lock();
        painter.finish(height);
        debug!(height, "progress renderer shut down");
    }
}

impl Drop for ProgressRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn draw(&self) {
        let Some(root) = self.root.get() else {
            return;
        };

        // Copy the tree first so no node lock is held while talking to the terminal.
        let snapshot = root.snapshot();
        let mut painter = self.painter.lock();
        if painter.closed {
            return;
        }

        let counter = if painter.attempt_frame(&snapshot) {
            &self.frames_drawn
        } else {
            &self.frames_dropped
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

fn run(shared: &Shared, fallback_interval: Duration) {
    debug!(?fallback_interval, "progress render loop started");

    while !shared.stopping.load(Ordering::Acquire) {
        let wake = shared.redraw.wait(fallback_interval);
        if shared.stopping.load(Ordering::Acquire) {
            break;
        }

        trace!(?wake, "progress render loop woke");
        shared.draw();
    }

    debug!("progress render loop stopped");
}

/// The terminal plus the geometry bookkeeping needed to redraw in place.
pub(crate) struct Painter {
    terminal: Box<dyn Terminal>,
    style: Style,
    anchor_row: u16,
    closed: bool,
}

impl Painter {
    /// Captures the anchor row. Must run before anything is drawn.
    fn new(mut terminal: Box<dyn Terminal>, style: Style) -> Self {
        let anchor_row = match terminal.cursor_position() {
            Ok((_, row)) => row,
            Err(err) => {
                debug!(error = %err, "cannot read cursor position, anchoring at the top row");
                0
            }
        };

        if let Err(err) = terminal
            .set_cursor_visible(false)
            .and_then(|()| terminal.flush())
        {
            debug!(error = %err, "cannot hide the cursor");
        }

        Self {
            terminal,
            style,
            anchor_row,
            closed: false,
        }
    }

    /// Draws one frame, swallowing any terminal failure. Returns whether the frame completed.
    fn attempt_frame(&mut self, root: &NodeSnapshot) -> bool {
        match self.paint(root) {
            Ok(rows) => {
                trace!(rows, anchor = self.anchor_row, "drew progress frame");
                true
            }
            Err(err) => {
                debug!(error = %err, "dropped progress frame");
                false
            }
        }
    }

    /// Returns the number of rows drawn.
    fn paint(&mut self, root: &NodeSnapshot) -> Result<u16> {
        let (columns, rows) = self.terminal.size()?;
        let mut cursor = Cursor {
            row: self.anchor_row,
            columns: usize::from(columns),
            limit: rows.saturating_sub(BOTTOM_MARGIN),
        };

        self.terminal.move_to(0, cursor.row)?;
        self.paint_node(root, &mut cursor)?;

        self.terminal.move_to(0, self.anchor_row)?;
        self.terminal.flush()?;
        Ok(cursor.row - self.anchor_row + 1)
    }

    fn paint_node(&mut self, node: &NodeSnapshot, cursor: &mut Cursor) -> Result<()> {
        let indent = node.indent();

        if node.shows_bar() {
            self.terminal.clear_row()?;
            self.terminal.write_str(&self.style.indent_prefix(indent))?;
            self.terminal
                .write_str(&self.style.bar(cursor.columns, indent, node.percentage()))?;
            cursor.row = cursor.row.saturating_add(1);
            self.terminal.move_to(0, cursor.row)?;
        }

        self.terminal.clear_row()?;
        self.terminal.write_str(&self.style.indent_prefix(indent))?;
        self.terminal.write_str(&single_row(
            node.message(),
            cursor.columns.saturating_sub(indent),
        ))?;

        for child in node.children() {
            if cursor.row >= cursor.limit {
                return Ok(());
            }

            cursor.row += 1;
            self.terminal.move_to(0, cursor.row)?;
            self.paint_node(child, cursor)?;
        }

        Ok(())
    }

    /// Parks the cursor below a tree of `height` rows and stops all further drawing.
    fn finish(&mut self, height: usize) {
        self.closed = true;

        let below = u16::try_from(height)
            .unwrap_or(u16::MAX)
            .saturating_add(self.anchor_row);
        let row = match self.terminal.size() {
            Ok((_, rows)) => below.min(rows.saturating_sub(1)),
            Err(_) => below,
        };

        let parked = self
            .terminal
            .move_to(0, row)
            .and_then(|()| self.terminal.set_cursor_visible(true))
            .and_then(|()| self.terminal.flush());
        if let Err(err) = parked {
            debug!(error = %err, "ignoring terminal failure during shutdown");
        }
    }
}

/// Working position of a frame in progress.
struct Cursor {
    row: u16,
    columns: usize,
    limit: u16,
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::ProgressRenderer;
    use crate::{RendererBuilder, VirtualTerminal};

    fn renderer(screen: &VirtualTerminal, fallback: Duration) -> ProgressRenderer {
        RendererBuilder::new()
            .terminal(screen.clone())
            .fallback_interval(fallback)
            .build()
            .unwrap()
    }

    /// Polls `check` for up to two seconds.
    fn eventually(check: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_create_root_draws_immediately_and_is_idempotent() {
        let screen = VirtualTerminal::new(20, 10).with_cursor(0, 2);
        let renderer = renderer(&screen, Duration::from_secs(10));

        let root = renderer.create_root("first");
        assert_eq!(screen.row_text(2), "", "Empty bar for a fresh root");
        assert_eq!(screen.row_text(3), "first");
        assert_eq!(screen.cursor(), (0, 2), "Cursor returns to the anchor");

        let again = renderer.create_root_with_indent("second", 4);
        again.set_message("shared");
        assert_eq!(root.message(), "shared", "Second call returns the same root");
        assert_eq!(again.indent(), 0);
    }

    #[test]
    fn test_frame_layout() {
        let screen = VirtualTerminal::new(20, 12);
        let renderer = renderer(&screen, Duration::from_secs(10));

        let root = renderer.create_root("root");
        root.set_total(2);
        root.tick();
        let bar = root.spawn(4);
        bar.tick_with_message("bar");
        let spinner = bar.spawn_indeterminate();
        spinner.set_message("a message that is far too long for the row");
        let late = root.spawn_indeterminate();
        late.set_message("late");

        // Shutdown draws a final frame and leaves the screen still.
        renderer.shutdown();

        assert_eq!(screen.row_text(0), "-".repeat(10));
        assert_eq!(screen.row_text(1), "root");
        // 18 columns of bar at 25%, rounded up.
        assert_eq!(screen.row_text(2), format!("| {}", "-".repeat(5)));
        assert_eq!(screen.row_text(3), "| bar");
        assert_eq!(screen.row_text(4), "|-- a message that i");
        assert_eq!(screen.row_text(5), "| late");
        assert_eq!(screen.cursor(), (0, 6));
        assert_eq!(root.height(), 6);
    }

    /// Multi-line Messages
    /// Line breaks in the last child stay inside the tree's rows.
    #[test]
    fn test_multiline_message_stays_on_its_row() {
        let screen = VirtualTerminal::new(20, 10);
        let renderer = renderer(&screen, Duration::from_secs(10));

        let root = renderer.create_root("root");
        root.spawn_indeterminate().set_message("first");
        root.spawn_indeterminate().set_message("second\nSTRAY\rX");
        renderer.shutdown();

        assert_eq!(root.height(), 4);
        assert_eq!(screen.row_text(2), "| first");
        assert_eq!(screen.row_text(3), "| second STRAY X");
        assert_eq!(screen.row_text(4), "", "Nothing lands where the cursor is parked");
        assert_eq!(screen.cursor(), (0, 4));
    }

    #[test]
    fn test_stops_near_bottom_of_window() {
        let screen = VirtualTerminal::new(20, 6);
        let renderer = renderer(&screen, Duration::from_secs(10));

        let root = renderer.create_root("root");
        for i in 0..6 {
            root.spawn_indeterminate().set_message(format!("child {i}"));
        }
        renderer.request_redraw();
        assert!(eventually(|| screen.row_text(4) == "| child 2"));

        thread::sleep(Duration::from_millis(50));
        assert_eq!(screen.row_text(5), "", "Bottom rows stay untouched");

        screen.resize(20, 8);
        renderer.request_redraw();
        assert!(
            eventually(|| screen.row_text(6) == "| child 4"),
            "More children appear once there is room"
        );
    }

    #[test]
    fn test_failing_terminal_drops_frames() {
        let screen = VirtualTerminal::new(20, 10);
        let renderer = renderer(&screen, Duration::from_millis(20));
        let root = renderer.create_root("root");
        let drawn = renderer.frames_drawn();

        screen.set_failing(true);
        root.set_message("while failing");
        assert!(eventually(|| renderer.frames_dropped() > 0));
        assert!(root.tick(), "Producers are unaffected");

        screen.set_failing(false);
        root.set_message("recovered");
        assert!(eventually(|| screen.row_text(1) == "recovered"));
        assert!(renderer.frames_drawn() > drawn);

        screen.set_failing(true);
        renderer.shutdown();
    }

    #[test]
    fn test_fallback_interval_catches_up() {
        let screen = VirtualTerminal::new(20, 10);
        let renderer = renderer(&screen, Duration::from_millis(30));
        let _root = renderer.create_root("root");
        let drawn = renderer.frames_drawn();

        assert!(
            eventually(|| renderer.frames_drawn() >= drawn + 2),
            "Timeouts draw without any request"
        );
    }

    /// Coalescing
    /// A burst of ticks while the loop is busy collapses into a bounded number of frames.
    #[test]
    fn test_burst_of_ticks_coalesces() {
        let screen = VirtualTerminal::new(40, 10);
        let renderer = renderer(&screen, Duration::from_secs(10));
        let root = renderer.create_root("root");
        let child = root.spawn(2000);
        assert!(eventually(|| screen.row_text(3) == "|"));
        thread::sleep(Duration::from_millis(50));
        let before = renderer.frames_drawn();

        let paused = screen.pause();
        for _ in 0..1000 {
            child.tick();
        }
        drop(paused);

        assert!(eventually(|| renderer.frames_drawn() > before));
        thread::sleep(Duration::from_millis(100));
        let frames = renderer.frames_drawn() - before;
        assert!((1..=3).contains(&frames), "Drew {frames} frames for 1000 ticks");

        assert!(eventually(|| screen.row_text(2) == format!("| {}", "-".repeat(19))));
    }

    #[test]
    fn test_shutdown_is_idempotent_and_final() {
        let screen = VirtualTerminal::new(20, 10).with_cursor(0, 3);
        let renderer = renderer(&screen, Duration::from_millis(10));
        let root = renderer.create_root("root");
        assert!(!screen.is_cursor_visible());

        renderer.shutdown();
        assert_eq!(screen.cursor(), (0, 5));
        assert!(screen.is_cursor_visible());
        let written = screen.bytes_written();

        renderer.shutdown();
        root.set_message("after");
        let _ = renderer.create_root("again");
        thread::sleep(Duration::from_millis(50));
        assert_eq!(screen.bytes_written(), written, "Nothing is drawn after shutdown");
        assert_eq!(screen.cursor(), (0, 5));
    }

    #[test]
    fn test_shutdown_clamps_to_window() {
        let screen = VirtualTerminal::new(20, 6).with_cursor(0, 3);
        let renderer = renderer(&screen, Duration::from_secs(10));
        let root = renderer.create_root("root");
        let _a = root.spawn(1);
        let _b = root.spawn(1);

        drop(renderer);
        assert_eq!(screen.cursor(), (0, 5));
    }

    #[test]
    fn test_shutdown_without_root() {
        let screen = VirtualTerminal::new(20, 6).with_cursor(0, 1);
        let renderer = renderer(&screen, Duration::from_secs(10));
        renderer.shutdown();
        assert_eq!(screen.cursor(), (0, 1));
        assert_eq!(renderer.frames_drawn(), 0);
    }

    /// End-to-end
    /// Two indeterminate children driven concurrently, then the root completes.
    #[test]
    fn test_concurrent_children_end_to_end() {
        let screen = VirtualTerminal::new(40, 20).with_cursor(0, 4);
        let renderer = renderer(&screen, Duration::from_millis(100));

        let root = renderer.create_root("Downloading files...");
        root.set_total(2);

        let workers: Vec<_> = (0..2)
            .map(|id| {
                let root = root.clone();
                thread::spawn(move || {
                    let child = root.spawn_indeterminate();
                    for i in 0..100 {
                        thread::sleep(Duration::from_millis(10));
                        child.tick_with_message(format!("worker {id}: {i}"));
                    }
                    child.tick_with_message("Done");
                    root.tick();
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(root.current(), 2);
        let height = root.height();
        assert_eq!(height, 4);

        renderer.shutdown();

        assert_eq!(screen.cursor(), (0, 4 + 4));
        assert_eq!(screen.row_text(4), "-".repeat(40));
        assert_eq!(screen.row_text(5), "Downloading files...");
        assert_eq!(screen.row_text(6), "| Done");
        assert_eq!(screen.row_text(7), "| Done");

        let written = screen.bytes_written();
        root.set_message("ignored");
        thread::sleep(Duration::from_millis(150));
        assert_eq!(screen.bytes_written(), written);
    }
}
