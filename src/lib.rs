//! # `tree_progress`
//!
//! Hierarchical, thread-safe progress reporting drawn in place on the terminal.
//!
//! A [`ProgressRenderer`] owns a tree of [`ProgressNode`]s and a background thread that
//! repaints the tree from a fixed anchor row whenever it changes. It is designed to be:
//!
//! * **Concurrent**: Node handles are cheap to clone ([`Arc`](std::sync::Arc)-based) and can be
//!   ticked, relabelled, and extended with children from any number of threads.
//! * **Non-blocking**: Counters are atomics and every lock is short and field-scoped. Redraw
//!   requests are coalesced, so producers never wait on the terminal.
//! * **Best-effort**: Terminal failures drop a frame and nothing more. The display converges
//!   on the latest state after a burst of updates, bounded by a fallback interval.
//!
//! ```
//! use tree_progress::{RendererBuilder, VirtualTerminal};
//!
//! let screen = VirtualTerminal::new(30, 10);
//! let renderer = RendererBuilder::new().terminal(screen.clone()).build().unwrap();
//!
//! let root = renderer.create_root("Downloading files...");
//! root.set_total(1);
//! let file = root.spawn(100);
//! file.set_message("index.html");
//! file.tick_to(100);
//! root.tick();
//!
//! renderer.shutdown();
//! assert_eq!(screen.row_text(3), "| index.html");
//! assert_eq!(screen.cursor(), (0, 4));
//! ```
//!
//! ## Modules
//!
//! * [`progress`]: The [`ProgressNode`] handle and [`NodeSnapshot`].
//! * [`render`]: The [`ProgressRenderer`] and its draw loop.
//! * [`builder`]: Renderer configuration.
//! * [`terminal`]: The [`Terminal`] seam and its crossterm implementation.
//! * [`screen`]: [`VirtualTerminal`], an in-memory screen.
//! * [`io`]: Byte-counting [`std::io::Read`] and [`std::io::Write`] wrappers.
//! * [`iter`]: Extension traits for tracking progress on Iterators.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
mod children;
mod error;
pub mod io;
pub mod iter;
pub mod progress;
pub mod render;
pub mod screen;
mod signal;
mod style;
pub mod terminal;

pub use builder::{DEFAULT_FALLBACK_INTERVAL, RendererBuilder};
pub use error::{Error, Result};
pub use iter::{ProgressIter, ProgressIteratorExt};
pub use progress::{NodeSnapshot, ProgressNode};
pub use render::ProgressRenderer;
pub use screen::{PausedScreen, VirtualTerminal};
pub use style::Style;
pub use terminal::{CrosstermTerminal, Terminal};
