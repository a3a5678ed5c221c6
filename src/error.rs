//! Error types.
//!
//! Almost nothing in this crate is allowed to fail loudly: node updates are infallible and
//! rendering failures are swallowed per frame. The errors here only surface while a
//! [`ProgressRenderer`](crate::ProgressRenderer) is being constructed, or from the internal
//! frame routine before it is turned into a dropped frame.

use std::io;

use thiserror::Error;

/// Errors produced while setting up or drawing to a terminal.
#[derive(Debug, Error)]
pub enum Error {
    /// A terminal operation (query, cursor movement, write) failed.
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),

    /// The background render thread could not be started.
    #[error("failed to spawn the render thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Convenience alias for results carrying [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
