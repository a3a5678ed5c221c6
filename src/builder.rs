//! Fluent interface for configuring a [`ProgressRenderer`].
//!
//! [`ProgressRenderer::new`] draws on stdout with the defaults. The [`RendererBuilder`] is
//! for everything else:
//!
//! * **Terminal Injection:** Any [`Terminal`] implementation can be supplied, e.g. a
//!   [`VirtualTerminal`](crate::VirtualTerminal) for tests or headless runs.
//! * **Cadence:** The fallback interval bounds how long the display can lag behind when no
//!   redraw request arrives. It is a tunable, not a frame-rate guarantee.
//! * **Glyphs:** Bar and indentation characters via [`Style`].

use std::time::Duration;

use crate::{CrosstermTerminal, ProgressRenderer, Result, Style, Terminal};

/// Default idle wakeup interval of the render loop.
pub const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::from_secs(10);

/// A builder for [`ProgressRenderer`].
pub struct RendererBuilder {
    fallback_interval: Duration,
    style: Style,
    terminal: Option<Box<dyn Terminal>>,
}

impl Default for RendererBuilder {
    fn default() -> Self {
        Self {
            fallback_interval: DEFAULT_FALLBACK_INTERVAL,
            style: Style::default(),
            terminal: None,
        }
    }
}

impl RendererBuilder {
    /// Starts from the defaults: stdout, a 10 second fallback, default glyphs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long the render loop sleeps without a request before drawing anyway.
    #[must_use]
    pub const fn fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval = interval;
        self
    }

    /// Sets the glyphs used for bars and indentation.
    #[must_use]
    pub const fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Draws on `terminal` instead of stdout.
    #[must_use]
    pub fn terminal(mut self, terminal: impl Terminal + 'static) -> Self {
        self.terminal = Some(Box::new(terminal));
        self
    }

    /// Captures the anchor row from the terminal's cursor and starts the render thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`](crate::Error::Spawn) if the thread cannot be started.
    pub fn build(self) -> Result<ProgressRenderer> {
        let terminal = self
            .terminal
            .unwrap_or_else(|| Box::new(CrosstermTerminal::stdout()));
        ProgressRenderer::start(terminal, self.style, self.fallback_interval)
    }
}
