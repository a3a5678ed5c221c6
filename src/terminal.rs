//! The terminal seam used by the renderer.
//!
//! [`Terminal`] is the only environment dependency of a
//! [`ProgressRenderer`](crate::ProgressRenderer). [`CrosstermTerminal`] drives a real
//! terminal; [`VirtualTerminal`](crate::VirtualTerminal) keeps an in-memory screen.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, MoveToColumn, Show},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

/// A character terminal with an addressable cursor.
///
/// Rows and columns are zero-based. Implementations may buffer output until
/// [`flush`](Self::flush); the renderer flushes once per frame.
pub trait Terminal: Send {
    /// Returns the visible window size as `(columns, rows)`.
    ///
    /// Called once per frame, so resizes are picked up on the next frame.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Returns the cursor position as `(column, row)`.
    fn cursor_position(&mut self) -> io::Result<(u16, u16)>;

    /// Moves the cursor to `(column, row)`.
    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()>;

    /// Blanks the cursor's row and returns the cursor to its first column.
    fn clear_row(&mut self) -> io::Result<()>;

    /// Writes text at the cursor.
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    /// Pushes buffered output to the device.
    fn flush(&mut self) -> io::Result<()>;

    /// Shows or hides the cursor.
    fn set_cursor_visible(&mut self, _visible: bool) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Terminal + ?Sized> Terminal for Box<T> {
    fn size(&self) -> io::Result<(u16, u16)> {
        (**self).size()
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        (**self).cursor_position()
    }

    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        (**self).move_to(column, row)
    }

    fn clear_row(&mut self) -> io::Result<()> {
        (**self).clear_row()
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        (**self).write_str(text)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        (**self).set_cursor_visible(visible)
    }
}

/// A [`Terminal`] backed by `crossterm`, writing to any [`Write`] (stdout by default).
///
/// Window size and cursor position are queried from the controlling terminal, so both fail
/// when output is redirected; the renderer then drops its frames quietly.
#[derive(Debug)]
pub struct CrosstermTerminal<W: Write + Send = Stdout> {
    out: W,
}

impl CrosstermTerminal {
    /// Creates a terminal writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> CrosstermTerminal<W> {
    /// Creates a terminal writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Terminal for CrosstermTerminal<W> {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        // The position query goes through the tty; anything still queued must land first.
        self.out.flush()?;
        crossterm::cursor::position()
    }

    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        queue!(self.out, MoveTo(column, row))
    }

    fn clear_row(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::CurrentLine), MoveToColumn(0))
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        if visible {
            queue!(self.out, Show)
        } else {
            queue!(self.out, Hide)
        }
    }
}
