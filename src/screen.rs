//! An in-memory [`Terminal`] for tests and headless rendering.

use std::{io, sync::Arc};

use parking_lot::{Mutex, MutexGuard};

use crate::Terminal;

/// A fixed-size character grid that implements [`Terminal`].
///
/// Clones share the same screen, so one clone can be handed to a renderer while another is
/// kept around to inspect what was drawn.
///
/// ```
/// use tree_progress::{Terminal, VirtualTerminal};
///
/// let mut screen = VirtualTerminal::new(20, 5);
/// screen.move_to(2, 1).unwrap();
/// screen.write_str("hi").unwrap();
///
/// assert_eq!(screen.row_text(1), "  hi");
/// assert_eq!(screen.cursor(), (4, 1));
/// ```
#[derive(Clone, Debug)]
pub struct VirtualTerminal {
    screen: Arc<Mutex<Screen>>,
}

#[derive(Debug)]
struct Screen {
    columns: u16,
    rows: u16,
    cells: Vec<Vec<char>>,
    cursor: (u16, u16),
    cursor_visible: bool,
    failing: bool,
    bytes_written: u64,
}

/// Holds the screen locked; any renderer touching the terminal blocks until this is dropped.
#[must_use = "the screen is released as soon as the guard is dropped"]
pub struct PausedScreen<'a> {
    _guard: MutexGuard<'a, Screen>,
}

impl VirtualTerminal {
    /// Creates a blank screen of `columns` x `rows` with the cursor at the origin.
    #[must_use]
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen {
                columns,
                rows,
                cells: blank(columns, rows),
                cursor: (0, 0),
                cursor_visible: true,
                failing: false,
                bytes_written: 0,
            })),
        }
    }

    /// Places the cursor before handing the terminal out.
    #[must_use]
    pub fn with_cursor(self, column: u16, row: u16) -> Self {
        self.screen.lock().cursor = (column, row);
        self
    }

    /// Changes the window size, keeping whatever content still fits.
    pub fn resize(&self, columns: u16, rows: u16) {
        let mut screen = self.screen.lock();
        let mut cells = blank(columns, rows);
        for (new_row, old_row) in cells.iter_mut().zip(&screen.cells) {
            for (new_cell, old_cell) in new_row.iter_mut().zip(old_row) {
                *new_cell = *old_cell;
            }
        }
        screen.cells = cells;
        screen.columns = columns;
        screen.rows = rows;
    }

    /// Makes every subsequent operation fail with an I/O error until turned off again.
    pub fn set_failing(&self, failing: bool) {
        self.screen.lock().failing = failing;
    }

    /// Blocks every terminal operation from other threads while the guard lives.
    pub fn pause(&self) -> PausedScreen<'_> {
        PausedScreen {
            _guard: self.screen.lock(),
        }
    }

    /// Returns the text of `row` with trailing blanks removed.
    #[must_use]
    pub fn row_text(&self, row: u16) -> String {
        let screen = self.screen.lock();
        screen
            .cells
            .get(usize::from(row))
            .map(|cells| cells.iter().collect::<String>().trim_end().to_owned())
            .unwrap_or_default()
    }

    /// Returns the cursor as `(column, row)`.
    #[must_use]
    pub fn cursor(&self) -> (u16, u16) {
        self.screen.lock().cursor
    }

    /// Whether the cursor is currently shown.
    #[must_use]
    pub fn is_cursor_visible(&self) -> bool {
        self.screen.lock().cursor_visible
    }

    /// Total bytes of text written so far.
    ///
    /// Handy for asserting that nothing was drawn during some interval.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.screen.lock().bytes_written
    }

    fn with_screen<T>(&self, f: impl FnOnce(&mut Screen) -> T) -> io::Result<T> {
        let mut screen = self.screen.lock();
        if screen.failing {
            return Err(io::Error::other("virtual terminal is failing"));
        }
        Ok(f(&mut screen))
    }
}

impl Screen {
    fn put(&mut self, ch: char) {
        let (column, row) = self.cursor;
        match ch {
            '\r' => self.cursor.0 = 0,
            '\n' => self.cursor = (0, row.saturating_add(1)),
            _ => {
                if let Some(cell) = self
                    .cells
                    .get_mut(usize::from(row))
                    .and_then(|cells| cells.get_mut(usize::from(column)))
                {
                    *cell = ch;
                }
                self.cursor.0 = column.saturating_add(1);
            }
        }
    }
}

fn blank(columns: u16, rows: u16) -> Vec<Vec<char>> {
    vec![vec![' '; usize::from(columns)]; usize::from(rows)]
}

impl Terminal for VirtualTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        self.with_screen(|screen| (screen.columns, screen.rows))
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        self.with_screen(|screen| screen.cursor)
    }

    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        self.with_screen(|screen| screen.cursor = (column, row))
    }

    fn clear_row(&mut self) -> io::Result<()> {
        self.with_screen(|screen| {
            let row = usize::from(screen.cursor.1);
            if let Some(cells) = screen.cells.get_mut(row) {
                cells.fill(' ');
            }
            screen.cursor.0 = 0;
        })
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.with_screen(|screen| {
            text.chars().for_each(|ch| screen.put(ch));
            screen.bytes_written += text.len() as u64;
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_screen(|_| ())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        self.with_screen(|screen| screen.cursor_visible = visible)
    }
}
