//! Glyphs and the pure text pieces of a frame.

use compact_str::CompactString;

/// Characters used to draw bars and indentation rungs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Style {
    /// Fill character of a progress bar.
    pub bar: char,
    /// First character of every indented row.
    pub separator: char,
    /// Padding between the separator and the content on deeper rows.
    pub filler: char,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            bar: '-',
            separator: '|',
            filler: '-',
        }
    }
}

impl Style {
    /// Builds the prefix written before a row's content at the given indent.
    ///
    /// * `indent < 1`: nothing.
    /// * `indent == 1`: the separator alone.
    /// * `indent > 1`: the separator, `indent - 2` fillers, then a space.
    ///
    /// ```
    /// use tree_progress::Style;
    ///
    /// let style = Style::default();
    /// assert_eq!(style.indent_prefix(0), "");
    /// assert_eq!(style.indent_prefix(1), "|");
    /// assert_eq!(style.indent_prefix(4), "|-- ");
    /// ```
    #[must_use]
    pub fn indent_prefix(&self, indent: usize) -> CompactString {
        let mut prefix = CompactString::default();
        match indent {
            0 => {}
            1 => prefix.push(self.separator),
            _ => {
                prefix.push(self.separator);
                prefix.extend(std::iter::repeat_n(self.filler, indent - 2));
                prefix.push(' ');
            }
        }
        prefix
    }

    /// Builds the bar for a row `width` columns wide at the given indent.
    #[must_use]
    pub fn bar(&self, width: usize, indent: usize, percentage: f64) -> CompactString {
        std::iter::repeat_n(self.bar, bar_fill(width, indent, percentage)).collect()
    }
}

/// Number of fill glyphs: `ceil((width - indent) * percentage)`, never past the row.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) fn bar_fill(width: usize, indent: usize, percentage: f64) -> usize {
    let bar_width = width.saturating_sub(indent);
    if !percentage.is_finite() || percentage <= 0.0 {
        return 0;
    }
    ((bar_width as f64 * percentage).ceil() as usize).min(bar_width)
}

/// Fits `text` on a single row of `columns` characters.
///
/// Control characters become spaces so a message can never move the cursor off its row.
pub(crate) fn single_row(text: &str, columns: usize) -> CompactString {
    text.chars()
        .take(columns)
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Style, bar_fill, single_row};

    #[test]
    fn test_indent_prefix_exact_bytes() {
        let style = Style::default();

        assert_eq!(style.indent_prefix(0).as_bytes(), b"");
        assert_eq!(style.indent_prefix(1).as_bytes(), b"|");
        assert_eq!(style.indent_prefix(2).as_bytes(), b"| ");
        assert_eq!(style.indent_prefix(4).as_bytes(), b"|-- ");
        assert_eq!(style.indent_prefix(6).len(), 6, "Prefix spans the whole indent");
    }

    #[test]
    fn test_indent_prefix_custom_glyphs() {
        let style = Style {
            bar: '#',
            separator: '+',
            filler: '.',
        };
        assert_eq!(style.indent_prefix(5), "+... ");
    }

    #[test]
    fn test_bar_fill_rounds_up() {
        assert_eq!(bar_fill(80, 0, 0.0), 0);
        assert_eq!(bar_fill(80, 0, 0.01), 1);
        assert_eq!(bar_fill(80, 0, 0.5), 40);
        assert_eq!(bar_fill(80, 4, 0.5), 38);
        assert_eq!(bar_fill(80, 0, 1.0), 80);
        assert_eq!(bar_fill(10, 20, 1.0), 0, "Indent wider than the row leaves no bar");
        assert_eq!(bar_fill(80, 0, f64::NAN), 0);
    }

    #[test]
    fn test_single_row_by_chars() {
        assert_eq!(single_row("hello", 10), "hello");
        assert_eq!(single_row("hello", 3), "hel");
        assert_eq!(single_row("héllo", 2), "hé");
        assert_eq!(single_row("hello", 0), "");
    }

    #[test]
    fn test_single_row_blanks_control_characters() {
        assert_eq!(single_row("two\nlines", 20), "two lines");
        assert_eq!(single_row("back\rto start\t!", 20), "back to start !");
    }
}
