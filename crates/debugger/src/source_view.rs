//! Source listings and scroll placement.

use transport::SourceLine;

/// A window of source lines around a focus line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    pub filename: String,
    pub focus_line: usize,
    pub show_arrow: bool,
    pub lines: Vec<SourceLine>,
    /// Set when the listing could not be fetched; `lines` is then empty.
    pub error: Option<String>,
}

impl ListingView {
    pub fn new(
        filename: impl Into<String>,
        focus_line: usize,
        show_arrow: bool,
        lines: Vec<SourceLine>,
    ) -> Self {
        Self {
            filename: filename.into(),
            focus_line,
            show_arrow,
            lines,
            error: None,
        }
    }

    pub fn failed(
        filename: impl Into<String>,
        focus_line: usize,
        show_arrow: bool,
        error: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            focus_line,
            show_arrow,
            lines: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.number == line)
            .map(|l| l.text.as_str())
    }

    /// Where to scroll so the focus line has `context` lines of context above it.
    pub fn scroll_target(&self, context: usize) -> ScrollTarget {
        let first = self.lines.first().map_or(1, |l| l.number);
        ScrollTarget {
            context_line: self.focus_line.saturating_sub(context).max(first),
            focus_line: self.focus_line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTarget {
    /// Line that should be at the top of the viewport.
    pub context_line: usize,
    pub focus_line: usize,
}

impl ScrollTarget {
    /// First visible line for a viewport `height` lines tall.
    ///
    /// Shows the context line when both it and the focus line fit, otherwise
    /// keeps the focus line on the last visible row.
    pub fn first_visible(&self, height: usize) -> usize {
        if height == 0 {
            return self.focus_line;
        }
        self.context_line
            .max((self.focus_line + 1).saturating_sub(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(range: std::ops::RangeInclusive<usize>) -> Vec<SourceLine> {
        range
            .map(|number| SourceLine {
                number,
                text: format!("line {number}"),
            })
            .collect()
    }

    #[test]
    fn context_line_sits_above_focus() {
        let view = ListingView::new("main.go", 30, true, lines(1..=60));

        let target = view.scroll_target(10);

        assert_eq!(target.context_line, 20);
        assert_eq!(target.first_visible(40), 20);
    }

    #[test]
    fn context_is_clamped_to_listing_start() {
        let view = ListingView::new("main.go", 4, true, lines(1..=60));
        assert_eq!(view.scroll_target(10).context_line, 1);

        let view = ListingView::new("main.go", 25, true, lines(20..=40));
        assert_eq!(view.scroll_target(10).context_line, 20);
    }

    #[test]
    fn short_viewport_prefers_focus() {
        let view = ListingView::new("main.go", 30, true, lines(1..=60));

        let target = view.scroll_target(10);

        assert_eq!(target.first_visible(5), 26);
        assert_eq!(target.first_visible(1), 30);
        assert_eq!(target.first_visible(0), 30);
    }

    #[test]
    fn line_lookup() {
        let view = ListingView::new("main.go", 3, false, lines(1..=5));
        assert_eq!(view.line_text(2), Some("line 2"));
        assert_eq!(view.line_text(6), None);
    }
}
