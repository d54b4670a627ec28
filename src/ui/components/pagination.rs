use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Page bar for paged listings: `Previous 1 2 [3] 4 Next`.
///
/// Every page gets a number; only when they cannot fit the width is the
/// bar windowed around the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  pub page: u32,
  pub total_pages: u32,
}

impl Pagination {
  pub fn new(page: u32, total_pages: u32) -> Self {
    Self { page, total_pages }
  }

  pub fn has_previous(&self) -> bool {
    self.page > 1
  }

  /// The last page is the one at `total_pages`; an empty listing has no next
  pub fn has_next(&self) -> bool {
    self.page < self.total_pages
  }

  /// Page `delta` steps away, if it exists
  pub fn step(&self, delta: i64) -> Option<u32> {
    let target = i64::from(self.page) + delta;
    (target >= 1 && target <= i64::from(self.total_pages.max(1))).then_some(target as u32)
  }

  /// Page numbers to show, windowed around the current page
  fn visible_pages(&self, max: u32) -> std::ops::RangeInclusive<u32> {
    let total = self.total_pages.max(1);
    if total <= max {
      return 1..=total;
    }
    let half = max / 2;
    let start = self.page.saturating_sub(half).max(1).min(total - max + 1);
    start..=start + max - 1
  }

  /// How many page numbers fit in `width` next to Previous/Next
  fn pages_that_fit(&self, width: u16) -> u32 {
    // " ‹ Previous  " + "  Next ›" + room for both ellipses
    const CHROME: u32 = 13 + 8 + 4;
    let cell = self.total_pages.max(1).to_string().len() as u32 + 2;
    (u32::from(width).saturating_sub(CHROME) / cell).max(1)
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
      Span::raw(" "),
      Span::styled(
        "‹ Previous",
        if self.has_previous() { enabled } else { disabled },
      ),
      Span::raw("  "),
    ];

    let pages = self.visible_pages(self.pages_that_fit(area.width));
    if *pages.start() > 1 {
      spans.push(Span::styled("… ", disabled));
    }
    let last = *pages.end();
    for page in pages {
      if page == self.page {
        spans.push(Span::styled(
          format!("[{}]", page),
          Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
        ));
      } else {
        spans.push(Span::styled(format!(" {} ", page), Style::default().fg(Color::White)));
      }
    }
    if last < self.total_pages {
      spans.push(Span::styled(" …", disabled));
    }

    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      "Next ›",
      if self.has_next() { enabled } else { disabled },
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}
