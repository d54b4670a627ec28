use crate::router::Route;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub struct NotFoundView {
  path: String,
}

impl NotFoundView {
  pub fn new(path: String) -> Self {
    Self { path }
  }
}

impl View for NotFoundView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Back,
      KeyCode::Enter => ViewAction::Navigate(Route::Dashboard),
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Not found ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let lines = vec![
      Line::default(),
      Line::from(vec![
        Span::raw("  Nothing lives at "),
        Span::styled(self.path.clone(), Style::default().fg(Color::Yellow).bold()),
      ]),
      Line::styled(
        "  Press Enter for the dashboard or Esc to go back.",
        Style::default().fg(Color::DarkGray),
      ),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    "Not found".to_string()
  }

  fn route(&self) -> Route {
    Route::NotFound {
      path: self.path.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::render_lines;

  #[test]
  fn test_names_the_path() {
    let mut view = NotFoundView::new("/teachers".to_string());
    let text = render_lines(60, 6, |frame| {
      let area = frame.area();
      view.render(frame, area)
    })
    .join("\n");
    assert!(text.contains("Nothing lives at /teachers"));
  }
}
