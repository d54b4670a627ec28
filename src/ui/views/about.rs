use crate::app::AppContext;
use crate::router::Route;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub struct AboutView {
  ctx: AppContext,
}

impl AboutView {
  pub fn new(ctx: AppContext) -> Self {
    Self { ctx }
  }
}

impl View for AboutView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Back,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" About ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let field = |name: &'static str, value: String| {
      Line::from(vec![
        Span::styled(format!("  {:<10}", name), Style::default().fg(Color::Cyan)),
        Span::raw(value),
      ])
    };

    let lines = vec![
      Line::default(),
      field("name", env!("CARGO_PKG_NAME").to_string()),
      field("version", env!("CARGO_PKG_VERSION").to_string()),
      field("api", self.ctx.api.base_url().to_string()),
      field("page size", self.ctx.api.page_limit().to_string()),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    "About".to_string()
  }

  fn route(&self) -> Route {
    Route::About
  }
}
