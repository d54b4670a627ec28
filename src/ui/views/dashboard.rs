use crate::app::AppContext;
use crate::router::Route;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Landing screen with pointers to the student screens
pub struct DashboardView {
  ctx: AppContext,
}

impl DashboardView {
  pub fn new(ctx: AppContext) -> Self {
    Self { ctx }
  }
}

fn hint(key: &'static str, text: &'static str) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("  {:<8}", key), Style::default().fg(Color::Cyan)),
    Span::raw(text),
  ])
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('s') | KeyCode::Enter => ViewAction::Navigate(Route::Students { page: 1 }),
      KeyCode::Char('a') => ViewAction::Navigate(Route::StudentAdd),
      KeyCode::Char('?') => ViewAction::Navigate(Route::About),
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Back,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.ctx.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines = vec![
      Line::default(),
      Line::styled(
        "  Manage the student roster of a json-server style API.",
        Style::default().bold(),
      ),
      Line::styled(
        format!("  Connected to {}", self.ctx.api.base_url()),
        Style::default().fg(Color::DarkGray),
      ),
      Line::default(),
      hint("s/Enter", "browse students"),
      hint("a", "add a student"),
      hint("?", "about"),
      hint(":", "command palette (names or /paths)"),
      hint("q", "quit"),
    ];

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn route(&self) -> Route {
    Route::Dashboard
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("s", "students").with_priority(20),
      ShortcutInfo::new("a", "add").with_priority(30),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
