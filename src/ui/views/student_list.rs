use crate::api::{ApiError, CachedStudentApi, Student, StudentId, StudentPage};
use crate::app::AppContext;
use crate::mutation::{Mutation, MutationState};
use crate::query::{Query, QueryState};
use crate::router::Route;
use crate::ui::components::Pagination;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{avatar_label, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use futures::future::{BoxFuture, FutureExt};
use ratatui::layout::Position;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

const SKELETON_ROWS: usize = 6;

type PageFetcher = Box<dyn Fn() -> BoxFuture<'static, Result<StudentPage, String>> + Send + Sync>;

fn page_fetcher(api: CachedStudentApi, page: u32) -> PageFetcher {
  Box::new(move || {
    let api = api.clone();
    async move { api.list_students(page).await.map_err(|e| e.to_string()) }.boxed()
  })
}

/// Paged table of students
pub struct StudentListView {
  ctx: AppContext,
  page: u32,
  query: Query<StudentPage>,
  delete: Mutation<(StudentId, u32), StudentId, ApiError>,
  table_state: TableState,
  // Body rows as last drawn, for mouse hit-testing
  rows_area: Rect,
  hovered: Option<usize>,
}

impl StudentListView {
  pub fn new(ctx: AppContext, page: u32) -> Self {
    let page = page.max(1);
    let mut query = Query::new(page_fetcher(ctx.api.clone(), page)).keep_previous_data();

    // Start fetching immediately
    query.fetch();

    let api = ctx.api.clone();
    let delete = Mutation::new(move |(id, page): (StudentId, u32)| {
      let api = api.clone();
      async move { api.delete_student(&id, page).await.map(|_| id) }
    });

    Self {
      ctx,
      page,
      query,
      delete,
      table_state: TableState::default(),
      rows_area: Rect::default(),
      hovered: None,
    }
  }

  fn students(&self) -> &[Student] {
    self
      .query
      .data()
      .map(|p| p.students.as_slice())
      .unwrap_or(&[])
  }

  fn total_pages(&self) -> u32 {
    self
      .query
      .data()
      .map(|p| p.total_pages(self.ctx.api.page_limit()))
      .unwrap_or(0)
  }

  fn pagination(&self) -> Pagination {
    Pagination::new(self.page, self.total_pages())
  }

  fn selected_student(&self) -> Option<&Student> {
    self
      .table_state
      .selected()
      .and_then(|idx| self.students().get(idx))
  }

  fn go_to_page(&mut self, page: u32) {
    if page == self.page || page == 0 {
      return;
    }
    tracing::debug!(from = self.page, to = page, "changing page");
    self.page = page;
    self
      .query
      .set_fetcher(page_fetcher(self.ctx.api.clone(), page));
    self.query.refetch();
    self.table_state.select(None);
    self.hovered = None;
  }

  fn prefetch_row(&mut self, idx: usize) {
    let Some(id) = self.students().get(idx).map(|s| s.id.clone()) else {
      return;
    };
    // Fresh records are skipped by the cache itself
    let api = self.ctx.api.clone();
    tokio::spawn(async move { api.prefetch_student(&id).await });
  }

  fn select(&mut self, idx: usize) {
    self.table_state.select(Some(idx));
    self.prefetch_row(idx);
  }

  fn move_selection(&mut self, delta: isize) {
    let len = self.students().len();
    if len == 0 {
      return;
    }
    let current = self.table_state.selected().unwrap_or(0);
    let next = current.saturating_add_signed(delta).min(len - 1);
    self.select(next);
  }

  fn delete_selected(&mut self) {
    if self.delete.is_pending() || self.query.is_loading() {
      return;
    }
    if let Some(id) = self.selected_student().map(|s| s.id.clone()) {
      tracing::info!(%id, "deleting student");
      self.delete.mutate((id, self.page));
    }
  }

  fn refresh(&mut self) {
    self.ctx.api.invalidate_page(self.page);
    self.query.refetch();
  }

  fn row_at(&self, column: u16, row: u16) -> Option<usize> {
    if !self.rows_area.contains(Position::new(column, row)) {
      return None;
    }
    let idx = self.table_state.offset() + usize::from(row - self.rows_area.y);
    (idx < self.students().len()).then_some(idx)
  }

  fn title(&self) -> String {
    let mut title = match self.query.state() {
      QueryState::Loading if self.query.is_placeholder_data() => {
        format!(" Students · page {} (loading...) ", self.page)
      }
      QueryState::Loading | QueryState::Idle => " Students (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Students (error: {}) ", e),
      QueryState::Success(page) => format!(
        " Students ({}) · page {}/{} ",
        page.total_count,
        self.page,
        self.total_pages().max(1)
      ),
    };
    if self.delete.is_pending() {
      title.push_str("(deleting...) ");
    }
    title
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.students().len();
    ensure_valid_selection(&mut self.table_state, len);

    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    self.rows_area = Rect {
      y: inner.y.saturating_add(1),
      height: inner.height.saturating_sub(1),
      ..inner
    };

    if self.query.data().is_none() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load students. Press 'r' to retry."
      } else {
        "No students loaded."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    if self.query.data().is_some() && len == 0 {
      let paragraph = Paragraph::new("No students found. Press 'a' to add one.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let widths = [
      Constraint::Length(6),
      Constraint::Length(16),
      Constraint::Min(18),
      Constraint::Min(24),
      Constraint::Length(17),
    ];
    let header = Row::new(["#", "Avatar", "Name", "Email", "Actions"])
      .style(Style::default().fg(Color::Yellow).bold());

    // Skeleton while the first page loads
    if self.query.data().is_none() {
      let skeleton = Style::default().fg(Color::DarkGray);
      let rows = (0..SKELETON_ROWS).map(|_| {
        Row::new([
          "░░░", "░░░░░░░░", "░░░░░░░░░░░░", "░░░░░░░░░░░░░░░░", "",
        ])
        .style(skeleton)
      });
      let table = Table::new(rows, widths).header(header).block(block);
      frame.render_widget(table, area);
      return;
    }

    let dimmed = self.query.is_placeholder_data();
    let rows: Vec<Row> = self
      .students()
      .iter()
      .enumerate()
      .map(|(idx, student)| {
        let mut style = Style::default();
        if dimmed {
          style = style.fg(Color::DarkGray);
        } else if self.hovered == Some(idx) {
          style = style.fg(Color::Yellow);
        }
        Row::new(vec![
          Cell::from(student.id.to_string()).style(Style::default().fg(Color::Cyan)),
          Cell::from(truncate(&avatar_label(&student.avatar), 16)),
          Cell::from(truncate(&student.full_name(), 30)),
          Cell::from(truncate(&student.email, 40)),
          Cell::from("[e]dit [d]elete").style(Style::default().fg(Color::DarkGray)),
        ])
        .style(style)
      })
      .collect();

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  // Key handling helpers for or_else chain pattern
  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::Char('g') | KeyCode::Home => self.move_selection(isize::MIN),
      KeyCode::Char('G') | KeyCode::End => self.move_selection(isize::MAX),
      KeyCode::Char('h') | KeyCode::Left => {
        if let Some(page) = self.pagination().step(-1) {
          self.go_to_page(page);
        }
      }
      KeyCode::Char('l') | KeyCode::Right => {
        if let Some(page) = self.pagination().step(1) {
          self.go_to_page(page);
        }
      }
      KeyCode::Char(c @ '1'..='9') => {
        let page = c as u32 - '0' as u32;
        if page <= self.total_pages() {
          self.go_to_page(page);
        }
      }
      _ => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('e') | KeyCode::Enter => {
        let id = self.selected_student()?.id.clone();
        Some(ViewAction::Navigate(Route::StudentEdit { id }))
      }
      KeyCode::Char('a') => Some(ViewAction::Navigate(Route::StudentAdd)),
      KeyCode::Char('d') => {
        self.delete_selected();
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.refresh();
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Back),
      _ => None,
    }
  }
}

impl View for StudentListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn handle_mouse(&mut self, mouse: MouseEvent) -> ViewAction {
    match mouse.kind {
      MouseEventKind::Moved => {
        let hovered = self.row_at(mouse.column, mouse.row);
        if hovered != self.hovered {
          self.hovered = hovered;
          if let Some(idx) = hovered {
            self.prefetch_row(idx);
          }
        }
      }
      MouseEventKind::Down(MouseButton::Left) => {
        if let Some(idx) = self.row_at(mouse.column, mouse.row) {
          // A click on the selected row opens it
          if self.table_state.selected() == Some(idx) {
            if let Some(student) = self.students().get(idx) {
              return ViewAction::Navigate(Route::StudentEdit {
                id: student.id.clone(),
              });
            }
          }
          self.select(idx);
        }
      }
      MouseEventKind::ScrollDown => self.move_selection(1),
      MouseEventKind::ScrollUp => self.move_selection(-1),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Min(3),    // Table
        Constraint::Length(1), // Page bar
      ])
      .split(area);

    self.render_table(frame, chunks[0]);
    self.pagination().render(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Students [{}]", self.page)
  }

  fn route(&self) -> Route {
    Route::Students { page: self.page }
  }

  fn tick(&mut self) {
    if self.query.poll() {
      // The last page can disappear after a delete
      let total = self.total_pages();
      if total > 0 && self.page > total {
        self.go_to_page(total);
      }
    }

    if self.delete.poll() {
      match self.delete.state() {
        MutationState::Success(id) => {
          self
            .ctx
            .notifier
            .success(format!("Delete Successful! {}", id));
          self.query.refetch();
        }
        MutationState::Error(e) => {
          let target = self
            .delete
            .variables()
            .map(|(id, _)| format!(" for {}", id))
            .unwrap_or_default();
          tracing::warn!(error = %e, "delete failed{}", target);
          self.ctx.notifier.error(format!("Delete failed{}: {}", target, e));
        }
        _ => {}
      }
    }
  }

  fn on_resume(&mut self) {
    self.query.refetch();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "add").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("h/l", "page").with_priority(50),
      ShortcutInfo::new("r", "refresh").with_priority(60),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
