use crate::api::CachedStudentApi;
use crate::commands::{self, CommandTarget};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::router::{FormMode, Route};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Notifier, Toasts};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{AboutView, DashboardView, NotFoundView, StudentFormView, StudentListView};
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;

const TICK_RATE: Duration = Duration::from_millis(250);

/// Shared services handed to every view
#[derive(Clone)]
pub struct AppContext {
  pub api: CachedStudentApi,
  pub notifier: Notifier,
  pub title: String,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  ctx: AppContext,

  /// Command palette (after pressing :)
  command: CommandInput,

  toasts: Toasts,

  /// Whether to quit
  should_quit: bool,
}

/// Build the screen for a route
fn build_view(ctx: &AppContext, route: &Route) -> Box<dyn View> {
  match route {
    Route::Dashboard => Box::new(DashboardView::new(ctx.clone())),
    Route::Students { page } => Box::new(StudentListView::new(ctx.clone(), *page)),
    Route::StudentAdd | Route::StudentEdit { .. } => {
      let mode = route.form_mode().unwrap_or(FormMode::Create);
      Box::new(StudentFormView::new(ctx.clone(), mode))
    }
    Route::About => Box::new(AboutView::new(ctx.clone())),
    Route::NotFound { path } => Box::new(NotFoundView::new(path.clone())),
  }
}

impl App {
  pub fn new(config: &Config, route: Route) -> Result<Self> {
    let api = CachedStudentApi::new(config)?;
    let (toasts, notifier) = Toasts::new();
    let ctx = AppContext {
      api,
      notifier,
      title: config.display_title(),
    };

    tracing::info!(route = %route, base_url = %ctx.api.base_url(), "starting");
    let root = build_view(&ctx, &route);

    Ok(Self {
      view_stack: vec![root],
      ctx,
      command: CommandInput::new(),
      toasts,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Mouse(mouse) => {
        if self.command.is_active() {
          return;
        }
        if let Some(view) = self.view_stack.last_mut() {
          let action = view.handle_mouse(mouse);
          self.apply(action);
        }
      }
      Event::Resize => {}
      Event::Tick => {
        // Views below the top keep polling so their queries settle
        for view in self.view_stack.iter_mut() {
          view.tick();
        }
        self.toasts.poll();
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let view_has_text = !self.command.is_active()
      && self.view_stack.last().is_some_and(|view| view.captures_text());

    if !view_has_text {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(input)) => {
          self.execute_command(&input);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
      // Palette swallows everything while open
      if self.command.is_active() {
        return;
      }
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn execute_command(&mut self, input: &str) {
    if input.trim().is_empty() {
      return;
    }
    match commands::resolve(input) {
      Some(CommandTarget::Navigate(route)) => self.open_root(route),
      Some(CommandTarget::Quit) => self.should_quit = true,
      None => {
        tracing::debug!(input, "unknown command");
        self.ctx.notifier.error(format!("Unknown command: {}", input));
      }
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Navigate(route) => self.open(route),
      ViewAction::Back => self.back(),
    }
  }

  /// Push the screen for `route`, unless it is already showing
  fn open(&mut self, route: Route) {
    if self.view_stack.last().is_some_and(|view| view.route() == route) {
      return;
    }
    tracing::debug!(route = %route, "navigate");
    let view = build_view(&self.ctx, &route);
    self.view_stack.push(view);
  }

  /// Replace the whole stack with the screen for `route`
  fn open_root(&mut self, route: Route) {
    tracing::debug!(route = %route, "navigate (root)");
    self.view_stack.clear();
    self.view_stack.push(build_view(&self.ctx, &route));
  }

  fn back(&mut self) {
    self.view_stack.pop();
    match self.view_stack.last_mut() {
      Some(view) => view.on_resume(),
      None => self.should_quit = true,
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Breadcrumb
      ])
      .split(frame.area());

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect();

    if let Some(view) = self.view_stack.last_mut() {
      let route = view.route().to_path();
      draw_header(
        frame,
        chunks[0],
        &self.ctx.title,
        self.ctx.api.base_url(),
        &route,
        &view.shortcuts(),
      );
      view.render(frame, chunks[1]);
    }

    draw_footer(frame, chunks[2], &breadcrumb);

    self.toasts.render_overlay(frame, chunks[1]);
    self.command.render_overlay(frame, chunks[1]);
  }
}
