use crate::router::Route;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Open the screen for a route on top of the current one
  Navigate(Route),
  /// Pop current view from stack (go back)
  Back,
}

/// Trait for view behavior
///
/// Views handle their own input modes and return actions for the App to
/// execute. This creates a clean delegation chain: App → View → Components
///
/// Views that load data asynchronously should use Query<T> / Mutation
/// internally and poll them in the tick() method.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Handle mouse movement and clicks
  fn handle_mouse(&mut self, _mouse: MouseEvent) -> ViewAction {
    ViewAction::None
  }

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// The route this view currently shows
  fn route(&self) -> Route;

  /// Called on each tick to allow views to poll async queries
  fn tick(&mut self) {}

  /// Called when the view becomes visible again after the one above it closed
  fn on_resume(&mut self) {}

  /// True while keystrokes are text for the view, so `:` is not a command
  fn captures_text(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  /// Override this to provide view-specific shortcuts
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
