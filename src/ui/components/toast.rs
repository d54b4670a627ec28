//! Transient notifications shown over the content area.
//!
//! Views hold a cloneable [`Notifier`]; the app owns the [`Toasts`] stack,
//! drains it on every tick and drops toasts once their ttl has passed.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(4000);
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
  Success,
  Error,
}

impl ToastKind {
  fn color(self) -> Color {
    match self {
      ToastKind::Success => Color::Green,
      ToastKind::Error => Color::Red,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Toast {
  pub kind: ToastKind,
  pub text: String,
  pub ttl: Duration,
}

impl Toast {
  pub fn success(text: impl Into<String>) -> Self {
    Self {
      kind: ToastKind::Success,
      text: text.into(),
      ttl: DEFAULT_TOAST_TTL,
    }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self {
      kind: ToastKind::Error,
      text: text.into(),
      ttl: DEFAULT_TOAST_TTL,
    }
  }
}

/// Sending half handed to views
#[derive(Debug, Clone)]
pub struct Notifier {
  tx: mpsc::UnboundedSender<Toast>,
}

impl Notifier {
  pub fn notify(&self, toast: Toast) {
    tracing::debug!(kind = ?toast.kind, text = %toast.text, "toast");
    // The stack is gone only during shutdown
    let _ = self.tx.send(toast);
  }

  pub fn success(&self, text: impl Into<String>) {
    self.notify(Toast::success(text));
  }

  pub fn error(&self, text: impl Into<String>) {
    self.notify(Toast::error(text));
  }
}

/// Visible toasts, newest last
pub struct Toasts {
  rx: mpsc::UnboundedReceiver<Toast>,
  visible: Vec<(Toast, Instant)>,
}

impl Toasts {
  pub fn new() -> (Self, Notifier) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
      Self {
        rx,
        visible: Vec::new(),
      },
      Notifier { tx },
    )
  }

  /// Take new toasts and expire old ones. Returns `true` if anything changed.
  pub fn poll(&mut self) -> bool {
    self.poll_at(Instant::now())
  }

  fn poll_at(&mut self, now: Instant) -> bool {
    let mut changed = false;
    while let Ok(toast) = self.rx.try_recv() {
      self.visible.push((toast, now));
      changed = true;
    }

    let before = self.visible.len();
    self
      .visible
      .retain(|(toast, shown)| now.saturating_duration_since(*shown) < toast.ttl);
    if self.visible.len() > MAX_VISIBLE {
      let excess = self.visible.len() - MAX_VISIBLE;
      self.visible.drain(..excess);
    }
    changed || self.visible.len() != before
  }

  #[cfg(test)]
  pub fn messages(&self) -> Vec<&str> {
    self.visible.iter().map(|(t, _)| t.text.as_str()).collect()
  }

  /// Draw the stack in the top-right corner of `area`
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let mut y = area.y + 1;
    for (toast, _) in self.visible.iter().rev() {
      let width = (toast.text.chars().count() as u16 + 4)
        .max(20)
        .min(area.width.saturating_sub(2));
      if width == 0 || y + 3 > area.bottom() {
        break;
      }
      let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, 3);

      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(toast.kind.color()));
      let paragraph = Paragraph::new(toast.text.as_str())
        .style(Style::default().fg(toast.kind.color()).bold())
        .block(block);

      frame.render_widget(Clear, rect);
      frame.render_widget(paragraph, rect);
      y += 3;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::render_lines;

  #[test]
  fn test_poll_collects_and_expires() {
    let (mut toasts, notifier) = Toasts::new();
    let start = Instant::now();

    notifier.success("Add Successful!");
    assert!(toasts.poll_at(start));
    assert_eq!(toasts.messages(), vec!["Add Successful!"]);

    assert!(!toasts.poll_at(start + Duration::from_millis(100)));
    assert!(toasts.poll_at(start + DEFAULT_TOAST_TTL));
    assert!(toasts.messages().is_empty());
  }

  #[test]
  fn test_only_newest_are_kept() {
    let (mut toasts, notifier) = Toasts::new();
    for i in 0..6 {
      notifier.error(format!("failure {}", i));
    }
    toasts.poll();
    assert_eq!(toasts.messages().len(), MAX_VISIBLE);
    assert_eq!(toasts.messages()[0], "failure 2");
  }

  #[test]
  fn test_render_overlay() {
    let (mut toasts, notifier) = Toasts::new();
    notifier.success("Delete Successful! 3");
    toasts.poll();

    let lines = render_lines(60, 8, |frame| {
      let area = frame.area();
      toasts.render_overlay(frame, area)
    });
    assert!(lines.iter().any(|l| l.contains("Delete Successful! 3")));
  }
}
