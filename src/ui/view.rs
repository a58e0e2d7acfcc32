use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::prefs::ViewMode;
use crate::ui::theme::Palette;

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
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Fetch the dataset again, bypassing the cache
  Reload,
  ToggleTheme,
  ToggleViewMode,
  Quit,
}

/// Display settings shared by every view
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
  pub palette: Palette,
  pub view_mode: ViewMode,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, pickers, overlays) and return
/// actions for the App to execute.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext);

  /// One-word state shown in the header
  fn status(&self) -> String;

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("q", "quit").with_priority(90)]
  }
}
