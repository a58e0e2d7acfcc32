use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::theme::Palette;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Query changed; emitted on each keystroke and on cancel
  Changed(String),
  /// Search submitted (overlay closed, filter persists)
  Submitted,
}

/// Search overlay opened with `/`, filtering as the user types
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  /// Query to restore on cancel
  previous: String,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the overlay, editing `current`
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.previous = current.to_string();
    self.input.set_value(current);
  }

  /// Handle a key event. Only the activation key is handled while inactive.
  pub fn handle_key(&mut self, key: KeyEvent, current: &str) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate(current);
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.set_value(&self.previous);
        KeyResult::Event(SearchEvent::Changed(self.previous.clone()))
      }
      InputResult::Consumed => {
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      // Swallow everything else while typing
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
    if !self.active {
      return;
    }

    let width = (area.width / 5 * 3).clamp(30.min(area.width), 60.min(area.width));
    let height = 3.min(area.height);
    let overlay_area = Rect::new(area.x + 1.min(area.width), area.y + 1.min(area.height), width, height)
      .intersection(area);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.warning))
      .title(" Search ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(palette.warning)),
      Span::raw(self.input.value()),
    ]);
    frame.render_widget(Paragraph::new(input_line).style(palette.base()), inner);

    let cursor = u16::try_from(self.input.cursor_position()).unwrap_or(u16::MAX);
    let x = inner.x.saturating_add(1).saturating_add(cursor);
    frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_inactive_ignores_other_keys() {
    let mut search = SearchInput::new();
    assert_eq!(search.handle_key(key(KeyCode::Char('x')), ""), KeyResult::NotHandled);
    assert_eq!(search.handle_key(key(KeyCode::Char('/')), ""), KeyResult::Handled);
    assert!(search.is_active());
  }

  #[test]
  fn test_typing_emits_changes() {
    let mut search = SearchInput::new();
    search.activate("ق");
    assert_eq!(
      search.handle_key(key(KeyCode::Char('ل')), "ق"),
      KeyResult::Event(SearchEvent::Changed("قل".into()))
    );
    assert_eq!(
      search.handle_key(key(KeyCode::Enter), "قل"),
      KeyResult::Event(SearchEvent::Submitted)
    );
    assert!(!search.is_active());
  }

  #[test]
  fn test_overlay_places_cursor_after_typed_text() {
    use crate::prefs::Theme;
    use ratatui::backend::TestBackend;

    let mut search = SearchInput::new();
    search.activate("ab");
    search.handle_key(key(KeyCode::Left), "ab");

    let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
    let palette = Palette::for_theme(Theme::Dark);
    terminal
      .draw(|frame| {
        let area = frame.area();
        search.render_overlay(frame, area, &palette);
      })
      .unwrap();

    let position = terminal.get_cursor_position().unwrap();
    assert_eq!((position.x, position.y), (4, 2));
  }

  #[test]
  fn test_cancel_restores_previous_query() {
    let mut search = SearchInput::new();
    search.activate("cat");
    search.handle_key(key(KeyCode::Backspace), "cat");
    assert_eq!(
      search.handle_key(key(KeyCode::Esc), "ca"),
      KeyResult::Event(SearchEvent::Changed("cat".into()))
    );
  }
}
