use crate::ui::view::{RenderContext, ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Screen shown while no records are available
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusView {
  Loading,
  /// Every retry failed
  Failed(String),
}

impl View for StatusView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Quit,
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => ViewAction::Quit,
      KeyCode::Char('r') if matches!(self, StatusView::Failed(_)) => ViewAction::Reload,
      KeyCode::Char('t') => ViewAction::ToggleTheme,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let palette = &ctx.palette;
    let (title, body, color) = match self {
      StatusView::Loading => (
        " Loading ",
        "Fetching the dictionary...".to_string(),
        palette.muted,
      ),
      StatusView::Failed(error) => (
        " Unable to load ",
        format!(
          "The dictionary could not be loaded.\n\n{}\n\nPress 'r' to try again or 'q' to quit.",
          error
        ),
        palette.error,
      ),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.border))
      .style(palette.base());

    let paragraph = Paragraph::new(body)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: false })
      .style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
  }

  fn status(&self) -> String {
    match self {
      StatusView::Loading => "loading".to_string(),
      StatusView::Failed(_) => "offline".to_string(),
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    match self {
      StatusView::Loading => vec![ShortcutInfo::new("q", "quit")],
      StatusView::Failed(_) => vec![
        ShortcutInfo::new("r", "retry").with_priority(10),
        ShortcutInfo::new("q", "quit").with_priority(90),
      ],
    }
  }
}
