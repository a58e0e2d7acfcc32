use super::KeyResult;
use crate::session::CategoryInfo;
use crate::ui::renderfns::{centered, parse_color};
use crate::ui::theme::Palette;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use std::collections::BTreeSet;

/// Events emitted by the category picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryEvent {
  /// Category selection flipped
  Toggled(String),
  /// All categories deselected
  Cleared,
}

/// Multi-select overlay over the dataset's categories
#[derive(Debug, Clone, Default)]
pub struct CategoryPicker {
  active: bool,
  categories: Vec<CategoryInfo>,
  selected: usize,
}

impl CategoryPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker over `categories`, keeping the cursor if possible
  pub fn show(&mut self, categories: Vec<CategoryInfo>) {
    self.active = true;
    self.selected = self.selected.min(categories.len().saturating_sub(1));
    self.categories = categories;
  }

  pub fn hide(&mut self) {
    self.active = false;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CategoryEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('c') => {
        self.hide();
        KeyResult::Handled
      }
      KeyCode::Char(' ') => match self.categories.get(self.selected) {
        Some(category) => KeyResult::Event(CategoryEvent::Toggled(category.name.clone())),
        None => KeyResult::Handled,
      },
      KeyCode::Char('x') => KeyResult::Event(CategoryEvent::Cleared),
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.categories.is_empty() {
          self.selected = (self.selected + 1) % self.categories.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.categories.is_empty() {
          self.selected = if self.selected == 0 {
            self.categories.len() - 1
          } else {
            self.selected - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active
  pub fn render_overlay(
    &self,
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
    chosen: &BTreeSet<String>,
  ) {
    if !self.active {
      return;
    }

    let max_name_len = self
      .categories
      .iter()
      .map(|c| c.name.chars().count() + c.count.to_string().len())
      .max()
      .unwrap_or(10);
    let width = (max_name_len as u16).saturating_add(14).max(28);
    let height = (self.categories.len() as u16).saturating_add(2).max(3);
    let overlay_area = centered(area, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.warning))
      .title(" Categories ")
      .title_bottom(" space:toggle  x:clear  enter:close ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    if self.categories.is_empty() {
      frame.render_widget(
        Line::styled("No categories", Style::default().fg(palette.muted)),
        inner,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .categories
      .iter()
      .map(|category| {
        let mark = if chosen.contains(&category.name) { "[x] " } else { "[ ] " };
        let swatch = category
          .color
          .as_deref()
          .and_then(parse_color)
          .unwrap_or(palette.muted);
        ListItem::new(Line::from(vec![
          Span::raw(mark),
          Span::styled("■ ", Style::default().fg(swatch)),
          Span::styled(category.name.clone(), Style::default().fg(palette.accent)),
          Span::styled(format!(" ({})", category.count), Style::default().fg(palette.muted)),
        ]))
      })
      .collect();

    let list = List::new(items).highlight_style(Style::default().bg(palette.selection).fg(palette.text));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}
