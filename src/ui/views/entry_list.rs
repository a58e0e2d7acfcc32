use crate::prefs::ViewMode;
use crate::record::{category_color, Record};
use crate::session::Session;
use crate::ui::components::{CategoryEvent, CategoryPicker, KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{parse_color, truncate};
use crate::ui::theme::Palette;
use crate::ui::view::{RenderContext, ShortcutInfo, View, ViewAction};
use crate::ui::views::entry_detail::draw_entry_detail;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

/// Paginated browser over the session's filtered entries
pub struct EntryListView {
  session: Session,
  search: SearchInput,
  picker: CategoryPicker,
  /// Index within the current page
  selected: usize,
  detail_open: bool,
  /// Grid columns at the last render, for vertical movement
  columns: usize,
}

impl EntryListView {
  pub fn new(session: Session) -> Self {
    Self {
      session,
      search: SearchInput::new(),
      picker: CategoryPicker::new(),
      selected: 0,
      detail_open: false,
      columns: 1,
    }
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  /// Swap in freshly loaded records
  pub fn replace_records(&mut self, records: Vec<Record>) {
    self.session.replace_records(records);
    self.detail_open = false;
    self.clamp_selection();
  }

  fn page_len(&self) -> usize {
    self.session.view().entries.len()
  }

  fn clamp_selection(&mut self) {
    self.selected = self.selected.min(self.page_len().saturating_sub(1));
  }

  fn move_selection(&mut self, delta: isize) {
    let len = self.page_len();
    if len == 0 {
      return;
    }
    let target = self.selected as isize + delta;
    self.selected = target.clamp(0, len as isize - 1) as usize;
  }

  fn selected_record(&self) -> Option<&Record> {
    self.session.view().entries.get(self.selected).copied()
  }

  fn filter_summary(&self) -> String {
    let filter = self.session.filter();
    let mut parts = Vec::new();
    if !filter.search_query.is_empty() {
      parts.push(format!("search \"{}\"", filter.search_query));
    }
    if !filter.selected_categories.is_empty() {
      let names: Vec<&str> = filter.selected_categories.iter().map(String::as_str).collect();
      parts.push(format!("in {}", names.join(", ")));
    }
    parts.push(format!(
      "sorted by {} {}",
      filter.sort_field.as_str(),
      filter.sort_order.as_str()
    ));
    parts.join("  ·  ")
  }

  fn render_grid(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
    let view = self.session.view();
    let columns: usize = if area.width >= 96 {
      3
    } else if area.width >= 60 {
      2
    } else {
      1
    };
    self.columns = columns;

    let rows = view.entries.len().div_ceil(columns).max(1);
    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);

    for (row_index, row_area) in row_areas.iter().enumerate() {
      let cells =
        Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns]).split(*row_area);
      for (column, cell) in cells.iter().enumerate() {
        let index = row_index * columns + column;
        let Some(record) = view.entries.get(index) else {
          continue;
        };
        let color = category_color(self.session.records(), &record.category);
        draw_card(frame, *cell, palette, record, color, index == self.selected);
      }
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
    self.columns = 1;
    let view = self.session.view();
    let width = area.width as usize;

    let header = Row::new(["Term", "Transliteration", "Translation", "Category"])
      .style(Style::default().fg(palette.accent).bold());

    let rows: Vec<Row> = view
      .entries
      .iter()
      .map(|record| {
        let swatch = category_color(self.session.records(), &record.category)
          .and_then(parse_color)
          .unwrap_or(palette.text);
        Row::new(vec![
          Cell::from(truncate(&record.term, width / 4)),
          Cell::from(truncate(&record.transliteration, width / 5)),
          Cell::from(truncate(&record.translation_primary, width / 3)),
          Cell::from(record.category.clone()).style(Style::default().fg(swatch)),
        ])
      })
      .collect();

    let table = Table::new(
      rows,
      [
        Constraint::Percentage(25),
        Constraint::Percentage(20),
        Constraint::Percentage(35),
        Constraint::Percentage(20),
      ],
    )
    .header(header)
    .block(
      Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border)),
    )
    .row_highlight_style(Style::default().bg(palette.selection).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut state = TableState::default();
    if !view.entries.is_empty() {
      state.select(Some(self.selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
  }
}

fn draw_card(
  frame: &mut Frame,
  area: Rect,
  palette: &Palette,
  record: &Record,
  color: Option<&str>,
  selected: bool,
) {
  let accent = color.and_then(parse_color).unwrap_or(palette.border);
  let border = if selected {
    Style::default().fg(palette.warning).bold()
  } else {
    Style::default().fg(accent)
  };

  let block = Block::default()
    .title(format!(" {} ", record.term))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(border);

  let lines = vec![
    Line::styled(record.transliteration.as_str(), Style::default().fg(palette.muted)),
    Line::styled(record.translation_primary.as_str(), Style::default().bold()),
    Line::styled(record.category.as_str(), Style::default().fg(accent)),
  ];

  frame.render_widget(
    Paragraph::new(lines)
      .alignment(Alignment::Center)
      .block(block)
      .style(palette.base()),
    area,
  );
}

impl View for EntryListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.detail_open {
      if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
        self.detail_open = false;
      }
      return ViewAction::None;
    }

    match self.picker.handle_key(key) {
      KeyResult::Event(CategoryEvent::Toggled(name)) => {
        self.session.toggle_category(&name);
        self.clamp_selection();
        return ViewAction::None;
      }
      KeyResult::Event(CategoryEvent::Cleared) => {
        self.session.clear_categories();
        self.clamp_selection();
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    let current = self.session.filter().search_query.clone();
    match self.search.handle_key(key, &current) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.session.set_search(&query);
        self.selected = 0;
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    let step = self.columns.max(1) as isize;
    match key.code {
      KeyCode::Char('q') => return ViewAction::Quit,
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return ViewAction::Quit
      }
      KeyCode::Char('c') => self.picker.show(self.session.categories()),
      KeyCode::Char('x') => self.session.clear_categories(),
      KeyCode::Esc => {
        self.session.set_search("");
        self.session.clear_categories();
      }
      KeyCode::Char('s') => {
        let next = self.session.filter().sort_field.next();
        self.session.set_sort(next);
      }
      KeyCode::Char('o') => self.session.toggle_order(),
      KeyCode::Char('n') | KeyCode::PageDown => {
        self.session.next_page();
        self.selected = 0;
      }
      KeyCode::Char('p') | KeyCode::PageUp => {
        self.session.prev_page();
        self.selected = 0;
      }
      KeyCode::Home => self.session.set_page(1),
      KeyCode::End => self.session.set_page(self.session.page_count()),
      KeyCode::Char('u') => {
        self.session.back();
      }
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(step),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-step),
      KeyCode::Char('l') | KeyCode::Right => self.move_selection(1),
      KeyCode::Char('h') | KeyCode::Left => self.move_selection(-1),
      KeyCode::Enter => self.detail_open = self.selected_record().is_some(),
      KeyCode::Char('r') => return ViewAction::Reload,
      KeyCode::Char('t') => return ViewAction::ToggleTheme,
      KeyCode::Char('v') => return ViewAction::ToggleViewMode,
      _ => {}
    }
    self.clamp_selection();
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let palette = &ctx.palette;
    let [summary_area, body_area] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);

    frame.render_widget(
      Paragraph::new(format!(" {}", self.filter_summary()))
        .style(palette.base().fg(palette.muted)),
      summary_area,
    );

    let view = self.session.view();
    if view.entries.is_empty() {
      let message = if self.session.records().is_empty() {
        "The dictionary is empty."
      } else if view.total > 0 {
        "No entries on this page. Press Home to go back to the first page."
      } else {
        "No entries match. Press Esc to clear the search and categories."
      };
      let paragraph = Paragraph::new(message)
        .alignment(Alignment::Center)
        .block(
          Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border)),
        )
        .style(palette.base().fg(palette.muted));
      frame.render_widget(paragraph, body_area);
    } else {
      match ctx.view_mode {
        ViewMode::Grid => self.render_grid(frame, body_area, palette),
        ViewMode::Table => self.render_table(frame, body_area, palette),
      }
    }

    self.search.render_overlay(frame, area, palette);
    self
      .picker
      .render_overlay(frame, area, palette, &self.session.filter().selected_categories);

    if self.detail_open {
      if let Some(record) = self.selected_record() {
        let color = category_color(self.session.records(), &record.category);
        draw_entry_detail(frame, area, palette, record, color);
      }
    }
  }

  fn status(&self) -> String {
    let view = self.session.view();
    format!("{} of {} entries", view.total, self.session.records().len())
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    if self.search.is_active() {
      return vec![
        ShortcutInfo::new("enter", "keep").with_priority(10),
        ShortcutInfo::new("esc", "cancel").with_priority(20),
      ];
    }
    if self.picker.is_active() {
      return vec![
        ShortcutInfo::new("space", "toggle").with_priority(10),
        ShortcutInfo::new("x", "clear").with_priority(20),
        ShortcutInfo::new("enter", "close").with_priority(30),
      ];
    }
    vec![
      ShortcutInfo::new("/", "search").with_priority(10),
      ShortcutInfo::new("c", "categories").with_priority(20),
      ShortcutInfo::new("s/o", "sort").with_priority(30),
      ShortcutInfo::new("n/p", "page").with_priority(40),
      ShortcutInfo::new("u", "back").with_priority(50),
      ShortcutInfo::new("v", "view").with_priority(60),
      ShortcutInfo::new("t", "theme").with_priority(70),
      ShortcutInfo::new("r", "refresh").with_priority(80),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
