//! The browsing session: loaded records, the filter state and the share-link
//! history, owned together.

use std::collections::HashSet;

use crate::filter::{matching_indices, page_count, page_slice, FilterState, SortField};
use crate::record::{category_color, Record};

/// A category and the color of its first colored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
  pub name: String,
  pub color: Option<String>,
  pub count: usize,
}

/// One page of the filtered view.
#[derive(Debug)]
pub struct PageView<'a> {
  pub entries: Vec<&'a Record>,
  /// Matches across all pages
  pub total: usize,
  pub page: usize,
  pub page_count: usize,
}

pub struct Session {
  records: Vec<Record>,
  filter: FilterState,
  page_size: usize,
  /// Indices into `records`, in display order
  visible: Vec<usize>,
  first_compute: bool,
  history: Vec<String>,
  cursor: usize,
}

impl Session {
  /// Start a session. The page in `initial` is kept for the first view.
  pub fn new(records: Vec<Record>, initial: FilterState, page_size: usize) -> Self {
    let mut session = Self {
      records,
      filter: initial,
      page_size: page_size.max(1),
      visible: Vec::new(),
      first_compute: true,
      history: Vec::new(),
      cursor: 0,
    };
    session.recompute(true);
    session.record_history();
    session
  }

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  pub fn filter(&self) -> &FilterState {
    &self.filter
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// Swap in a freshly loaded record set, keeping the filter.
  pub fn replace_records(&mut self, records: Vec<Record>) {
    self.records = records;
    self.recompute(false);
  }

  pub fn set_search(&mut self, query: &str) {
    if self.filter.search_query == query {
      return;
    }
    self.filter.search_query = query.to_string();
    self.changed(true);
  }

  /// Select `category` if unselected, otherwise deselect it.
  pub fn toggle_category(&mut self, category: &str) {
    if !self.filter.selected_categories.remove(category) {
      self.filter.selected_categories.insert(category.to_string());
    }
    self.changed(true);
  }

  pub fn set_categories<I, S>(&mut self, categories: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.filter.selected_categories = categories.into_iter().map(Into::into).collect();
    self.changed(true);
  }

  pub fn clear_categories(&mut self) {
    if self.filter.selected_categories.is_empty() {
      return;
    }
    self.filter.selected_categories.clear();
    self.changed(true);
  }

  pub fn set_sort(&mut self, field: SortField) {
    if self.filter.sort_field == field {
      return;
    }
    self.filter.sort_field = field;
    self.changed(false);
  }

  pub fn toggle_order(&mut self) {
    self.filter.sort_order = self.filter.sort_order.reversed();
    self.changed(false);
  }

  /// Jump to `page`, clamped to the pages that exist.
  pub fn set_page(&mut self, page: usize) {
    let page = page.clamp(1, self.page_count().max(1));
    if page == self.filter.current_page {
      return;
    }
    self.filter.current_page = page;
    self.record_history();
  }

  pub fn next_page(&mut self) {
    if self.filter.current_page < self.page_count() {
      self.set_page(self.filter.current_page + 1);
    }
  }

  pub fn prev_page(&mut self) {
    if self.filter.current_page > 1 {
      self.set_page(self.filter.current_page - 1);
    }
  }

  pub fn page_count(&self) -> usize {
    page_count(self.visible.len(), self.page_size)
  }

  /// The current page of the filtered view.
  pub fn view(&self) -> PageView<'_> {
    let indices = page_slice(&self.visible, self.filter.current_page, self.page_size);
    PageView {
      entries: indices.iter().map(|&index| &self.records[index]).collect(),
      total: self.visible.len(),
      page: self.filter.current_page,
      page_count: self.page_count(),
    }
  }

  /// Every record in the filtered view, across all pages.
  pub fn filtered(&self) -> impl Iterator<Item = &Record> {
    self.visible.iter().map(|&index| &self.records[index])
  }

  /// Distinct non-empty categories in first-seen order.
  pub fn categories(&self) -> Vec<CategoryInfo> {
    let mut seen = HashSet::new();
    let mut categories: Vec<CategoryInfo> = Vec::new();

    for record in &self.records {
      if record.category.is_empty() {
        continue;
      }
      if seen.insert(record.category.as_str()) {
        categories.push(CategoryInfo {
          name: record.category.clone(),
          color: category_color(&self.records, &record.category).map(str::to_string),
          count: 0,
        });
      }
      if let Some(info) = categories.iter_mut().find(|c| c.name == record.category) {
        info.count += 1;
      }
    }

    categories
  }

  /// Query string reproducing the current state.
  pub fn share_link(&self) -> String {
    self.filter.to_query()
  }

  /// Restore the previous share-link state. Returns false at the oldest entry.
  pub fn back(&mut self) -> bool {
    if self.cursor == 0 {
      return false;
    }
    self.cursor -= 1;
    self.filter = FilterState::from_query(&self.history[self.cursor]);
    self.recompute(false);
    true
  }

  /// Every share link this session has produced, oldest first.
  #[cfg(test)]
  pub fn history(&self) -> &[String] {
    &self.history
  }

  fn changed(&mut self, resets_page: bool) {
    self.recompute(resets_page);
    self.record_history();
  }

  fn recompute(&mut self, resets_page: bool) {
    if resets_page && !self.first_compute {
      self.filter.current_page = 1;
    }
    self.first_compute = false;
    self.visible = matching_indices(&self.records, &self.filter);
  }

  fn record_history(&mut self) {
    let link = self.share_link();
    if self.history.last() != Some(&link) {
      self.history.push(link);
    }
    self.cursor = self.history.len() - 1;
  }
}
