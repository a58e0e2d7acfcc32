//! Encoding of the filter state as a shareable query string.

use url::form_urlencoded;

use crate::filter::{FilterState, SortField, SortOrder};

impl FilterState {
  /// Read a filter state from a query string, with or without a leading `?`.
  ///
  /// Unknown keys and invalid values are ignored.
  pub fn from_query(query: &str) -> Self {
    let query = query.trim().trim_start_matches('?');
    let mut state = FilterState::default();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
      match key.as_ref() {
        "q" | "search" => state.search_query = value.into_owned(),
        "category" | "categories" => state.selected_categories.extend(
          value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        ),
        "page" => {
          if let Some(page) = value.trim().parse::<usize>().ok().filter(|page| *page > 0) {
            state.current_page = page;
          }
        }
        "sort" => {
          if let Some(field) = SortField::parse(&value) {
            state.sort_field = field;
          }
        }
        "order" => {
          if let Some(order) = SortOrder::parse(&value) {
            state.sort_order = order;
          }
        }
        _ => {}
      }
    }

    state
  }

  /// Query string for this state; empty when everything is at its default.
  pub fn to_query(&self) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !self.search_query.is_empty() {
      serializer.append_pair("q", &self.search_query);
    }
    if !self.selected_categories.is_empty() {
      let joined = self
        .selected_categories
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");
      serializer.append_pair("categories", &joined);
    }
    if self.current_page > 1 {
      serializer.append_pair("page", &self.current_page.to_string());
    }
    if self.sort_field != SortField::default() {
      serializer.append_pair("sort", self.sort_field.as_str());
    }
    if self.sort_order != SortOrder::default() {
      serializer.append_pair("order", self.sort_order.as_str());
    }

    serializer.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reads_all_keys() {
    let state =
      FilterState::from_query("?q=%D9%83%D8%AA%D8%A7%D8%A8&categories=Objects,Animals&page=3&sort=translation&order=desc");
    assert_eq!(state.search_query, "كتاب");
    assert!(state.selected_categories.contains("Objects"));
    assert!(state.selected_categories.contains("Animals"));
    assert_eq!(state.current_page, 3);
    assert_eq!(state.sort_field, SortField::Translation);
    assert_eq!(state.sort_order, SortOrder::Descending);
  }

  #[test]
  fn test_alias_keys() {
    let state = FilterState::from_query("search=big+cat&category=Animals");
    assert_eq!(state.search_query, "big cat");
    assert_eq!(state.selected_categories.len(), 1);
  }

  #[test]
  fn test_invalid_values_are_ignored() {
    let state = FilterState::from_query("page=0&sort=color&order=sideways&categories=,,&x=1");
    assert_eq!(state, FilterState::default());

    let state = FilterState::from_query("page=-2");
    assert_eq!(state.current_page, 1);
    assert_eq!(FilterState::from_query(""), FilterState::default());
  }

  #[test]
  fn test_default_state_has_empty_query() {
    assert_eq!(FilterState::default().to_query(), "");
  }

  #[test]
  fn test_writes_only_non_defaults() {
    let mut state = FilterState {
      search_query: "a b&c".into(),
      ..Default::default()
    };
    assert_eq!(state.to_query(), "q=a+b%26c");

    state.current_page = 2;
    state.sort_order = SortOrder::Descending;
    assert_eq!(state.to_query(), "q=a+b%26c&page=2&order=desc");
  }

  #[test]
  fn test_share_link_restores_state() {
    let state = FilterState {
      selected_categories: ["Places", "Food & Drink"].iter().map(|s| s.to_string()).collect(),
      search_query: "مَدْرَسَة".into(),
      sort_field: SortField::Category,
      sort_order: SortOrder::Descending,
      current_page: 4,
    };
    assert_eq!(FilterState::from_query(&state.to_query()), state);
  }
}
