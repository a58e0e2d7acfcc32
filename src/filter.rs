//! Category filter, free-text search, stable sort and pagination.

use std::collections::BTreeSet;

use crate::normalize::{fold_case, normalize};
use crate::record::Record;

/// Entries per page in the paginated views
pub const DEFAULT_PAGE_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
  #[default]
  Term,
  Translation,
  Category,
}

impl SortField {
  pub const ALL: [SortField; 3] = [SortField::Term, SortField::Translation, SortField::Category];

  pub fn as_str(self) -> &'static str {
    match self {
      SortField::Term => "term",
      SortField::Translation => "translation",
      SortField::Category => "category",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    Self::ALL
      .into_iter()
      .find(|field| field.as_str().eq_ignore_ascii_case(value.trim()))
  }

  /// Next field in display order, wrapping around
  pub fn next(self) -> Self {
    match self {
      SortField::Term => SortField::Translation,
      SortField::Translation => SortField::Category,
      SortField::Category => SortField::Term,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
  #[default]
  Ascending,
  Descending,
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      SortOrder::Ascending => "asc",
      SortOrder::Descending => "desc",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "asc" | "ascending" => Some(SortOrder::Ascending),
      "desc" | "descending" => Some(SortOrder::Descending),
      _ => None,
    }
  }

  pub fn reversed(self) -> Self {
    match self {
      SortOrder::Ascending => SortOrder::Descending,
      SortOrder::Descending => SortOrder::Ascending,
    }
  }
}

/// The user's current search, category, sort and page selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
  /// Empty means no category restriction
  pub selected_categories: BTreeSet<String>,
  pub search_query: String,
  pub sort_field: SortField,
  pub sort_order: SortOrder,
  /// 1-based
  pub current_page: usize,
}

impl Default for FilterState {
  fn default() -> Self {
    Self {
      selected_categories: BTreeSet::new(),
      search_query: String::new(),
      sort_field: SortField::default(),
      sort_order: SortOrder::default(),
      current_page: 1,
    }
  }
}

/// Normalized text a search query is matched against.
pub fn search_haystack(record: &Record) -> String {
  normalize(
    &[
      record.term.as_str(),
      record.transliteration.as_str(),
      record.translation_primary.as_str(),
      record.meaning_primary.as_str(),
      record.meaning_secondary.as_str(),
    ]
    .join(" "),
  )
}

fn sort_key(record: &Record, field: SortField) -> String {
  match field {
    SortField::Term => normalize(&record.term),
    SortField::Translation => fold_case(&record.translation_primary),
    SortField::Category => fold_case(&record.category),
  }
}

/// Positions in `records` of the filtered view, in display order.
///
/// The sort is stable: equal keys keep their input order in both directions.
pub fn matching_indices(records: &[Record], state: &FilterState) -> Vec<usize> {
  let query = normalize(state.search_query.trim());

  let mut keyed: Vec<(String, usize)> = records
    .iter()
    .enumerate()
    .filter(|(_, record)| {
      state.selected_categories.is_empty() || state.selected_categories.contains(&record.category)
    })
    .filter(|(_, record)| query.is_empty() || search_haystack(record).contains(&query))
    .map(|(index, record)| (sort_key(record, state.sort_field), index))
    .collect();

  keyed.sort_by(|a, b| {
    let ordering = a.0.cmp(&b.0);
    match state.sort_order {
      SortOrder::Ascending => ordering,
      SortOrder::Descending => ordering.reverse(),
    }
  });

  keyed.into_iter().map(|(_, index)| index).collect()
}

/// Number of pages needed for `total` items.
pub fn page_count(total: usize, page_size: usize) -> usize {
  if page_size == 0 {
    0
  } else {
    total.div_ceil(page_size)
  }
}

/// Items on 1-based `page`. Pages past the end are empty.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
  let start = page.saturating_sub(1).saturating_mul(page_size);
  if page_size == 0 || start >= items.len() {
    return &[];
  }
  let end = start.saturating_add(page_size).min(items.len());
  &items[start..end]
}
