use serde::{Deserialize, Serialize};

use crate::csv::Row;

/// One dictionary entry.
///
/// Every field is a plain string; absent source columns become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  pub id: String,
  pub image_url: String,
  /// Headword in the source script
  pub term: String,
  pub transliteration: String,
  /// Main gloss in the working language
  pub translation_primary: String,
  /// Longer explanation in the working language
  pub meaning_primary: String,
  /// Explanation in the source script
  pub meaning_secondary: String,
  pub category: String,
  /// Display color hint, shared by convention across a category
  pub color: String,
}

/// Record fields that can be populated from a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Id,
  ImageUrl,
  Term,
  Transliteration,
  TranslationPrimary,
  MeaningPrimary,
  MeaningSecondary,
  Category,
  Color,
}

/// Accepted header names per field, lowercase, most preferred first.
const COLUMN_ALIASES: &[(Field, &[&str])] = &[
  (Field::Id, &["id"]),
  (Field::ImageUrl, &["image", "image_url", "imageurl", "img"]),
  (Field::Term, &["term", "arabic", "word"]),
  (Field::Transliteration, &["transliteration", "pronunciation"]),
  (Field::TranslationPrimary, &["translation", "english"]),
  (
    Field::MeaningPrimary,
    &["meaning", "english meaning", "meaning_en", "definition"],
  ),
  (Field::MeaningSecondary, &["arabic meaning", "meaning_ar"]),
  (Field::Category, &["category"]),
  (Field::Color, &["color", "colour"]),
];

/// The field a header names and the alias's rank within that field.
fn field_for_header(header: &str) -> Option<(Field, usize)> {
  let header = header.trim().to_lowercase();
  COLUMN_ALIASES.iter().find_map(|(field, aliases)| {
    aliases
      .iter()
      .position(|alias| *alias == header)
      .map(|rank| (*field, rank))
  })
}

impl Record {
  /// Build a record from a parsed row, ignoring unrecognized columns.
  ///
  /// When a row carries several aliases of the same field, the non-empty
  /// value under the most preferred alias wins, whatever the header's case.
  pub fn from_row(row: &Row) -> Self {
    let mut candidates: Vec<(usize, Field, &str)> = row
      .iter()
      .filter_map(|(header, value)| {
        let (field, rank) = field_for_header(header)?;
        let value = value.trim();
        (!value.is_empty()).then_some((rank, field, value))
      })
      .collect();
    candidates.sort_by_key(|(rank, _, _)| *rank);

    let mut record = Record::default();
    for (_, field, value) in candidates {
      let slot = record.slot_mut(field);
      if slot.is_empty() {
        *slot = value.to_string();
      }
    }
    record
  }

  fn slot_mut(&mut self, field: Field) -> &mut String {
    match field {
      Field::Id => &mut self.id,
      Field::ImageUrl => &mut self.image_url,
      Field::Term => &mut self.term,
      Field::Transliteration => &mut self.transliteration,
      Field::TranslationPrimary => &mut self.translation_primary,
      Field::MeaningPrimary => &mut self.meaning_primary,
      Field::MeaningSecondary => &mut self.meaning_secondary,
      Field::Category => &mut self.category,
      Field::Color => &mut self.color,
    }
  }

  /// A record is kept only if it has a headword or a gloss.
  pub fn is_retained(&self) -> bool {
    !self.term.is_empty() || !self.translation_primary.is_empty()
  }
}

/// Map parsed rows to records, dropping rows without a term or translation.
pub fn records_from_rows(rows: &[Row]) -> Vec<Record> {
  rows
    .iter()
    .map(Record::from_row)
    .filter(Record::is_retained)
    .collect()
}

/// Color of the first record in `records` that carries `category` and a color.
pub fn category_color<'a>(records: &'a [Record], category: &str) -> Option<&'a str> {
  records
    .iter()
    .find(|r| r.category == category && !r.color.is_empty())
    .map(|r| r.color.as_str())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::csv::parse_objects;

  #[test]
  fn test_recognized_columns() {
    let text = "ID,Arabic,Transliteration,English,Meaning,Arabic Meaning,Category,Image,Color,Notes\n\
                7,كتاب,kitāb,book,a written work,مؤلف مكتوب,Objects,http://img/1.png,#f00,ignored";
    let records = records_from_rows(&parse_objects(text, ',', true));
    assert_eq!(
      records,
      vec![Record {
        id: "7".into(),
        image_url: "http://img/1.png".into(),
        term: "كتاب".into(),
        transliteration: "kitāb".into(),
        translation_primary: "book".into(),
        meaning_primary: "a written work".into(),
        meaning_secondary: "مؤلف مكتوب".into(),
        category: "Objects".into(),
        color: "#f00".into(),
      }]
    );
  }

  #[test]
  fn test_alias_priority_ignores_header_case() {
    let upper_first = records_from_rows(&parse_objects("Term,arabic\nفي,من", ',', true));
    let lower_first = records_from_rows(&parse_objects("term,Arabic\nفي,من", ',', true));
    assert_eq!(upper_first[0].term, "في");
    assert_eq!(lower_first[0].term, "في");

    let fallback = records_from_rows(&parse_objects("Term,arabic,English\n,من,from", ',', true));
    assert_eq!(fallback[0].term, "من");
  }

  #[test]
  fn test_missing_columns_default_to_empty() {
    let records = records_from_rows(&parse_objects("term\nقلم", ',', true));
    assert_eq!(records[0].term, "قلم");
    assert_eq!(records[0].translation_primary, "");
    assert_eq!(records[0].category, "");
  }

  #[test]
  fn test_retention_rule() {
    let text = "term,translation,category\n,,Orphan\nقلم,,A\n,pen,B";
    let records = records_from_rows(&parse_objects(text, ',', true));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].term, "قلم");
    assert_eq!(records[1].translation_primary, "pen");
  }

  #[test]
  fn test_category_color_first_match_wins() {
    let records = vec![
      Record {
        category: "A".into(),
        ..Default::default()
      },
      Record {
        category: "A".into(),
        color: "red".into(),
        ..Default::default()
      },
      Record {
        category: "A".into(),
        color: "blue".into(),
        ..Default::default()
      },
    ];
    assert_eq!(category_color(&records, "A"), Some("red"));
    assert_eq!(category_color(&records, "B"), None);
  }
}
