//! Tabular text parsing for spreadsheet CSV exports.
//!
//! Only the subset a spreadsheet export emits is supported: a single-character
//! delimiter, double-quote quoting with doubled-quote escaping, an optional
//! leading byte-order mark, and CRLF/CR/LF line endings. Quoted fields cannot
//! span lines. Malformed quoting never fails: the field splitter simply ends
//! the line in whatever quote state it reached.

use std::collections::BTreeMap;

/// Default field delimiter
pub const DEFAULT_DELIMITER: char = ',';

/// How many leading characters `looks_like_html` inspects
const HTML_SNIFF_LEN: usize = 200;

const QUOTE: char = '"';
const BOM: char = '\u{feff}';

/// One parsed data row keyed by header name.
pub type Row = BTreeMap<String, String>;

/// Split text into non-blank lines.
///
/// A leading BOM is stripped and every line break convention is folded to LF
/// before splitting. Lines that are empty after trimming are dropped.
pub fn split_lines(text: &str) -> Vec<&str> {
  let text = text.strip_prefix(BOM).unwrap_or(text);

  // Splitting on both CR and LF and dropping blank pieces is equivalent to
  // normalizing CRLF/CR to LF first: the empty piece between CR and LF is blank.
  text
    .split(['\r', '\n'])
    .filter(|line| !line.trim().is_empty())
    .collect()
}

/// Split a single line into fields.
pub fn parse_line(line: &str, delimiter: char) -> Vec<String> {
  let mut fields = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut chars = line.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      if c == QUOTE {
        if chars.peek() == Some(&QUOTE) {
          // Escaped quote
          chars.next();
          field.push(QUOTE);
        } else {
          in_quotes = false;
        }
      } else {
        field.push(c);
      }
    } else if c == QUOTE {
      in_quotes = true;
    } else if c == delimiter {
      fields.push(std::mem::take(&mut field));
    } else {
      field.push(c);
    }
  }

  fields.push(field);
  fields
}

/// Parse text into rows of raw fields.
pub fn parse_rows(text: &str, delimiter: char) -> Vec<Vec<String>> {
  split_lines(text)
    .into_iter()
    .map(|line| parse_line(line, delimiter))
    .collect()
}

/// Parse text into header-keyed rows, using the first row as headers.
///
/// Values are always trimmed. Cells missing from a short row become empty
/// strings; positions without a usable header get a `column_<index>` name.
/// Text with fewer than two rows yields no objects.
pub fn parse_objects(text: &str, delimiter: char, trim_headers: bool) -> Vec<Row> {
  let mut rows = parse_rows(text, delimiter).into_iter();

  let headers: Vec<String> = match rows.next() {
    Some(header) => header
      .into_iter()
      .map(|h| if trim_headers { h.trim().to_string() } else { h })
      .collect(),
    None => return Vec::new(),
  };

  rows
    .map(|fields| {
      let width = headers.len().max(fields.len());
      let mut row = Row::new();
      for index in 0..width {
        let name = match headers.get(index) {
          Some(h) if !h.trim().is_empty() => h.clone(),
          _ => placeholder_header(index),
        };
        let value = fields
          .get(index)
          .map(|v| v.trim().to_string())
          .unwrap_or_default();
        row.insert(name, value);
      }
      row
    })
    .collect()
}

fn placeholder_header(index: usize) -> String {
  format!("column_{}", index)
}

/// Detect an HTML document served in place of tabular data.
///
/// Published spreadsheet links answer with a login or error page (status 200)
/// when the export is revoked.
pub fn looks_like_html(text: &str) -> bool {
  let head: String = text
    .trim_start_matches(BOM)
    .chars()
    .take(HTML_SNIFF_LEN)
    .collect::<String>()
    .to_lowercase();

  head.contains("<!doctype html") || head.contains("<html") || head.contains("<title")
}

/// Quote a field when the delimiter, a quote or a line break would break it.
pub fn quote_field(field: &str, delimiter: char) -> String {
  let needs_quotes = field.contains(delimiter) || field.contains(['"', '\r', '\n']);
  if needs_quotes {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}

/// Render rows back to delimited text, one LF-terminated line per row.
pub fn write_rows<R, F>(rows: R, delimiter: char) -> String
where
  R: IntoIterator<Item = F>,
  F: IntoIterator,
  F::Item: AsRef<str>,
{
  let mut out = String::new();
  let separator = delimiter.to_string();
  for row in rows {
    let fields: Vec<F::Item> = row.into_iter().collect();
    let mut line = fields
      .iter()
      .map(|field| quote_field(field.as_ref(), delimiter))
      .collect::<Vec<_>>()
      .join(&separator);
    // A blank line would be dropped on parse
    if line.trim().is_empty() {
      line = fields
        .iter()
        .map(|field| format!("\"{}\"", field.as_ref()))
        .collect::<Vec<_>>()
        .join(&separator);
    }
    out.push_str(&line);
    out.push('\n');
  }
  out
}
