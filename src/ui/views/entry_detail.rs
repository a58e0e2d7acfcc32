use crate::record::Record;
use crate::ui::renderfns::{centered, parse_color};
use crate::ui::theme::Palette;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Draw a modal with every field of `record`.
///
/// `color` is the category color hint for the record's category.
pub fn draw_entry_detail(
  frame: &mut Frame,
  area: Rect,
  palette: &Palette,
  record: &Record,
  color: Option<&str>,
) {
  let width = (area.width * 70 / 100).max(40);
  let height = (area.height * 70 / 100).max(12);
  let modal = centered(area, width, height);

  frame.render_widget(Clear, modal);

  let accent = color.and_then(parse_color).unwrap_or(palette.accent);
  let block = Block::default()
    .title(format!(" {} ", record.term))
    .title_alignment(Alignment::Center)
    .title_bottom(" esc:close ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(accent))
    .style(palette.base());

  let inner = block.inner(modal);
  frame.render_widget(block, modal);

  let label = Style::default().fg(palette.muted);
  let mut lines = Vec::new();
  for (name, value) in [
    ("Transliteration", &record.transliteration),
    ("Translation", &record.translation_primary),
    ("Category", &record.category),
  ] {
    if !value.is_empty() {
      lines.push(Line::from(vec![
        Span::styled(format!("{}: ", name), label),
        Span::raw(value.as_str()),
      ]));
    }
  }

  for (name, value) in [
    ("Meaning", &record.meaning_primary),
    ("Arabic meaning", &record.meaning_secondary),
  ] {
    if !value.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::styled(format!("{}:", name), label));
      lines.push(Line::raw(value.as_str()));
    }
  }

  if !record.image_url.is_empty() {
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
      Span::styled("Image: ", label),
      Span::styled(record.image_url.as_str(), Style::default().fg(palette.accent).underlined()),
    ]));
  }

  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}
