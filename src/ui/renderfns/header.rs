use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::theme::Palette;
use crate::ui::view::ShortcutInfo;

/// Draw the header bar with logo, data source, status and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  palette: &Palette,
  source_url: &str,
  status: &str,
  shortcuts: &[ShortcutInfo],
) {
  let separator = Style::default().fg(palette.muted);

  let mut spans = vec![
    Span::styled(" qamus ", Style::default().fg(palette.accent).bold()),
    Span::styled("│", separator),
    Span::styled(
      format!(" {} ", source_host(source_url)),
      Style::default().fg(palette.text),
    ),
    Span::styled("│", separator),
    Span::styled(
      format!(" {} ", status),
      Style::default().fg(palette.warning).bold(),
    ),
    Span::raw(" "),
  ];

  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);
  for shortcut in sorted {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(palette.accent),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(palette.muted),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(palette.base());
  frame.render_widget(paragraph, area);
}

/// Host part of the data source URL, or the URL itself if it has none
fn source_host(url: &str) -> String {
  url::Url::parse(url)
    .ok()
    .and_then(|parsed| {
      let host = parsed.host_str()?.to_string();
      Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
      })
    })
    .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_source_host() {
    assert_eq!(
      source_host("https://docs.google.com/spreadsheets/d/e/x/pub?output=csv"),
      "docs.google.com"
    );
    assert_eq!(source_host("http://localhost:8080/export.csv"), "localhost:8080");
    assert_eq!(source_host("not a url"), "not a url");
  }
}
