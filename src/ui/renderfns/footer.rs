use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::theme::Palette;

/// Draw the footer bar with page position and the current share link
pub fn draw_footer(frame: &mut Frame, area: Rect, palette: &Palette, position: &str, share_link: &str) {
  let link = if share_link.is_empty() {
    "(no filters)".to_string()
  } else {
    format!("?{}", share_link)
  };

  let line = Line::from(vec![
    Span::raw(" "),
    Span::styled(position.to_string(), Style::default().fg(palette.accent).bold()),
    Span::styled(" > ", Style::default().fg(palette.muted)),
    Span::styled("link ", Style::default().fg(palette.muted)),
    Span::styled(link, Style::default().fg(palette.text)),
  ]);

  let paragraph = Paragraph::new(line).style(palette.base());
  frame.render_widget(paragraph, area);
}
