pub mod components;
pub mod renderfns;
pub mod theme;
pub mod view;
pub mod views;

use crate::app::App;
use crate::cache::KvBackend;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw<B: KvBackend + 'static>(frame: &mut Frame, app: &mut App<B>) {
  let palette = app.render_context().palette;
  let notice = app.notice();

  let [header, banner, body, footer] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(if notice.is_some() { 1 } else { 0 }),
    Constraint::Min(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  frame.render_widget(Paragraph::new("").style(palette.base()), frame.area());

  renderfns::draw_header(
    frame,
    header,
    &palette,
    app.source_url(),
    &app.status(),
    &app.shortcuts(),
  );

  if let Some(message) = notice {
    frame.render_widget(
      Paragraph::new(format!(" {} ", message))
        .style(Style::default().fg(palette.background).bg(palette.warning).bold()),
      banner,
    );
  }

  app.render_body(frame, body);

  let (position, link) = app.footer();
  renderfns::draw_footer(frame, footer, &palette, &position, &link);
}
