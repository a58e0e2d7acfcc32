use ratatui::prelude::*;

use crate::prefs::Theme;

/// Colors used across every screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub background: Color,
  pub text: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub selection: Color,
  pub warning: Color,
  pub error: Color,
}

impl Palette {
  pub fn for_theme(theme: Theme) -> Self {
    match theme {
      Theme::Dark => Self {
        background: Color::Black,
        text: Color::White,
        muted: Color::DarkGray,
        accent: Color::Cyan,
        border: Color::Blue,
        selection: Color::DarkGray,
        warning: Color::Yellow,
        error: Color::Red,
      },
      Theme::Light => Self {
        background: Color::White,
        text: Color::Black,
        muted: Color::Gray,
        accent: Color::Blue,
        border: Color::DarkGray,
        selection: Color::Gray,
        warning: Color::Magenta,
        error: Color::Red,
      },
    }
  }

  pub fn base(&self) -> Style {
    Style::default().fg(self.text).bg(self.background)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_themes_differ() {
    let dark = Palette::for_theme(Theme::Dark);
    let light = Palette::for_theme(Theme::Light);
    assert_ne!(dark, light);
    assert_eq!(dark.base().bg, Some(Color::Black));
  }
}
