use ratatui::prelude::*;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Parse a category color hint: `#rgb`, `#rrggbb` or a basic color name
pub fn parse_color(value: &str) -> Option<Color> {
  let value = value.trim();
  if let Some(hex) = value.strip_prefix('#') {
    let expanded: String = match hex.len() {
      3 => hex.chars().flat_map(|c| [c, c]).collect(),
      6 => hex.to_string(),
      _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
  }

  match value.to_ascii_lowercase().as_str() {
    "red" => Some(Color::Red),
    "green" => Some(Color::Green),
    "blue" => Some(Color::Blue),
    "yellow" => Some(Color::Yellow),
    "magenta" | "purple" => Some(Color::Magenta),
    "cyan" => Some(Color::Cyan),
    "gray" | "grey" => Some(Color::Gray),
    "white" => Some(Color::White),
    "black" => Some(Color::Black),
    _ => None,
  }
}

/// A rectangle of at most `width` x `height`, centered in `area`
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("مدرسة كبيرة", 6), "مدر...");
  }

  #[test]
  fn test_parse_hex_colors() {
    assert_eq!(parse_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
    assert_eq!(parse_color("#0f0"), Some(Color::Rgb(0, 255, 0)));
    assert_eq!(parse_color("#12"), None);
    assert_eq!(parse_color("#zzzzzz"), None);
  }

  #[test]
  fn test_parse_named_colors() {
    assert_eq!(parse_color(" Green "), Some(Color::Green));
    assert_eq!(parse_color("teal-ish"), None);
    assert_eq!(parse_color(""), None);
  }

  #[test]
  fn test_centered() {
    let area = Rect::new(0, 0, 100, 40);
    assert_eq!(centered(area, 20, 10), Rect::new(40, 15, 20, 10));
    assert_eq!(centered(area, 200, 10).width, 100);
  }
}
