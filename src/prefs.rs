//! Persisted display preferences, one cache key each.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, KvBackend};

const THEME_KEY: &str = "theme";
const VIEW_MODE_KEY: &str = "view_mode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  Light,
  #[default]
  Dark,
}

impl Theme {
  pub fn toggled(self) -> Self {
    match self {
      Theme::Light => Theme::Dark,
      Theme::Dark => Theme::Light,
    }
  }
}

/// Card grid or dense table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  #[default]
  Grid,
  Table,
}

impl ViewMode {
  pub fn toggled(self) -> Self {
    match self {
      ViewMode::Grid => ViewMode::Table,
      ViewMode::Table => ViewMode::Grid,
    }
  }
}

/// Read and write preferences through the cache store.
pub struct Preferences<B: KvBackend> {
  store: CacheStore<B>,
}

impl<B: KvBackend> Preferences<B> {
  pub fn new(store: CacheStore<B>) -> Self {
    Self { store }
  }

  pub fn theme(&self) -> Theme {
    self.store.get(THEME_KEY).unwrap_or_default()
  }

  pub fn set_theme(&self, theme: Theme) -> bool {
    self.store.set(THEME_KEY, &theme, None)
  }

  pub fn view_mode(&self) -> ViewMode {
    self.store.get(VIEW_MODE_KEY).unwrap_or_default()
  }

  pub fn set_view_mode(&self, mode: ViewMode) -> bool {
    self.store.set(VIEW_MODE_KEY, &mode, None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryBackend;

  #[test]
  fn test_defaults_when_unset() {
    let prefs = Preferences::new(CacheStore::new(MemoryBackend::new(), "qamus"));
    assert_eq!(prefs.theme(), Theme::Dark);
    assert_eq!(prefs.view_mode(), ViewMode::Grid);
  }

  #[test]
  fn test_preferences_are_independent_keys() {
    let store = CacheStore::new(MemoryBackend::new(), "qamus");
    let prefs = Preferences::new(store.clone());

    assert!(prefs.set_theme(Theme::Light));
    assert_eq!(prefs.theme(), Theme::Light);
    assert_eq!(prefs.view_mode(), ViewMode::Grid);

    assert!(prefs.set_view_mode(ViewMode::Table));
    store.remove(THEME_KEY);
    assert_eq!(prefs.theme(), Theme::Dark);
    assert_eq!(prefs.view_mode(), ViewMode::Table);
  }

  #[test]
  fn test_toggles() {
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
    assert_eq!(ViewMode::Grid.toggled().toggled(), ViewMode::Grid);
  }
}
