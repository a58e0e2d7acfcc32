use crate::cache::{Backend, KvBackend};
use crate::event::{Event, EventHandler};
use crate::filter::FilterState;
use crate::loader::{DataLoader, LoadResult, LoadSource};
use crate::offline::StatusBanner;
use crate::prefs::{Preferences, Theme, ViewMode};
use crate::session::Session;
use crate::task::Task;
use crate::ui;
use crate::ui::theme::Palette;
use crate::ui::view::{RenderContext, ShortcutInfo, View, ViewAction};
use crate::ui::views::{EntryListView, StatusView};
use color_eyre::Result;
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What fills the body of the screen
enum Screen {
  Status(StatusView),
  Entries(EntryListView),
}

/// Main application state
pub struct App<B: KvBackend = Backend> {
  loader: Arc<DataLoader<B, StatusBanner>>,
  banner: StatusBanner,
  prefs: Preferences<B>,
  theme: Theme,
  view_mode: ViewMode,

  /// Filter applied when the first record set arrives
  initial_filter: FilterState,
  page_size: usize,

  screen: Screen,
  load: Option<Task<LoadResult>>,

  /// Transient message shown under the header
  notice: Option<String>,
  should_quit: bool,
}

impl<B: KvBackend + 'static> App<B> {
  pub fn new(
    loader: DataLoader<B, StatusBanner>,
    banner: StatusBanner,
    prefs: Preferences<B>,
    initial_filter: FilterState,
    page_size: usize,
  ) -> Self {
    let theme = prefs.theme();
    let view_mode = prefs.view_mode();

    Self {
      loader: Arc::new(loader),
      banner,
      prefs,
      theme,
      view_mode,
      initial_filter,
      page_size,
      screen: Screen::Status(StatusView::Loading),
      load: None,
      notice: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self, refresh: bool) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    self.start_load(refresh);
    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => {
          let action = match &mut self.screen {
            Screen::Status(view) => view.handle_key(key),
            Screen::Entries(view) => view.handle_key(key),
          };
          self.apply(action);
        }
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    info!("exiting");
    Ok(())
  }

  /// Spawn a dataset load unless one is already running.
  fn start_load(&mut self, refresh: bool) {
    if self.load.as_ref().is_some_and(Task::is_running) {
      debug!("load already in progress");
      return;
    }

    let loader = Arc::clone(&self.loader);
    self.load = Some(Task::spawn(async move {
      let result = if refresh {
        loader.reload().await
      } else {
        loader.load().await
      };
      result.map_err(|e| e.to_string())
    }));

    match &mut self.screen {
      Screen::Status(view) => *view = StatusView::Loading,
      Screen::Entries(_) => self.notice = Some("Refreshing...".to_string()),
    }
  }

  /// Pick up a finished load, if any.
  fn tick(&mut self) {
    let Some(task) = &mut self.load else {
      return;
    };
    if !task.poll() {
      return;
    }
    let Some(result) = task.take() else {
      return;
    };
    self.load = None;

    match result {
      Ok(loaded) => self.on_loaded(loaded),
      Err(error) => {
        warn!(%error, "dataset load failed");
        match &mut self.screen {
          Screen::Status(view) => *view = StatusView::Failed(error),
          Screen::Entries(_) => self.notice = Some(format!("Refresh failed: {}", error)),
        }
      }
    }
  }

  fn on_loaded(&mut self, loaded: LoadResult) {
    info!(
      records = loaded.records.len(),
      cached = loaded.source == LoadSource::Cache,
      "dataset ready"
    );

    match &mut self.screen {
      Screen::Entries(view) => {
        view.replace_records(loaded.records);
        self.notice = None;
      }
      Screen::Status(_) => {
        let session = Session::new(loaded.records, self.initial_filter.clone(), self.page_size);
        self.screen = Screen::Entries(EntryListView::new(session));
      }
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Quit => self.should_quit = true,
      ViewAction::Reload => self.start_load(true),
      ViewAction::ToggleTheme => {
        self.theme = self.theme.toggled();
        self.prefs.set_theme(self.theme);
      }
      ViewAction::ToggleViewMode => {
        self.view_mode = self.view_mode.toggled();
        self.prefs.set_view_mode(self.view_mode);
      }
    }
  }

  // Accessors for UI rendering
  pub fn render_context(&self) -> RenderContext {
    RenderContext {
      palette: Palette::for_theme(self.theme),
      view_mode: self.view_mode,
    }
  }

  pub fn source_url(&self) -> &str {
    self.loader.source_url()
  }

  /// Offline warning first, then any transient message
  pub fn notice(&self) -> Option<String> {
    if self.banner.is_unavailable() {
      return Some("Network unavailable. Retrying...".to_string());
    }
    self.notice.clone()
  }

  pub fn status(&self) -> String {
    match &self.screen {
      Screen::Status(view) => view.status(),
      Screen::Entries(view) => view.status(),
    }
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    match &self.screen {
      Screen::Status(view) => view.shortcuts(),
      Screen::Entries(view) => view.shortcuts(),
    }
  }

  /// Page position and share link for the footer
  pub fn footer(&self) -> (String, String) {
    match &self.screen {
      Screen::Status(_) => (String::new(), self.initial_filter.to_query()),
      Screen::Entries(view) => {
        let page = view.session().view();
        (
          format!("page {}/{}", page.page, page.page_count.max(1)),
          view.session().share_link(),
        )
      }
    }
  }

  pub fn render_body(&mut self, frame: &mut Frame, area: Rect) {
    let ctx = self.render_context();
    match &mut self.screen {
      Screen::Status(view) => view.render(frame, area, &ctx),
      Screen::Entries(view) => view.render(frame, area, &ctx),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheStore, MemoryBackend};
  use crate::fetch::{FetchConfig, Fetcher};
  use crate::offline::{OfflineRetry, RetryPolicy};
  use crate::retry::Backoff;
  use crate::testutil::{StubResponse, StubServer};

  const CSV: &str = "Arabic,English,Category\nكتاب,book,Objects\nقلم,pen,Objects\n";

  fn app(url: &str, initial: FilterState) -> App<MemoryBackend> {
    let store = CacheStore::new(MemoryBackend::new(), "qamus");
    let banner = StatusBanner::default();
    let fetch_config = FetchConfig {
      attempts: 1,
      backoff: Backoff::new(1, 1.0),
      ..FetchConfig::default()
    };
    let retry = OfflineRetry::new(
      banner.clone(),
      RetryPolicy {
        attempts: 1,
        backoff: Backoff::new(1, 1.0),
      },
    );
    let loader = DataLoader::new(url, ',', Fetcher::new().unwrap(), fetch_config, store.clone(), retry);
    App::new(loader, banner, Preferences::new(store), initial, 9)
  }

  async fn settle(app: &mut App<MemoryBackend>) {
    for _ in 0..200 {
      app.tick();
      if app.load.is_none() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("load did not finish");
  }

  #[tokio::test]
  async fn test_first_load_opens_entries_with_shared_filter() {
    let server = StubServer::start(vec![StubResponse::ok(CSV)]).await;
    let mut app = app(&server.url, FilterState::from_query("q=pen"));

    app.start_load(false);
    settle(&mut app).await;

    assert!(matches!(app.screen, Screen::Entries(_)));
    assert_eq!(app.footer().1, "q=pen");
    assert_eq!(app.status(), "1 of 2 entries");
  }

  #[tokio::test]
  async fn test_failed_load_shows_failure_screen() {
    let server = StubServer::start(vec![StubResponse::status(500, "down")]).await;
    let mut app = app(&server.url, FilterState::default());

    app.start_load(false);
    settle(&mut app).await;

    assert!(matches!(app.screen, Screen::Status(StatusView::Failed(_))));
    assert!(app.notice().is_some());
  }

  #[tokio::test]
  async fn test_failed_refresh_keeps_entries() {
    let server = StubServer::start(vec![StubResponse::ok(CSV), StubResponse::status(503, "busy")]).await;
    let mut app = app(&server.url, FilterState::default());

    app.start_load(false);
    settle(&mut app).await;
    app.apply(ViewAction::Reload);
    settle(&mut app).await;

    assert!(matches!(app.screen, Screen::Entries(_)));
    assert_eq!(app.status(), "2 of 2 entries");
    assert!(app.notice().is_some_and(|n| n.contains("unavailable")));
  }

  #[tokio::test]
  async fn test_toggles_persist_preferences() {
    let mut app = app("http://127.0.0.1:9/export.csv", FilterState::default());
    assert_eq!(app.theme, Theme::Dark);

    app.apply(ViewAction::ToggleTheme);
    app.apply(ViewAction::ToggleViewMode);

    assert_eq!(app.prefs.theme(), Theme::Light);
    assert_eq!(app.prefs.view_mode(), ViewMode::Table);
    assert_eq!(app.render_context().view_mode, ViewMode::Table);
  }
}
