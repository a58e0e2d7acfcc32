mod app;
mod cache;
mod config;
mod csv;
mod event;
mod fetch;
mod filter;
mod loader;
mod normalize;
mod offline;
mod params;
mod prefs;
mod record;
mod retry;
mod session;
mod task;
mod ui;

#[cfg(test)]
mod testutil;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cache::{Backend, CacheStore};
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::filter::FilterState;
use crate::loader::DataLoader;
use crate::offline::{AlwaysOnline, OfflineRetry, StatusBanner};
use crate::record::Record;
use crate::session::Session;

/// Environment variable holding the log filter
const LOG_ENV: &str = "QAMUS_LOG";

#[derive(Parser, Debug)]
#[command(name = "qamus")]
#[command(about = "A terminal browser for spreadsheet-published dictionaries")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/qamus/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// CSV export URL of the dictionary, overriding the config file
  #[arg(short, long)]
  url: Option<String>,

  /// Share link query string to start from, e.g. "q=book&page=2"
  #[arg(short, long)]
  link: Option<String>,

  /// Restrict --print/--export to a category, replacing any from --link (repeatable)
  #[arg(long = "category", value_name = "NAME")]
  categories: Vec<String>,

  /// Print the current page of entries and exit
  #[arg(long)]
  print: bool,

  /// Write every matching entry to a CSV file and exit
  #[arg(long, value_name = "FILE")]
  export: Option<PathBuf>,

  /// Remove all cached data and preferences, then exit
  #[arg(long)]
  clear_cache: bool,

  /// Ignore the cached dataset and fetch it again
  #[arg(long)]
  refresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let config = Config::load(args.config.as_deref())?;
  let store = CacheStore::new(Backend::open(config.cache.enabled), &config.cache.namespace);

  if args.clear_cache {
    let removed = store.clear_all();
    info!(removed, "cache cleared");
    println!("Removed {} cached entries from '{}'", removed, store.namespace());
    return Ok(());
  }

  let source_url = config.source_url(args.url.as_deref())?;
  let initial_filter = args
    .link
    .as_deref()
    .map(FilterState::from_query)
    .unwrap_or_default();
  let fetcher = Fetcher::new()?;

  if args.print || args.export.is_some() {
    let loader = DataLoader::new(
      &source_url,
      config.source.delimiter,
      fetcher,
      config.fetch_config(),
      store,
      OfflineRetry::new(AlwaysOnline, config.retry_policy()),
    )
    .with_ttl(config.entries_ttl());

    let loaded = if args.refresh {
      loader.reload().await
    } else {
      loader.load().await
    }
    .map_err(|e| eyre!("Failed to load dictionary from {}: {}", source_url, e))?;

    let session = batch_session(
      loaded.records,
      initial_filter,
      config.browse.page_size,
      &args.categories,
    );
    if let Some(path) = &args.export {
      export_csv(&session, path, config.source.delimiter)?;
    }
    if args.print {
      print_page(&session)?;
    }
    return Ok(());
  }

  let banner = StatusBanner::for_source(&source_url);
  let loader = DataLoader::new(
    &source_url,
    config.source.delimiter,
    fetcher,
    config.fetch_config(),
    store.clone(),
    OfflineRetry::new(banner.clone(), config.retry_policy()),
  )
  .with_ttl(config.entries_ttl());

  let mut app = app::App::new(
    loader,
    banner,
    prefs::Preferences::new(store),
    initial_filter,
    config.browse.page_size,
  );
  app.run(args.refresh).await?;

  Ok(())
}

/// Log to a file so output never lands on the terminal UI.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("qamus")
    .join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&log_dir, "qamus.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter =
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("qamus=info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

/// Session for --print/--export, with any --category override applied.
fn batch_session(
  records: Vec<Record>,
  initial: FilterState,
  page_size: usize,
  categories: &[String],
) -> Session {
  let mut session = Session::new(records, initial, page_size);
  if !categories.is_empty() {
    session.set_categories(categories.iter().cloned());
  }
  session
}

/// Header row and field order used for export.
const EXPORT_HEADERS: [&str; 9] = [
  "id",
  "term",
  "transliteration",
  "translation",
  "meaning",
  "arabic meaning",
  "category",
  "color",
  "image",
];

fn export_row(record: &Record) -> [&str; 9] {
  [
    record.id.as_str(),
    record.term.as_str(),
    record.transliteration.as_str(),
    record.translation_primary.as_str(),
    record.meaning_primary.as_str(),
    record.meaning_secondary.as_str(),
    record.category.as_str(),
    record.color.as_str(),
    record.image_url.as_str(),
  ]
}

fn export_csv(session: &Session, path: &Path, delimiter: char) -> Result<()> {
  let rows = std::iter::once(EXPORT_HEADERS).chain(session.filtered().map(export_row));
  let text = csv::write_rows(rows, delimiter);
  std::fs::write(path, text)
    .map_err(|e| eyre!("Failed to write export {}: {}", path.display(), e))?;
  info!(path = %path.display(), entries = session.filtered().count(), "exported entries");
  Ok(())
}

fn print_page(session: &Session) -> Result<()> {
  let page = session.view();
  let mut out = std::io::stdout().lock();

  for record in &page.entries {
    let mut line = record.term.clone();
    if !record.transliteration.is_empty() {
      line.push_str(&format!(" ({})", record.transliteration));
    }
    if !record.translation_primary.is_empty() {
      line.push_str(&format!(" - {}", record.translation_primary));
    }
    if !record.category.is_empty() {
      line.push_str(&format!(" [{}]", record.category));
    }
    writeln!(out, "{}", line)?;
  }
  writeln!(
    out,
    "page {}/{} ({} per page) - {} matching entries",
    page.page,
    page.page_count.max(1),
    session.page_size(),
    page.total
  )?;

  let link = session.share_link();
  if !link.is_empty() {
    writeln!(out, "link: ?{}", link)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_export_round_trips_through_parser() {
    let records = vec![
      Record {
        term: "كتاب".into(),
        translation_primary: "book, volume".into(),
        meaning_primary: "a \"written\" work".into(),
        category: "Objects".into(),
        ..Default::default()
      },
      Record {
        term: "قلم".into(),
        translation_primary: "pen".into(),
        category: "Tools".into(),
        ..Default::default()
      },
    ];
    let session = Session::new(records.clone(), FilterState::from_query("categories=Objects"), 9);
    let path = std::env::temp_dir().join(format!("qamus-export-{}.csv", std::process::id()));

    export_csv(&session, &path, ',').unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let parsed = record::records_from_rows(&csv::parse_objects(&text, ',', true));
    assert_eq!(parsed, vec![records[0].clone()]);
  }

  #[test]
  fn test_category_override_replaces_link_categories() {
    let records: Vec<Record> = ["Animals", "Food", "Tools"]
      .iter()
      .map(|category| Record {
        term: format!("{} term", category),
        category: category.to_string(),
        ..Default::default()
      })
      .collect();
    let initial = FilterState::from_query("categories=Tools&page=2");

    let kept = batch_session(records.clone(), initial.clone(), 9, &[]);
    assert_eq!(kept.filtered().count(), 1);

    let session = batch_session(records, initial, 9, &["Animals".into(), "Food".into()]);
    let categories: Vec<&str> = session.filtered().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["Animals", "Food"]);
    assert_eq!(session.view().page, 1);
    assert_eq!(session.share_link(), "categories=Animals%2CFood");
  }

  #[test]
  fn test_args_parse() {
    let args = Args::parse_from([
      "qamus",
      "--url",
      "https://example.com/a.csv",
      "--link",
      "q=cat",
      "--export",
      "out.csv",
      "--refresh",
      "--category",
      "Animals",
      "--category",
      "Food",
    ]);
    assert_eq!(args.url.as_deref(), Some("https://example.com/a.csv"));
    assert_eq!(args.export, Some(PathBuf::from("out.csv")));
    assert!(args.refresh && !args.print && !args.clear_cache);
    assert_eq!(args.categories, vec!["Animals", "Food"]);
  }
}
