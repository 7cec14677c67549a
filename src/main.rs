//! Blogshelf demo: wires the components the way an embedding page would,
//! loads the collection and prints a few listings.
//!
//! With the `network` feature the dataset URL from `settings.json` is fetched;
//! without it the loader runs offline and falls back to cache or sample data.
//! Set `RUST_LOG` to adjust log output (default `blogshelf=info`).

use blogshelf::app::App;
use blogshelf::managers::reading_history_manager::ReadingHistoryManagerTrait;
use blogshelf::services::fetch_source::FetchSource;
use blogshelf::types::query::{LoadOutcome, PostQuery};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blogshelf=info")),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let app = match build_app(config_path) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("Failed to initialize Blogshelf: {}", err);
            std::process::exit(1);
        }
    };

    run(&app).await;
}

#[cfg(feature = "network")]
fn build_app(
    config_path: Option<String>,
) -> Result<App<blogshelf::services::fetch_source::HttpFetchSource>, blogshelf::types::errors::AppError> {
    App::new(config_path)
}

#[cfg(not(feature = "network"))]
fn build_app(
    config_path: Option<String>,
) -> Result<App<blogshelf::services::fetch_source::StaticFetchSource>, blogshelf::types::errors::AppError> {
    use blogshelf::services::fetch_source::StaticFetchSource;
    use blogshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

    let mut settings_engine = SettingsEngine::new(config_path);
    let settings = settings_engine.load()?;
    let storage = blogshelf::app::open_storage(&settings)?;
    Ok(App::with_components(settings_engine, storage, StaticFetchSource::offline()))
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

async fn run<F: FetchSource>(app: &App<F>) {
    section("Load");
    match app.startup().await {
        LoadOutcome::Completed(report) => println!(
            "  {} posts from {:?} ({} malformed, {} duplicate records skipped)",
            report.loaded, report.source, report.skipped_malformed, report.skipped_duplicates
        ),
        other => println!("  load did not complete: {:?}", other),
    }
    println!();

    section("First page");
    let page = app.posts.query(&PostQuery {
        page_size: app.settings().display.page_size,
        ..PostQuery::default()
    });
    for post in &page.posts {
        println!(
            "  [{}] {} · {} · {} min · {} views",
            post.id, post.title, post.author.name, post.reading_time_minutes, post.view_count
        );
    }
    println!("  page {}/{} of {} posts", page.page, page.total_pages, page.total);
    println!();

    section("Facets");
    let facets = app.posts.facets();
    for facet in &facets.categories {
        println!("  category {:<16} {}", facet.value, facet.count);
    }
    println!("  {} tags, {} authors", facets.tags.len(), facets.authors.len());
    println!();

    if let Some(first) = page.posts.first() {
        section("Engagement");
        app.posts.record_view(&first.id);
        let bookmarked = app.posts.toggle_bookmark(&first.id).unwrap_or(false);
        let entry = app.reading_history.record_progress(&first.id, 40);
        println!(
            "  '{}' bookmarked={} reading status={:?}",
            first.title, bookmarked, entry.status
        );
        println!("  stats: {:?}", app.posts.stats());
    }
}
