use dotenv::dotenv;
use log::{LevelFilter, info, warn};

use tice_sync::config::{LoadFromEnv, SCHEDULE_PAGES, SyncConfig, WebdriverEnv};
use tice_sync::extract::extract_schedule_page;
use tice_sync::feed::{build_calendar, write_feed};
use tice_sync::{BrowserSession, ClassOccurrence, FilterRules, RequestClient, dedupe_occurrences};

/// Loads both schedule pages in one browser session and runs the extraction
/// fallback chain on each. Navigation failures bubble up and fail the run.
async fn scrape_all_pages(
    session: &BrowserSession,
    request_client: &RequestClient,
    default_minutes: i64,
) -> anyhow::Result<Vec<ClassOccurrence>> {
    let mut all_occurrences = vec![];
    for schedule in SCHEDULE_PAGES {
        let page = session.load_schedule_page(schedule.url).await?;
        let occurrences =
            extract_schedule_page(&page, schedule, request_client, default_minutes).await;
        all_occurrences.extend(occurrences);
    }
    Ok(all_occurrences)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let headless = !std::env::args().any(|arg| arg == "--no-headless");
    let config = SyncConfig::load()?;
    let webdriver_env = WebdriverEnv::load_from_env()?;
    let request_client = RequestClient::new()?;

    info!("Tice Creek Fitness Center calendar sync | headless: {headless}");

    let session = BrowserSession::connect(&webdriver_env.webdriver_url, headless).await?;
    let scrape_result = scrape_all_pages(
        &session,
        &request_client,
        config.default_class_duration_minutes,
    )
    .await;
    if let Err(e) = session.quit().await {
        warn!("{e}");
    }
    let all_occurrences = scrape_result?;

    info!("Total scraped: {}", all_occurrences.len());
    let total = all_occurrences.len();
    let unique = dedupe_occurrences(all_occurrences);
    if unique.len() < total {
        info!("Deduplicated: {total} -> {} unique", unique.len());
    }

    if unique.is_empty() {
        // Not fatal: publish a valid empty feed and let the next scheduled
        // run retry. The warning is the signal for human follow-up.
        warn!("No classes extracted from any page; publishing an empty feed");
    }

    let rules = FilterRules::from_config(&config);
    let kept = rules.apply(unique);
    for occurrence in &kept {
        info!(
            "  {} {} - {} ({})",
            occurrence.start.format("%a %Y-%m-%d"),
            occurrence.start.format("%-I:%M %p"),
            occurrence.name,
            occurrence.instructor.as_deref().unwrap_or("?")
        );
    }

    let calendar = build_calendar(&kept, &config);
    let output_path = config.output_path();
    write_feed(&output_path, &calendar)?;
    info!(
        "Calendar -> {} ({} events)",
        output_path.display(),
        kept.len()
    );

    Ok(())
}
