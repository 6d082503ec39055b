//! Offline driver: replays a scripted browsing session through the real
//! pipeline. Point `TUBEGUARD_ENDPOINT` at a live classifier to see
//! warnings; without one the run demonstrates the fail-open error path.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use tokio::time::{self, Instant};
use url::Url;

use tubeguard::config::GuardConfig;
use tubeguard::monitor::NavSignal;
use tubeguard::protocol::TabId;
use tubeguard::settings::PreferenceStore;
use tubeguard::sim::{RecordingNavigator, ScriptedPage, ScriptedTab};
use tubeguard::surface::{InterstitialControl, TabSurface};
use tubeguard::{Engine, TabRuntime};

enum SessionOutcome {
    Warning,
    Notice(String),
    Quiet,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("tubeguard scripted session starting");

    let mut config = GuardConfig::default();
    if let Ok(endpoint) = env::var("TUBEGUARD_ENDPOINT") {
        config.endpoint = Url::parse(&endpoint)
            .with_context(|| format!("TUBEGUARD_ENDPOINT is not a valid URL: {endpoint:?}"))?;
    }
    info!("classifier endpoint: {}", config.endpoint);

    let settings = Arc::new(PreferenceStore::new(settings_path()?)?);
    seed_preferences(&settings)?;

    let navigator = Arc::new(RecordingNavigator::new());
    let tab = Arc::new(ScriptedTab::new(TabId(1)));
    navigator.attach(Arc::clone(&tab));
    prepare_pages(&tab)?;

    let engine = Engine::launch(config.clone(), settings, Arc::clone(&navigator))?;
    let runtime = engine
        .attach_tab(tab.id(), Arc::clone(&tab) as Arc<dyn TabSurface>)
        .await?;

    // Full page load onto the site's home page.
    let event = tab.goto("https://www.youtube.com/")?;
    engine.coordinator().tab_event(event).await?;
    time::sleep(Duration::from_millis(300)).await;

    visit_video(
        &config,
        &tab,
        &runtime,
        "https://www.youtube.com/watch?v=borrowck101",
        InterstitialControl::GoBack,
    )
    .await?;

    visit_video(
        &config,
        &tab,
        &runtime,
        "https://www.youtube.com/watch?v=drama9000",
        InterstitialControl::Continue,
    )
    .await?;

    info!(
        "session finished: {} interstitial renders, {} notices, {} recorded navigations",
        tab.views().len(),
        tab.notice_history().len(),
        navigator.navigations().len()
    );
    for (tab_id, url) in navigator.navigations() {
        info!("  navigated tab {tab_id} -> {url}");
    }
    for notice in tab.notice_history() {
        info!("  notice: {notice}");
    }

    runtime.close().await?;
    engine.shutdown();
    Ok(())
}

/// One in-page navigation to a video, waiting for whatever verdict the
/// classifier produces and reacting like a user would.
async fn visit_video(
    config: &GuardConfig,
    tab: &Arc<ScriptedTab>,
    runtime: &TabRuntime,
    url: &str,
    choice: InterstitialControl,
) -> Result<()> {
    let seen_views = tab.views().len();
    let seen_notices = tab.notice_history().len();

    info!("navigating to {url}");
    tab.goto(url)?;
    tab.begin_playback();
    runtime.notify_navigation(NavSignal::HistoryMutation).await?;

    // Settle, extraction, and the classifier round trip all have to fit.
    let budget = config.settle_delay + config.request_timeout + Duration::from_secs(3);
    match await_outcome(tab, seen_views, seen_notices, budget).await {
        SessionOutcome::Warning => {
            info!("warning interstitial is up, waiting for the countdown");
            wait_for_unlock(config, tab).await;
            info!("countdown finished, choosing {choice:?}");
            runtime.interstitial().choose(choice).await;
            time::sleep(Duration::from_millis(300)).await;
            info!(
                "after choice: playing={} url={:?}",
                tab.is_playing(),
                tab.current_url().map(String::from)
            );
        }
        SessionOutcome::Notice(message) => {
            info!("classifier unavailable or errored, playback continues: {message}");
        }
        SessionOutcome::Quiet => {
            info!("video aligns with the configured focus, no interruption");
        }
    }
    Ok(())
}

async fn await_outcome(
    tab: &ScriptedTab,
    seen_views: usize,
    seen_notices: usize,
    budget: Duration,
) -> SessionOutcome {
    let deadline = Instant::now() + budget;
    while Instant::now() < deadline {
        let views = tab.views();
        if views.len() > seen_views && views.last().is_some_and(|view| view.visible) {
            return SessionOutcome::Warning;
        }
        let notices = tab.notice_history();
        if notices.len() > seen_notices {
            if let Some(message) = notices.last() {
                return SessionOutcome::Notice(message.clone());
            }
        }
        time::sleep(Duration::from_millis(100)).await;
    }
    SessionOutcome::Quiet
}

async fn wait_for_unlock(config: &GuardConfig, tab: &ScriptedTab) {
    let budget =
        config.countdown_tick * (u32::from(config.countdown_start) + 2) + Duration::from_secs(1);
    let deadline = Instant::now() + budget;
    while Instant::now() < deadline {
        if tab
            .last_view()
            .is_some_and(|view| view.visible && view.continue_enabled)
        {
            return;
        }
        time::sleep(Duration::from_millis(100)).await;
    }
}

fn settings_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("TUBEGUARD_SETTINGS") {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().context("no config directory on this platform")?;
    Ok(base.join("tubeguard").join("settings.json"))
}

/// First-run focus: give the classifier something to judge against.
fn seed_preferences(settings: &PreferenceStore) -> Result<()> {
    let prefs = settings.snapshot();
    if !prefs.preferred_content.is_empty() || !prefs.non_preferred_content.is_empty() {
        return Ok(());
    }
    info!("seeding default focus preferences");
    settings.set_preferred_content(vec![
        "rust programming".into(),
        "systems programming".into(),
        "software engineering talks".into(),
    ])?;
    settings.set_non_preferred_content(vec![
        "celebrity gossip".into(),
        "drama compilations".into(),
        "reaction videos".into(),
    ])?;
    Ok(())
}

fn prepare_pages(tab: &ScriptedTab) -> Result<()> {
    tab.add_page(
        "https://www.youtube.com/",
        ScriptedPage {
            title: "YouTube".into(),
            html: "<html><body><div id=\"contents\"></div></body></html>".into(),
            expanded_html: None,
        },
    )?;
    tab.add_page(
        "https://www.youtube.com/watch?v=borrowck101",
        ScriptedPage {
            title: "Understanding the Borrow Checker - YouTube".into(),
            html: r#"<html><head>
                <meta property="og:title" content="Understanding the Borrow Checker">
                <meta property="og:description" content="A walkthrough of ownership, borrowing, and lifetimes with worked examples.">
            </head><body>
                <h1 class="ytd-watch-metadata"><yt-formatted-string>Understanding the Borrow Checker</yt-formatted-string></h1>
                <div id="description-inline-expander">
                    <div class="content">A walkthrough of ownership, borrowing, and lifetimes with worked examples.</div>
                </div>
            </body></html>"#
                .into(),
            expanded_html: None,
        },
    )?;
    // Short collapsed description; the expander reveals the full text.
    tab.add_page(
        "https://www.youtube.com/watch?v=drama9000",
        ScriptedPage {
            title: "Celebrity Drama Compilation 2024 - YouTube".into(),
            html: r#"<html><body>
                <h1 class="ytd-watch-metadata"><yt-formatted-string>Celebrity Drama Compilation 2024</yt-formatted-string></h1>
                <div id="description-inline-expander">
                    <div class="content">The messiest moments...</div>
                </div>
            </body></html>"#
                .into(),
            expanded_html: Some(
                r#"<html><body>
                <h1 class="ytd-watch-metadata"><yt-formatted-string>Celebrity Drama Compilation 2024</yt-formatted-string></h1>
                <div id="description-inline-expander">
                    <div class="content">The messiest moments, feuds, and breakups of the year, ranked and reacted to.</div>
                </div>
            </body></html>"#
                    .into(),
            ),
        },
    )?;
    Ok(())
}
