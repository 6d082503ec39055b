//! End-to-end pipeline tests: a scripted tab, the real engine, and a mock
//! classifier. Each test replays the scenario a user would hit and asserts
//! on what the page surface recorded.

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use tokio::time;
use url::Url;

use tubeguard::config::GuardConfig;
use tubeguard::monitor::NavSignal;
use tubeguard::protocol::TabId;
use tubeguard::settings::PreferenceStore;
use tubeguard::sim::{RecordingNavigator, ScriptedPage, ScriptedTab};
use tubeguard::surface::{InterstitialControl, TabSurface};
use tubeguard::Engine;

const HOME: &str = "https://www.youtube.com/";
const RUST_VIDEO: &str = "https://www.youtube.com/watch?v=borrowck101";
const GOSSIP_VIDEO: &str = "https://www.youtube.com/watch?v=gossip42";

fn fast_config(endpoint: &str) -> GuardConfig {
    GuardConfig {
        endpoint: Url::parse(endpoint).unwrap(),
        settle_delay: Duration::from_millis(20),
        poll_interval: Duration::from_millis(25),
        history_check_delay: Duration::from_millis(5),
        extract_retry_delay: Duration::from_millis(20),
        expansion_wait: Duration::from_millis(5),
        countdown_tick: Duration::from_millis(10),
        notice_duration: Duration::from_millis(40),
        request_timeout: Duration::from_secs(2),
        ..GuardConfig::default()
    }
}

struct Pipeline {
    engine: Engine,
    tab: Arc<ScriptedTab>,
    navigator: Arc<RecordingNavigator>,
    settings: Arc<PreferenceStore>,
    _dir: tempfile::TempDir,
}

fn pipeline(endpoint: &str) -> Pipeline {
    let dir = tempfile::tempdir().unwrap();
    let settings = Arc::new(PreferenceStore::new(dir.path().join("settings.json")).unwrap());
    settings
        .set_preferred_content(vec!["rust programming".into()])
        .unwrap();
    settings
        .set_non_preferred_content(vec!["celebrity gossip".into()])
        .unwrap();

    let navigator = Arc::new(RecordingNavigator::new());
    let tab = Arc::new(ScriptedTab::new(TabId(1)));
    navigator.attach(Arc::clone(&tab));
    seed_pages(&tab);

    let engine = Engine::launch(
        fast_config(endpoint),
        Arc::clone(&settings),
        Arc::clone(&navigator),
    )
    .unwrap();

    Pipeline {
        engine,
        tab,
        navigator,
        settings,
        _dir: dir,
    }
}

fn seed_pages(tab: &ScriptedTab) {
    tab.add_page(
        HOME,
        ScriptedPage {
            title: "YouTube".into(),
            html: "<html><body><div id=\"contents\"></div></body></html>".into(),
            expanded_html: None,
        },
    )
    .unwrap();
    tab.add_page(
        RUST_VIDEO,
        ScriptedPage {
            title: "Understanding the Borrow Checker - YouTube".into(),
            html: r#"<html><body>
                <h1 class="ytd-watch-metadata"><yt-formatted-string>Understanding the Borrow Checker</yt-formatted-string></h1>
                <div id="description-inline-expander">
                    <div class="content">A walkthrough of ownership, borrowing, and lifetimes with worked examples.</div>
                </div>
            </body></html>"#
                .into(),
            expanded_html: None,
        },
    )
    .unwrap();
    tab.add_page(
        GOSSIP_VIDEO,
        ScriptedPage {
            title: "Celebrity Gossip Roundup - YouTube".into(),
            html: r#"<html><body>
                <h1 class="ytd-watch-metadata"><yt-formatted-string>Celebrity Gossip Roundup</yt-formatted-string></h1>
                <div id="description-inline-expander">
                    <div class="content">Every feud, breakup, and red-carpet moment from this week, recapped.</div>
                </div>
            </body></html>"#
                .into(),
            expanded_html: None,
        },
    )
    .unwrap();
}

async fn verdict_mock(server: &mut ServerGuard, body: serde_json::Value, hits: usize) -> Mock {
    server
        .mock("POST", "/analyze-video")
        .with_status(200)
        .with_body(body.to_string())
        .expect(hits)
        .create_async()
        .await
}

fn endpoint_of(server: &ServerGuard) -> String {
    format!("{}/analyze-video", server.url())
}

async fn wait_until<T>(mut probe: impl FnMut() -> Option<T>) -> T {
    for _ in 0..400 {
        if let Some(value) = probe() {
            return value;
        }
        time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

async fn wait_until_matched(mock: &Mock) {
    for _ in 0..400 {
        if mock.matched_async().await {
            return;
        }
        time::sleep(Duration::from_millis(5)).await;
    }
    panic!("classifier was never called");
}

#[tokio::test]
async fn misaligned_video_interrupts_playback() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/analyze-video")
        .match_body(Matcher::PartialJson(json!({
            "videoTitle": "Celebrity Gossip Roundup",
            "preferredContent": ["rust programming"],
            "nonPreferredContent": ["celebrity gossip"],
        })))
        .with_status(200)
        .with_body(r#"{"alignsWithFocus": false}"#)
        .expect(1)
        .create_async()
        .await;

    let p = pipeline(&endpoint_of(&server));
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    p.tab.goto(GOSSIP_VIDEO).unwrap();
    p.tab.begin_playback();
    runtime
        .notify_navigation(NavSignal::HistoryMutation)
        .await
        .unwrap();

    let first = wait_until(|| p.tab.views().into_iter().find(|view| view.visible)).await;
    assert_eq!(first.countdown, 5);
    assert!(!first.continue_enabled);
    assert!(!first.quote_text.is_empty());
    assert!(!p.tab.is_playing());
    assert!(p.tab.is_mounted());

    wait_until(|| p.tab.last_view().filter(|view| view.continue_enabled)).await;
    runtime
        .interstitial()
        .choose(InterstitialControl::Continue)
        .await;

    assert!(p.tab.is_playing());
    assert!(!p.tab.last_view().unwrap().visible);
    mock.assert_async().await;
    runtime.close().await.unwrap();
}

#[tokio::test]
async fn aligned_video_plays_untouched() {
    let mut server = Server::new_async().await;
    let mock = verdict_mock(&mut server, json!({"alignsWithFocus": true}), 1).await;

    let p = pipeline(&endpoint_of(&server));
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    p.tab.goto(RUST_VIDEO).unwrap();
    p.tab.begin_playback();
    runtime
        .notify_navigation(NavSignal::HistoryMutation)
        .await
        .unwrap();

    // The classifier gets consulted; nothing should happen after that.
    wait_until_matched(&mock).await;
    time::sleep(Duration::from_millis(60)).await;

    assert!(p.tab.is_playing());
    assert!(p.tab.views().is_empty());
    assert!(p.tab.current_notice().is_none());
    runtime.close().await.unwrap();
}

#[tokio::test]
async fn classifier_error_shows_notice_and_fails_open() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/analyze-video")
        .with_status(500)
        .with_body("Internal Error")
        .create_async()
        .await;

    let p = pipeline(&endpoint_of(&server));
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    p.tab.goto(GOSSIP_VIDEO).unwrap();
    p.tab.begin_playback();
    runtime
        .notify_navigation(NavSignal::HistoryMutation)
        .await
        .unwrap();

    let notice = wait_until(|| p.tab.current_notice()).await;
    assert_eq!(notice, "Server error (500): Internal Error");
    assert!(p.tab.is_playing());
    assert!(p.tab.views().is_empty());

    // The notice dismisses itself.
    wait_until(|| p.tab.current_notice().is_none().then_some(())).await;
    runtime.close().await.unwrap();
}

#[tokio::test]
async fn go_back_returns_to_the_last_non_video_page() {
    let mut server = Server::new_async().await;
    verdict_mock(&mut server, json!({"alignsWithFocus": false}), 1).await;

    let p = pipeline(&endpoint_of(&server));
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    // Full page load on home, then an in-page hop to a video.
    let event = p.tab.goto(HOME).unwrap();
    p.engine.coordinator().tab_event(event).await.unwrap();
    p.tab.goto(GOSSIP_VIDEO).unwrap();
    p.tab.begin_playback();
    runtime
        .notify_navigation(NavSignal::HistoryTraversal)
        .await
        .unwrap();

    wait_until(|| p.tab.last_view().filter(|view| view.visible)).await;
    runtime
        .interstitial()
        .choose(InterstitialControl::GoBack)
        .await;

    wait_until(|| p.tab.current_url().filter(|url| url.as_str() == HOME)).await;
    assert_eq!(p.navigator.navigations().len(), 1);
    assert!(!p.tab.last_view().unwrap().visible);
    runtime.close().await.unwrap();
}

#[tokio::test]
async fn failed_back_navigation_closes_the_tab() {
    let mut server = Server::new_async().await;
    verdict_mock(&mut server, json!({"alignsWithFocus": false}), 1).await;

    let p = pipeline(&endpoint_of(&server));
    p.navigator.set_failing(true);
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    p.tab.goto(GOSSIP_VIDEO).unwrap();
    runtime
        .notify_navigation(NavSignal::HistoryMutation)
        .await
        .unwrap();

    wait_until(|| p.tab.last_view().filter(|view| view.visible)).await;
    runtime
        .interstitial()
        .choose(InterstitialControl::GoBack)
        .await;

    let closed = wait_until(|| {
        let closed = p.navigator.closed_tabs();
        (!closed.is_empty()).then_some(closed)
    })
    .await;
    assert_eq!(closed, vec![TabId(1)]);
    runtime.close().await.unwrap();
}

#[tokio::test]
async fn paused_extension_never_calls_the_classifier() {
    let mut server = Server::new_async().await;
    let mock = verdict_mock(&mut server, json!({"alignsWithFocus": false}), 0).await;

    let p = pipeline(&endpoint_of(&server));
    p.settings.set_extension_paused(true).unwrap();
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    p.tab.goto(GOSSIP_VIDEO).unwrap();
    p.tab.begin_playback();
    runtime
        .notify_navigation(NavSignal::HistoryMutation)
        .await
        .unwrap();

    // Enough time for detection, settling, and a would-be submission.
    time::sleep(Duration::from_millis(200)).await;

    assert!(p.tab.is_playing());
    assert!(p.tab.views().is_empty());
    assert!(p.tab.current_notice().is_none());
    mock.assert_async().await;
    runtime.close().await.unwrap();
}

#[tokio::test]
async fn repeat_visit_inside_the_window_skips_reanalysis() {
    let mut server = Server::new_async().await;
    let mock = verdict_mock(&mut server, json!({"alignsWithFocus": true}), 1).await;

    let p = pipeline(&endpoint_of(&server));
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    p.tab.goto(RUST_VIDEO).unwrap();
    runtime
        .notify_navigation(NavSignal::HistoryMutation)
        .await
        .unwrap();
    wait_until_matched(&mock).await;

    // Leave the video (unsignaled; the fallback poll notices), then come
    // straight back. The monitor resubmits, the coordinator suppresses.
    p.tab.goto(HOME).unwrap();
    time::sleep(Duration::from_millis(60)).await;
    p.tab.goto(RUST_VIDEO).unwrap();
    runtime
        .notify_navigation(NavSignal::DomMutation)
        .await
        .unwrap();
    time::sleep(Duration::from_millis(200)).await;

    mock.assert_async().await;
    runtime.close().await.unwrap();
}

#[tokio::test]
async fn details_pull_reads_the_live_page() {
    let p = pipeline("http://127.0.0.1:9/analyze-video");
    // Pausing keeps the monitor from chasing the unreachable endpoint;
    // the pull itself is page-side and not gated.
    p.settings.set_extension_paused(true).unwrap();
    let runtime = p
        .engine
        .attach_tab(TabId(1), Arc::clone(&p.tab) as Arc<dyn TabSurface>)
        .await
        .unwrap();

    p.tab.goto(RUST_VIDEO).unwrap();
    let details = runtime.video_details().await.unwrap();
    assert_eq!(details.video_title, "Understanding the Borrow Checker");
    assert!(details
        .video_description
        .starts_with("A walkthrough of ownership"));
    runtime.close().await.unwrap();
}
