use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::GuardConfig;
use crate::coordinator::CoordinatorHandle;
use crate::protocol::{PageRequest, PageSender, TabId};
use crate::site;
use crate::surface::TabSurface;

use super::extract::Extractor;
use super::NavSignal;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macro (exported at crate root)
use crate::log_debug;

/// Everything the watch loop holds constant for its lifetime. Cloned into
/// each spawned extraction cycle.
#[derive(Clone)]
struct WatchContext {
    tab: TabId,
    surface: Arc<dyn TabSurface>,
    extractor: Arc<Extractor>,
    coordinator: CoordinatorHandle,
    config: GuardConfig,
    in_flight: Arc<AtomicBool>,
    cancel_token: CancellationToken,
}

/// Watches one tab for video changes and submits extracted details.
///
/// Detection is a single idempotent check fed by every signal source plus
/// the fallback poll, so an address change is caught within one poll
/// interval even when the page fires no signal at all. Extraction runs in
/// a spawned cycle guarded by an in-flight flag; the loop itself never
/// blocks on the page settling.
pub async fn watch_loop(
    tab: TabId,
    surface: Arc<dyn TabSurface>,
    extractor: Extractor,
    coordinator: CoordinatorHandle,
    config: GuardConfig,
    mut nav_rx: mpsc::Receiver<NavSignal>,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctx = WatchContext {
        tab,
        surface,
        extractor: Arc::new(extractor),
        coordinator,
        config,
        in_flight: Arc::new(AtomicBool::new(false)),
        cancel_token,
    };
    let mut last_video: Option<String> = None;

    loop {
        tokio::select! {
            signal = nav_rx.recv() => {
                let Some(signal) = signal else {
                    break;
                };
                if signal == NavSignal::HistoryMutation {
                    // The history API fires before the SPA swaps the page
                    // in; give the address a beat to become current.
                    time::sleep(ctx.config.history_check_delay).await;
                }
                check_current_page(&ctx, &mut last_video, signal);
            }
            _ = ticker.tick() => {
                check_current_page(&ctx, &mut last_video, NavSignal::Poll);
            }
            _ = ctx.cancel_token.cancelled() => {
                log_debug!("[monitor] tab {tab}: watch loop shutting down");
                break;
            }
        }
    }
}

/// The one detection check. Reads the current address, compares the video
/// id against the last one handled, and starts an extraction cycle when
/// they differ. Safe to call from any signal at any rate.
fn check_current_page(ctx: &WatchContext, last_video: &mut Option<String>, signal: NavSignal) {
    let tab = ctx.tab;
    let current = ctx
        .surface
        .current_url()
        .as_ref()
        .and_then(site::video_id_from_url);

    match current {
        Some(video_id) => {
            if last_video.as_deref() == Some(video_id.as_str()) {
                return;
            }
            // One extraction cycle at a time. On a lost race the last-seen
            // id stays untouched, so a later poll retries this video.
            if ctx
                .in_flight
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                log_debug!("[monitor] tab {tab}: extraction busy, deferring {video_id}");
                return;
            }

            log_debug!("[monitor] tab {tab}: new video {video_id} ({signal:?})");
            *last_video = Some(video_id.clone());
            tokio::spawn(extraction_cycle(ctx.clone(), video_id));
        }
        None => {
            if last_video.take().is_some() {
                log_debug!("[monitor] tab {tab}: left video pages ({signal:?})");
            }
        }
    }
}

/// One settle-extract-submit pass for a newly seen video. Re-verifies the
/// page still shows the same video before doing work and again before
/// submitting, so stale details never reach the coordinator.
async fn extraction_cycle(ctx: WatchContext, video_id: String) {
    let tab = ctx.tab;
    // Releases the flag on every exit path, including cancellation.
    let _guard = InFlightGuard(Arc::clone(&ctx.in_flight));

    // Let the page finish rendering the new video's metadata.
    if !sleep_unless_cancelled(ctx.config.settle_delay, &ctx.cancel_token).await {
        return;
    }

    let details = loop {
        if !still_current(&ctx, &video_id) {
            log_debug!("[monitor] tab {tab}: {video_id} gone before extraction, aborting");
            return;
        }
        let details = ctx
            .extractor
            .extract_settled(ctx.surface.as_ref(), &ctx.config)
            .await;
        if !details.video_title.is_empty() {
            break details;
        }
        log_debug!("[monitor] tab {tab}: no title yet for {video_id}, retrying");
        if !sleep_unless_cancelled(ctx.config.extract_retry_delay, &ctx.cancel_token).await {
            return;
        }
    };

    if !still_current(&ctx, &video_id) {
        log_debug!("[monitor] tab {tab}: {video_id} changed before submit, dropping details");
        return;
    }

    let sender = PageSender {
        tab,
        url: ctx.surface.current_url(),
    };
    match ctx
        .coordinator
        .submit(sender, PageRequest::FullVideoDetails(details))
        .await
    {
        Ok(status) => log_debug!("[monitor] tab {tab}: submitted {video_id} -> {status}"),
        Err(err) => log::error!("[monitor] tab {tab}: failed to submit video details: {err}"),
    }
}

fn still_current(ctx: &WatchContext, video_id: &str) -> bool {
    ctx.surface
        .current_url()
        .as_ref()
        .and_then(site::video_id_from_url)
        .as_deref()
        == Some(video_id)
}

/// False when cancellation won the race.
async fn sleep_unless_cancelled(duration: Duration, cancel_token: &CancellationToken) -> bool {
    tokio::select! {
        _ = time::sleep(duration) => true,
        _ = cancel_token.cancelled() => false,
    }
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
