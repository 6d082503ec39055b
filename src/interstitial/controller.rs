use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, warn};
use tokio::{sync::Mutex, task::JoinHandle, time};

use crate::config::GuardConfig;
use crate::coordinator::CoordinatorHandle;
use crate::protocol::{PageRequest, PageSender, TabId};
use crate::quotes;
use crate::surface::{InterstitialControl, TabSurface};

use super::state::{InterstitialState, KeyInput, KeyOutcome, ModalPhase};
use super::INTERSTITIAL_MARKUP;

/// Drives one tab's interstitial: owns the state machine, the countdown
/// ticker, and the error-notice lifetime. Clones share the same state.
#[derive(Clone)]
pub struct InterstitialController {
    tab: TabId,
    surface: Arc<dyn TabSurface>,
    coordinator: CoordinatorHandle,
    config: GuardConfig,
    state: Arc<Mutex<InterstitialState>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    notice_epoch: Arc<AtomicU64>,
}

impl InterstitialController {
    pub fn new(
        tab: TabId,
        surface: Arc<dyn TabSurface>,
        coordinator: CoordinatorHandle,
        config: GuardConfig,
    ) -> Self {
        Self {
            tab,
            surface,
            coordinator,
            config,
            state: Arc::new(Mutex::new(InterstitialState::new())),
            ticker: Arc::new(Mutex::new(None)),
            notice_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Handles a warning verdict: pause playback, mount the markup on
    /// first use, show the interstitial, and (re)arm the countdown. A
    /// warning landing while one is already up restarts the countdown
    /// instead of stacking a second interstitial.
    pub async fn show_warning(&self) -> Result<()> {
        self.surface.pause_playback();

        {
            let mut state = self.state.lock().await;
            if state.begin_injection() {
                if let Err(err) = self.surface.mount_interstitial(INTERSTITIAL_MARKUP) {
                    state.abort_injection();
                    return Err(err.context("failed to mount warning interstitial"));
                }
                state.finish_injection();
            }

            if !state.is_open() {
                let quote = quotes::random_quote();
                let prior_focus = self.surface.focused_control();
                state.open(quote, prior_focus);
            }
            state.start_countdown(self.config.countdown_start);
            self.surface.render_interstitial(&state.view());
        }

        self.spawn_countdown().await;
        Ok(())
    }

    /// A control was activated. "Continue" is honored only once the
    /// countdown has unlocked it; "go back" always works.
    pub async fn choose(&self, choice: InterstitialControl) {
        match choice {
            InterstitialControl::Continue => {
                if !self.state.lock().await.continue_enabled() {
                    return;
                }
                self.close().await;
                self.surface.resume_playback();
            }
            InterstitialControl::GoBack => {
                self.close().await;
                let tab = self.tab;
                let coordinator = self.coordinator.clone();
                let surface = Arc::clone(&self.surface);
                tokio::spawn(async move {
                    let sender = PageSender {
                        tab,
                        url: surface.current_url(),
                    };
                    if let Err(err) = coordinator.submit(sender, PageRequest::GoBack).await {
                        error!("[interstitial] tab {tab}: go-back request failed: {err}");
                    }
                });
            }
        }
    }

    /// Keyboard input while the interstitial may be up. Tab cycles the
    /// focus trap, Escape closes; anything else belongs to the page.
    pub async fn handle_key(&self, key: KeyInput) -> KeyOutcome {
        let (outcome, redraw) = {
            let mut state = self.state.lock().await;
            let outcome = state.handle_key(key);
            let redraw = (outcome == KeyOutcome::Trapped).then(|| state.view());
            (outcome, redraw)
        };
        if let Some(view) = redraw {
            self.surface.render_interstitial(&view);
        }
        if outcome == KeyOutcome::CloseRequested {
            self.close().await;
        }
        outcome
    }

    /// Hides the interstitial and restores page focus. The injected
    /// markup stays mounted for the next warning.
    pub async fn close(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }

        let (restored, view) = {
            let mut state = self.state.lock().await;
            if !state.is_open() {
                return;
            }
            let restored = state.close();
            (restored, state.view())
        };
        self.surface.render_interstitial(&view);
        if let Some(control) = restored {
            self.surface.restore_focus(&control);
        }
    }

    /// Shows a transient error notice that dismisses itself unless a
    /// newer notice has replaced it in the meantime.
    pub async fn show_error(&self, message: &str) {
        warn!("[interstitial] tab {}: {message}", self.tab);
        self.surface.render_notice(Some(message));

        let epoch = self.notice_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let notice_epoch = Arc::clone(&self.notice_epoch);
        let surface = Arc::clone(&self.surface);
        let linger = self.config.notice_duration;
        tokio::spawn(async move {
            time::sleep(linger).await;
            if notice_epoch.load(Ordering::SeqCst) == epoch {
                surface.render_notice(None);
            }
        });
    }

    pub async fn phase(&self) -> ModalPhase {
        self.state.lock().await.phase()
    }

    async fn spawn_countdown(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = Arc::clone(&self.state);
        let surface = Arc::clone(&self.surface);
        let tick_interval = self.config.countdown_tick;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // A fresh interval yields its first tick immediately; consume
            // it so the first decrement lands a full tick later.
            interval.tick().await;
            loop {
                interval.tick().await;
                let (view, more) = {
                    let mut guard = state.lock().await;
                    if !guard.is_open() {
                        break;
                    }
                    let more = guard.tick();
                    (guard.view(), more)
                };
                surface.render_interstitial(&view);
                if !more {
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }
}
