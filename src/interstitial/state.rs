//! Pure interstitial state machine.
//!
//! No timers, no page access: callers feed it events (open, tick, key,
//! close) and push the resulting [`InterstitialView`] at the surface.
//! Keeping it synchronous makes every transition testable in isolation.

use serde::Serialize;

use crate::quotes::Quote;
use crate::surface::{InterstitialControl, InterstitialView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModalPhase {
    /// Nothing shown.
    Closed,
    /// Markup is being mounted into the page.
    Injecting,
    /// Mounted and visible, countdown not yet running.
    Open,
    /// Counting down; "continue" is locked.
    CountingDown,
    /// Countdown finished; both controls are live.
    Interactable,
}

impl Default for ModalPhase {
    fn default() -> Self {
        ModalPhase::Closed
    }
}

/// Keyboard input the interstitial cares about while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Tab,
    BackTab,
    Escape,
    Other,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Focus moved inside the trap; redraw.
    Trapped,
    /// Escape asked for the interstitial to close.
    CloseRequested,
    /// Not ours; the page keeps it.
    Ignored,
}

#[derive(Debug, Default)]
pub struct InterstitialState {
    phase: ModalPhase,
    countdown: u8,
    injected: bool,
    quote: Option<&'static Quote>,
    prior_focus: Option<String>,
    focused: Option<InterstitialControl>,
}

impl InterstitialState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.phase,
            ModalPhase::Open | ModalPhase::CountingDown | ModalPhase::Interactable
        )
    }

    /// Starts the one-time markup injection. False when the markup is
    /// already in the page, in which case the caller skips straight to
    /// opening.
    pub fn begin_injection(&mut self) -> bool {
        if self.injected {
            return false;
        }
        self.phase = ModalPhase::Injecting;
        true
    }

    pub fn finish_injection(&mut self) {
        self.injected = true;
    }

    /// Injection failed; drop back to closed with `injected` still unset
    /// so the next warning retries the mount.
    pub fn abort_injection(&mut self) {
        self.phase = ModalPhase::Closed;
    }

    pub fn is_injected(&self) -> bool {
        self.injected
    }

    /// Shows the interstitial with a fresh quote. Initial focus sits on
    /// the go-back control; the prior page focus is captured for restore
    /// at close.
    pub fn open(&mut self, quote: &'static Quote, prior_focus: Option<String>) {
        self.phase = ModalPhase::Open;
        self.countdown = 0;
        self.quote = Some(quote);
        self.prior_focus = prior_focus;
        self.focused = Some(InterstitialControl::GoBack);
    }

    /// Arms (or re-arms) the countdown. Called on open and again when a
    /// repeat warning lands while the interstitial is already up.
    pub fn start_countdown(&mut self, start: u8) {
        self.countdown = start;
        self.phase = if start == 0 {
            ModalPhase::Interactable
        } else {
            ModalPhase::CountingDown
        };
        if self.focused.is_none() {
            self.focused = Some(InterstitialControl::GoBack);
        }
    }

    /// One countdown second elapsed. Returns true while ticks remain.
    pub fn tick(&mut self) -> bool {
        if self.phase != ModalPhase::CountingDown {
            return false;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.phase = ModalPhase::Interactable;
        }
        self.phase == ModalPhase::CountingDown
    }

    pub fn countdown(&self) -> u8 {
        self.countdown
    }

    /// "Continue" is live only after the countdown has fully elapsed.
    pub fn continue_enabled(&self) -> bool {
        self.phase == ModalPhase::Interactable
    }

    /// Tears the interstitial down and hands back the control that held
    /// focus before it opened. The injected markup stays in the page.
    pub fn close(&mut self) -> Option<String> {
        self.phase = ModalPhase::Closed;
        self.countdown = 0;
        self.quote = None;
        self.focused = None;
        self.prior_focus.take()
    }

    /// Focus trap membership in visual order.
    fn focusables(&self) -> &'static [InterstitialControl] {
        if self.continue_enabled() {
            &[InterstitialControl::Continue, InterstitialControl::GoBack]
        } else {
            &[InterstitialControl::GoBack]
        }
    }

    pub fn handle_key(&mut self, key: KeyInput) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match key {
            KeyInput::Escape => KeyOutcome::CloseRequested,
            KeyInput::Tab => {
                self.cycle_focus(1);
                KeyOutcome::Trapped
            }
            KeyInput::BackTab => {
                self.cycle_focus(-1);
                KeyOutcome::Trapped
            }
            KeyInput::Other => KeyOutcome::Ignored,
        }
    }

    fn cycle_focus(&mut self, step: isize) {
        let order = self.focusables();
        let current = self
            .focused
            .and_then(|focused| order.iter().position(|control| *control == focused))
            .unwrap_or(0);
        let next = (current as isize + step).rem_euclid(order.len() as isize);
        self.focused = Some(order[next as usize]);
    }

    pub fn focused(&self) -> Option<InterstitialControl> {
        self.focused
    }

    pub fn view(&self) -> InterstitialView {
        InterstitialView {
            visible: self.is_open(),
            quote_text: self.quote.map(|quote| quote.text.to_owned()).unwrap_or_default(),
            quote_author: self
                .quote
                .map(|quote| quote.author.to_owned())
                .unwrap_or_default(),
            countdown: self.countdown,
            continue_enabled: self.continue_enabled(),
            focused: self.focused,
        }
    }
}
