use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::GuardConfig;
use crate::coordinator::CoordinatorHandle;
use crate::protocol::TabId;
use crate::surface::TabSurface;

use super::extract::Extractor;
use super::loop_worker::watch_loop;
use super::NavSignal;

/// Buffered navigation signals per tab; beyond this, signal sources see
/// backpressure rather than the loop falling behind unboundedly.
const NAV_SIGNAL_BUFFER: usize = 32;

/// Owns one tab's watch loop: start spawns it, stop cancels and joins it.
pub struct MonitorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    nav_tx: Option<mpsc::Sender<NavSignal>>,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            nav_tx: None,
        }
    }

    /// Spawns the watch loop for a tab. The returned sender feeds it
    /// navigation signals; the loop also polls on its own.
    pub fn start(
        &mut self,
        tab: TabId,
        surface: Arc<dyn TabSurface>,
        coordinator: CoordinatorHandle,
        config: GuardConfig,
        parent_token: &CancellationToken,
    ) -> Result<mpsc::Sender<NavSignal>> {
        if self.handle.is_some() {
            bail!("monitor already active for tab {tab}");
        }

        let cancel_token = parent_token.child_token();
        let (nav_tx, nav_rx) = mpsc::channel(NAV_SIGNAL_BUFFER);

        let handle = tokio::spawn(watch_loop(
            tab,
            surface,
            Extractor::new(),
            coordinator,
            config,
            nav_rx,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.nav_tx = Some(nav_tx.clone());
        Ok(nav_tx)
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.nav_tx = None;

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("watch loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
