pub mod config;
pub mod coordinator;
pub mod interstitial;
pub mod monitor;
pub mod protocol;
pub mod quotes;
pub mod settings;
pub mod sim;
pub mod site;
pub mod surface;
pub mod utils;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use config::GuardConfig;
use coordinator::{Coordinator, CoordinatorHandle};
use interstitial::InterstitialController;
use monitor::{Extractor, MonitorController, NavSignal};
use protocol::{PageCommand, ReplyStatus, TabEvent, TabId, VideoDetails};
use settings::PreferenceStore;
use surface::{TabNavigator, TabSurface};

/// Verdict commands queued per tab between the coordinator and the page.
const PAGE_COMMAND_BUFFER: usize = 16;

/// The running guard: one coordinator plus whatever tabs are attached.
///
/// The embedder supplies the settings store and a [`TabNavigator`] for its
/// browser shell, then attaches a [`TabSurface`] per tab it wants watched.
pub struct Engine {
    config: GuardConfig,
    coordinator: Coordinator,
    settings: Arc<PreferenceStore>,
    root_token: CancellationToken,
}

impl Engine {
    pub fn launch<N: TabNavigator>(
        config: GuardConfig,
        settings: Arc<PreferenceStore>,
        navigator: N,
    ) -> Result<Self> {
        let coordinator = Coordinator::spawn(config.clone(), Arc::clone(&settings), navigator)?;
        Ok(Self {
            config,
            coordinator,
            settings,
            root_token: CancellationToken::new(),
        })
    }

    pub fn coordinator(&self) -> CoordinatorHandle {
        self.coordinator.handle()
    }

    pub fn settings(&self) -> Arc<PreferenceStore> {
        Arc::clone(&self.settings)
    }

    /// Puts a tab under watch: registers its verdict route, starts its
    /// page command loop, and spawns its navigation monitor.
    pub async fn attach_tab(&self, tab: TabId, surface: Arc<dyn TabSurface>) -> Result<TabRuntime> {
        let coordinator = self.coordinator.handle();

        let (command_tx, command_rx) = mpsc::channel(PAGE_COMMAND_BUFFER);
        coordinator
            .register_tab(tab, command_tx.clone())
            .await
            .with_context(|| format!("failed to register tab {tab}"))?;

        let interstitial = InterstitialController::new(
            tab,
            Arc::clone(&surface),
            coordinator.clone(),
            self.config.clone(),
        );

        let command_token = self.root_token.child_token();
        let command_task = tokio::spawn(page_command_loop(
            tab,
            Arc::clone(&surface),
            interstitial.clone(),
            command_rx,
            command_token.clone(),
        ));

        let mut monitor = MonitorController::new();
        let nav_tx = monitor.start(
            tab,
            surface,
            coordinator.clone(),
            self.config.clone(),
            &self.root_token,
        )?;

        Ok(TabRuntime {
            tab,
            coordinator,
            interstitial,
            monitor,
            nav_tx,
            command_tx,
            command_token,
            command_task: Some(command_task),
        })
    }

    /// Cancels every attached tab's loops. Detach tabs with
    /// [`TabRuntime::close`] for an orderly join instead when possible.
    pub fn shutdown(&self) {
        self.root_token.cancel();
    }
}

/// One attached tab's running pieces. Dropping it leaks the loops; call
/// [`TabRuntime::close`] when the tab goes away.
pub struct TabRuntime {
    tab: TabId,
    coordinator: CoordinatorHandle,
    interstitial: InterstitialController,
    monitor: MonitorController,
    nav_tx: mpsc::Sender<NavSignal>,
    command_tx: mpsc::Sender<PageCommand>,
    command_token: CancellationToken,
    command_task: Option<JoinHandle<()>>,
}

impl TabRuntime {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn interstitial(&self) -> &InterstitialController {
        &self.interstitial
    }

    /// Forwards a navigation signal from the page to the watch loop.
    pub async fn notify_navigation(&self, signal: NavSignal) -> Result<()> {
        self.nav_tx
            .send(signal)
            .await
            .map_err(|_| anyhow!("watch loop for tab {} is gone", self.tab))
    }

    /// Pulls the current page's details on demand, for embedder surfaces
    /// (a details popup, a debug view) that want them outside the verdict
    /// flow.
    pub async fn video_details(&self) -> Result<VideoDetails> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(PageCommand::ExtractVideoDetails { reply: reply_tx })
            .await
            .map_err(|_| anyhow!("page command loop for tab {} is gone", self.tab))?;
        reply_rx.await.context("page dropped the details reply")
    }

    /// Tears the tab down: stops its loops and tells the coordinator to
    /// drop its history, dedup entries, and verdict route.
    pub async fn close(mut self) -> Result<()> {
        self.command_token.cancel();
        self.monitor.stop().await?;
        if let Some(task) = self.command_task.take() {
            task.await.context("page command task failed to join")?;
        }
        self.coordinator
            .tab_event(TabEvent::Closed { tab: self.tab })
            .await
    }
}

/// Receives verdict commands for one tab and acts on its page. Extraction
/// requests are answered inline; warnings and errors go through the
/// interstitial controller.
async fn page_command_loop(
    tab: TabId,
    surface: Arc<dyn TabSurface>,
    interstitial: InterstitialController,
    mut commands: mpsc::Receiver<PageCommand>,
    cancel_token: CancellationToken,
) {
    let extractor = Extractor::new();
    loop {
        let command = tokio::select! {
            command = commands.recv() => command,
            _ = cancel_token.cancelled() => break,
        };
        let Some(command) = command else {
            break;
        };

        match command {
            PageCommand::ShowWarning { ack } => {
                let status = match interstitial.show_warning().await {
                    Ok(()) => ReplyStatus::WarningShown,
                    Err(err) => {
                        error!("[page] tab {tab}: failed to show warning: {err:#}");
                        ReplyStatus::Received
                    }
                };
                let _ = ack.send(status);
            }
            PageCommand::ShowError { message, ack } => {
                interstitial.show_error(&message).await;
                let _ = ack.send(ReplyStatus::ErrorShown);
            }
            PageCommand::ExtractVideoDetails { reply } => {
                let _ = reply.send(extractor.extract(&surface.document()));
            }
        }
    }
}
