//! The coordinator task: one mailbox, one owner of all cross-tab state.
//!
//! Per-tab history, the dedup ledger, and the command routes live inside
//! a single task and are touched only between mailbox receives, so no
//! handler ever observes them mid-update. Anything slow (the classifier
//! round trip, verdict delivery, back-navigation) runs in spawned tasks
//! that own clones of what they need and report back through channels.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::config::GuardConfig;
use crate::protocol::{
    PageCommand, PageRequest, PageSender, ReplyStatus, TabEvent, TabId, VideoDetails,
};
use crate::settings::PreferenceStore;
use crate::site;
use crate::surface::TabNavigator;

use super::classifier::{AnalysisClient, AnalysisOutcome, AnalysisRequest};
use super::history::{AnalysisKey, AnalysisLedger, TabHistory};

const MAILBOX_BUFFER: usize = 64;

pub(crate) enum CoordinatorMessage {
    Request {
        sender: PageSender,
        request: PageRequest,
        reply: oneshot::Sender<ReplyStatus>,
    },
    Tab(TabEvent),
    Register {
        tab: TabId,
        route: mpsc::Sender<PageCommand>,
    },
}

/// Cheap handle for talking to the coordinator task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordinatorMessage>,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<CoordinatorMessage>) -> Self {
        Self { tx }
    }

    /// Sends a page request and waits for its status. Every request gets
    /// exactly one reply.
    pub async fn submit(&self, sender: PageSender, request: PageRequest) -> Result<ReplyStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CoordinatorMessage::Request {
                sender,
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow!("coordinator mailbox closed"))?;
        reply_rx.await.context("coordinator dropped the reply")
    }

    /// Reports a browser-level tab event (navigation commit, close).
    pub async fn tab_event(&self, event: TabEvent) -> Result<()> {
        self.tx
            .send(CoordinatorMessage::Tab(event))
            .await
            .map_err(|_| anyhow!("coordinator mailbox closed"))
    }

    /// Registers the command route verdicts for this tab are pushed down.
    pub async fn register_tab(&self, tab: TabId, route: mpsc::Sender<PageCommand>) -> Result<()> {
        self.tx
            .send(CoordinatorMessage::Register { tab, route })
            .await
            .map_err(|_| anyhow!("coordinator mailbox closed"))
    }
}

/// Spawned coordinator. Dropping it (after every handle is gone) lets the
/// task drain its mailbox and exit.
pub struct Coordinator {
    handle: CoordinatorHandle,
}

impl Coordinator {
    pub fn spawn<N: TabNavigator>(
        config: GuardConfig,
        settings: Arc<PreferenceStore>,
        navigator: N,
    ) -> Result<Self> {
        let client = AnalysisClient::new(&config)?;
        let ledger = AnalysisLedger::new(config.dedup_window);
        let (tx, rx) = mpsc::channel(MAILBOX_BUFFER);

        let service = Service {
            config,
            settings,
            client: Arc::new(client),
            navigator: Arc::new(navigator),
            history: HashMap::new(),
            ledger,
            routes: HashMap::new(),
        };
        tokio::spawn(service.run(rx));

        Ok(Self {
            handle: CoordinatorHandle::new(tx),
        })
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }
}

struct Service<N: TabNavigator> {
    config: GuardConfig,
    settings: Arc<PreferenceStore>,
    client: Arc<AnalysisClient>,
    navigator: Arc<N>,
    history: HashMap<TabId, TabHistory>,
    ledger: AnalysisLedger,
    routes: HashMap<TabId, mpsc::Sender<PageCommand>>,
}

impl<N: TabNavigator> Service<N> {
    async fn run(mut self, mut rx: mpsc::Receiver<CoordinatorMessage>) {
        while let Some(message) = rx.recv().await {
            match message {
                CoordinatorMessage::Register { tab, route } => {
                    debug!("[coordinator] tab {tab} registered");
                    self.routes.insert(tab, route);
                }
                CoordinatorMessage::Tab(event) => self.handle_tab_event(event),
                CoordinatorMessage::Request {
                    sender,
                    request,
                    reply,
                } => match request {
                    PageRequest::FullVideoDetails(details) => {
                        let status = self.handle_video_details(&sender, details);
                        if reply.send(status).is_err() {
                            warn!("[coordinator] tab {}: reply dropped", sender.tab);
                        }
                    }
                    PageRequest::GoBack => self.handle_go_back(sender.tab, reply),
                },
            }
        }
        info!("[coordinator] mailbox closed, coordinator stopping");
    }

    fn handle_tab_event(&mut self, event: TabEvent) {
        match event {
            TabEvent::NavigationCommitted { tab, url } => {
                // Only on-site addresses matter for the back scan.
                if site::is_site_url(&url) {
                    self.history.entry(tab).or_default().push(url);
                }
            }
            TabEvent::Closed { tab } => {
                debug!("[coordinator] tab {tab} closed, dropping its state");
                self.history.remove(&tab);
                self.ledger.evict_tab(tab);
                self.routes.remove(&tab);
            }
        }
    }

    /// Gatekeeping for one details submission, in order: is this a video
    /// page at all, does it carry an id, was it analyzed moments ago,
    /// do the settings allow warnings, is there anything to analyze.
    /// Passing all gates starts the classifier round trip off-task and
    /// answers `Processing` immediately.
    fn handle_video_details(&mut self, sender: &PageSender, details: VideoDetails) -> ReplyStatus {
        let tab = sender.tab;
        let Some(url) = sender.url.as_ref().filter(|url| site::is_watch_url(url)) else {
            return ReplyStatus::NotVideoPage;
        };
        let Some(video_id) = site::video_id_from_url(url) else {
            return ReplyStatus::MissingVideoId;
        };

        // Dedup records before settings gates: a submission refused for
        // pause/disable still counts as analyzed for the window.
        let key = AnalysisKey {
            tab,
            video: video_id.clone(),
        };
        if !self.ledger.begin(key, Instant::now()) {
            debug!("[coordinator] tab {tab}: duplicate analysis of {video_id} suppressed");
            return ReplyStatus::DuplicateSuppressed;
        }

        self.history.entry(tab).or_default().push(url.clone());

        let prefs = self.settings.snapshot();
        if prefs.extension_paused {
            debug!("[coordinator] tab {tab}: paused, skipping {video_id}");
            return ReplyStatus::Paused;
        }
        if !prefs.warnings_enabled {
            debug!("[coordinator] tab {tab}: warnings disabled, skipping {video_id}");
            return ReplyStatus::WarningsDisabled;
        }
        if details.video_title.is_empty() {
            return ReplyStatus::MissingTitle;
        }

        let request = AnalysisRequest {
            video_title: details.video_title,
            video_description: details.video_description,
            preferred_content: prefs.preferred_content,
            non_preferred_content: prefs.non_preferred_content,
        };
        let client = Arc::clone(&self.client);
        let route = self.routes.get(&tab).cloned();
        tokio::spawn(async move {
            let outcome = client.analyze(&request).await;
            deliver_outcome(tab, outcome, route).await;
        });

        ReplyStatus::Processing
    }

    /// Back-navigation: most recent non-video history entry, or the site
    /// home when there is none. Runs off-task; a failed navigation closes
    /// the tab instead, and either way the requester hears
    /// `NavigationStarted` once the attempt has been made.
    fn handle_go_back(&mut self, tab: TabId, reply: oneshot::Sender<ReplyStatus>) {
        let target = self
            .history
            .get(&tab)
            .and_then(|history| history.previous_non_watch().cloned())
            .unwrap_or_else(site::home_url);
        info!("[coordinator] tab {tab}: navigating back to {target}");

        let navigator = Arc::clone(&self.navigator);
        tokio::spawn(async move {
            if let Err(err) = navigator.navigate(tab, &target).await {
                error!("[coordinator] tab {tab}: back navigation failed ({err}), closing tab");
                if let Err(close_err) = navigator.close_tab(tab).await {
                    error!("[coordinator] tab {tab}: close fallback failed: {close_err}");
                }
            }
            let _ = reply.send(ReplyStatus::NavigationStarted);
        });
    }
}

/// Turns a finished analysis into a page command and delivers it. A page
/// that went away mid-request just logs; verdicts are never retried.
async fn deliver_outcome(
    tab: TabId,
    outcome: AnalysisOutcome,
    route: Option<mpsc::Sender<PageCommand>>,
) {
    let (ack_tx, ack_rx) = oneshot::channel();
    let command = match outcome {
        AnalysisOutcome::Allow => {
            debug!("[coordinator] tab {tab}: video aligns with focus, no warning");
            return;
        }
        AnalysisOutcome::Warn => PageCommand::ShowWarning { ack: ack_tx },
        AnalysisOutcome::Error { message } => PageCommand::ShowError {
            message,
            ack: ack_tx,
        },
    };

    let Some(route) = route else {
        error!("[coordinator] tab {tab}: no registered page to deliver verdict to");
        return;
    };
    if route.send(command).await.is_err() {
        error!("[coordinator] tab {tab}: verdict delivery failed, page is gone");
        return;
    }
    match ack_rx.await {
        Ok(status) => debug!("[coordinator] tab {tab}: page acknowledged verdict: {status}"),
        Err(_) => error!("[coordinator] tab {tab}: page dropped the verdict ack"),
    }
}
