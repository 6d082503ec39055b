//! Scripted in-memory browser for the offline driver and the test suite.
//!
//! [`ScriptedTab`] plays the role of one tab: a set of prepared pages
//! keyed by address, a current location, a player flag, and recording
//! implementations of the interstitial surface. [`RecordingNavigator`]
//! stands in for the browser shell, logging navigations and optionally
//! applying them back to attached tabs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

use crate::protocol::{TabEvent, TabId};
use crate::surface::{DocumentSnapshot, InterstitialView, TabNavigator, TabSurface};

/// One prepared page: the document a scripted tab serves at an address.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub title: String,
    pub html: String,
    /// Document served instead of `html` once the description expander
    /// has been activated on this page.
    pub expanded_html: Option<String>,
}

#[derive(Default)]
struct TabState {
    url: Option<Url>,
    pages: HashMap<Url, ScriptedPage>,
    playing: bool,
    expanded: bool,
    focused: Option<String>,
    mounted_markup: Option<String>,
    views: Vec<InterstitialView>,
    notice: Option<String>,
    notice_history: Vec<String>,
    mount_failure: bool,
}

pub struct ScriptedTab {
    id: TabId,
    state: Mutex<TabState>,
}

impl ScriptedTab {
    pub fn new(id: TabId) -> Self {
        Self {
            id,
            state: Mutex::new(TabState::default()),
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    /// Registers the page served at an address.
    pub fn add_page(&self, url: &str, page: ScriptedPage) -> Result<()> {
        let url = Url::parse(url).with_context(|| format!("invalid page url {url:?}"))?;
        self.state.lock().unwrap().pages.insert(url, page);
        Ok(())
    }

    /// Moves the tab to an address, like a committed navigation. Resets
    /// per-page state (expansion) and returns the event the browser shell
    /// would report.
    pub fn goto(&self, url: &str) -> Result<TabEvent> {
        let url = Url::parse(url).with_context(|| format!("invalid navigation url {url:?}"))?;
        let mut state = self.state.lock().unwrap();
        state.url = Some(url.clone());
        state.expanded = false;
        Ok(TabEvent::NavigationCommitted { tab: self.id, url })
    }

    pub fn begin_playback(&self) {
        self.state.lock().unwrap().playing = true;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    pub fn set_focused(&self, control: &str) {
        self.state.lock().unwrap().focused = Some(control.to_owned());
    }

    pub fn focused(&self) -> Option<String> {
        self.state.lock().unwrap().focused.clone()
    }

    /// Makes the next `mount_interstitial` call fail.
    pub fn fail_next_mount(&self) {
        self.state.lock().unwrap().mount_failure = true;
    }

    pub fn is_mounted(&self) -> bool {
        self.state.lock().unwrap().mounted_markup.is_some()
    }

    pub fn description_expanded(&self) -> bool {
        self.state.lock().unwrap().expanded
    }

    /// Latest interstitial view pushed at this tab, if any.
    pub fn last_view(&self) -> Option<InterstitialView> {
        self.state.lock().unwrap().views.last().cloned()
    }

    /// Every view pushed so far, oldest first.
    pub fn views(&self) -> Vec<InterstitialView> {
        self.state.lock().unwrap().views.clone()
    }

    /// The notice currently on screen.
    pub fn current_notice(&self) -> Option<String> {
        self.state.lock().unwrap().notice.clone()
    }

    /// Every notice ever shown, oldest first.
    pub fn notice_history(&self) -> Vec<String> {
        self.state.lock().unwrap().notice_history.clone()
    }
}

impl TabSurface for ScriptedTab {
    fn current_url(&self) -> Option<Url> {
        self.state.lock().unwrap().url.clone()
    }

    fn document(&self) -> DocumentSnapshot {
        let state = self.state.lock().unwrap();
        let Some(url) = state.url.as_ref() else {
            return DocumentSnapshot::default();
        };
        let Some(page) = state.pages.get(url) else {
            return DocumentSnapshot::default();
        };
        let html = match (&page.expanded_html, state.expanded) {
            (Some(expanded), true) => expanded.clone(),
            _ => page.html.clone(),
        };
        DocumentSnapshot {
            title: page.title.clone(),
            html,
        }
    }

    fn expand_description(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        let has_expander = state
            .url
            .as_ref()
            .and_then(|url| state.pages.get(url))
            .is_some_and(|page| page.expanded_html.is_some());
        if !has_expander || state.expanded {
            return false;
        }
        state.expanded = true;
        true
    }

    fn pause_playback(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        let was_playing = state.playing;
        state.playing = false;
        was_playing
    }

    fn resume_playback(&self) {
        self.state.lock().unwrap().playing = true;
    }

    fn focused_control(&self) -> Option<String> {
        self.state.lock().unwrap().focused.clone()
    }

    fn restore_focus(&self, control: &str) {
        self.state.lock().unwrap().focused = Some(control.to_owned());
    }

    fn mount_interstitial(&self, markup: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.mount_failure {
            state.mount_failure = false;
            bail!("scripted mount failure");
        }
        state.mounted_markup = Some(markup.to_owned());
        Ok(())
    }

    fn render_interstitial(&self, view: &InterstitialView) {
        self.state.lock().unwrap().views.push(view.clone());
    }

    fn render_notice(&self, message: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        match message {
            Some(message) => {
                state.notice = Some(message.to_owned());
                state.notice_history.push(message.to_owned());
            }
            None => state.notice = None,
        }
    }
}

#[derive(Default)]
struct NavigatorLog {
    navigations: Vec<(TabId, Url)>,
    closed: Vec<TabId>,
    fail_navigation: bool,
    tabs: HashMap<TabId, Arc<ScriptedTab>>,
}

/// Browser-shell stand-in: records navigate/close calls and, for attached
/// tabs, applies navigations so the scripted page actually changes.
#[derive(Default)]
pub struct RecordingNavigator {
    log: Mutex<NavigatorLog>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets this navigator move a scripted tab when asked to navigate it.
    pub fn attach(&self, tab: Arc<ScriptedTab>) {
        self.log.lock().unwrap().tabs.insert(tab.id(), tab);
    }

    /// Makes every subsequent navigation fail, to exercise the
    /// close-tab fallback.
    pub fn set_failing(&self, failing: bool) {
        self.log.lock().unwrap().fail_navigation = failing;
    }

    pub fn navigations(&self) -> Vec<(TabId, Url)> {
        self.log.lock().unwrap().navigations.clone()
    }

    pub fn closed_tabs(&self) -> Vec<TabId> {
        self.log.lock().unwrap().closed.clone()
    }
}

impl TabNavigator for RecordingNavigator {
    async fn navigate(&self, tab: TabId, url: &Url) -> Result<()> {
        let applied = {
            let mut log = self.log.lock().unwrap();
            if log.fail_navigation {
                bail!("scripted navigation failure");
            }
            log.navigations.push((tab, url.clone()));
            log.tabs.get(&tab).cloned()
        };
        if let Some(scripted) = applied {
            scripted
                .goto(url.as_str())
                .map_err(|err| anyhow!("scripted tab rejected {url}: {err}"))?;
        }
        Ok(())
    }

    async fn close_tab(&self, tab: TabId) -> Result<()> {
        self.log.lock().unwrap().closed.push(tab);
        Ok(())
    }
}
