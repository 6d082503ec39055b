//! Seams between the guard engine and whatever hosts it.
//!
//! [`TabSurface`] is the page a tab currently shows: its address, its
//! document, its player, and the interstitial mount point. Everything on
//! it is synchronous because page access is synchronous in the contexts
//! that implement it. [`TabNavigator`] is the browser-level surface that
//! can move or close tabs, and that one is async.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use url::Url;

use crate::protocol::TabId;

/// Raw material for one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct DocumentSnapshot {
    /// The document title bar text.
    pub title: String,
    /// Full document markup.
    pub html: String,
}

/// The two controls on the warning interstitial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InterstitialControl {
    Continue,
    GoBack,
}

/// Everything a surface needs to draw the interstitial. Pushed whole on
/// every state change; the surface keeps no interstitial state of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterstitialView {
    pub visible: bool,
    pub quote_text: String,
    pub quote_author: String,
    pub countdown: u8,
    pub continue_enabled: bool,
    pub focused: Option<InterstitialControl>,
}

/// Page access for one tab.
pub trait TabSurface: Send + Sync {
    /// Address the page currently shows, if any page is loaded.
    fn current_url(&self) -> Option<Url>;

    /// Snapshot of the live document.
    fn document(&self) -> DocumentSnapshot;

    /// Activates the description "show more" control. False when the
    /// control is absent or already expanded.
    fn expand_description(&self) -> bool;

    /// Pauses the player. True when it was actually playing.
    fn pause_playback(&self) -> bool;

    fn resume_playback(&self);

    /// Identifier of the control that currently holds focus, if the
    /// surface can tell.
    fn focused_control(&self) -> Option<String>;

    /// Hands focus back to a control captured earlier.
    fn restore_focus(&self, control: &str);

    /// Injects the interstitial fragment into the page. Called at most
    /// once per page lifetime.
    fn mount_interstitial(&self, markup: &str) -> Result<()>;

    /// Redraws the mounted interstitial from a fresh view.
    fn render_interstitial(&self, view: &InterstitialView);

    /// Shows a transient notice, or clears it with `None`.
    fn render_notice(&self, message: Option<&str>);
}

/// Browser-level tab control.
pub trait TabNavigator: Send + Sync + 'static {
    /// Points the tab at a new address.
    fn navigate(&self, tab: TabId, url: &Url) -> impl Future<Output = Result<()>> + Send;

    /// Closes the tab outright.
    fn close_tab(&self, tab: TabId) -> impl Future<Output = Result<()>> + Send;
}

impl<N: TabNavigator> TabNavigator for Arc<N> {
    fn navigate(&self, tab: TabId, url: &Url) -> impl Future<Output = Result<()>> + Send {
        (**self).navigate(tab, url)
    }

    fn close_tab(&self, tab: TabId) -> impl Future<Output = Result<()>> + Send {
        (**self).close_tab(tab)
    }
}
