//! Per-tab navigation history and the analysis dedup ledger.
//!
//! Both are plain owned collections mutated only by the coordinator task,
//! and both are bounded by tab lifetime: a tab-closed event drops its
//! history and its ledger entries in the same breath.

use std::collections::HashMap;

use tokio::time::{Duration, Instant};
use url::Url;

use crate::protocol::TabId;
use crate::site;

/// Addresses one tab has visited on the site, oldest first.
#[derive(Debug, Default)]
pub struct TabHistory {
    urls: Vec<Url>,
}

impl TabHistory {
    /// Appends an address unless it repeats the most recent entry, so
    /// SPA re-fires and the submit-time re-append never stack duplicates.
    pub fn push(&mut self, url: Url) {
        if self.urls.last() != Some(&url) {
            self.urls.push(url);
        }
    }

    /// Back-navigation target: the most recent entry that is not a video
    /// page, skipping the current page itself. `None` when every earlier
    /// entry is a video page (or there is no earlier entry), in which
    /// case the caller falls back to the site home.
    pub fn previous_non_watch(&self) -> Option<&Url> {
        self.urls
            .iter()
            .rev()
            .skip(1)
            .find(|url| !site::is_watch_url(url))
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }
}

/// Key for one analyzed video in one tab. The same video in two tabs is
/// two independent analyses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisKey {
    pub tab: TabId,
    pub video: String,
}

/// Timestamps of recent analyses, used to drop rapid repeats.
#[derive(Debug)]
pub struct AnalysisLedger {
    window: Duration,
    entries: HashMap<AnalysisKey, Instant>,
}

impl AnalysisLedger {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Returns false when the key was analyzed less than a window ago.
    /// Otherwise records `now` and returns true. The record lands before
    /// the caller starts any network work, so a near-simultaneous repeat
    /// sees it.
    pub fn begin(&mut self, key: AnalysisKey, now: Instant) -> bool {
        if let Some(last) = self.entries.get(&key) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }
        self.entries.insert(key, now);
        true
    }

    /// Drops every entry belonging to a closed tab.
    pub fn evict_tab(&mut self, tab: TabId) {
        self.entries.retain(|key, _| key.tab != tab);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
