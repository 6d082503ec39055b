//! Message types exchanged between page-side tasks and the coordinator.
//!
//! Page-side code (navigation monitor, interstitial) talks to the
//! coordinator with [`PageRequest`]s carrying a [`PageSender`] context;
//! the coordinator answers every request with a [`ReplyStatus`] and pushes
//! [`PageCommand`]s back down the tab's command route.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use url::Url;

/// Browser-assigned tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Title and description sampled from a video page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_title: String,
    pub video_description: String,
}

/// Where a request came from: the tab and the address its page had when
/// the request was sent. The coordinator trusts this address, not whatever
/// the tab shows by the time the request is handled.
#[derive(Debug, Clone)]
pub struct PageSender {
    pub tab: TabId,
    pub url: Option<Url>,
}

/// Requests a page sends up to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    /// Extracted details for the video the page currently shows.
    FullVideoDetails(VideoDetails),
    /// The user chose to leave; navigate this tab somewhere safe.
    GoBack,
}

/// Commands the coordinator pushes down to a page. Every command carries
/// a reply channel so delivery failures are observable.
#[derive(Debug)]
pub enum PageCommand {
    /// Put up the blocking warning interstitial.
    ShowWarning { ack: oneshot::Sender<ReplyStatus> },
    /// Surface a transient, non-blocking error notice.
    ShowError {
        message: String,
        ack: oneshot::Sender<ReplyStatus>,
    },
    /// Legacy pull: ask the page for a fresh extraction pass.
    ExtractVideoDetails { reply: oneshot::Sender<VideoDetails> },
}

/// Tab lifecycle notifications from the browser shell.
#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    /// A top-level navigation committed in this tab.
    NavigationCommitted { tab: TabId, url: Url },
    /// The tab is gone; drop everything held for it.
    Closed { tab: TabId },
}

/// Outcome of a page request, as reported back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplyStatus {
    Processing,
    NotVideoPage,
    MissingVideoId,
    DuplicateSuppressed,
    Paused,
    WarningsDisabled,
    MissingTitle,
    NavigationStarted,
    WarningShown,
    ErrorShown,
    Received,
}

impl ReplyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyStatus::Processing => "Processing video for analysis",
            ReplyStatus::NotVideoPage => "Not a video page",
            ReplyStatus::MissingVideoId => "No video ID found",
            ReplyStatus::DuplicateSuppressed => "Skipping duplicate analysis request",
            ReplyStatus::Paused => "Extension is paused",
            ReplyStatus::WarningsDisabled => "Warnings are disabled",
            ReplyStatus::MissingTitle => "No title provided for analysis",
            ReplyStatus::NavigationStarted => "Navigation initiated or tab closed",
            ReplyStatus::WarningShown => "Warning modal process initiated.",
            ReplyStatus::ErrorShown => "Error notice displayed",
            ReplyStatus::Received => "Message received",
        }
    }
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_details_use_wire_field_names() {
        let details = VideoDetails {
            video_title: "Building a Parser".into(),
            video_description: "We build a parser from scratch.".into(),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["videoTitle"], "Building a Parser");
        assert_eq!(json["videoDescription"], "We build a parser from scratch.");
    }

    #[test]
    fn reply_status_strings_match_the_wire_protocol() {
        assert_eq!(
            ReplyStatus::DuplicateSuppressed.as_str(),
            "Skipping duplicate analysis request"
        );
        assert_eq!(ReplyStatus::NotVideoPage.as_str(), "Not a video page");
        assert_eq!(
            ReplyStatus::NavigationStarted.as_str(),
            "Navigation initiated or tab closed"
        );
    }
}
