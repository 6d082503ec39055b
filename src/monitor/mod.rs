//! Page-side navigation watching and metadata extraction.

pub mod controller;
pub mod extract;
pub mod loop_worker;

pub use controller::MonitorController;
pub use extract::Extractor;

/// Where a navigation-change signal came from. All sources funnel into
/// the same current-page check; they differ only in how fast they fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavSignal {
    /// Programmatic history mutation (the SPA pushing a new address).
    HistoryMutation,
    /// Back/forward traversal through existing history.
    HistoryTraversal,
    /// A substantial swap of the page's content subtree.
    DomMutation,
    /// Periodic fallback poll.
    Poll,
}
