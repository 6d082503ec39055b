use std::time::Duration;

use url::Url;

/// Default remote classification endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://ai-youtube-extension-server.vercel.app/analyze-video";

/// Configuration for the guard pipeline with tunable timings.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Classification endpoint hit with one POST per analyzed video.
    pub endpoint: Url,

    /// Repeat analyses of the same (tab, video) inside this window are dropped.
    pub dedup_window: Duration,

    /// Wait after a detected navigation before sampling the page, so the
    /// app has re-rendered the new video's metadata.
    pub settle_delay: Duration,

    /// Fallback poll cadence; bounds detection latency when no navigation
    /// signal fires.
    pub poll_interval: Duration,

    /// Wait between a history-API signal and the address check.
    pub history_check_delay: Duration,

    /// Retry cadence while a video page has not produced a title yet.
    pub extract_retry_delay: Duration,

    /// Wait after activating the description expander before re-sampling.
    pub expansion_wait: Duration,

    /// Descriptions shorter than this trigger an expansion attempt.
    pub min_description_len: usize,

    /// Seconds on the interstitial countdown before "continue" unlocks.
    pub countdown_start: u8,
    pub countdown_tick: Duration,

    /// How long an error notice stays up before auto-dismissing.
    pub notice_duration: Duration,

    /// Whole-request timeout on classification calls.
    pub request_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is valid"),
            dedup_window: Duration::from_secs(10),
            settle_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            history_check_delay: Duration::from_millis(100),
            extract_retry_delay: Duration::from_secs(2),
            expansion_wait: Duration::from_millis(300),
            min_description_len: 50,
            countdown_start: 5,
            countdown_tick: Duration::from_secs(1),
            notice_duration: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}
