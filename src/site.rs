//! Address predicates for the one site the guard watches.
//!
//! Everything downstream (navigation detection, the per-tab history scan,
//! back-navigation targets) keys off these three questions: is this address
//! on the site at all, is it a video page, and which video is it.

use url::Url;

/// Host the guard is scoped to, matched with or without subdomains.
pub const SITE_HOST: &str = "youtube.com";
/// Landing page used as the back-navigation target of last resort.
pub const HOME_URL: &str = "https://www.youtube.com/";
/// Path that carries video playback.
pub const WATCH_PATH: &str = "/watch";

const SITE_HOST_SUFFIX: &str = ".youtube.com";

/// The site landing page as a parsed address.
pub fn home_url() -> Url {
    Url::parse(HOME_URL).expect("home URL constant is valid")
}

/// True when the address points at the watched site, on any subdomain.
pub fn is_site_url(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host == SITE_HOST || host.ends_with(SITE_HOST_SUFFIX))
}

/// True when the address is a video page: the watch path with a `v`
/// query parameter present (even an empty one).
pub fn is_watch_url(url: &Url) -> bool {
    url.path() == WATCH_PATH && url.query_pairs().any(|(key, _)| key == "v")
}

/// Video identifier from the `v` query parameter. Empty values count as
/// absent, so `/watch?v=` yields `None` while still being a watch page.
pub fn video_id_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}
