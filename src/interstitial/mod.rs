//! The blocking warning interstitial and its countdown.

pub mod controller;
pub mod state;

pub use controller::InterstitialController;
pub use state::{InterstitialState, KeyInput, KeyOutcome, ModalPhase};

/// Static interstitial fragment, injected into a page once and redrawn
/// from [`crate::surface::InterstitialView`] pushes after that.
pub const INTERSTITIAL_MARKUP: &str = include_str!("../../assets/interstitial.html");
