//! # API Module
//!
//! HTTP endpoints served by the transient local callback server that exists
//! only for the duration of a browser-redirect authorization flow.
//!
//! - [`callback`] - receives the OAuth redirect, validates the `state`
//!   parameter and records the authorization code (or the rejection cause)
//!   in the shared flow state. The token exchange itself happens in
//!   [`crate::spotify::auth`], after the listener has shut down.
//! - [`health`] - minimal liveness endpoint, mostly useful when debugging
//!   redirect-URI configuration.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
