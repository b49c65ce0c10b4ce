//! An out-of-the-box lead chat that bundles the site's dictionary, the
//! OpenAI-compatible model provider and a browser for hand-off links.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring the widget into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod opener;
mod session;

pub use opener::BrowserOpener;
pub use session::{
    Session, SessionBuilder, bundled_dictionary, hand_off_config_for,
    max_tokens_for,
};

/// Re-exports of [`lead_chat_core`] crate.
pub mod core {
    pub use lead_chat_core::*;
}
