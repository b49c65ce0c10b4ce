//! A provider-neutral protocol for chat completions.
//!
//! The lead widget talks to a language model through the types in this
//! crate only, so the HTTP provider can be swapped for a scripted one in
//! tests (or for another vendor) without touching the widget.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
