//! The lead-qualification chat widget: transcript, completion turns,
//! hand-off policy and the deep link that carries a conversation over to a
//! human.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod completion;
pub mod hand_off;
pub mod i18n;
pub mod locale;
pub mod transcript;
mod widget;

pub use completion::{MAX_TOKENS, TEMPERATURE};
pub use lead_chat_actor::ActorDeadError;
pub use widget::{
    HandOffError, HandOffErrorKind, SendError, SendErrorKind, Widget,
    WidgetBuilder,
};
