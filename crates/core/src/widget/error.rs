use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;

/// Why a message was not sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SendErrorKind {
    /// The input was blank.
    EmptyInput,
    /// A reply is still pending.
    Busy,
    /// The widget has been shut down.
    ShutDown,
}

/// Error returned by [`Widget::send`](crate::Widget::send). Carries the
/// rejected input so the view can keep it in the text box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendError {
    kind: SendErrorKind,
    input: String,
}

impl SendError {
    #[inline]
    pub(crate) fn new(kind: SendErrorKind, input: String) -> Self {
        Self { kind, input }
    }

    /// Returns the reason.
    #[inline]
    pub fn kind(&self) -> SendErrorKind {
        self.kind
    }

    /// Returns the rejected input.
    #[inline]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Takes back the rejected input.
    #[inline]
    pub fn into_input(self) -> String {
        self.input
    }
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            SendErrorKind::EmptyInput => f.write_str("message is empty"),
            SendErrorKind::Busy => f.write_str("a reply is still pending"),
            SendErrorKind::ShutDown => f.write_str("the widget has shut down"),
        }
    }
}

impl StdError for SendError {}

/// Why the hand-off link was not opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandOffErrorKind {
    /// The conversation has not qualified for a hand-off yet.
    NotReady,
    /// The link opener failed.
    Launch,
    /// The widget has been shut down.
    ShutDown,
}

/// Error returned by [`Widget::hand_off`](crate::Widget::hand_off).
#[derive(Debug)]
pub struct HandOffError {
    kind: HandOffErrorKind,
    url: Option<String>,
    source: Option<io::Error>,
}

impl HandOffError {
    #[inline]
    pub(crate) fn new(kind: HandOffErrorKind) -> Self {
        Self {
            kind,
            url: None,
            source: None,
        }
    }

    #[inline]
    pub(crate) fn launch(url: String, source: io::Error) -> Self {
        Self {
            kind: HandOffErrorKind::Launch,
            url: Some(url),
            source: Some(source),
        }
    }

    /// Returns the reason.
    #[inline]
    pub fn kind(&self) -> HandOffErrorKind {
        self.kind
    }

    /// Returns the link that failed to open, so it can be shown instead.
    #[inline]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Display for HandOffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            HandOffErrorKind::NotReady => {
                f.write_str("the conversation is not ready for a hand-off")
            }
            HandOffErrorKind::Launch => match &self.source {
                Some(err) => write!(f, "failed to open the hand-off link: {err}"),
                None => f.write_str("failed to open the hand-off link"),
            },
            HandOffErrorKind::ShutDown => f.write_str("the widget has shut down"),
        }
    }
}

impl StdError for HandOffError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|err| err as _)
    }
}
