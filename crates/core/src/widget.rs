mod builder;
mod error;
mod state;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use lead_chat_actor::{Actor, ActorDeadError};

use crate::completion::CompletionClient;
use crate::hand_off::{HandOffConfig, HandOffPolicy, HandOffState, LinkOpener};
use crate::i18n::{Persona, Translator};
use crate::locale::LocaleContext;
use crate::transcript::{Message, MessageId, Transcript};
pub use builder::WidgetBuilder;
pub use error::{HandOffError, HandOffErrorKind, SendError, SendErrorKind};
use state::{Callbacks, WidgetStage};

/// State owned by the widget's actor task.
pub(crate) struct WidgetState {
    completion: Option<CompletionClient>,
    max_tokens: u32,
    current_stage: WidgetStage,
    translator: Arc<dyn Translator>,
    locale: LocaleContext,
    persona: Persona,
    opener: Arc<dyn LinkOpener>,
    hand_off_config: HandOffConfig,
    policy: HandOffPolicy,
    transcript: Transcript,
    visible: bool,
    callbacks: Callbacks,
}

/// A chat widget instance: one transcript, one model, one hand-off policy.
///
/// The state lives on its own task and handles one call at a time, so at
/// most one completion is in flight. Handles are cheap to clone and every
/// clone talks to the same instance. Once [`Widget::shutdown`] is called
/// every method fails, and a reply that arrives later is dropped.
#[derive(Clone)]
pub struct Widget {
    handle: Actor<WidgetState>,
}

impl Widget {
    /// Shows the widget, seeding the greeting on first open.
    pub async fn open(&self) -> Result<(), ActorDeadError> {
        self.handle.ask(|state, _| state.open()).await
    }

    /// Hides the widget. The transcript and a pending reply are kept.
    pub async fn close(&self) -> Result<(), ActorDeadError> {
        self.handle.ask(|state, _| state.close()).await
    }

    /// Returns `true` if the widget is shown.
    pub async fn is_open(&self) -> Result<bool, ActorDeadError> {
        self.handle.ask(|state, _| state.visible).await
    }

    /// Sends a user message and requests a reply in the background.
    ///
    /// The input is trimmed. It is rejected if blank or while a reply is
    /// pending, and the transcript is left as it was. Completion of the
    /// turn is reported through the `on_idle` callback.
    pub async fn send<S: Into<String>>(
        &self,
        input: S,
    ) -> Result<MessageId, SendError> {
        let input = input.into();
        let fallback_input = input.clone();
        match self.handle.ask(move |state, handle| state.submit(input, handle)).await
        {
            Ok(result) => result,
            Err(ActorDeadError) => {
                Err(SendError::new(SendErrorKind::ShutDown, fallback_input))
            }
        }
    }

    /// Opens the hand-off link built from the current transcript and
    /// returns it.
    ///
    /// Fails with [`HandOffErrorKind::NotReady`] until the conversation has
    /// qualified. Calling it again opens a fresh link.
    pub async fn hand_off(&self) -> Result<String, HandOffError> {
        self.handle
            .ask(|state, _| state.hand_off())
            .await
            .unwrap_or_else(|ActorDeadError| {
                Err(HandOffError::new(HandOffErrorKind::ShutDown))
            })
    }

    /// Returns a copy of the transcript.
    pub async fn transcript(&self) -> Result<Vec<Message>, ActorDeadError> {
        self.handle
            .ask(|state, _| state.transcript.all().to_vec())
            .await
    }

    /// Returns the hand-off readiness.
    pub async fn hand_off_state(&self) -> Result<HandOffState, ActorDeadError> {
        self.handle.ask(|state, _| state.policy.state()).await
    }

    /// Returns `true` while a reply is pending.
    pub async fn is_busy(&self) -> Result<bool, ActorDeadError> {
        self.handle
            .ask(|state, _| state.current_stage != WidgetStage::Idle)
            .await
    }

    /// Destroys the instance. Pending and future calls fail.
    pub fn shutdown(&self) {
        debug!("shutting down widget");
        self.handle.try_kill();
    }

    /// Returns `true` once the instance has been destroyed.
    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.handle.is_dead()
    }
}

impl Widget {
    fn spawn_from_builder(builder: WidgetBuilder) -> Self {
        let WidgetBuilder {
            completion,
            max_tokens,
            translator,
            locale,
            persona,
            opener,
            hand_off_config,
            callbacks,
        } = builder;

        let state = WidgetState {
            completion: Some(completion),
            max_tokens,
            current_stage: WidgetStage::Idle,
            translator,
            locale,
            persona,
            opener,
            policy: HandOffPolicy::new(hand_off_config.min_messages),
            hand_off_config,
            transcript: Transcript::new(),
            visible: false,
            callbacks,
        };
        Self {
            handle: Actor::spawn(state, Some("widget")),
        }
    }
}
