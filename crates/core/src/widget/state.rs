use std::fmt::{self, Debug};

use lead_chat_actor::{Actor, Message};
use tracing::Instrument;

use super::{HandOffError, HandOffErrorKind, SendError, SendErrorKind, WidgetState};
use crate::completion::{self, CompletionClient, CompletionUnavailable};
use crate::hand_off::{
    HandOffState, HandOffTrigger, ReplySource, compose_hand_off_url,
    parse_trigger_phrases,
};
use crate::i18n::TextKey;
use crate::transcript::{Message as ChatMessage, MessageId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidgetStage {
    #[default]
    Idle,
    AwaitingCompletion,
}

type MessageCallback = Box<dyn Fn(&ChatMessage) + Send + Sync>;
type IdleCallback = Box<dyn Fn() + Send + Sync>;
type ReadyCallback = Box<dyn Fn(&HandOffTrigger) + Send + Sync>;

/// Hooks for the view layer. All of them run on the widget task.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) on_message: Option<MessageCallback>,
    pub(crate) on_idle: Option<IdleCallback>,
    pub(crate) on_hand_off_ready: Option<ReadyCallback>,
}

impl Callbacks {
    #[inline]
    fn message(&self, msg: &ChatMessage) {
        if let Some(on_message) = &self.on_message {
            on_message(msg);
        }
    }

    #[inline]
    fn idle(&self) {
        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }

    #[inline]
    fn hand_off_ready(&self, trigger: &HandOffTrigger) {
        if let Some(on_hand_off_ready) = &self.on_hand_off_ready {
            on_hand_off_ready(trigger);
        }
    }
}

impl WidgetState {
    #[inline]
    fn text(&self, key: TextKey) -> String {
        self.persona
            .text(&*self.translator, key, self.locale.current())
    }

    pub(super) fn open(&mut self) {
        self.visible = true;
        self.seed_greeting();
    }

    pub(super) fn close(&mut self) {
        self.visible = false;
    }

    fn seed_greeting(&mut self) {
        if !self.transcript.is_empty() {
            return;
        }
        let greeting = self.text(TextKey::Greeting);
        let msg = self.transcript.push_assistant(greeting);
        trace!("seeded greeting {}", msg.id());
        self.callbacks.message(msg);
    }

    pub(super) fn submit(
        &mut self,
        input: String,
        handle: &Actor<Self>,
    ) -> Result<MessageId, SendError> {
        if input.trim().is_empty() {
            return Err(SendError::new(SendErrorKind::EmptyInput, input));
        }
        if self.current_stage != WidgetStage::Idle {
            debug!("rejecting input while a reply is pending");
            return Err(SendError::new(SendErrorKind::Busy, input));
        }
        let Some(client) = self.completion.take() else {
            return Err(SendError::new(SendErrorKind::Busy, input));
        };

        self.seed_greeting();
        let msg = match self.transcript.push_user(input.trim()) {
            Ok(msg) => msg,
            Err(_) => {
                self.completion = Some(client);
                return Err(SendError::new(SendErrorKind::EmptyInput, input));
            }
        };
        let id = msg.id();
        self.callbacks.message(msg);

        self.current_stage = WidgetStage::AwaitingCompletion;
        let request = completion::build_request(
            self.text(TextKey::SystemPrompt),
            &self.transcript,
            self.max_tokens,
        );
        let handle = handle.clone();
        tokio::spawn(
            async move {
                let result = client.complete(request).await;
                let finished = CompletionFinishedMessage { client, result };
                if handle.send(finished).is_err() {
                    debug!("widget is gone, dropping the reply");
                }
            }
            .instrument(debug_span!("turn", %id)),
        );
        Ok(id)
    }

    fn finish_turn(
        &mut self,
        client: CompletionClient,
        result: Result<String, CompletionUnavailable>,
    ) {
        self.completion = Some(client);

        let (reply, source) = match result {
            Ok(reply) => (reply, ReplySource::Model),
            Err(err) => {
                warn!(
                    "no completion ({}), using the fallback reply: {}",
                    err.kind(),
                    err.message()
                );
                (self.text(TextKey::Fallback), ReplySource::Fallback)
            }
        };
        let trigger_phrases =
            parse_trigger_phrases(&self.text(TextKey::HandOffTriggers));

        let msg = self.transcript.push_assistant(reply);
        self.callbacks.message(msg);

        let reply = self.transcript.last_assistant_text().unwrap_or_default();
        let trigger = self.policy.observe(
            reply,
            source,
            self.transcript.len(),
            &trigger_phrases,
        );
        if let Some(trigger) = trigger {
            info!("hand-off is ready: {trigger:?}");
            self.callbacks.hand_off_ready(&trigger);
        }

        self.current_stage = WidgetStage::Idle;
        self.callbacks.idle();
    }

    pub(super) fn hand_off(&self) -> Result<String, HandOffError> {
        if self.policy.state() != HandOffState::Ready {
            return Err(HandOffError::new(HandOffErrorKind::NotReady));
        }
        let url = compose_hand_off_url(
            &self.hand_off_config,
            &self.transcript,
            &self.text(TextKey::HandOffTemplate),
            &self.text(TextKey::HandOffDefaultNeeds),
        );
        info!("opening hand-off link");
        if let Err(err) = self.opener.open(&url) {
            warn!("failed to open {url}: {err}");
            return Err(HandOffError::launch(url, err));
        }
        Ok(url)
    }
}

struct CompletionFinishedMessage {
    client: CompletionClient,
    result: Result<String, CompletionUnavailable>,
}

impl Debug for CompletionFinishedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionFinishedMessage")
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Message<WidgetState> for CompletionFinishedMessage {
    fn handle(self, state: &mut WidgetState, _handle: &Actor<WidgetState>) {
        state.finish_turn(self.client, self.result);
    }
}
