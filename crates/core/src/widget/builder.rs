use std::sync::Arc;

use lead_chat_model::ModelProvider;

use super::Widget;
use super::state::Callbacks;
use crate::completion::{CompletionClient, MAX_TOKENS};
use crate::hand_off::{HandOffConfig, HandOffTrigger, LinkOpener, NoopOpener};
use crate::i18n::{Persona, Translator};
use crate::locale::{Locale, LocaleContext};
use crate::transcript::Message;

/// [`Widget`] builder.
///
/// Without further setup the widget speaks English, uses the site persona,
/// resolves every key to itself and leaves opening the hand-off link to the
/// caller.
pub struct WidgetBuilder {
    pub(crate) completion: CompletionClient,
    pub(crate) max_tokens: u32,
    pub(crate) translator: Arc<dyn Translator>,
    pub(crate) locale: LocaleContext,
    pub(crate) persona: Persona,
    pub(crate) opener: Arc<dyn LinkOpener>,
    pub(crate) hand_off_config: HandOffConfig,
    pub(crate) callbacks: Callbacks,
}

impl WidgetBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            completion: CompletionClient::new(provider),
            max_tokens: MAX_TOKENS,
            translator: Arc::new(key_as_text),
            locale: LocaleContext::default(),
            persona: Persona::default(),
            opener: Arc::new(NoopOpener),
            hand_off_config: HandOffConfig::default(),
            callbacks: Callbacks::default(),
        }
    }

    /// Caps the length of each reply, [`MAX_TOKENS`](crate::MAX_TOKENS) by
    /// default.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the text resolver.
    #[inline]
    pub fn with_translator<T: Translator + 'static>(
        mut self,
        translator: T,
    ) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Sets the text resolver, sharing it with other widgets.
    #[inline]
    pub fn with_shared_translator(
        mut self,
        translator: Arc<dyn Translator>,
    ) -> Self {
        self.translator = translator;
        self
    }

    /// Follows the given locale. It is read again on every operation.
    #[inline]
    pub fn with_locale(mut self, locale: LocaleContext) -> Self {
        self.locale = locale;
        self
    }

    /// Sets the key namespace for all display text.
    #[inline]
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Sets the hand-off link and threshold configuration.
    #[inline]
    pub fn with_hand_off_config(mut self, config: HandOffConfig) -> Self {
        self.hand_off_config = config;
        self
    }

    /// Sets how hand-off links are opened.
    #[inline]
    pub fn with_link_opener<O: LinkOpener + 'static>(mut self, opener: O) -> Self {
        self.opener = Arc::new(opener);
        self
    }

    /// Attaches a callback to be invoked for every appended message.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_message = Some(Box::new(on_message));
        self
    }

    /// Attaches a callback to be invoked when a turn has finished.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Attaches a callback to be invoked once, when the hand-off becomes
    /// ready.
    #[inline]
    pub fn on_hand_off_ready(
        mut self,
        on_hand_off_ready: impl Fn(&HandOffTrigger) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_hand_off_ready = Some(Box::new(on_hand_off_ready));
        self
    }

    /// Builds the widget. Must be called within a tokio runtime.
    #[inline]
    pub fn build(self) -> Widget {
        Widget::spawn_from_builder(self)
    }
}

fn key_as_text(key: &str, _locale: Locale) -> String {
    key.to_owned()
}
