use std::sync::Arc;

use lead_chat_core::hand_off::{HandOffConfig, HandOffTrigger, LinkOpener};
use lead_chat_core::i18n::{Dictionary, Persona, TextKey, Translator};
use lead_chat_core::locale::{Locale, LocaleSwitch};
use lead_chat_core::transcript::Message;
use lead_chat_core::{MAX_TOKENS, Widget, WidgetBuilder};
use lead_chat_model::ModelProvider;

use crate::opener::BrowserOpener;

static BUNDLED_DICTIONARY: &str = include_str!("../assets/dictionary.json");

/// Returns the site's dictionary, with English and Spanish text for every
/// bundled persona.
pub fn bundled_dictionary() -> Dictionary {
    match Dictionary::from_json_str(BUNDLED_DICTIONARY) {
        Ok(dictionary) => dictionary,
        Err(err) => {
            error!("bundled dictionary is broken: {err}");
            Dictionary::default()
        }
    }
}

fn is_deck(persona: &Persona) -> bool {
    *persona == Persona::DECK || *persona == Persona::ELECTRONICS
}

/// Hand-off defaults of a persona. The deck consultants hand off after the
/// second reply and summarize with sentences instead of a pipe-joined list.
pub fn hand_off_config_for(persona: &Persona) -> HandOffConfig {
    if is_deck(persona) {
        HandOffConfig {
            delimiter: ". ".to_owned(),
            min_messages: 5,
            min_fragment_chars: 4,
            ..Default::default()
        }
    } else {
        HandOffConfig::default()
    }
}

/// Reply length cap of a persona. The deck consultants write longer replies.
pub fn max_tokens_for(persona: &Persona) -> u32 {
    if is_deck(persona) { 300 } else { MAX_TOKENS }
}

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    widget_builder: WidgetBuilder,
    translator: Arc<dyn Translator>,
    persona: Persona,
    initial_locale: Locale,
    hand_off_config: Option<HandOffConfig>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider, the
    /// bundled dictionary and the system browser as link opener.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let widget_builder = WidgetBuilder::with_model_provider(provider)
            .with_link_opener(BrowserOpener);
        Self {
            widget_builder,
            translator: Arc::new(bundled_dictionary()),
            persona: Persona::default(),
            initial_locale: Locale::default(),
            hand_off_config: None,
        }
    }

    /// Replaces the bundled dictionary.
    #[inline]
    pub fn with_translator<T: Translator + 'static>(
        mut self,
        translator: T,
    ) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Sets the chat surface. Also picks its hand-off defaults unless
    /// [`SessionBuilder::with_hand_off_config`] is used.
    #[inline]
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Sets the language the session starts in.
    #[inline]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.initial_locale = locale;
        self
    }

    /// Overrides the hand-off configuration.
    #[inline]
    pub fn with_hand_off_config(mut self, config: HandOffConfig) -> Self {
        self.hand_off_config = Some(config);
        self
    }

    /// Replaces the browser with another way of opening hand-off links.
    #[inline]
    pub fn with_link_opener<O: LinkOpener + 'static>(mut self, opener: O) -> Self {
        self.widget_builder = self.widget_builder.with_link_opener(opener);
        self
    }

    /// Attaches a callback to be invoked for every appended message.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.widget_builder = self.widget_builder.on_message(on_message);
        self
    }

    /// Attaches a callback to be invoked when a turn has finished.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.widget_builder = self.widget_builder.on_idle(on_idle);
        self
    }

    /// Attaches a callback to be invoked when the hand-off becomes ready.
    #[inline]
    pub fn on_hand_off_ready(
        mut self,
        on_hand_off_ready: impl Fn(&HandOffTrigger) + Send + Sync + 'static,
    ) -> Self {
        self.widget_builder =
            self.widget_builder.on_hand_off_ready(on_hand_off_ready);
        self
    }

    /// Builds a new session. Must be called within a tokio runtime.
    pub fn build(self) -> Session {
        let locale = LocaleSwitch::new(self.initial_locale);
        let hand_off_config = self
            .hand_off_config
            .unwrap_or_else(|| hand_off_config_for(&self.persona));
        let widget = self
            .widget_builder
            .with_shared_translator(Arc::clone(&self.translator))
            .with_locale(locale.context())
            .with_persona(self.persona.clone())
            .with_hand_off_config(hand_off_config)
            .with_max_tokens(max_tokens_for(&self.persona))
            .build();

        Session {
            widget,
            locale,
            translator: self.translator,
            persona: self.persona,
        }
    }
}

/// A chat surface on a page: the widget plus the page's language switch.
///
/// Dropping the session shuts the widget down.
pub struct Session {
    widget: Widget,
    locale: LocaleSwitch,
    translator: Arc<dyn Translator>,
    persona: Persona,
}

impl Session {
    /// Returns the widget.
    #[inline]
    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    /// Returns the active language.
    #[inline]
    pub fn locale(&self) -> Locale {
        self.locale.get()
    }

    /// Switches the language. The widget uses it from its next operation.
    #[inline]
    pub fn set_locale(&self, locale: Locale) {
        self.locale.set(locale);
    }

    /// Looks up display text for this session's persona and language, such
    /// as the [`TextKey::BookCall`] label.
    pub fn text(&self, key: TextKey) -> String {
        self.persona.text(&*self.translator, key, self.locale.get())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.widget.shutdown();
    }
}
