//! Display text lookup.
//!
//! The widget never hardcodes user-facing text. Everything it shows or sends
//! is resolved through a [`Translator`] from a semantic key and the active
//! [`Locale`]. Keys are namespaced by a [`Persona`], so one dictionary can
//! serve several chat surfaces.

use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use crate::locale::Locale;

/// Resolves a key to display text in a given locale.
///
/// Lookups are total: an implementation with no text for a key should
/// return the key itself, which is what [`Dictionary`] does.
pub trait Translator: Send + Sync {
    /// Returns the text for `key` in `locale`.
    fn translate(&self, key: &str, locale: Locale) -> String;
}

impl<F> Translator for F
where
    F: Fn(&str, Locale) -> String + Send + Sync,
{
    #[inline]
    fn translate(&self, key: &str, locale: Locale) -> String {
        self(key, locale)
    }
}

/// Error returned when a dictionary cannot be loaded.
#[derive(Debug)]
pub enum DictionaryError {
    /// The input is not a JSON object of objects of strings.
    Json(serde_json::Error),
    /// A top-level key is not a supported locale.
    UnknownLocale(String),
}

impl Display for DictionaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed dictionary: {err}"),
            Self::UnknownLocale(code) => {
                write!(f, "dictionary has unsupported locale `{code}`")
            }
        }
    }
}

impl StdError for DictionaryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnknownLocale(_) => None,
        }
    }
}

/// An in-memory translation table, one flat key-to-text map per locale.
///
/// The JSON form is an object keyed by locale code:
///
/// ```json
/// { "en": { "chatbot.greeting": "Hi!" }, "es": { "chatbot.greeting": "Hola!" } }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    tables: HashMap<Locale, HashMap<String, String>>,
}

impl Dictionary {
    /// Parses a dictionary from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, DictionaryError> {
        let raw: HashMap<String, HashMap<String, String>> =
            serde_json::from_str(json).map_err(DictionaryError::Json)?;
        let mut tables = HashMap::with_capacity(raw.len());
        for (code, table) in raw {
            let locale = code
                .parse::<Locale>()
                .map_err(|_| DictionaryError::UnknownLocale(code))?;
            tables.insert(locale, table);
        }
        Ok(Self { tables })
    }

    /// Adds or replaces one entry.
    pub fn insert(
        &mut self,
        locale: Locale,
        key: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.tables
            .entry(locale)
            .or_default()
            .insert(key.into(), text.into());
    }

    /// Returns the text for `key` in `locale`, if present.
    #[inline]
    pub fn get(&self, key: &str, locale: Locale) -> Option<&str> {
        self.tables.get(&locale)?.get(key).map(String::as_str)
    }
}

impl Translator for Dictionary {
    fn translate(&self, key: &str, locale: Locale) -> String {
        match self.get(key, locale) {
            Some(text) => text.to_owned(),
            None => {
                debug!("no `{locale}` text for key `{key}`");
                key.to_owned()
            }
        }
    }
}

/// A semantic key the widget looks up under its persona.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextKey {
    /// The synthetic first assistant message.
    Greeting,
    /// The instruction sent ahead of the transcript.
    SystemPrompt,
    /// The assistant text used when no completion is available.
    Fallback,
    /// Newline-separated phrases that make the hand-off ready.
    HandOffTriggers,
    /// The hand-off message, with `{needs}` and `{summary}` placeholders.
    HandOffTemplate,
    /// Substituted for `{needs}` when the user has said nothing.
    HandOffDefaultNeeds,
    /// The call-to-action label for the hand-off.
    BookCall,
}

impl TextKey {
    fn suffix(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::SystemPrompt => "systemPrompt",
            Self::Fallback => "fallback",
            Self::HandOffTriggers => "handoff.triggers",
            Self::HandOffTemplate => "handoff.template",
            Self::HandOffDefaultNeeds => "handoff.defaultNeeds",
            Self::BookCall => "bookCall",
        }
    }
}

/// The key namespace of one chat surface.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Persona {
    namespace: Cow<'static, str>,
}

impl Persona {
    /// The floating widget on the main site.
    pub const SITE: Persona = Persona::from_static("chatbot");
    /// The consultant on the presentation deck.
    pub const DECK: Persona = Persona::from_static("deck.consultant");
    /// The consultant on the electronics deck.
    pub const ELECTRONICS: Persona = Persona::from_static("elec.consultant");

    const fn from_static(namespace: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
        }
    }

    /// Creates a persona with a custom key namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Cow::Owned(namespace.into()),
        }
    }

    /// Resolves a persona by its short name (`site`, `deck`,
    /// `electronics`), or treats the name as a raw namespace.
    pub fn from_name(name: &str) -> Self {
        match name {
            "site" | "chatbot" => Self::SITE,
            "deck" => Self::DECK,
            "electronics" | "elec" => Self::ELECTRONICS,
            other => Self::new(other),
        }
    }

    /// Returns the key namespace.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the full dictionary key for `key`.
    pub fn key(&self, key: TextKey) -> String {
        format!("{}.{}", self.namespace, key.suffix())
    }

    /// Looks up `key` for this persona.
    #[inline]
    pub fn text(
        &self,
        translator: &dyn Translator,
        key: TextKey,
        locale: Locale,
    ) -> String {
        translator.translate(&self.key(key), locale)
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::SITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_lookup() {
        let dict = Dictionary::from_json_str(
            r#"{
                "en": { "chatbot.greeting": "Hi, I'm Karu." },
                "es": { "chatbot.greeting": "Hola, soy Karu." }
            }"#,
        )
        .unwrap();

        assert_eq!(
            dict.translate("chatbot.greeting", Locale::Es),
            "Hola, soy Karu."
        );
        assert_eq!(dict.translate("chatbot.missing", Locale::En), "chatbot.missing");
    }

    #[test]
    fn test_dictionary_errors() {
        let err = Dictionary::from_json_str(r#"{ "fr": {} }"#).unwrap_err();
        assert!(matches!(err, DictionaryError::UnknownLocale(code) if code == "fr"));

        let err = Dictionary::from_json_str(r#"{ "en": [] }"#).unwrap_err();
        assert!(matches!(err, DictionaryError::Json(_)));
    }

    #[test]
    fn test_persona_keys() {
        assert_eq!(Persona::SITE.key(TextKey::Greeting), "chatbot.greeting");
        assert_eq!(
            Persona::DECK.key(TextKey::HandOffDefaultNeeds),
            "deck.consultant.handoff.defaultNeeds"
        );
        assert_eq!(Persona::from_name("electronics"), Persona::ELECTRONICS);
        assert_eq!(
            Persona::from_name("kiosk").key(TextKey::BookCall),
            "kiosk.bookCall"
        );
    }

    #[test]
    fn test_closure_translator() {
        let translator = |key: &str, locale: Locale| format!("{locale}:{key}");
        let text = Persona::SITE.text(&translator, TextKey::Fallback, Locale::Es);
        assert_eq!(text, "es:chatbot.fallback");
    }
}
