//! The active display language, shared between the host and the widget.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A supported display language.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Spanish.
    Es,
}

impl Locale {
    /// Returns the two-letter language code.
    #[inline]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Returns the other language.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Self::En => Self::Es,
            Self::Es => Self::En,
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unsupported language code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLocaleError(String);

impl Display for UnknownLocaleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported locale `{}`", self.0)
    }
}

impl StdError for UnknownLocaleError {}

impl FromStr for Locale {
    type Err = UnknownLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            _ => Err(UnknownLocaleError(s.to_owned())),
        }
    }
}

/// The owning side of the locale: whoever holds it decides the language.
///
/// Clones share the same underlying value.
#[derive(Clone, Debug)]
pub struct LocaleSwitch {
    tx: Arc<watch::Sender<Locale>>,
}

impl LocaleSwitch {
    /// Creates a switch starting at `initial`.
    pub fn new(initial: Locale) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Changes the active locale. Readers observe it on their next
    /// operation.
    pub fn set(&self, locale: Locale) {
        let previous = self.tx.send_replace(locale);
        if previous != locale {
            debug!("locale switched from {previous} to {locale}");
        }
    }

    /// Returns the active locale.
    #[inline]
    pub fn get(&self) -> Locale {
        *self.tx.borrow()
    }

    /// Returns a read-only view of this switch.
    #[inline]
    pub fn context(&self) -> LocaleContext {
        LocaleContext {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for LocaleSwitch {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

/// A read-only view of the active locale.
#[derive(Clone, Debug)]
pub struct LocaleContext {
    rx: watch::Receiver<Locale>,
}

impl LocaleContext {
    /// Creates a context that never changes.
    pub fn fixed(locale: Locale) -> Self {
        // The last value stays readable after the sender is gone.
        let (_, rx) = watch::channel(locale);
        Self { rx }
    }

    /// Returns the active locale.
    #[inline]
    pub fn current(&self) -> Locale {
        *self.rx.borrow()
    }
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self::fixed(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!("en".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(" ES ".parse::<Locale>(), Ok(Locale::Es));
        assert!("fr".parse::<Locale>().is_err());
        assert_eq!(Locale::Es.to_string(), "es");
        assert_eq!(Locale::En.toggled(), Locale::Es);
    }

    #[test]
    fn test_context_follows_switch() {
        let switch = LocaleSwitch::new(Locale::En);
        let context = switch.context();
        let cloned = context.clone();
        assert_eq!(context.current(), Locale::En);

        switch.set(Locale::Es);
        assert_eq!(context.current(), Locale::Es);
        assert_eq!(cloned.current(), Locale::Es);
        assert_eq!(switch.get(), Locale::Es);

        drop(switch);
        assert_eq!(context.current(), Locale::Es);
    }

    #[test]
    fn test_fixed_context() {
        assert_eq!(LocaleContext::fixed(Locale::Es).current(), Locale::Es);
        assert_eq!(LocaleContext::default().current(), Locale::En);
    }
}
