//! Deciding when to offer the hand-off to a human, and building the link
//! that carries the conversation over.

use std::io;

use serde::{Deserialize, Serialize};

use crate::transcript::Transcript;

/// Whether the hand-off call-to-action should be offered.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HandOffState {
    /// Keep qualifying.
    #[default]
    NotReady,
    /// Offer the hand-off. Never reverts.
    Ready,
}

/// What made the hand-off ready.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandOffTrigger {
    /// No completion was available and the fallback text was shown.
    Fallback,
    /// The reply contained this trigger phrase.
    Phrase(String),
    /// The transcript reached this many messages.
    TranscriptLength(usize),
}

/// Where an assistant reply came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplySource {
    /// The completion endpoint.
    Model,
    /// The persona's fallback text.
    Fallback,
}

/// Hand-off tuning. Deserializable, with every field optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandOffConfig {
    /// Scheme and host of the deep link.
    pub base_url: String,
    /// Path segment after the base, typically a phone number.
    pub destination: String,
    /// Joins the user's messages in the summary.
    pub delimiter: String,
    /// Transcript length, both roles, at which the hand-off becomes ready.
    pub min_messages: usize,
    /// User messages shorter than this, in characters, are left out of the
    /// summary.
    pub min_fragment_chars: usize,
}

impl Default for HandOffConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wa.me".to_owned(),
            destination: "527202533388".to_owned(),
            delimiter: " | ".to_owned(),
            min_messages: 8,
            min_fragment_chars: 0,
        }
    }
}

/// The one-way `NotReady -> Ready` state machine.
#[derive(Clone, Debug)]
pub struct HandOffPolicy {
    state: HandOffState,
    min_messages: usize,
}

impl HandOffPolicy {
    /// Creates a policy that is not ready yet.
    #[inline]
    pub fn new(min_messages: usize) -> Self {
        Self {
            state: HandOffState::NotReady,
            min_messages,
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> HandOffState {
        self.state
    }

    /// Evaluates a completed assistant turn.
    ///
    /// `transcript_len` counts the reply itself. `trigger_phrases` must be
    /// lowercase, see [`parse_trigger_phrases`]. Returns the trigger only on
    /// the turn that makes the policy ready.
    pub fn observe(
        &mut self,
        reply: &str,
        source: ReplySource,
        transcript_len: usize,
        trigger_phrases: &[String],
    ) -> Option<HandOffTrigger> {
        if self.state == HandOffState::Ready {
            return None;
        }

        let trigger = if source == ReplySource::Fallback {
            Some(HandOffTrigger::Fallback)
        } else {
            let reply = reply.to_lowercase();
            trigger_phrases
                .iter()
                .find(|phrase| reply.contains(phrase.as_str()))
                .map(|phrase| HandOffTrigger::Phrase(phrase.clone()))
        };
        let trigger = trigger.or_else(|| {
            (transcript_len >= self.min_messages)
                .then_some(HandOffTrigger::TranscriptLength(transcript_len))
        });

        if trigger.is_some() {
            self.state = HandOffState::Ready;
        }
        trigger
    }
}

/// Splits a newline-separated phrase list, dropping blank lines.
pub fn parse_trigger_phrases(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Builds the plain-text hand-off message from the transcript.
///
/// `{needs}` in `template` becomes the user's messages joined with the
/// configured delimiter, or `default_needs` if there are none. `{summary}`
/// becomes the last assistant reply.
pub fn compose_hand_off_message(
    config: &HandOffConfig,
    transcript: &Transcript,
    template: &str,
    default_needs: &str,
) -> String {
    let fragments: Vec<&str> = transcript
        .user_contents()
        .map(str::trim)
        .filter(|text| text.chars().count() >= config.min_fragment_chars)
        .filter(|text| !text.is_empty())
        .collect();
    let needs = if fragments.is_empty() {
        default_needs.to_owned()
    } else {
        fragments.join(config.delimiter.as_str())
    };
    let summary = transcript.last_assistant_text().unwrap_or_default();
    fill_template(template, &needs, summary)
}

/// Builds the deep link carrying the hand-off message.
pub fn compose_hand_off_url(
    config: &HandOffConfig,
    transcript: &Transcript,
    template: &str,
    default_needs: &str,
) -> String {
    let message =
        compose_hand_off_message(config, transcript, template, default_needs);
    format!(
        "{}/{}?text={}",
        config.base_url.trim_end_matches('/'),
        config.destination,
        urlencoding::encode(&message)
    )
}

// Single pass, so placeholder-like text inside the values stays literal.
fn fill_template(template: &str, needs: &str, summary: &str) -> String {
    let mut out =
        String::with_capacity(template.len() + needs.len() + summary.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{needs}") {
            out.push_str(needs);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{summary}") {
            out.push_str(summary);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Opens a hand-off link in a new browsing context.
pub trait LinkOpener: Send + Sync {
    /// Opens `url`.
    fn open(&self, url: &str) -> io::Result<()>;
}

impl<F> LinkOpener for F
where
    F: Fn(&str) -> io::Result<()> + Send + Sync,
{
    #[inline]
    fn open(&self, url: &str) -> io::Result<()> {
        self(url)
    }
}

/// Leaves the link to the caller, which gets it back from
/// [`Widget::hand_off`](crate::Widget::hand_off).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopOpener;

impl LinkOpener for NoopOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        debug!("no link opener installed, not opening {url}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str =
        "Hi! I chatted with Karu.\n\nI'm looking for help with: {needs}\n\n{summary}";

    fn transcript(user_inputs: &[&str]) -> Transcript {
        let mut transcript = Transcript::new();
        transcript.push_assistant("Hi!");
        for input in user_inputs {
            transcript.push_user(*input).unwrap();
            transcript.push_assistant("Tell me more.");
        }
        transcript
    }

    #[test]
    fn test_compose_url() {
        let config = HandOffConfig::default();
        let transcript = transcript(&["I need automation", "budget is 5k"]);
        let url = compose_hand_off_url(
            &config,
            &transcript,
            "{needs}",
            "technology solutions",
        );
        assert_eq!(
            url,
            "https://wa.me/527202533388?text=I%20need%20automation%20%7C%20budget%20is%205k"
        );
    }

    #[test]
    fn test_default_needs() {
        let config = HandOffConfig::default();
        let message = compose_hand_off_message(
            &config,
            &transcript(&[]),
            TEMPLATE,
            "technology solutions",
        );
        assert_eq!(
            message,
            "Hi! I chatted with Karu.\n\nI'm looking for help with: technology solutions\n\nHi!"
        );

        let url = compose_hand_off_url(
            &config,
            &Transcript::new(),
            "{needs}{summary}",
            "technology solutions",
        );
        assert!(url.ends_with("?text=technology%20solutions"));
    }

    #[test]
    fn test_short_fragments_are_dropped() {
        let config = HandOffConfig {
            delimiter: ". ".to_owned(),
            min_fragment_chars: 4,
            ..Default::default()
        };
        let transcript = transcript(&["ok", "We sell drones", "yes", "Need a CRM"]);
        let message =
            compose_hand_off_message(&config, &transcript, "{needs}", "-");
        assert_eq!(message, "We sell drones. Need a CRM");
    }

    #[test]
    fn test_placeholders_in_values_stay_literal() {
        let transcript = transcript(&["write {summary} for me"]);
        let message = compose_hand_off_message(
            &HandOffConfig::default(),
            &transcript,
            "{needs} / {summary} / {other}",
            "-",
        );
        assert_eq!(message, "write {summary} for me / Tell me more. / {other}");
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: HandOffConfig =
            serde_json::from_str(r#"{ "min_messages": 4 }"#).unwrap();
        assert_eq!(config.min_messages, 4);
        assert_eq!(config.base_url, "https://wa.me");
    }

    #[test]
    fn test_policy_triggers() {
        let phrases = parse_trigger_phrases("WhatsApp\n  connect you \n\n");
        assert_eq!(phrases, ["whatsapp", "connect you"]);

        let mut policy = HandOffPolicy::new(8);
        assert_eq!(
            policy.observe("What do you do?", ReplySource::Model, 3, &phrases),
            None
        );
        assert_eq!(policy.state(), HandOffState::NotReady);

        let trigger = policy.observe(
            "Let me CONNECT YOU with the team.",
            ReplySource::Model,
            5,
            &phrases,
        );
        assert_eq!(trigger, Some(HandOffTrigger::Phrase("connect you".to_owned())));
        assert_eq!(policy.state(), HandOffState::Ready);

        // Ready is sticky and reported once.
        assert_eq!(policy.observe("ok", ReplySource::Fallback, 9, &phrases), None);
        assert_eq!(policy.state(), HandOffState::Ready);
    }

    #[test]
    fn test_policy_fallback_and_length() {
        let mut policy = HandOffPolicy::new(8);
        assert_eq!(
            policy.observe("Sorry.", ReplySource::Fallback, 3, &[]),
            Some(HandOffTrigger::Fallback)
        );

        let mut policy = HandOffPolicy::new(5);
        assert_eq!(policy.observe("Hm.", ReplySource::Model, 3, &[]), None);
        assert_eq!(
            policy.observe("Hm.", ReplySource::Model, 5, &[]),
            Some(HandOffTrigger::TranscriptLength(5))
        );
    }
}
