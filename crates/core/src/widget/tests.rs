use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lead_chat_model::{ErrorKind, ModelMessage};
use lead_chat_test_model::TestModelProvider;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use crate::hand_off::{HandOffConfig, HandOffState, HandOffTrigger};
use crate::i18n::Dictionary;
use crate::locale::{Locale, LocaleSwitch};
use crate::transcript::Role;
use crate::{HandOffErrorKind, SendErrorKind, Widget, WidgetBuilder};

const DICTIONARY: &str = r#"{
    "en": {
        "chatbot.greeting": "Hi! I'm Karu. What are you working on?",
        "chatbot.systemPrompt": "You qualify leads.",
        "chatbot.fallback": "Reach out directly via WhatsApp.",
        "chatbot.handoff.triggers": "whatsapp\nconnect you\nour team",
        "chatbot.handoff.template": "Needs: {needs}\nSummary: {summary}",
        "chatbot.handoff.defaultNeeds": "technology solutions"
    },
    "es": {
        "chatbot.greeting": "Hola! Soy Karu.",
        "chatbot.systemPrompt": "Calificas prospectos.",
        "chatbot.fallback": "Contactanos directamente por WhatsApp.",
        "chatbot.handoff.triggers": "whatsapp\nnuestro equipo",
        "chatbot.handoff.template": "Necesito: {needs}",
        "chatbot.handoff.defaultNeeds": "soluciones tecnologicas"
    }
}"#;

struct Harness {
    widget: Widget,
    locale: LocaleSwitch,
    idle_rx: watch::Receiver<usize>,
    ready_rx: watch::Receiver<Vec<HandOffTrigger>>,
    appended: Arc<Mutex<usize>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn new(provider: TestModelProvider, min_messages: usize) -> Self {
        let locale = LocaleSwitch::new(Locale::En);
        let (idle_tx, idle_rx) = watch::channel(0usize);
        let (ready_tx, ready_rx) = watch::channel(Vec::new());
        let appended = Arc::new(Mutex::new(0));
        let opened = Arc::new(Mutex::new(Vec::new()));

        let widget = WidgetBuilder::with_model_provider(provider)
            .with_translator(Dictionary::from_json_str(DICTIONARY).unwrap())
            .with_locale(locale.context())
            .with_hand_off_config(HandOffConfig {
                min_messages,
                ..Default::default()
            })
            .with_link_opener({
                let opened = Arc::clone(&opened);
                move |url: &str| -> io::Result<()> {
                    opened.lock().unwrap().push(url.to_owned());
                    Ok(())
                }
            })
            .on_message({
                let appended = Arc::clone(&appended);
                move |_| *appended.lock().unwrap() += 1
            })
            .on_idle(move || {
                idle_tx.send_modify(|turns| *turns += 1);
            })
            .on_hand_off_ready(move |trigger| {
                ready_tx.send_modify(|triggers| triggers.push(trigger.clone()));
            })
            .build();

        Self {
            widget,
            locale,
            idle_rx,
            ready_rx,
            appended,
            opened,
        }
    }

    async fn wait_turns(&mut self, turns: usize) {
        timeout(
            Duration::from_millis(500),
            self.idle_rx.wait_for(|finished| *finished >= turns),
        )
        .await
        .unwrap()
        .unwrap();
    }

    async fn send_and_wait(&mut self, input: &str) {
        let turns = *self.idle_rx.borrow();
        self.widget.send(input).await.unwrap();
        self.wait_turns(turns + 1).await;
    }
}

fn provider(replies: &[&str]) -> TestModelProvider {
    let mut provider = TestModelProvider::default();
    for reply in replies {
        provider.add_reply(*reply);
    }
    provider
}

#[tokio::test]
async fn test_transcript_alternates() {
    let mut harness =
        Harness::new(provider(&["What industry?", "How big?", "Got it."]), 100);
    harness.send_and_wait("Hello").await;
    harness.send_and_wait("Retail").await;
    harness.send_and_wait("Forty people").await;

    let transcript = harness.widget.transcript().await.unwrap();
    assert_eq!(transcript.len(), 7);
    assert_eq!(transcript[0].content(), "Hi! I'm Karu. What are you working on?");
    for (idx, msg) in transcript.iter().enumerate().skip(1) {
        let expected = if idx % 2 == 1 { Role::User } else { Role::Assistant };
        assert_eq!(msg.role(), expected);
    }
    assert_eq!(transcript[6].content(), "Got it.");
    assert_eq!(*harness.appended.lock().unwrap(), 7);
    assert_eq!(
        harness.widget.hand_off_state().await.unwrap(),
        HandOffState::NotReady
    );
}

#[tokio::test]
async fn test_send_while_pending_is_rejected() {
    let mut provider = provider(&["First reply", "Second reply"]);
    provider.set_delay(Duration::from_millis(50));
    let mut harness = Harness::new(provider, 100);

    harness.widget.send("a").await.unwrap();
    assert!(harness.widget.is_busy().await.unwrap());

    let err = harness.widget.send("b").await.unwrap_err();
    assert_eq!(err.kind(), SendErrorKind::Busy);
    assert_eq!(err.input(), "b");
    assert_eq!(harness.widget.transcript().await.unwrap().len(), 2);

    harness.wait_turns(1).await;
    assert!(!harness.widget.is_busy().await.unwrap());
    harness.send_and_wait("b").await;

    let transcript = harness.widget.transcript().await.unwrap();
    let contents: Vec<_> = transcript.iter().map(|msg| msg.content()).collect();
    assert_eq!(
        contents,
        [
            "Hi! I'm Karu. What are you working on?",
            "a",
            "First reply",
            "b",
            "Second reply"
        ]
    );
}

#[tokio::test]
async fn test_blank_input_is_rejected() {
    let harness = Harness::new(provider(&[]), 100);
    let err = harness.widget.send("  \n").await.unwrap_err();
    assert_eq!(err.kind(), SendErrorKind::EmptyInput);
    assert_eq!(err.into_input(), "  \n");
    assert!(harness.widget.transcript().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_input_is_trimmed_and_greeting_seeded() {
    let mut harness = Harness::new(provider(&["Hello!"]), 100);
    harness.send_and_wait("  hi there \n").await;

    let transcript = harness.widget.transcript().await.unwrap();
    assert_eq!(transcript[0].role(), Role::Assistant);
    assert_eq!(transcript[1].content(), "hi there");
}

#[tokio::test]
async fn test_fallback_on_failure() {
    let mut provider = TestModelProvider::default();
    provider.add_failure(ErrorKind::Network);
    let mut harness = Harness::new(provider, 100);

    harness.send_and_wait("Hello").await;

    let transcript = harness.widget.transcript().await.unwrap();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2].content(), "Reach out directly via WhatsApp.");
    assert_eq!(
        harness.widget.hand_off_state().await.unwrap(),
        HandOffState::Ready
    );
    assert_eq!(*harness.ready_rx.borrow(), [HandOffTrigger::Fallback]);
}

#[tokio::test]
async fn test_ready_is_monotonic() {
    let mut harness = Harness::new(
        provider(&[
            "Our team can help with that.",
            "What else?",
            "Anything more?",
        ]),
        100,
    );

    harness.send_and_wait("Hello").await;
    assert_eq!(
        harness.widget.hand_off_state().await.unwrap(),
        HandOffState::Ready
    );

    harness.send_and_wait("Also billing").await;
    harness.send_and_wait("That's all").await;
    assert_eq!(
        harness.widget.hand_off_state().await.unwrap(),
        HandOffState::Ready
    );
    assert_eq!(
        *harness.ready_rx.borrow(),
        [HandOffTrigger::Phrase("our team".to_owned())]
    );
}

#[tokio::test]
async fn test_trigger_phrase_in_any_case() {
    let mut harness = Harness::new(
        provider(&["Tell me more.", "Happy to CONNECT YOU with a human."]),
        100,
    );

    harness.send_and_wait("Hello").await;
    assert_eq!(
        harness.widget.hand_off_state().await.unwrap(),
        HandOffState::NotReady
    );

    harness.send_and_wait("We need a CRM").await;
    assert_eq!(
        harness.widget.hand_off_state().await.unwrap(),
        HandOffState::Ready
    );
}

#[tokio::test]
async fn test_length_threshold() {
    let mut harness = Harness::new(provider(&["Okay.", "Sure."]), 5);

    harness.send_and_wait("one").await;
    assert_eq!(
        harness.widget.hand_off_state().await.unwrap(),
        HandOffState::NotReady
    );

    harness.send_and_wait("two").await;
    assert_eq!(
        *harness.ready_rx.borrow(),
        [HandOffTrigger::TranscriptLength(5)]
    );
}

#[tokio::test]
async fn test_hand_off() {
    let mut harness = Harness::new(
        provider(&["What's your budget?", "Let's talk on WhatsApp."]),
        100,
    );

    let err = harness.widget.hand_off().await.unwrap_err();
    assert_eq!(err.kind(), HandOffErrorKind::NotReady);
    assert!(harness.opened.lock().unwrap().is_empty());

    harness.send_and_wait("I need automation").await;
    harness.send_and_wait("budget is 5k").await;

    let url = harness.widget.hand_off().await.unwrap();
    assert_eq!(
        url,
        "https://wa.me/527202533388?text=Needs%3A%20I%20need%20automation%20%7C%20budget%20is%205k%0ASummary%3A%20Let%27s%20talk%20on%20WhatsApp."
    );

    let again = harness.widget.hand_off().await.unwrap();
    assert_eq!(again, url);
    assert_eq!(*harness.opened.lock().unwrap(), [url.clone(), url]);
}

#[tokio::test]
async fn test_launch_failure_keeps_url() {
    let mut provider = TestModelProvider::default();
    provider.add_failure(ErrorKind::Unauthorized);
    let widget = WidgetBuilder::with_model_provider(provider)
        .with_link_opener(|_: &str| -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no browser"))
        })
        .build();

    widget.send("Hi").await.unwrap();
    timeout(Duration::from_millis(500), async {
        while widget.hand_off_state().await.unwrap() != HandOffState::Ready {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let err = widget.hand_off().await.unwrap_err();
    assert_eq!(err.kind(), HandOffErrorKind::Launch);
    // No translator: every key resolves to itself.
    assert_eq!(
        err.url(),
        Some("https://wa.me/527202533388?text=chatbot.handoff.template")
    );
}

#[tokio::test]
async fn test_locale_switch_between_sends() {
    let mut provider = TestModelProvider::default();
    provider.add_reply("Which tools do you use?");
    provider.add_failure(ErrorKind::Network);
    let observer = provider.clone();
    let mut harness = Harness::new(provider, 100);

    harness.send_and_wait("Hello").await;
    harness.locale.set(Locale::Es);
    harness.send_and_wait("Excel").await;

    let requests = observer.requests();
    assert_eq!(
        requests[0].messages[0],
        ModelMessage::System("You qualify leads.".to_owned())
    );
    assert_eq!(
        requests[1].messages[0],
        ModelMessage::System("Calificas prospectos.".to_owned())
    );
    // The greeting was seeded in English and stays as it was.
    assert_eq!(
        requests[1].messages[1],
        ModelMessage::Assistant("Hi! I'm Karu. What are you working on?".to_owned())
    );

    let transcript = harness.widget.transcript().await.unwrap();
    assert_eq!(
        transcript.last().unwrap().content(),
        "Contactanos directamente por WhatsApp."
    );

    let url = harness.widget.hand_off().await.unwrap();
    assert!(url.ends_with("?text=Necesito%3A%20Hello%20%7C%20Excel"));
}

#[tokio::test]
async fn test_open_and_close() {
    let harness = Harness::new(provider(&[]), 100);
    assert!(!harness.widget.is_open().await.unwrap());

    harness.widget.open().await.unwrap();
    harness.widget.open().await.unwrap();
    assert!(harness.widget.is_open().await.unwrap());
    assert_eq!(harness.widget.transcript().await.unwrap().len(), 1);

    harness.widget.close().await.unwrap();
    assert!(!harness.widget.is_open().await.unwrap());
    assert_eq!(harness.widget.transcript().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reply_after_shutdown_is_dropped() {
    let mut provider = provider(&["Too late"]);
    provider.set_delay(Duration::from_millis(30));
    let harness = Harness::new(provider, 100);

    harness.widget.send("Hello").await.unwrap();
    harness.widget.shutdown();
    assert!(harness.widget.is_shut_down());

    sleep(Duration::from_millis(100)).await;
    assert_eq!(*harness.idle_rx.borrow(), 0);
    assert_eq!(*harness.appended.lock().unwrap(), 2);
    assert!(harness.widget.transcript().await.is_err());

    let err = harness.widget.send("Still there?").await.unwrap_err();
    assert_eq!(err.kind(), SendErrorKind::ShutDown);
    let err = harness.widget.hand_off().await.unwrap_err();
    assert_eq!(err.kind(), HandOffErrorKind::ShutDown);
}
