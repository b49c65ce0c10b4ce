//! A single-mailbox actor runtime on top of tokio.
//!
//! An actor owns its state exclusively and handles one message at a time,
//! which gives the lead widget a cooperative, event-driven core without any
//! locking around the transcript.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod scheduler;

pub use error::ActorDeadError;
pub use handle::Actor;
pub use mailbox::Message;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    #[derive(Debug)]
    struct AddMessage(u32);

    impl Message<Counter> for AddMessage {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            state.value += self.0;
        }
    }

    #[tokio::test]
    async fn test_send_then_ask() {
        let actor = Actor::spawn(Counter::default(), Some("counter"));
        actor.send(AddMessage(40)).unwrap();
        actor.send(AddMessage(2)).unwrap();

        let value = actor.ask(|state, _| state.value).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_self_send_from_handler() {
        let actor = Actor::spawn(Counter::default(), None);
        actor
            .ask(|_, handle| handle.send(AddMessage(7)).unwrap())
            .await
            .unwrap();

        let value = actor.ask(|state, _| state.value).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_killed_actor() {
        let actor = Actor::spawn(Counter::default(), None);
        actor.try_kill();
        assert!(actor.is_dead());
        assert_eq!(actor.send(AddMessage(1)), Err(ActorDeadError));

        let result = timeout(
            Duration::from_millis(500),
            actor.ask(|state, _| state.value),
        )
        .await
        .unwrap();
        assert_eq!(result, Err(ActorDeadError));
    }
}
