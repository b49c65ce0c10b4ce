//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lead_chat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond. The n-th response answers the request carrying n
/// user messages, so the provider itself stays stateless. If there are no
/// enough responses in the script, an error will be returned.
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::requests`], also from clones of the provider.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    /// Appends a response for the next user turn.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Appends a successful reply for the next user turn.
    #[inline]
    pub fn add_reply<S: Into<String>>(&mut self, text: S) {
        self.add_response(PresetResponse::reply(text));
    }

    /// Appends a failure for the next user turn.
    #[inline]
    pub fn add_failure(&mut self, kind: ErrorKind) {
        self.add_response(PresetResponse::failure(kind));
    }

    /// Delays every response by `duration`.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns a copy of every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("script", &self.script)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }

        let step = req
            .user_turns()
            .checked_sub(1)
            .and_then(|idx| self.script.get(idx))
            .cloned();
        let delay = self.delay.unwrap_or(Duration::from_millis(1));

        async move {
            sleep(delay).await;
            match step {
                Some(PresetResponse::Reply(text)) => {
                    Ok(ModelResponse::with_content(text))
                }
                Some(PresetResponse::Failure(kind)) => Err(Error {
                    message: "scripted failure",
                    kind,
                }),
                None => Err(Error {
                    message: "no enough steps",
                    kind: ErrorKind::Other,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lead_chat_model::ModelMessage;

    use super::*;

    fn request(user_inputs: &[&str]) -> ModelRequest {
        let mut messages = vec![ModelMessage::System("Be kind.".to_owned())];
        for input in user_inputs {
            messages.push(ModelMessage::User((*input).to_owned()));
            messages.push(ModelMessage::Assistant("...".to_owned()));
        }
        messages.pop();
        ModelRequest {
            messages,
            max_tokens: 64,
            temperature: 0.5,
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_reply("Hello, world!");
        provider.add_failure(ErrorKind::Network);

        let resp = provider.send_request(&request(&["Hi"])).await.unwrap();
        assert_eq!(resp.content, "Hello, world!");

        let err = provider
            .send_request(&request(&["Hi", "Anyone?"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);

        let err = provider
            .send_request(&request(&["Hi", "Anyone?", "Hello?"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_requests_are_recorded_across_clones() {
        let mut provider = TestModelProvider::default();
        provider.add_reply("Sure.");
        let observer = provider.clone();

        provider.send_request(&request(&["Hi"])).await.unwrap();

        let requests = observer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_turns(), 1);
    }
}
