use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::pin::Pin;
use std::sync::Arc;

use lead_chat_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
};
use tracing::Instrument;

use crate::transcript::{Role, Transcript};

/// Default upper bound of generated tokens per reply.
pub const MAX_TOKENS: u32 = 200;

/// Sampling temperature of every request.
pub const TEMPERATURE: f32 = 0.7;

type CompleteResult = Result<String, CompletionUnavailable>;
type BoxedCompleteFuture = Pin<Box<dyn Future<Output = CompleteResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedCompleteFuture + Send + Sync>;

/// The model could not produce a usable reply.
///
/// The kind and message are diagnostics; the widget treats every instance
/// the same way.
#[derive(Clone, Debug)]
pub struct CompletionUnavailable {
    kind: ErrorKind,
    message: String,
}

impl CompletionUnavailable {
    /// Returns the provider's classification of the failure.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the provider's description of the failure.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for CompletionUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "completion unavailable ({}): {}", self.kind, self.message)
    }
}

impl StdError for CompletionUnavailable {}

/// A type-erased wrapper around a model provider.
#[derive(Clone)]
pub struct CompletionClient {
    handler_fn: HandlerFn,
}

impl CompletionClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // Erase `P` so the widget state stays non-generic.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending {} messages", req.messages.len());
                    match fut.await {
                        Ok(resp) if !resp.content.trim().is_empty() => {
                            trace!("finish reason: {:?}", resp.finish_reason);
                            Ok(resp.content)
                        }
                        Ok(_) => Err(CompletionUnavailable {
                            kind: ErrorKind::InvalidResponse,
                            message: "the model replied with blank text"
                                .to_owned(),
                        }),
                        Err(err) => Err(CompletionUnavailable {
                            kind: err.kind(),
                            message: err.to_string(),
                        }),
                    }
                }
                .instrument(trace_span!("completion")),
            )
        });
        Self { handler_fn }
    }

    /// Sends `req` and returns the reply text.
    #[inline]
    pub async fn complete(&self, req: ModelRequest) -> CompleteResult {
        (self.handler_fn)(req).await
    }
}

impl Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient").finish_non_exhaustive()
    }
}

/// Builds the request for the next reply: the system prompt, then every
/// transcript message in order.
pub fn build_request(
    system_prompt: String,
    transcript: &Transcript,
    max_tokens: u32,
) -> ModelRequest {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(ModelMessage::System(system_prompt));
    messages.extend(transcript.all().iter().map(|msg| match msg.role() {
        Role::User => ModelMessage::User(msg.content().to_owned()),
        Role::Assistant => ModelMessage::Assistant(msg.content().to_owned()),
    }));
    ModelRequest {
        messages,
        max_tokens,
        temperature: TEMPERATURE,
    }
}
