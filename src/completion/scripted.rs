//! In-memory completion service.
//!
//! Useful for testing and offline runs: replies come from a queue or a
//! responder function, and every call is recorded.

use super::CompletionService;
use crate::conversation::ChatMessage;
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&[ChatMessage]) -> Result<String> + Send + Sync>;

/// A recorded completion call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

impl RecordedCall {
    /// Content of the final (prompt) message.
    pub fn prompt(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or_default()
    }
}

/// Scripted completion service.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    /// Create a service that answers from a reply queue.
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a service that computes each reply from the request messages.
    ///
    /// Queued replies still take precedence over the responder.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: VidaskError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for ScriptedCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            model: model.to_string(),
        });

        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }

        match &self.responder {
            Some(responder) => responder(messages),
            None => Err(VidaskError::completion("No scripted reply left")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_responder() {
        let scripted = ScriptedCompletion::with_responder(|messages| {
            Ok(format!("echo: {}", messages.last().unwrap().content))
        });
        scripted.push_reply("first");

        let first = scripted.complete(&[ChatMessage::user("a")], "m1").await.unwrap();
        let second = scripted.complete(&[ChatMessage::user("b")], "m2").await.unwrap();

        assert_eq!(first, "first");
        assert_eq!(second, "echo: b");

        let calls = scripted.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].model, "m2");
        assert_eq!(calls[1].prompt(), "b");
    }

    #[test]
    fn test_exhausted_queue_errors() {
        let scripted = ScriptedCompletion::new();
        let result = tokio_test::block_on(scripted.complete(&[], "m"));
        assert!(result.is_err());
    }
}
