use crate::domain::model::Payload;
use crate::domain::ports::{Handler, OperationParams};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared invocation counter; clones observe the same count.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Nothing,
    Canned(Value),
    Echo,
    Fail(String),
}

/// Test double for the handler contract: returns a fixed reply and counts
/// how often it ran.
#[derive(Debug, Clone)]
pub struct StubHandler {
    reply: Reply,
    parameter_model: Option<String>,
    calls: CallCounter,
}

impl Default for StubHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl StubHandler {
    /// Replies with no result.
    pub fn new() -> Self {
        Self {
            reply: Reply::Nothing,
            parameter_model: None,
            calls: CallCounter::default(),
        }
    }

    pub fn with_response(response: Value) -> Self {
        Self {
            reply: Reply::Canned(response),
            ..Self::new()
        }
    }

    /// Replies with the decoded request body.
    pub fn echo() -> Self {
        Self {
            reply: Reply::Echo,
            ..Self::new()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Reply::Fail(message.to_string()),
            ..Self::new()
        }
    }

    /// Declares the model the request body decodes into.
    pub fn expecting(mut self, model: &str) -> Self {
        self.parameter_model = Some(model.to_string());
        self
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl Handler for StubHandler {
    fn parameter_model(&self) -> Option<&str> {
        self.parameter_model.as_deref()
    }

    async fn handle(&self, params: OperationParams) -> anyhow::Result<Option<Payload>> {
        self.calls.hit();
        match &self.reply {
            Reply::Nothing => Ok(None),
            Reply::Canned(value) => Ok(Some(Box::new(value.clone()))),
            Reply::Echo => Ok(params.body),
            Reply::Fail(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

type BoxedHandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<Option<Payload>>> + Send>>;

/// Wraps an async closure as a handler.
pub struct FnHandler {
    parameter_model: Option<String>,
    func: Box<dyn Fn(OperationParams) -> BoxedHandlerFuture + Send + Sync>,
}

impl FnHandler {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(OperationParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Payload>>> + Send + 'static,
    {
        Self {
            parameter_model: None,
            func: Box::new(move |params| -> BoxedHandlerFuture { Box::pin(func(params)) }),
        }
    }

    pub fn expecting(mut self, model: &str) -> Self {
        self.parameter_model = Some(model.to_string());
        self
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("parameter_model", &self.parameter_model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for FnHandler {
    fn parameter_model(&self) -> Option<&str> {
        self.parameter_model.as_deref()
    }

    async fn handle(&self, params: OperationParams) -> anyhow::Result<Option<Payload>> {
        (self.func)(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stub_handler_counts_calls() {
        let handler = StubHandler::with_response(json!({"ok": true}));
        let calls = handler.calls();
        assert_eq!(calls.count(), 0);

        let result = tokio_test::block_on(handler.handle(OperationParams::default())).unwrap();
        let value = result.unwrap().to_value().unwrap();
        assert_eq!(value, json!({"ok": true}));

        tokio_test::block_on(handler.handle(OperationParams::default())).unwrap();
        assert_eq!(calls.count(), 2);
    }

    #[test]
    fn test_stub_handler_failure() {
        let handler = StubHandler::failing("boom");
        let err = tokio_test::block_on(handler.handle(OperationParams::default())).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_fn_handler_sees_path_params() {
        let handler = FnHandler::new(|params: OperationParams| async move {
            let id = params.path_param("id").unwrap_or_default().to_string();
            Ok::<_, anyhow::Error>(Some(Box::new(id) as Payload))
        })
        .expecting("pet");

        assert_eq!(handler.parameter_model(), Some("pet"));

        let mut params = OperationParams::default();
        params.path_params.push("id", "7");
        let result = handler.handle(params).await.unwrap().unwrap();
        assert_eq!(result.downcast::<String>().as_deref(), Some("7"));
    }
}
