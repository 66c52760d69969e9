use crate::core::api::Api;
use crate::core::codecs::base_type;
use crate::core::routes::Operation;
use crate::domain::http::{Request, Response};
use crate::domain::model::Payload;
use crate::domain::ports::{OperationParams, Producer};
use crate::utils::error::ApiError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// 無 Content-Type 但有 body 時採用的類型
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Routing,
    Authenticating,
    Consuming,
    Handling,
    Producing,
    Done,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Routing => "routing",
            DispatchState::Authenticating => "authenticating",
            DispatchState::Consuming => "consuming",
            DispatchState::Handling => "handling",
            DispatchState::Producing => "producing",
            DispatchState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal error of a dispatch: where it stopped and why.
#[derive(Debug, Error)]
#[error("dispatch failed while {state}: {error}")]
pub struct DispatchFailure {
    pub state: DispatchState,
    #[source]
    pub error: ApiError,
}

impl DispatchFailure {
    fn at(state: DispatchState) -> impl FnOnce(ApiError) -> Self {
        move |error| Self { state, error }
    }

    pub fn status_code(&self) -> u16 {
        self.error.status_code()
    }
}

/// Runs requests through an assembled [`Api`]. Cloning is cheap; each clone
/// shares the same read-only registries.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    api: Arc<Api>,
}

impl Dispatcher {
    pub fn new(api: Arc<Api>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(method = %request.method(), path = %request.path())
    )]
    pub async fn dispatch(&self, request: Request) -> Result<Response, DispatchFailure> {
        let result = self.run(&request).await;
        match &result {
            Ok(response) => tracing::debug!(
                "State: {} (status {})",
                DispatchState::Done,
                response.status
            ),
            Err(failure) => tracing::warn!(
                "Dispatch stopped while {}: {} (status {})",
                failure.state,
                failure.error,
                failure.status_code()
            ),
        }
        result
    }

    async fn run(&self, request: &Request) -> Result<Response, DispatchFailure> {
        tracing::debug!("State: {}", DispatchState::Routing);
        let (operation, path_params) = self
            .api
            .operations()
            .resolve(request.method(), request.path())
            .map_err(DispatchFailure::at(DispatchState::Routing))?;

        tracing::debug!("State: {} ({})", DispatchState::Authenticating, operation.id());
        let authenticated = self
            .api
            .auth()
            .authenticate_any(operation.schemes(), request)
            .map_err(DispatchFailure::at(DispatchState::Authenticating))?;

        tracing::debug!("State: {}", DispatchState::Consuming);
        let body = self
            .consume(operation, request)
            .map_err(DispatchFailure::at(DispatchState::Consuming))?;

        // 在呼叫 handler 之前先協商，NotAcceptable 時 handler 不會被執行
        let (mime, producer) = self
            .api
            .codecs()
            .negotiate(request.accept_header(), self.api.default_producer())
            .map_err(DispatchFailure::at(DispatchState::Producing))?;

        tracing::debug!("State: {}", DispatchState::Handling);
        let (granted_by, principal) = authenticated.unzip();
        let params = OperationParams {
            path_params: path_params.clone(),
            query: request.query().to_vec(),
            body,
            principal: principal.clone(),
        };
        let result = operation.handler().handle(params).await.map_err(|e| {
            DispatchFailure::at(DispatchState::Handling)(ApiError::handler_failed(
                operation.id(),
                format!("{:#}", e),
            ))
        })?;

        tracing::debug!("State: {} ({})", DispatchState::Producing, mime);
        let (status, content_type, body) = match result {
            Some(model) => {
                let body = encode(producer.as_ref(), &mime, &model)
                    .map_err(DispatchFailure::at(DispatchState::Producing))?;
                (200, Some(mime), body)
            }
            None => (204, None, Vec::new()),
        };

        Ok(Response {
            status,
            content_type,
            body,
            principal,
            granted_by,
            path_params,
        })
    }

    fn consume(&self, operation: &Operation, request: &Request) -> Result<Option<Payload>, ApiError> {
        let raw = request.body_bytes();
        let declared = request
            .content_type_header()
            .or((!raw.is_empty()).then_some(FALLBACK_CONTENT_TYPE));

        let consumer = match declared {
            Some(mime) => Some((base_type(mime), self.api.codecs().consumer_for(mime)?)),
            None => None,
        };

        let Some(model_name) = operation.handler().parameter_model() else {
            return Ok(None);
        };
        let mut model = self.api.models().new_model(model_name)?;

        if let Some((mime, consumer)) = consumer {
            if !raw.is_empty() {
                let mut reader = raw;
                consumer
                    .consume(&mut reader, &mut *model)
                    .map_err(|e| ApiError::DecodeFailed {
                        mime: mime.to_string(),
                        message: e.to_string(),
                    })?;
            }
        }

        Ok(Some(model))
    }
}

fn encode(producer: &dyn Producer, mime: &str, model: &Payload) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    producer
        .produce(&mut body, &**model)
        .map_err(|e| ApiError::EncodeFailed {
            mime: mime.to_string(),
            message: e.to_string(),
        })?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::codecs::JsonCodec;
    use crate::adapters::handlers::StubHandler;
    use crate::domain::http::Method;
    use serde_json::json;

    fn dispatcher(handler: StubHandler) -> Dispatcher {
        let mut builder = Api::builder("unit");
        builder.register_codec("application/json", JsonCodec);
        builder.register_model::<serde_json::Value>("any");
        builder
            .register_operation(Method::Post, "/echo/{id}", handler)
            .unwrap();
        Dispatcher::new(Arc::new(builder.build().unwrap()))
    }

    #[tokio::test]
    async fn test_route_not_found_stops_in_routing() {
        let failure = dispatcher(StubHandler::new())
            .dispatch(Request::new(Method::Get, "/echo/1"))
            .await
            .unwrap_err();
        assert_eq!(failure.state, DispatchState::Routing);
        assert_eq!(failure.status_code(), 404);
    }

    #[tokio::test]
    async fn test_empty_result_is_no_content() {
        let response = dispatcher(StubHandler::new())
            .dispatch(Request::new(Method::Post, "/echo/1"))
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert!(response.content_type.is_none());
        assert!(response.body.is_empty());
        assert_eq!(response.path_params.get("id"), Some("1"));
    }

    #[tokio::test]
    async fn test_body_without_content_type_is_octet_stream() {
        let handler = StubHandler::new().expecting("any");
        let calls = handler.calls();
        let failure = dispatcher(handler)
            .dispatch(Request::new(Method::Post, "/echo/1").body("{}"))
            .await
            .unwrap_err();
        assert_eq!(failure.state, DispatchState::Consuming);
        assert!(matches!(
            failure.error,
            ApiError::UnsupportedMediaType { ref mime } if mime == "application/octet-stream"
        ));
        assert_eq!(calls.count(), 0);
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let handler = StubHandler::new().expecting("any");
        let calls = handler.calls();
        let failure = dispatcher(handler)
            .dispatch(
                Request::new(Method::Post, "/echo/1")
                    .content_type("application/json")
                    .body("{not json"),
            )
            .await
            .unwrap_err();
        assert!(matches!(failure.error, ApiError::DecodeFailed { .. }));
        assert_eq!(failure.status_code(), 400);
        assert_eq!(calls.count(), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_carries_detail() {
        let failure = dispatcher(StubHandler::failing("store unavailable"))
            .dispatch(Request::new(Method::Post, "/echo/1"))
            .await
            .unwrap_err();
        assert_eq!(failure.state, DispatchState::Handling);
        assert!(matches!(
            failure.error,
            ApiError::HandlerFailed { ref operation, ref message }
                if operation == "POST /echo/{id}" && message.contains("store unavailable")
        ));
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let response = dispatcher(StubHandler::echo().expecting("any"))
            .dispatch(
                Request::new(Method::Post, "/echo/1")
                    .content_type("application/json; charset=utf-8")
                    .accept("application/json")
                    .body(r#"{"name":"rex"}"#),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(response.json().unwrap(), json!({"name": "rex"}));
    }
}
