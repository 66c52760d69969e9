use crate::domain::http::{PathParams, Request};
use crate::domain::model::{Credentials, Model, Payload, Principal};
use crate::utils::error::{AuthFailure, CodecError};
use async_trait::async_trait;
use std::io::{Read, Write};

/// Everything a handler receives for one invocation. The parameter model is
/// owned by this request only.
#[derive(Debug, Default)]
pub struct OperationParams {
    pub path_params: PathParams,
    pub query: Vec<(String, String)>,
    pub body: Option<Payload>,
    pub principal: Option<Principal>,
}

impl OperationParams {
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Takes the decoded body as a concrete type.
    pub fn take_body<T: Model>(&mut self) -> Option<T> {
        self.body.take().and_then(|body| body.downcast::<T>())
    }
}

#[async_trait]
pub trait Handler: Send + Sync {
    /// Name of the registered model the request body decodes into.
    fn parameter_model(&self) -> Option<&str> {
        None
    }

    async fn handle(&self, params: OperationParams) -> anyhow::Result<Option<Payload>>;
}

pub trait Consumer: Send + Sync {
    /// 將輸入內容解碼到 `target`；失敗時 target 的狀態不保證
    fn consume(&self, reader: &mut dyn Read, target: &mut dyn Model) -> Result<(), CodecError>;
}

pub trait Producer: Send + Sync {
    fn produce(&self, writer: &mut dyn Write, source: &dyn Model) -> Result<(), CodecError>;
}

/// A named security scheme: knows where its credentials live in a request
/// and how to turn them into a principal.
pub trait Authenticator: Send + Sync {
    fn extract(&self, request: &Request) -> Result<Option<Credentials>, AuthFailure>;

    /// Must be free of side effects; called concurrently.
    fn validate(&self, credentials: &Credentials) -> Result<Principal, AuthFailure>;

    fn authenticate(&self, request: &Request) -> Result<Principal, AuthFailure> {
        match self.extract(request)? {
            Some(credentials) => self.validate(&credentials),
            None => Err(AuthFailure::MissingCredentials),
        }
    }
}
