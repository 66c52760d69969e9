pub mod api;
pub mod auth;
pub mod codecs;
pub mod dispatcher;
pub mod models;
pub mod routes;

pub use crate::domain::http::{Method, PathParams, Request, Response};
pub use crate::domain::model::{Credentials, Model, Payload, Principal};
pub use crate::domain::ports::{Authenticator, Consumer, Handler, OperationParams, Producer};
pub use crate::utils::error::Result;
