use crate::domain::http::Request;
use crate::domain::model::{Credentials, Principal};
use crate::domain::ports::Authenticator;
use crate::utils::error::AuthFailure;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

type BasicValidator = dyn Fn(&str, &str) -> Result<Principal, AuthFailure> + Send + Sync;
type TokenValidator = dyn Fn(&str) -> Result<Principal, AuthFailure> + Send + Sync;

/// HTTP basic authentication (`Authorization: Basic base64(user:pass)`).
pub struct BasicAuth {
    validator: Box<BasicValidator>,
}

impl BasicAuth {
    pub fn new<F>(validator: F) -> Self
    where
        F: Fn(&str, &str) -> Result<Principal, AuthFailure> + Send + Sync + 'static,
    {
        Self {
            validator: Box::new(validator),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth").finish_non_exhaustive()
    }
}

impl Authenticator for BasicAuth {
    fn extract(&self, request: &Request) -> Result<Option<Credentials>, AuthFailure> {
        let Some(header) = request.header_value("authorization") else {
            return Ok(None);
        };
        let Some((scheme, encoded)) = header.trim().split_once(' ') else {
            return Ok(None);
        };
        // 其他 scheme (例如 Bearer) 不屬於 basic
        if !scheme.eq_ignore_ascii_case("basic") {
            return Ok(None);
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthFailure::Malformed(format!("invalid base64: {}", e)))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthFailure::Malformed("credentials are not UTF-8".to_string()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthFailure::Malformed("missing ':' separator".to_string()))?;

        Ok(Some(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        }))
    }

    fn validate(&self, credentials: &Credentials) -> Result<Principal, AuthFailure> {
        match credentials {
            Credentials::Basic { username, password } => (self.validator)(username, password),
            Credentials::Token(_) => Err(AuthFailure::Malformed(
                "basic auth expects a username and password".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// A named API key carried in a header or a query parameter.
pub struct ApiKeyAuth {
    name: String,
    location: ApiKeyLocation,
    validator: Box<TokenValidator>,
}

impl ApiKeyAuth {
    pub fn new<F>(name: &str, location: ApiKeyLocation, validator: F) -> Self
    where
        F: Fn(&str) -> Result<Principal, AuthFailure> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            location,
            validator: Box::new(validator),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> ApiKeyLocation {
        self.location
    }
}

impl fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("name", &self.name)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Authenticator for ApiKeyAuth {
    fn extract(&self, request: &Request) -> Result<Option<Credentials>, AuthFailure> {
        let token = match self.location {
            ApiKeyLocation::Header => request.header_value(&self.name),
            ApiKeyLocation::Query => request.query_value(&self.name),
        };
        Ok(token
            .filter(|token| !token.is_empty())
            .map(|token| Credentials::Token(token.to_string())))
    }

    fn validate(&self, credentials: &Credentials) -> Result<Principal, AuthFailure> {
        match credentials {
            Credentials::Token(token) => (self.validator)(token),
            Credentials::Basic { .. } => Err(AuthFailure::Malformed(format!(
                "api key {} expects a token",
                self.name
            ))),
        }
    }
}
