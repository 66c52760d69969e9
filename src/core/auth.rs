use crate::domain::http::Request;
use crate::domain::model::Principal;
use crate::domain::ports::Authenticator;
use crate::utils::error::{ApiError, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct AuthRegistry {
    schemes: HashMap<String, Arc<dyn Authenticator>>,
}

impl std::fmt::Debug for AuthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.schemes.keys().collect();
        names.sort();
        f.debug_struct("AuthRegistry").field("schemes", &names).finish()
    }
}

impl AuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scheme: &str, authenticator: Arc<dyn Authenticator>) {
        if self
            .schemes
            .insert(scheme.to_string(), authenticator)
            .is_some()
        {
            tracing::debug!("Replacing authenticator for scheme {}", scheme);
        }
    }

    pub fn resolve(&self, scheme: &str) -> Result<Arc<dyn Authenticator>> {
        self.schemes
            .get(scheme)
            .cloned()
            .ok_or_else(|| ApiError::SchemeNotRegistered {
                scheme: scheme.to_string(),
            })
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.schemes.contains_key(scheme)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// Tries each declared scheme and grants access on the first success.
    ///
    /// Returns `Ok(None)` when nothing is declared. When every scheme fails,
    /// an unregistered scheme is reported as `SchemeNotRegistered` ahead of
    /// plain credential failures.
    pub fn authenticate_any(
        &self,
        schemes: &[String],
        request: &Request,
    ) -> Result<Option<(String, Principal)>> {
        if schemes.is_empty() {
            return Ok(None);
        }

        let mut unregistered = None;
        for scheme in schemes {
            let authenticator = match self.resolve(scheme) {
                Ok(authenticator) => authenticator,
                Err(e) => {
                    tracing::warn!("Operation requires unregistered scheme {}", scheme);
                    unregistered.get_or_insert(e);
                    continue;
                }
            };

            match authenticator.authenticate(request) {
                Ok(principal) => {
                    tracing::debug!("Scheme {} authenticated {}", scheme, principal);
                    return Ok(Some((scheme.clone(), principal)));
                }
                Err(failure) => {
                    tracing::debug!("Scheme {} rejected request: {}", scheme, failure);
                }
            }
        }

        Err(unregistered.unwrap_or_else(|| ApiError::AuthenticationFailed {
            schemes: schemes.to_vec(),
        }))
    }
}
