use crate::config::toml_config::{ApiConfig, DEFAULT_PRODUCER};
use crate::core::auth::AuthRegistry;
use crate::core::codecs::{base_type, CodecRegistry};
use crate::core::models::ModelRegistry;
use crate::core::routes::{Operation, OperationRegistry, SecurityRequirement};
use crate::domain::http::Method;
use crate::domain::model::{Model, Payload};
use crate::domain::ports::{Authenticator, Consumer, Handler, Producer};
use crate::utils::error::{ApiError, Result};
use std::sync::Arc;

/// Mutable assembly stage. Everything is registered here, then
/// [`ApiBuilder::build`] freezes it into an [`Api`].
#[derive(Debug)]
pub struct ApiBuilder {
    name: String,
    operations: OperationRegistry,
    codecs: CodecRegistry,
    auth: AuthRegistry,
    models: ModelRegistry,
    default_producer: String,
    default_security: Vec<String>,
    strict_routes: bool,
}

impl ApiBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: OperationRegistry::new(),
            codecs: CodecRegistry::new(),
            auth: AuthRegistry::new(),
            models: ModelRegistry::new(),
            default_producer: DEFAULT_PRODUCER.to_string(),
            default_security: Vec::new(),
            strict_routes: false,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let mut builder = Self::new(config.api.name.clone())
            .default_producer(&config.api.default_producer)
            .strict_routes(config.api.strict_routes);
        builder.default_security = config.security.default_schemes.clone();
        builder
    }

    pub fn default_producer(mut self, mime: &str) -> Self {
        self.default_producer = base_type(mime).to_string();
        self
    }

    pub fn strict_routes(mut self, strict: bool) -> Self {
        self.strict_routes = strict;
        self
    }

    pub fn default_security<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_security = schemes.into_iter().map(Into::into).collect();
        self
    }

    pub fn register_consumer<C: Consumer + 'static>(&mut self, mime: &str, consumer: C) -> &mut Self {
        self.codecs.register_consumer(mime, Arc::new(consumer));
        self
    }

    pub fn register_producer<P: Producer + 'static>(&mut self, mime: &str, producer: P) -> &mut Self {
        self.codecs.register_producer(mime, Arc::new(producer));
        self
    }

    /// Registers one value as both consumer and producer for `mime`.
    pub fn register_codec<C>(&mut self, mime: &str, codec: C) -> &mut Self
    where
        C: Consumer + Producer + 'static,
    {
        let codec = Arc::new(codec);
        self.codecs.register_consumer(mime, codec.clone());
        self.codecs.register_producer(mime, codec);
        self
    }

    pub fn register_auth<A: Authenticator + 'static>(&mut self, scheme: &str, authenticator: A) -> &mut Self {
        self.auth.register(scheme, Arc::new(authenticator));
        self
    }

    /// Returns the stored operation so security can be declared on it.
    pub fn register_operation<H: Handler + 'static>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
    ) -> Result<&mut Operation> {
        self.register_shared_operation(method, template, Arc::new(handler))
    }

    pub fn register_shared_operation(
        &mut self,
        method: Method,
        template: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<&mut Operation> {
        self.operations.register(method, template, handler)
    }

    pub fn register_model<T: Model + Default>(&mut self, name: &str) -> &mut Self {
        self.models.register::<T>(name);
        self
    }

    pub fn register_model_with<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Payload + Send + Sync + 'static,
    {
        self.models.register_with(name, factory);
        self
    }

    /// 檢查組裝結果是否一致
    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !self.codecs.has_producer(&self.default_producer) {
            problems.push(format!(
                "default producer {} is not registered",
                self.default_producer
            ));
        }

        for scheme in &self.default_security {
            if !self.auth.contains(scheme) {
                problems.push(format!("default security scheme {} is not registered", scheme));
            }
        }

        let mut operations: Vec<&Operation> = self.operations.iter().collect();
        operations.sort_by_key(|operation| operation.id());
        for operation in operations {
            if let SecurityRequirement::AnyOf(schemes) = operation.security() {
                for scheme in schemes {
                    if !self.auth.contains(scheme) {
                        problems.push(format!(
                            "{} requires unregistered scheme {}",
                            operation.id(),
                            scheme
                        ));
                    }
                }
            }
            if let Some(model) = operation.handler().parameter_model() {
                if !self.models.contains(model) {
                    problems.push(format!(
                        "{} expects unregistered model {}",
                        operation.id(),
                        model
                    ));
                }
            }
        }

        for (first, second) in self.operations.overlapping() {
            if self.strict_routes {
                problems.push(format!("{} overlaps {}", first, second));
            } else {
                tracing::warn!(
                    "Path templates overlap: {} and {}; {} wins because it was registered first",
                    first,
                    second,
                    first
                );
            }
        }

        problems
    }

    pub fn build(mut self) -> Result<Api> {
        let problems = self.problems();
        if !problems.is_empty() {
            for problem in &problems {
                tracing::error!("API assembly problem: {}", problem);
            }
            return Err(ApiError::Assembly { problems });
        }

        let defaults = self.default_security.clone();
        for operation in self.operations.iter_mut() {
            operation.resolve_default_security(&defaults);
        }

        tracing::info!(
            "Assembled API {}: {} operations, {} consumers, {} producers, {} schemes, {} models",
            self.name,
            self.operations.len(),
            self.codecs.consumer_types().len(),
            self.codecs.producer_types().len(),
            self.auth.len(),
            self.models.len()
        );

        Ok(Api {
            name: self.name,
            operations: self.operations,
            codecs: self.codecs,
            auth: self.auth,
            models: self.models,
            default_producer: self.default_producer,
        })
    }
}

/// The assembled, read-only API. Share it behind an `Arc`; nothing in it
/// changes after `build`.
#[derive(Debug)]
pub struct Api {
    name: String,
    operations: OperationRegistry,
    codecs: CodecRegistry,
    auth: AuthRegistry,
    models: ModelRegistry,
    default_producer: String,
}

impl Api {
    pub fn builder(name: impl Into<String>) -> ApiBuilder {
        ApiBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> &OperationRegistry {
        &self.operations
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn auth(&self) -> &AuthRegistry {
        &self.auth
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn default_producer(&self) -> &str {
        &self.default_producer
    }
}
