use crate::domain::model::{Model, Payload};
use crate::utils::error::{ApiError, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub type ModelFactory = Arc<dyn Fn() -> Payload + Send + Sync>;

/// Zero-value constructors keyed by model name.
#[derive(Default, Clone)]
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ModelRegistry").field("models", &names).finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_with<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Payload + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Registers `T::default()` as the zero value for `name`.
    pub fn register<T: Model + Default>(&mut self, name: &str) {
        self.register_with(name, || Box::new(T::default()) as Payload);
    }

    pub fn new_model(&self, name: &str) -> Result<Payload> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ApiError::ModelNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
