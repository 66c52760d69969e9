//! The pet store sample API: the codecs, security schemes, operations and
//! models a pet store document would describe, wired onto an in-memory store.

use crate::adapters::codecs::{
    JsonCodec, StubConsumer, StubProducer, TextProducer, TomlCodec, YamlCodec,
};
use crate::adapters::security::{ApiKeyAuth, ApiKeyLocation, BasicAuth};
use crate::config::ApiConfig;
use crate::core::api::{Api, ApiBuilder};
use crate::domain::http::Method;
use crate::domain::model::{Payload, Principal};
use crate::domain::ports::{Handler, OperationParams};
use crate::utils::error::{AuthFailure, Result};
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub photo_urls: Vec<String>,
    pub status: String,
    pub tags: Vec<Tag>,
}

/// In-memory backing store for the sample handlers.
#[derive(Debug, Clone)]
pub struct PetStore {
    pets: Arc<RwLock<BTreeMap<i64, Pet>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for PetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PetStore {
    pub fn new() -> Self {
        Self {
            pets: Arc::default(),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn with_sample_data() -> Self {
        let pets = [
            ("Rex", "available", "dog"),
            ("Tom", "pending", "cat"),
            ("Nemo", "sold", "fish"),
        ];

        let mut map = BTreeMap::new();
        for (index, (name, status, kind)) in pets.iter().enumerate() {
            let id = index as i64 + 1;
            map.insert(
                id,
                Pet {
                    id,
                    name: name.to_string(),
                    photo_urls: vec![format!("https://example.com/{}.png", name.to_lowercase())],
                    status: status.to_string(),
                    tags: vec![Tag {
                        id,
                        name: kind.to_string(),
                    }],
                },
            );
        }

        Self {
            next_id: Arc::new(AtomicI64::new(map.len() as i64 + 1)),
            pets: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn list(&self) -> Vec<Pet> {
        self.pets.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: i64) -> Option<Pet> {
        self.pets.read().await.get(&id).cloned()
    }

    /// 新增寵物；id 為 0 時自動配號
    pub async fn insert(&self, mut pet: Pet) -> anyhow::Result<Pet> {
        if pet.id < 0 {
            bail!("pet id must not be negative, got {}", pet.id);
        }
        if pet.id == 0 {
            pet.id = self
                .next_id
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
                .map_err(|_| anyhow!("no pet ids left to assign"))?;
        } else {
            self.next_id
                .fetch_max(pet.id.saturating_add(1), Ordering::SeqCst);
        }
        self.pets.write().await.insert(pet.id, pet.clone());
        Ok(pet)
    }

    pub async fn remove(&self, id: i64) -> Option<Pet> {
        self.pets.write().await.remove(&id)
    }
}

fn pet_id(params: &OperationParams) -> anyhow::Result<i64> {
    let raw = params
        .path_param("id")
        .ok_or_else(|| anyhow!("missing path parameter id"))?;
    raw.parse::<i64>()
        .with_context(|| format!("pet id must be an integer, got {:?}", raw))
}

#[derive(Debug, Clone)]
pub struct ListPets {
    store: PetStore,
}

#[async_trait]
impl Handler for ListPets {
    async fn handle(&self, params: OperationParams) -> anyhow::Result<Option<Payload>> {
        let limit = match params.query_value("limit") {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .with_context(|| format!("limit must be a positive integer, got {:?}", raw))?,
            ),
            None => None,
        };
        let status = params.query_value("status");

        let pets: Vec<Pet> = self
            .store
            .list()
            .await
            .into_iter()
            .filter(|pet| status.map_or(true, |status| pet.status == status))
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Ok(Some(Box::new(pets)))
    }
}

#[derive(Debug, Clone)]
pub struct CreatePet {
    store: PetStore,
}

#[async_trait]
impl Handler for CreatePet {
    fn parameter_model(&self) -> Option<&str> {
        Some("newPet")
    }

    async fn handle(&self, mut params: OperationParams) -> anyhow::Result<Option<Payload>> {
        let pet: Pet = params
            .take_body()
            .ok_or_else(|| anyhow!("request body is not a pet"))?;
        if pet.name.trim().is_empty() {
            bail!("pet name is required");
        }
        let created = self.store.insert(pet).await?;
        tracing::info!("Created pet {} ({})", created.id, created.name);
        Ok(Some(Box::new(created)))
    }
}

#[derive(Debug, Clone)]
pub struct GetPet {
    store: PetStore,
}

#[async_trait]
impl Handler for GetPet {
    async fn handle(&self, params: OperationParams) -> anyhow::Result<Option<Payload>> {
        let id = pet_id(&params)?;
        match self.store.get(id).await {
            Some(pet) => Ok(Some(Box::new(pet))),
            None => bail!("pet {} not found", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeletePet {
    store: PetStore,
}

#[async_trait]
impl Handler for DeletePet {
    async fn handle(&self, params: OperationParams) -> anyhow::Result<Option<Payload>> {
        let id = pet_id(&params)?;
        match self.store.remove(id).await {
            Some(pet) => {
                tracing::info!("Deleted pet {} ({})", pet.id, pet.name);
                Ok(None)
            }
            None => bail!("pet {} not found", id),
        }
    }
}

/// Registers the pet store's codecs, schemes, operations and models.
pub fn register(builder: &mut ApiBuilder, store: PetStore) -> Result<()> {
    builder
        .register_codec("application/json", JsonCodec)
        .register_consumer("application/xml", StubConsumer)
        .register_producer("application/xml", StubProducer)
        .register_producer("text/plain", TextProducer)
        .register_producer("text/html", StubProducer)
        .register_codec("application/x-yaml", YamlCodec)
        .register_codec("application/toml", TomlCodec);

    builder.register_auth(
        "basic",
        BasicAuth::new(|username, password| {
            if username == "admin" && password == "admin" {
                Ok(Principal::new("admin"))
            } else {
                Err(AuthFailure::Unauthenticated("basic".to_string()))
            }
        }),
    );
    builder.register_auth(
        "apiKey",
        ApiKeyAuth::new(API_KEY_HEADER, ApiKeyLocation::Header, |token| {
            if token == "token123" {
                Ok(Principal::new("admin"))
            } else {
                Err(AuthFailure::Unauthenticated("token".to_string()))
            }
        }),
    );

    builder.register_operation(
        Method::Get,
        "/pets",
        ListPets {
            store: store.clone(),
        },
    )?;
    builder
        .register_operation(
            Method::Post,
            "/pets",
            CreatePet {
                store: store.clone(),
            },
        )?
        .secured_by(["basic", "apiKey"]);
    builder
        .register_operation(
            Method::Delete,
            "/pets/{id}",
            DeletePet {
                store: store.clone(),
            },
        )?
        .secured_by(["basic", "apiKey"]);
    builder.register_operation(Method::Get, "/pets/{id}", GetPet { store })?;

    builder
        .register_model::<Pet>("pet")
        .register_model::<Pet>("newPet")
        .register_model::<Tag>("tag");

    Ok(())
}

pub fn new_api_with_store(config: &ApiConfig, store: PetStore) -> Result<Api> {
    let mut builder = ApiBuilder::from_config(config);
    register(&mut builder, store)?;
    builder.build()
}

/// Assembles the pet store API over sample data.
pub fn new_api(config: &ApiConfig) -> Result<Api> {
    new_api_with_store(config, PetStore::with_sample_data())
}
