//! Database service layer
//!
//! Bundles the event and registration stores behind shared trait objects so
//! the services can run over Postgres or the in-memory store alike.

use std::sync::Arc;
use crate::database::{
    connection, DatabasePool, EventRepository, EventStore, MemoryStore, RegistrationRepository,
    RegistrationStore,
};
use crate::utils::errors::HealingError;

#[derive(Clone)]
pub struct DatabaseService {
    pub events: Arc<dyn EventStore>,
    pub registrations: Arc<dyn RegistrationStore>,
    pool: Option<DatabasePool>,
}

impl DatabaseService {
    /// Postgres-backed stores sharing one pool
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: Arc::new(EventRepository::new(pool.clone())),
            registrations: Arc::new(RegistrationRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Both stores over a single in-memory table set
    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(store: MemoryStore) -> Self {
        Self {
            events: Arc::new(store.clone()),
            registrations: Arc::new(store),
            pool: None,
        }
    }

    pub fn pool(&self) -> Option<&DatabasePool> {
        self.pool.as_ref()
    }

    /// Check storage reachability
    pub async fn health_check(&self) -> Result<(), HealingError> {
        match &self.pool {
            Some(pool) => connection::health_check(pool).await,
            None => Ok(()),
        }
    }
}
