//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod clock;
pub mod event;
pub mod registration;

// Re-export commonly used services
pub use auth::{AdminOverride, AuthContext, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use event::EventService;
pub use registration::{GuestDetails, RegistrationPolicy, RegistrationService};

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    database: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    ///
    /// Fails with `HealingError::Config` when the registration windows do
    /// not fit in a `chrono::Duration`.
    pub fn new(settings: &Settings, database: DatabaseService, clock: Arc<dyn Clock>) -> Result<Self> {
        let event_service = EventService::new(database.events.clone(), clock.clone());
        let registration_service = RegistrationService::new(
            database.events.clone(),
            database.registrations.clone(),
            clock,
            RegistrationPolicy::try_from(&settings.registration)?,
        );

        Ok(Self {
            event_service,
            registration_service,
            database,
        })
    }

    /// Services over the in-memory store with the system clock
    pub fn in_memory(settings: &Settings) -> Result<Self> {
        Self::new(settings, DatabaseService::in_memory(), Arc::new(SystemClock))
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let storage_healthy = match self.database.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Storage health check failed");
                false
            }
        };

        ServiceHealthStatus {
            storage_healthy,
            persistent_storage: self.database.pool().is_some(),
        }
    }

    /// Fail fast variant of `health_check` for startup
    pub async fn ensure_healthy(&self) -> Result<()> {
        self.database.health_check().await
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub storage_healthy: bool,
    /// False when running over the in-memory store
    pub persistent_storage: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.storage_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.storage_healthy {
            issues.push("Storage connection failed".to_string());
        }
        if !self.persistent_storage {
            issues.push("Running on in-memory storage; data is not persisted".to_string());
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_factory_health() {
        let factory = ServiceFactory::in_memory(&Settings::default()).unwrap();
        let status = factory.health_check().await;

        assert!(status.is_healthy());
        assert!(!status.persistent_storage);
        assert_eq!(status.get_issues().len(), 1);
        assert!(factory.ensure_healthy().await.is_ok());
    }

    #[test]
    fn test_factory_applies_registration_settings() {
        let mut settings = Settings::default();
        settings.registration.guest_rate_limit = 7;

        let factory = ServiceFactory::in_memory(&settings).unwrap();
        assert_eq!(factory.registration_service.policy().guest_rate_limit, 7);
    }

    #[test]
    fn test_factory_rejects_out_of_range_windows() {
        let mut settings = Settings::default();
        settings.registration.guest_rate_window_minutes = i64::MAX / 2;

        let result = ServiceFactory::in_memory(&settings);
        assert!(matches!(result, Err(crate::HealingError::Config(_))));
    }
}
