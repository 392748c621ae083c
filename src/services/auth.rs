//! Authorization context
//!
//! Identity and roles come from the hosting application. This module turns
//! them into an `AuthContext`, and only an admin context can mint the
//! `AdminOverride` capability the registration service accepts for rule
//! bypasses.

use serde::{Deserialize, Serialize};
use crate::utils::errors::{HealingError, Result};

/// Site roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Guest,
    User,
    Volunteer,
    Admin,
}

/// Authenticated caller as seen by the services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Option<i64>,
    pub role: Role,
}

/// Proof that the caller holds an admin context
///
/// Cannot be constructed outside this module except through
/// [`AuthContext::admin_override`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminOverride {
    admin_id: Option<i64>,
}

impl AdminOverride {
    pub fn admin_id(&self) -> Option<i64> {
        self.admin_id
    }
}

impl AuthContext {
    pub fn guest() -> Self {
        Self { user_id: None, role: Role::Guest }
    }

    pub fn user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), role: Role::User }
    }

    pub fn volunteer(user_id: i64) -> Self {
        Self { user_id: Some(user_id), role: Role::Volunteer }
    }

    pub fn admin(user_id: i64) -> Self {
        Self { user_id: Some(user_id), role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some() && self.role != Role::Guest
    }

    /// The override capability, present only for admins
    pub fn admin_override(&self) -> Option<AdminOverride> {
        self.is_admin().then(|| AdminOverride { admin_id: self.user_id })
    }

    /// Like `admin_override`, but a missing admin role is an error
    pub fn require_admin(&self) -> Result<AdminOverride> {
        self.admin_override().ok_or_else(|| {
            HealingError::PermissionDenied(format!(
                "{:?} {} lacks admin role",
                self.role,
                self.user_id.map_or_else(|| "anonymous".to_string(), |id| id.to_string())
            ))
        })
    }
}
