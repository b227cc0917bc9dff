//! Settings page: reference data and the role catalogue.
//!
//! Read-only composition computed per request; machines, users, and shifts
//! are managed elsewhere.

use crate::error::Result;
use pulse_model::{Department, Profile, Shift, UserRole};
use pulse_store::PulseStore;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Role with its access description
#[derive(Debug, Clone, Serialize)]
pub struct RoleInfo {
    pub role: UserRole,
    pub description: &'static str,
}

/// User identity with granted roles
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    #[serde(flatten)]
    pub profile: Profile,
    pub roles: Vec<UserRole>,
}

/// Rendered settings page
#[derive(Debug, Clone, Serialize)]
pub struct SettingsData {
    pub users: Vec<UserAccount>,
    pub shifts: Vec<Shift>,
    pub departments: Vec<Department>,
    pub roles: Vec<RoleInfo>,
}

/// The fixed role catalogue
pub fn role_catalog() -> Vec<RoleInfo> {
    vec![
        RoleInfo {
            role: UserRole::Admin,
            description: "Full access to all features and settings",
        },
        RoleInfo {
            role: UserRole::Manager,
            description: "Access to dashboards, reports, and machine management",
        },
        RoleInfo {
            role: UserRole::Maintenance,
            description: "Machine management and downtime tracking",
        },
        RoleInfo {
            role: UserRole::Operator,
            description: "View-only access to machine status",
        },
    ]
}

/// Compose the settings page from the reference readers
pub async fn settings(store: &PulseStore) -> Result<SettingsData> {
    let departments = store.list_departments().await?;
    let shifts = store.list_shifts().await?;
    let profiles = store.list_profiles().await?;
    let grants = store.list_user_roles().await?;

    let mut roles_by_user: HashMap<Uuid, Vec<UserRole>> = HashMap::new();
    for grant in grants {
        roles_by_user.entry(grant.user_id).or_default().push(grant.role);
    }

    let users = profiles
        .into_iter()
        .map(|profile| {
            let roles = roles_by_user.remove(&profile.id).unwrap_or_default();
            UserAccount { profile, roles }
        })
        .collect();

    Ok(SettingsData {
        users,
        shifts,
        departments,
        roles: role_catalog(),
    })
}
