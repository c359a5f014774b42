//! First-run setup of the platform administrator account.
//!
//! Creating the account touches two collections, users then user profiles,
//! and is not atomic across them. A crash between the two leaves a user
//! without a profile; rerunning does not repair it.

use crate::collection::Filter;
use crate::credentials::hash_password;
use crate::document::{into_document, Document, ID_FIELD};
use crate::entity::EntityKind;
use crate::error::CoreResult;
use crate::registry::Registry;
use serde_json::{json, Value};
use tracing::info;

/// Username of the bootstrap administrator.
pub const ADMIN_USERNAME: &str = "admin";

/// Password used when none is supplied.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Outcome of [`ensure_admin`].
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    /// The administrator's user document.
    pub user: Document,
    /// Whether this call created it.
    pub created: bool,
}

/// Creates the administrator user and profile unless a user named
/// `admin` already exists.
///
/// # Errors
///
/// Returns an error if either collection cannot be opened or written.
pub fn ensure_admin(registry: &Registry, password: &str) -> CoreResult<AdminBootstrap> {
    let users = registry.entity(EntityKind::Users)?;

    if let Some(user) = users.first(&Filter::new().eq("username", ADMIN_USERNAME)) {
        return Ok(AdminBootstrap {
            user,
            created: false,
        });
    }

    let user = users.create(fields(json!({
        "username": ADMIN_USERNAME,
        "email": "admin@healthguard.local",
        "password": hash_password(password),
        "first_name": "System",
        "last_name": "Administrator",
        "is_active": true,
    })))?;

    let user_id = user.get(ID_FIELD).cloned().unwrap_or(Value::Null);
    let profiles = registry.entity(EntityKind::UserProfiles)?;
    profiles.create(fields(json!({
        "user_id": user_id,
        "user_type": "platform_admin",
        "phone": "",
        "date_of_birth": null,
        "gender": "",
        "address": "",
        "profile_picture": null,
        "blood_group": "",
        "height": null,
        "weight": null,
        "emergency_contact": "",
        "specialization": "",
        "license_number": "",
        "years_of_experience": null,
        "consultation_fee": null,
        "two_fa_enabled": false,
        "two_fa_email": null,
        "is_verified": true,
    })))?;

    info!(user_id = %user_id, "administrator account created");
    Ok(AdminBootstrap {
        user,
        created: true,
    })
}

fn fields(value: Value) -> Document {
    into_document(value).unwrap_or_default()
}
