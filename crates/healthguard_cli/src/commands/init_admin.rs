//! Administrator bootstrap command.

use healthguard_core::bootstrap::{ensure_admin, ADMIN_USERNAME};
use healthguard_core::{Config, Registry};

/// Creates the administrator account unless it already exists.
pub fn run(config: Config, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::open_all(config)?;
    let outcome = ensure_admin(&registry, password)?;

    if outcome.created {
        println!("✓ Admin account created");
        println!("  Username: {ADMIN_USERNAME}");
        println!("  User ID:  {}", outcome.user["id"]);
    } else {
        println!("✓ Admin account already exists");
        println!("  User ID:  {}", outcome.user["id"]);
    }

    Ok(())
}
