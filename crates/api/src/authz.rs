//! API-side authorization guard for commands.
//!
//! This enforces authorization at the command boundary (before the listing
//! pipeline runs), while keeping the catalog and infra crates auth-agnostic.

use storefront_auth::{AuthzError, CommandAuthorization, Principal, authorize};

use crate::context::PrincipalContext;

/// Check authorization for a command in the current request context.
///
/// This is intended to be called **before** running the command.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let principal = Principal::from_roles(principal.principal_id(), principal.roles().to_vec());

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}
