use std::collections::HashSet;

use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Command-side authorization contract (checked at the command boundary).
///
/// Implement this on operations that require permissions. The API layer enforces
/// these requirements before the catalog pipeline runs.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        tracing::debug!(
            principal_id = %principal.principal_id,
            permission = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Static role → permission policy.
///
/// `admin` grants everything; `catalog_manager` may manage product listings.
/// Unknown roles grant nothing.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut permissions = Vec::new();
    for role in roles {
        let granted = match role.as_str() {
            "admin" => Permission::WILDCARD,
            "catalog_manager" => Permission::MANAGE_PRODUCTS,
            _ => continue,
        };
        if !permissions.contains(&granted) {
            permissions.push(granted);
        }
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrincipalId;

    #[test]
    fn admin_is_granted_everything() {
        let principal = Principal::from_roles(PrincipalId::new(), vec![Role::ADMIN]);
        assert_eq!(authorize(&principal, &Permission::MANAGE_PRODUCTS), Ok(()));
        assert_eq!(authorize(&principal, &Permission::new("anything")), Ok(()));
    }

    #[test]
    fn catalog_manager_may_manage_products_only() {
        let principal = Principal::from_roles(PrincipalId::new(), vec![Role::CATALOG_MANAGER]);
        assert_eq!(authorize(&principal, &Permission::MANAGE_PRODUCTS), Ok(()));
        assert_eq!(
            authorize(&principal, &Permission::new("channels.manage")),
            Err(AuthzError::Forbidden("channels.manage".to_string()))
        );
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        let principal = Principal::from_roles(PrincipalId::new(), vec![Role::new("viewer")]);
        assert!(principal.permissions.is_empty());
        assert!(authorize(&principal, &Permission::MANAGE_PRODUCTS).is_err());
    }

    #[test]
    fn repeated_roles_do_not_duplicate_permissions() {
        let perms = permissions_for_roles(&[Role::CATALOG_MANAGER, Role::CATALOG_MANAGER]);
        assert_eq!(perms, vec![Permission::MANAGE_PRODUCTS]);
    }
}
