use storefront_auth::{CommandAuthorization, Permission};

/// Small helper wrapper to associate required permissions with a command.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CmdAuth<C> {
    /// Channel listing writes all require `products.manage`.
    pub fn manage_products(inner: C) -> Self {
        Self {
            inner,
            required: vec![Permission::MANAGE_PRODUCTS],
        }
    }
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}
