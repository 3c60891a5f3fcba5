// Service provider capability
mod aws;

pub use aws::AwsServiceProvider;

use crate::error::Result;
use crate::models::{Role, RoleCredentials};

#[cfg_attr(test, mockall::automock)]
pub trait ServiceProvider {
    /// Roles granted by a base64 SAML assertion
    fn list_roles(&self, assertion: &str) -> Result<Vec<Role>>;

    fn credentials(&self, role: &Role, assertion: &str) -> Result<RoleCredentials>;
}
