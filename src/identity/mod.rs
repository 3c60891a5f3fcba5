// Identity provider capability
mod okta;
pub mod session_cache;

pub use okta::OktaClient;

use crate::error::Result;
use crate::models::{AppDetail, MfaFactor};

/// Outcome of a username/password authentication attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Authenticated; carries the identity provider's user id
    Authenticated(String),
    /// Credentials were accepted but a second factor must be verified
    MfaRequired,
}

#[cfg_attr(test, mockall::automock)]
pub trait IdentityProvider {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<AuthOutcome>;

    /// Resume a cached session, returning the user id when one is found
    fn authenticate_from_cache(&mut self, username: &str) -> Result<Option<String>>;

    fn complete_mfa(&mut self, username: &str, factor_url: &str, code: &str) -> Result<String>;

    /// Factors offered by the most recent `MfaRequired` outcome
    fn mfa_factors(&self) -> Result<Vec<MfaFactor>>;

    fn list_applications(&self, user_id: &str) -> Result<Vec<AppDetail>>;

    /// Fetch the base64 SAML assertion for an application
    fn saml(&self, app: &AppDetail) -> Result<String>;
}
