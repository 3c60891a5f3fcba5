// Credential resolution: Okta authentication followed by AWS role selection
mod authenticate;
mod role;

pub use authenticate::authenticate;
pub use role::select_role;

use crate::console::Console;
use crate::error::{BmxError, Result};
use crate::identity::IdentityProvider;
use crate::models::RoleCredentials;
use crate::service::ServiceProvider;

/// What the user asked for on the command line
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub username: String,
    pub no_mask: bool,
    pub filter: String,
    pub account: String,
    pub role: String,
}

/// Authenticate, then exchange the resulting assertion for role credentials
pub fn get_credentials(
    console: &mut dyn Console,
    identity: &mut dyn IdentityProvider,
    service: &dyn ServiceProvider,
    request: &Request,
) -> Result<RoleCredentials> {
    let saml = authenticate(
        console,
        &request.username,
        request.no_mask,
        &request.filter,
        &request.account,
        identity,
    )?;

    select_role(console, &request.role, &saml, service)
}

/// Convert a 1-based menu choice into an index into a list of `len` items
pub(crate) fn select(choice: i64, len: usize) -> Result<usize> {
    match usize::try_from(choice) {
        Ok(choice) if (1..=len).contains(&choice) => Ok(choice - 1),
        _ => Err(BmxError::InvalidSelection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MockConsole;
    use crate::identity::MockIdentityProvider;
    use crate::models::{AppDetail, Role};
    use crate::service::MockServiceProvider;
    use chrono::{TimeZone, Utc};

    const DUMMY_SAML: &str = "something something saml";

    fn request() -> Request {
        Request {
            username: "testuser".to_string(),
            no_mask: false,
            filter: "amazon_aws".to_string(),
            account: "account".to_string(),
            role: "".to_string(),
        }
    }

    fn credentials() -> RoleCredentials {
        RoleCredentials {
            access_key_id: "access_key_id".to_string(),
            secret_access_key: "secret_access_key".to_string(),
            session_token: "session_token".to_string(),
            expiration: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn cached_identity() -> MockIdentityProvider {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_authenticate_from_cache()
            .returning(|_| Ok(Some("00u123".to_string())));
        identity.expect_list_applications().returning(|_| {
            Ok(vec![AppDetail {
                label: "account".to_string(),
                ..Default::default()
            }])
        });
        identity
            .expect_saml()
            .returning(|_| Ok(DUMMY_SAML.to_string()));
        identity
    }

    #[test]
    fn test_select_is_one_based() {
        assert_eq!(select(1, 2).unwrap(), 0);
        assert_eq!(select(2, 2).unwrap(), 1);
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        for choice in [0, 3, -1, i64::MAX] {
            assert!(matches!(select(choice, 2), Err(BmxError::InvalidSelection)));
        }
        assert!(matches!(select(1, 0), Err(BmxError::InvalidSelection)));
    }

    #[test]
    fn test_cache_hit_end_to_end() {
        let mut console = MockConsole::new();
        let mut identity = cached_identity();
        let mut service = MockServiceProvider::new();
        service.expect_list_roles().returning(|_| {
            Ok(vec![Role {
                name: "owner".to_string(),
                ..Default::default()
            }])
        });
        service
            .expect_credentials()
            .withf(|role, saml| role.name == "owner" && saml == DUMMY_SAML)
            .returning(|_, _| Ok(credentials()));

        let creds = get_credentials(&mut console, &mut identity, &service, &request()).unwrap();
        assert_eq!(creds, credentials());
    }

    #[test]
    fn test_authenticate_error_short_circuits() {
        let mut console = MockConsole::new();
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_authenticate_from_cache()
            .returning(|_| Ok(Some("00u123".to_string())));
        identity.expect_list_applications().returning(|_| {
            Err(BmxError::IdentityProvider(
                "test - error authenticating".to_string(),
            ))
        });
        let mut service = MockServiceProvider::new();
        service.expect_list_roles().never();

        let err = get_credentials(&mut console, &mut identity, &service, &request()).unwrap_err();
        assert_eq!(err.to_string(), "test - error authenticating");
    }

    #[test]
    fn test_select_role_error_is_returned_unchanged() {
        let mut console = MockConsole::new();
        let mut identity = cached_identity();
        let mut service = MockServiceProvider::new();
        service.expect_list_roles().returning(|_| {
            Err(BmxError::ServiceProvider(
                "test - error selecting role".to_string(),
            ))
        });
        service.expect_credentials().never();

        let err = get_credentials(&mut console, &mut identity, &service, &request()).unwrap_err();
        assert_eq!(err.to_string(), "test - error selecting role");
    }
}
