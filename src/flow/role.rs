use super::select;
use crate::console::Console;
use crate::error::{BmxError, Result};
use crate::models::{Role, RoleCredentials};
use crate::service::ServiceProvider;

/// Pick a role granted by `saml` and exchange the assertion for credentials.
pub fn select_role(
    console: &mut dyn Console,
    desired_role: &str,
    saml: &str,
    service: &dyn ServiceProvider,
) -> Result<RoleCredentials> {
    let mut roles = service.list_roles(saml)?;
    if roles.is_empty() {
        return Err(BmxError::NoRolesAvailable);
    }

    let mut role = None;
    if !desired_role.is_empty() {
        let desired_role = desired_role.to_lowercase();
        role = roles
            .iter()
            .position(|r| r.name.to_lowercase() == desired_role);

        if role.is_none() {
            console.writeln("Desired role not available");
        }
    }

    let idx = match role {
        Some(idx) => idx,
        None if roles.len() == 1 => 0,
        None => choose_role(console, &roles)?,
    };

    let role = roles.swap_remove(idx);
    tracing::debug!("Selected role {}", role.arn);

    service.credentials(&role, saml)
}

fn choose_role(console: &mut dyn Console, roles: &[Role]) -> Result<usize> {
    for (idx, role) in roles.iter().enumerate() {
        console.writeln(&format!("[{}] {}", idx + 1, role.name));
    }

    let choice = console.read_int("Select a role: ")?;
    select(choice, roles.len())
}
