use super::select;
use crate::console::Console;
use crate::error::Result;
use crate::identity::{AuthOutcome, IdentityProvider};
use crate::models::AppDetail;

const USERNAME_PROMPT: &str = "Username: ";
const PASSWORD_PROMPT: &str = "Password: ";

/// Resolve an identity for `username` and fetch the SAML assertion for the
/// chosen application.
///
/// A cached session skips the password prompt and MFA entirely. `account` is
/// matched case-insensitively against every application label before falling
/// back to a menu of the applications whose name equals `filter` (all of them
/// when `filter` is empty).
pub fn authenticate(
    console: &mut dyn Console,
    username: &str,
    no_mask: bool,
    filter: &str,
    account: &str,
    identity: &mut dyn IdentityProvider,
) -> Result<String> {
    let username = match username.trim() {
        "" => console.read_line(USERNAME_PROMPT)?.trim().to_string(),
        name => name.to_string(),
    };

    let cached = match identity.authenticate_from_cache(&username) {
        Ok(found) => found,
        Err(e) => {
            tracing::debug!("Cached session unavailable: {}", e);
            None
        }
    };

    let user_id = match cached {
        Some(user_id) => user_id,
        None => {
            let password = read_password(console, no_mask)?;
            match identity.authenticate(&username, &password)? {
                AuthOutcome::Authenticated(user_id) => user_id,
                AuthOutcome::MfaRequired => complete_mfa(console, &username, identity)?,
            }
        }
    };

    let applications = identity.list_applications(&user_id)?;

    let app = match find_app(account, &applications) {
        Some(app) => app.clone(),
        None => choose_app(console, filter, applications)?,
    };

    identity.saml(&app)
}

fn read_password(console: &mut dyn Console, no_mask: bool) -> Result<String> {
    if no_mask {
        return console.read_line(PASSWORD_PROMPT);
    }

    let password = console.read_password(PASSWORD_PROMPT)?;
    console.writeln("");
    Ok(password)
}

fn complete_mfa(
    console: &mut dyn Console,
    username: &str,
    identity: &mut dyn IdentityProvider,
) -> Result<String> {
    console.writeln("MFA Required");

    let factors = identity.mfa_factors()?;
    for (idx, factor) in factors.iter().enumerate() {
        console.writeln(&format!("{} - {}", idx + 1, factor.factor));
    }

    let choice = console.read_int("Select an available MFA option: ")?;
    let factor = &factors[select(choice, factors.len())?];

    let code = console.read_line("Code: ")?;
    identity.complete_mfa(username, &factor.url, code.trim())
}

fn find_app<'a>(account: &str, apps: &'a [AppDetail]) -> Option<&'a AppDetail> {
    if account.is_empty() {
        return None;
    }

    let account = account.to_lowercase();
    apps.iter().find(|app| app.label.to_lowercase() == account)
}

fn choose_app(
    console: &mut dyn Console,
    filter: &str,
    applications: Vec<AppDetail>,
) -> Result<AppDetail> {
    let mut filtered: Vec<AppDetail> = applications
        .into_iter()
        .filter(|app| filter.is_empty() || app.app_name == filter)
        .collect();

    console.writeln("Available accounts:");
    for (idx, app) in filtered.iter().enumerate() {
        console.writeln(&format!("[{}] {}", idx + 1, app.label));
    }

    let choice = console.read_int("Select an account: ")?;
    let idx = select(choice, filtered.len())?;
    Ok(filtered.swap_remove(idx))
}
