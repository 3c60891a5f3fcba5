pub mod completions;
pub mod print;
pub mod remove;
pub mod write;

use crate::cli::CredentialArgs;
use crate::config::{Settings, UserConfig, DEFAULT_PROFILE};
use crate::console::TerminalConsole;
use crate::error::Result;
use crate::flow::{self, Request};
use crate::identity::OktaClient;
use crate::models::RoleCredentials;
use crate::service::AwsServiceProvider;

/// Sign in to Okta and assume an AWS role using the merged settings
fn fetch_credentials(args: &CredentialArgs, profile: Option<String>) -> Result<(Settings, RoleCredentials)> {
    let settings = UserConfig::load()?.merge(args.to_config(profile))?;
    tracing::debug!("Using Okta org {}", settings.org);

    let mut console = TerminalConsole;
    let mut identity = OktaClient::new(&settings.org)?;
    let service = AwsServiceProvider::new(settings.duration)?;

    let request = Request {
        username: settings.user.clone(),
        no_mask: args.nomask,
        filter: settings.filter.clone(),
        account: settings.account.clone(),
        role: settings.role.clone(),
    };

    let creds = flow::get_credentials(&mut console, &mut identity, &service, &request)?;
    Ok((settings, creds))
}

/// Profile flag, then the configured profile, then `default`
fn profile_name(flag: Option<String>, config: &UserConfig) -> String {
    flag.filter(|p| !p.is_empty())
        .or_else(|| config.profile.clone().filter(|p| !p.is_empty()))
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}
