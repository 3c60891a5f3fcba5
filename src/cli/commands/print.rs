use crate::aws_config::{self, OutputFormat};
use crate::cli::CredentialArgs;
use crate::error::Result;

pub fn execute(args: CredentialArgs, format: OutputFormat) -> Result<()> {
    let (_, creds) = super::fetch_credentials(&args, None)?;

    tracing::debug!("Credentials expire at {}", creds.expiration_display());
    println!("{}", aws_config::render(&creds, format).trim_end());
    Ok(())
}
