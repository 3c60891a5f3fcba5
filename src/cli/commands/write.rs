use crate::aws_config;
use crate::cli::CredentialArgs;
use crate::error::Result;
use std::path::PathBuf;

pub fn execute(args: CredentialArgs, profile: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let (settings, creds) = super::fetch_credentials(&args, profile)?;

    let path = match output {
        Some(path) => path,
        None => aws_config::credentials_file_path()?,
    };

    aws_config::write_credentials(&path, &settings.profile, &creds)?;
    eprintln!("✓ Wrote credentials to {}", path.display());
    eprintln!("  Profile: {}", settings.profile);
    eprintln!("  Expires: {}", creds.expiration_display());

    Ok(())
}
