use crate::aws_config;
use crate::config::UserConfig;
use crate::error::Result;
use std::path::PathBuf;

pub fn execute(profile: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let profile = super::profile_name(profile, &UserConfig::load()?);

    let path = match output {
        Some(path) => path,
        None => aws_config::credentials_file_path()?,
    };

    if aws_config::remove_profile(&path, &profile)? {
        eprintln!("✓ Removed profile {} from {}", profile, path.display());
    } else {
        eprintln!("Profile {} not found in {}", profile, path.display());
    }

    Ok(())
}
