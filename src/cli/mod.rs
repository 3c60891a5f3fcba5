// CLI interface
pub mod commands;

use crate::aws_config::OutputFormat;
use crate::config::UserConfig;
use crate::error::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bmx")]
#[command(about = "Get AWS credentials through Okta", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Options shared by every command that signs in
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// Okta organization (the part before .okta.com)
    #[arg(long)]
    pub org: Option<String>,

    /// Okta username
    #[arg(long)]
    pub user: Option<String>,

    /// Okta application label to use
    #[arg(long)]
    pub account: Option<String>,

    /// AWS role to assume
    #[arg(long)]
    pub role: Option<String>,

    /// Only offer Okta applications with this app name
    #[arg(long)]
    pub filter: Option<String>,

    /// Echo the password while typing it
    #[arg(long)]
    pub nomask: bool,

    /// Session duration in minutes
    #[arg(long)]
    pub duration: Option<u32>,
}

impl CredentialArgs {
    /// Flags as a config layer that overrides files and environment
    pub fn to_config(&self, profile: Option<String>) -> UserConfig {
        UserConfig {
            allow_project_configs: false,
            org: self.org.clone(),
            user: self.user.clone(),
            account: self.account.clone(),
            role: self.role.clone(),
            profile,
            filter: self.filter.clone(),
            default_duration: self.duration,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print credentials as shell statements
    Print {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Shell syntax to print (defaults to powershell on Windows, bash elsewhere)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Write credentials to the AWS credentials file
    Write {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Profile name to write (defaults to the configured profile, then "default")
        #[arg(long)]
        profile: Option<String>,

        /// Credentials file to write (defaults to ~/.aws/credentials)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Remove a profile from the AWS credentials file
    Remove {
        /// Profile name to remove (defaults to the configured profile, then "default")
        #[arg(long)]
        profile: Option<String>,

        /// Credentials file to edit (defaults to ~/.aws/credentials)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    ///
    /// INSTALLATION:
    ///
    /// Bash:
    ///   eval "$(bmx completions bash)"    # Add to ~/.bashrc
    ///
    /// Zsh:
    ///   eval "$(bmx completions zsh)"     # Add to ~/.zshrc
    ///
    /// Fish:
    ///   bmx completions fish > ~/.config/fish/completions/bmx.fish
    ///
    /// PowerShell:
    ///   bmx completions powershell | Out-String | Invoke-Expression
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

pub fn execute(args: Cli) -> Result<()> {
    match args.command {
        Commands::Print {
            credentials,
            format,
        } => commands::print::execute(credentials, format.unwrap_or_default()),
        Commands::Write {
            credentials,
            profile,
            output,
        } => commands::write::execute(credentials, profile, output),
        Commands::Remove { profile, output } => commands::remove::execute(profile, output),
        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            Ok(())
        }
    }
}
