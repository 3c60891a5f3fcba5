// bmx - AWS credentials through Okta

mod aws_config;
mod cli;
mod config;
mod console;
mod error;
mod flow;
mod identity;
mod models;
mod saml;
mod service;

use clap::Parser;
use error::Result;
use std::io::Write;

fn main() {
    // Parse CLI arguments first to get verbose flag
    let args = cli::Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // stdout carries credentials, so logs always go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = report(cli::execute(args), &mut std::io::stderr());
    std::process::exit(code);
}

/// Print a failure's message and turn the outcome into an exit code
fn report(result: Result<()>, out: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(out, "{}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BmxError;

    #[test]
    fn test_report_success() {
        let mut out = Vec::new();
        assert_eq!(report(Ok(()), &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_report_prints_message_not_debug() {
        let mut out = Vec::new();
        assert_eq!(report(Err(BmxError::InvalidSelection), &mut out), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "invalid selection\n");

        let mut out = Vec::new();
        let err = BmxError::IdentityProvider("Authentication failed".to_string());
        assert_eq!(report(Err(err), &mut out), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "Authentication failed\n");
    }
}
