// Interactive terminal I/O
use crate::error::{BmxError, Result};
use std::io::{self, BufRead, Write};

/// Prompting and messaging for the interactive flow.
///
/// Everything goes to the user-facing stream (stderr) so that stdout only
/// ever carries credential output.
#[cfg_attr(test, mockall::automock)]
pub trait Console {
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Read a line without echoing it back to the terminal
    fn read_password(&mut self, prompt: &str) -> Result<String>;

    fn read_int(&mut self, prompt: &str) -> Result<i64>;

    fn writeln(&mut self, message: &str);
}

pub struct TerminalConsole;

impl TerminalConsole {
    fn prompt(prompt: &str) -> Result<()> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;
        Ok(())
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        Self::prompt(prompt)?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_password(&mut self, prompt: &str) -> Result<String> {
        Self::prompt(prompt)?;
        Ok(rpassword::read_password()?)
    }

    fn read_int(&mut self, prompt: &str) -> Result<i64> {
        let line = self.read_line(prompt)?;
        parse_int(&line)
    }

    fn writeln(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

fn parse_int(input: &str) -> Result<i64> {
    let input = input.trim();
    input
        .parse::<i64>()
        .map_err(|e| BmxError::Console(format!("invalid number '{}': {}", input, e)))
}
