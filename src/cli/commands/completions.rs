use crate::cli::{Cli, Shell};
use clap::CommandFactory;
use clap_complete::{generate, Shell as ClapShell};
use std::io;

const BIN_NAME: &str = "bmx";

impl From<&Shell> for ClapShell {
    fn from(shell: &Shell) -> Self {
        match shell {
            Shell::Bash => ClapShell::Bash,
            Shell::Zsh => ClapShell::Zsh,
            Shell::Fish => ClapShell::Fish,
            Shell::PowerShell => ClapShell::PowerShell,
            Shell::Elvish => ClapShell::Elvish,
        }
    }
}

fn install_hint(shell: &Shell) -> &'static str {
    match shell {
        Shell::Bash => "# Add to ~/.bashrc:\n#   eval \"$(bmx completions bash)\"",
        Shell::Zsh => "# Add to ~/.zshrc:\n#   eval \"$(bmx completions zsh)\"",
        Shell::Fish => {
            "# Save to fish completion directory:\n#   bmx completions fish > ~/.config/fish/completions/bmx.fish"
        }
        Shell::PowerShell => {
            "# Add to PowerShell profile:\n#   bmx completions powershell | Out-String | Invoke-Expression"
        }
        Shell::Elvish => "# Add to Elvish config:\n#   eval (bmx completions elvish | slurp)",
    }
}

pub fn execute(shell: Shell) {
    let mut cmd = Cli::command();

    tracing::debug!("Generating completion file for {:?}", shell);
    generate(ClapShell::from(&shell), &mut cmd, BIN_NAME, &mut io::stdout());

    // Hints go to stderr so the script can be piped
    eprintln!("\n{}", install_hint(&shell));
}
