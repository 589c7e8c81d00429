//! Shell completion generation for cssense
//!
//! Generates completion scripts for bash, zsh and fish. Stylesheet
//! arguments complete as `.css` files where the shell supports it.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, CssenseError, Result};

/// Generate shell completion script
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish)
pub fn generate_completion(shell_name: &str) -> Result<()> {
    let shell = parse_shell(shell_name)?;
    print!("{}", render_completion(shell));
    Ok(())
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(CssenseError::Config(ConfigError::Generic(format!(
            "Unsupported shell: {}. Supported shells: bash, zsh, fish",
            shell_name
        )))),
    }
}

fn render_completion(shell: Shell) -> String {
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, "cssense", &mut buffer);

    let mut script = String::from_utf8_lossy(&buffer).into_owned();
    if shell == Shell::Fish {
        // Offer stylesheets first for the lookup subcommands
        script.push_str(
            "\ncomplete -c cssense -n '__fish_seen_subcommand_from complete state info' -k -a '(__fish_complete_suffix .css)'\n",
        );
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert!(matches!(parse_shell("bash"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("zsh"), Ok(Shell::Zsh)));
        assert!(matches!(parse_shell("fish"), Ok(Shell::Fish)));
        assert!(parse_shell("invalid").is_err());
    }

    #[test]
    fn test_parse_shell_case_insensitive() {
        assert!(matches!(parse_shell("BASH"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("Zsh"), Ok(Shell::Zsh)));
        assert!(matches!(parse_shell("FiSh"), Ok(Shell::Fish)));
    }

    #[test]
    fn test_scripts_name_the_binary() {
        assert!(render_completion(Shell::Bash).contains("cssense"));
        let fish = render_completion(Shell::Fish);
        assert!(fish.contains("__fish_complete_suffix .css"));
    }
}
