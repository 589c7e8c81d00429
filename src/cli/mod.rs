//! Command-line interface for cssense
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Reading the stylesheet and caret position
//! - Running completion, state and span lookups

pub mod completion;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

use crate::completion::{Caret, CssCompleter, end_of};
use crate::config::Config;
use crate::error::{CssenseError, Result};

/// cssense - CSS editing-completion engine
#[derive(Parser, Debug)]
#[command(
    name = "cssense",
    version,
    about = "Context-aware CSS completion",
    long_about = "Works out what is being typed at a caret in a CSS document and suggests
property names, values, selectors and at-rules. Results are printed as JSON."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Maximum number of candidates
    #[arg(long, value_name = "N", global = true)]
    pub max_entries: Option<usize>,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Stylesheet and caret shared by the lookup subcommands
#[derive(Args, Debug, Clone)]
pub struct CaretArgs {
    /// CSS file to read; stdin when omitted or `-`
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Caret line (zero-based); last line when omitted
    #[arg(short = 'l', long)]
    pub line: Option<usize>,

    /// Caret column (zero-based, in chars); end of the line when omitted
    #[arg(short = 'C', long)]
    pub column: Option<usize>,
}

/// Subcommands for cssense
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print completion candidates at the caret
    Complete(CaretArgs),

    /// Print the resolved state at the caret
    State(CaretArgs),

    /// Print the construct around the caret and its span
    Info(CaretArgs),

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,

        /// Write the effective configuration to the config file if none exists
        #[arg(long)]
        init: bool,
    },
}

impl CaretArgs {
    /// Read the stylesheet from the file or stdin
    fn read_source(&self) -> Result<String> {
        match &self.file {
            Some(path) if path.as_os_str() != "-" => Ok(std::fs::read_to_string(path)?),
            _ => {
                let mut source = String::new();
                std::io::stdin().read_to_string(&mut source)?;
                Ok(source)
            }
        }
    }

    /// Turn the line/column flags into a caret inside `source`
    fn caret(&self, source: &str) -> Result<Caret> {
        let Some(line) = self.line else {
            return match self.column {
                Some(_) => Err(CssenseError::InvalidArgument(
                    "--column requires --line".to_string(),
                )),
                None => Ok(end_of(source)),
            };
        };

        let text = source.split('\n').nth(line).ok_or_else(|| {
            CssenseError::InvalidArgument(format!("line {line} is past the end of the input"))
        })?;
        let column = self.column.unwrap_or_else(|| text.chars().count());
        Ok(Caret::new(line, column))
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    fn load_config(args: &CliArgs) -> Result<Config> {
        let config_path = args.config_file.as_deref();
        let mut config = Config::load_from_file(config_path)?;

        // Validate loaded configuration
        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        // Apply CLI arguments to override config values
        Self::apply_args_to_config(&mut config, args);

        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Apply CLI arguments to configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_completion_args(config, args);
        Self::apply_logging_args(config, args);
    }

    fn apply_completion_args(config: &mut Config, args: &CliArgs) {
        if let Some(max_entries) = args.max_entries {
            config.completion.max_entries = max_entries;
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        use crate::config::LogLevel;

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Run the selected subcommand
    pub async fn run(&self) -> Result<()> {
        match &self.args.command {
            Commands::Complete(caret_args) => {
                let (source, caret) = self.read_input(caret_args)?;
                let mut completer = self.completer()?;
                let candidates = completer.complete(&source, caret).await;
                print_json(&candidates)
            }
            Commands::State(caret_args) => {
                let (source, caret) = self.read_input(caret_args)?;
                let mut completer = self.completer()?;
                print_json(&completer.resolve_state(&source, caret))
            }
            Commands::Info(caret_args) => {
                let (source, caret) = self.read_input(caret_args)?;
                let completer = self.completer()?;
                print_json(&completer.get_info_at(&source, caret))
            }
            Commands::Completion { shell } => completion::generate_completion(shell),
            Commands::Config {
                show,
                validate,
                init,
            } => self.handle_config_command(*show, *validate, *init),
        }
    }

    fn read_input(&self, caret_args: &CaretArgs) -> Result<(String, Caret)> {
        let source = caret_args.read_source()?;
        let caret = caret_args.caret(&source)?;
        tracing::debug!(line = caret.line, column = caret.column, bytes = source.len(), "read input");
        Ok((source, caret))
    }

    /// Build a completer from the effective configuration
    fn completer(&self) -> Result<CssCompleter> {
        CssCompleter::from_config(&self.config.completion)
    }

    /// Handle config subcommand
    fn handle_config_command(&self, show: bool, validate: bool, init: bool) -> Result<()> {
        if init {
            self.init_config_file()?;
        }

        if validate {
            self.validate_config_file()?;
        }

        if show {
            self.show_config()?;
        }

        Ok(())
    }

    /// Write the effective configuration unless a file is already there
    fn init_config_file(&self) -> Result<()> {
        let path = self.get_config_path();
        if write_config_if_missing(&self.config, &path)? {
            println!("✅ Wrote configuration to {}", path.display());
        } else {
            println!("Configuration file already exists: {}", path.display());
        }
        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return Ok(());
        }

        match Config::from_file(&path) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("✅ Configuration is valid"),
                Err(e) => println!("❌ Configuration validation failed: {}", e),
            },
            Err(e) => println!("❌ Failed to load configuration: {}", e),
        }

        Ok(())
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Configuration file: {}", path.display());
        println!();
        println!("=== Effective Configuration ===");
        println!();

        match self.config.to_toml() {
            Ok(toml_str) => println!("{}", toml_str),
            Err(e) => {
                eprintln!("Error formatting configuration: {}", e);
                println!("{:#?}", self.config);
            }
        }

        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .as_ref()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Config::default_config_path)
    }
}

/// Save `config` to `path` when nothing exists there; reports whether it wrote
fn write_config_if_missing(config: &Config, path: &std::path::Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    config.save(path)?;
    Ok(true)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
