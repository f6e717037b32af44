//! modmail-config
//!
//! Resolves the modmail server configuration from config files, environment
//! variables and built-in defaults, and reports the result. A bad
//! configuration exits non-zero before anything else would start.

use anyhow::Result;
use clap::Parser;
use modmail_config::cli::{Cli, Command};
use modmail_config::config::{Config, Resolver};
use serde_json::Value;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let base_dir = cli.dir.unwrap_or_else(|| PathBuf::from("."));
    let resolver = Resolver::new(base_dir);

    match cli.command {
        Some(Command::Show) => {
            let config = resolver.resolve()?;
            print_redacted(&config)?;
        }
        Some(Command::Check) | None => {
            resolver.resolve()?;
        }
    }

    Ok(())
}

/// Print the resolved configuration as pretty JSON with the token redacted.
fn print_redacted(config: &Config) -> Result<()> {
    let mut value = serde_json::to_value(config)?;
    if let Some(token) = value.get_mut("token") {
        *token = Value::String("<redacted>".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
