//! Config command - show or initialize the configuration file.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use recibo_core::ReciboConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the active configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(default_value = "recibo.json")]
        path: PathBuf,
    },
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = match config_path {
                Some(path) => ReciboConfig::from_file(std::path::Path::new(path))?,
                None => ReciboConfig::default(),
            };
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { path } => {
            ReciboConfig::default().save(&path)?;
            println!(
                "{} Default configuration written to {}",
                style("✓").green(),
                path.display()
            );
        }
    }
    Ok(())
}
