use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use rolodex_service::DataLayout;

pub const HOME_ENV: &str = "ROLODEX_HOME";

/// Terminal contact book with per-user lists and an admin console.
///
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "rolodex", version, about)]
pub struct Cli {
    /// Data directory holding the JSON documents [env: ROLODEX_HOME]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// Print command results as JSON envelopes
    #[arg(long)]
    pub json: bool,
}

pub struct Config {
    pub data_dir: PathBuf,
    pub json: bool,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Result<Self> {
        let data_dir = match cli
            .data_dir
            .or_else(|| std::env::var(HOME_ENV).ok().map(PathBuf::from))
        {
            Some(dir) => dir,
            None => DataLayout::default_root().wrap_err("Failed to locate a data directory")?,
        };

        Ok(Self {
            data_dir,
            json: cli.json,
        })
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}
