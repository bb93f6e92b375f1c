//! Command-line interface parsing for the ClimaPYG server
//!
//! Flags given here take precedence over the config file and the
//! environment.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Settings, StoreBackend};

/// ClimaPYG - cached weather and PYG conversion API for Paraguay
#[derive(Parser, Debug)]
#[command(name = "climapyg")]
#[command(about = "Weather and currency API for Paraguayan departments")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    ///
    /// Defaults to ./climapyg.toml when it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Port to listen on, overriding the config file
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Keep weather snapshots in memory instead of on disk
    #[arg(long)]
    pub memory_store: bool,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Applies command-line overrides on top of loaded settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.memory_store {
            settings.store.backend = StoreBackend::Memory;
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}
