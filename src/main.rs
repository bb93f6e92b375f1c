//! ClimaPYG - weather and currency API for Paraguay
//!
//! Serves cached OpenWeatherMap snapshots for Paraguayan departments and
//! converts foreign currency and Bitcoin to guaraníes.

use clap::Parser;

use climapyg::app;
use climapyg::cli::Cli;
use climapyg::config::Settings;
use climapyg::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_to(&mut settings);

    init_logging(&settings.log_level);

    app::run(settings).await?;

    Ok(())
}
