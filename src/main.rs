//! pixtrim command-line entry point

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use pixtrim::adapters::{LogLevel, TracingLogAdapter};
use pixtrim::app::container::DefaultAppContainer;
use pixtrim::cli::{commands, Cli, Commands};
use pixtrim::config_initialization::initialize_configuration_hierarchy;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = initialize_configuration_hierarchy(&cli)?;

    TracingLogAdapter::init(LogLevel::parse(&config.log_level)?, config.log_format);
    debug!(?config, "Configuration resolved");

    let result = match &cli.command {
        Commands::Plan(args) => commands::plan(args),
        Commands::Trim(args) => {
            let container = DefaultAppContainer::new(&config);
            commands::trim(args, &config, &container).await
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
