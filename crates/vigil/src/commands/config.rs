use clap::ArgMatches;
use tracing::info;

use super::helpers::load_config;

pub fn handle_config_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches)?;
    let rendered = toml::to_string_pretty(&config.resolved())?;

    info!(event = "cli.config_printed");
    print!("{}", rendered);
    Ok(())
}
