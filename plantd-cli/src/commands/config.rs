///! Config subcommands

use crate::ConfigCommands;
use anyhow::Result;
use plantd_cli::config::Config;
use plantd_cli::output::{self, OutputFormat};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct ConfigRow {
    key: String,
    value: String,
}

fn rows(config: &Config) -> Vec<ConfigRow> {
    let row = |key: &str, value: String| ConfigRow {
        key: key.to_string(),
        value,
    };
    vec![
        row("default_server", config.default_server.clone()),
        row("default_output", config.default_output.clone()),
        row("timeout", config.timeout.to_string()),
        row("default_namespace", config.default_namespace.clone().unwrap_or_default()),
        row(
            "log_dir",
            config
                .log_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ),
    ]
}

pub(crate) fn handle_config_command(
    command: ConfigCommands,
    config: &mut Config,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => match format {
            OutputFormat::Table => output::print_output(rows(config), format)?,
            _ => output::print_single(config, format)?,
        },
        ConfigCommands::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            output::print_success(&format!("Set {} = {}", key, value));
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}
