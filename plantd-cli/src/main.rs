///! PlantD CLI
///!
///! Command-line studio for PlantD resources and dashboards

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plantd_cli::api::ApiClient;
use plantd_cli::config::Config;
use plantd_cli::logging::LoggingConfig;
use plantd_cli::output::OutputFormat;
use plantd_common::ResourceKind;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API server address (defaults to the configured server)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(long, global = true)]
    output: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resources of a kind
    List {
        kind: ResourceKind,
        /// Only show resources in this namespace
        #[arg(short, long)]
        namespace: Option<String>,
        /// Poll every SECS seconds until interrupted
        #[arg(short, long, value_name = "SECS", default_value_t = 0)]
        watch: u64,
        /// Sort by column (namespace, name)
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Show one resource
    Get {
        kind: ResourceKind,
        /// `<namespace> <name>`, `<namespace>/<name>` or just `<name>`
        #[arg(num_args = 1..=2, required = true)]
        target: Vec<String>,
    },
    /// Create a resource from defaults or a form file
    Create {
        kind: ResourceKind,
        /// YAML form to submit instead of opening an editor
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Create a new resource starting from an existing one
    Clone {
        kind: ResourceKind,
        #[arg(num_args = 1..=2, required = true)]
        target: Vec<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Edit an existing resource
    Edit {
        kind: ResourceKind,
        #[arg(num_args = 1..=2, required = true)]
        target: Vec<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete a resource
    Delete {
        kind: ResourceKind,
        #[arg(num_args = 1..=2, required = true)]
        target: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Import resources from a ZIP archive
    Import { file: PathBuf },
    /// Export resources to an archive
    Export {
        /// Destination file
        #[arg(short, long)]
        output_file: PathBuf,
        /// Resources as `<kind>/<namespace>/<name>` (`namespace/<name>` for namespaces)
        #[arg(required = true)]
        resources: Vec<String>,
    },
    /// Render a dashboard definition
    Dashboard {
        file: PathBuf,
        /// Seconds between refreshes, 0 for manual only (overrides the file)
        #[arg(short, long, value_name = "SECS")]
        refresh: Option<u64>,
        /// Render once and exit
        #[arg(long)]
        once: bool,
    },
    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Set a configuration key
    Set { key: String, value: String },
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_default();

    let _log_guard = LoggingConfig::resolve(cli.log_level.as_deref(), config.log_dir.clone())
        .init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let server = cli.server.clone().unwrap_or_else(|| config.default_server.clone());
    let output = OutputFormat::parse(cli.output.as_deref().unwrap_or(&config.default_output));
    let api = ApiClient::new(&server, Duration::from_secs(config.timeout))?;
    tracing::debug!(server = %api.base_url(), "using server");
    let ctx = commands::Context::new(api, output, config.default_namespace.clone());

    match cli.command {
        Commands::List {
            kind,
            namespace,
            watch,
            sort,
            desc,
        } => commands::resource::list(&ctx, kind, namespace, watch, sort, desc).await?,
        Commands::Get { kind, target } => commands::resource::get(&ctx, kind, &target).await?,
        Commands::Create { kind, file } => {
            commands::resource::edit(&ctx, kind, "create", &[], file).await?
        }
        Commands::Clone { kind, target, file } => {
            commands::resource::edit(&ctx, kind, "clone", &target, file).await?
        }
        Commands::Edit { kind, target, file } => {
            commands::resource::edit(&ctx, kind, "edit", &target, file).await?
        }
        Commands::Delete { kind, target, yes } => {
            commands::resource::delete(&ctx, kind, &target, yes).await?
        }
        Commands::Import { file } => commands::bulk::import(&ctx, &file).await?,
        Commands::Export {
            output_file,
            resources,
        } => commands::bulk::export(&ctx, &output_file, &resources).await?,
        Commands::Dashboard {
            file,
            refresh,
            once,
        } => commands::dashboard::run(&ctx, &file, refresh, once).await?,
        Commands::Config { command } => {
            commands::config::handle_config_command(command, &mut config, output)?
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
