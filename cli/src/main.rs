use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

mod commands;
mod logging;
mod utils;

use commands::{check, config, seed, serve};
use utils::env_paths::{get_environment, EnvPaths};
use utils::service_config::ServiceConfig;

/// Classgate - authorization service for classroom resources
#[derive(Parser)]
#[command(name = "classgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Interface to bind, overrides the configuration
        #[arg(long, env = "CLASSGATE_HOST")]
        host: Option<String>,

        /// Port to listen on, overrides the configuration
        #[arg(short, long, env = "CLASSGATE_PORT")]
        port: Option<u16>,

        /// Load the bundled demo data before serving
        #[arg(long)]
        seed_demo: bool,
    },

    /// Load resource rows into the database
    Seed {
        /// YAML seed file, the bundled demo data when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Evaluate one authorization request against the database
    ///
    /// Exits with status 0 when allowed and 2 when denied.
    Check {
        /// Principal id
        #[arg(long = "as", value_name = "ID")]
        principal_id: i64,

        /// Principal role (admin, teacher, student)
        #[arg(long)]
        role: String,

        /// Principal tier (free, enterprise)
        #[arg(long, default_value = "free")]
        tier: String,

        /// Principal school id
        #[arg(long)]
        school: Option<i64>,

        /// Resource kind (e.g. projects, team-members)
        kind: String,

        /// Resource id
        id: String,

        /// Action (e.g. read, delete, manage_team)
        action: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved configuration
    Show {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read a single configuration value
    Get {
        /// Configuration path (e.g., "server.port")
        path: String,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_paths = EnvPaths::load()?;
    let environment_name = get_environment();
    let service_config = match ServiceConfig::load(&env_paths, &environment_name) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        service_config.logging.level.clone()
    };
    // Only the long-running server writes a log file
    let logs_dir = match cli.command {
        Commands::Serve { .. } if service_config.logging.file => Some(env_paths.logs_path()),
        _ => None,
    };
    let _guard = logging::init_logging(logs_dir.as_deref(), &log_level)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            seed_demo,
        } => {
            serve::execute(&service_config, host, port, seed_demo).await?;
        }
        Commands::Seed { file } => {
            seed::execute(&service_config, file).await?;
        }
        Commands::Check {
            principal_id,
            role,
            tier,
            school,
            kind,
            id,
            action,
            format,
        } => {
            let request = check::CheckRequest {
                principal_id,
                role,
                tier,
                school,
                kind,
                id,
                action,
            };
            let outcome = check::execute(&service_config, request, &format).await?;
            if !outcome.allowed {
                std::process::exit(2);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                config::show(&service_config, &format)?;
            }
            ConfigAction::Get { path, format } => {
                config::get(&service_config, &path, &format)?;
            }
        },
    }

    Ok(())
}
