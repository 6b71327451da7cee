use clap::{Parser, Subcommand};
use freelance_api::{config::DEFAULT_CONFIG_PATH, logging, Config};
use freelance_core::Database;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "freelance-api")]
#[command(about = "Freelance marketplace REST API server")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to run the server on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create or upgrade the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    let _guard = logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            info!(port = config.server.port, "Starting freelance API server");
            freelance_api::start_server(config).await?;
        }
        Commands::Migrate => {
            let db = Database::open(&config.database.path)?;
            db.run_migrations()?;
            info!(path = %config.database.path.display(), "Database is up to date");
        }
    }
    Ok(())
}
