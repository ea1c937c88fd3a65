use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use bookshare_cli::{init_tracing, open_database, run_server, Config};

#[derive(Parser)]
#[command(name = "bookshare")]
#[command(about = "Bookshare - a class book-sharing library")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Database file (overrides BOOKSHARE_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Create or upgrade the database schema, then exit
    Migrate {
        /// Database file (overrides BOOKSHARE_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port, db } => {
            if let Some(port) = port {
                anyhow::ensure!(port != 0, "Port must be between 1 and 65535");
                config.port = port;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            run_server(config).await
        }
        Commands::Migrate { db } => {
            if let Some(db) = db {
                config.db_path = db;
            }
            let pool = open_database(&config).await?;
            pool.close().await;
            info!("Database ready at {}", config.db_path.display());
            Ok(())
        }
    }
}
