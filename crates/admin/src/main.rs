// admin/main.rs - provisions the application user and indexes for the ai_agent_db database

use clap::{Parser, Subcommand};
use database::{connection, Bootstrap};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::time::Duration;
use tracing::subscriber::set_global_default;
use tracing::{error, info};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

mod config;
mod status;

use config::Config;

#[derive(Parser, Debug)]
#[clap(name = "admin")]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommands,
    #[arg(short, long, env = "ENVIRONMENT", default_value = "local")]
    environment: String,
    #[arg(long, env = "ADMIN_CONFIG", default_value = "./crates/admin/config.toml")]
    config: PathBuf,
    /// Needs privileges to create users and indexes on the target database
    #[arg(
        long,
        env = "DATABASE_URI",
        default_value = "mongodb://localhost:27017"
    )]
    database_uri: String,
    /// Overrides database_name from the config file
    #[arg(long, env = "DATABASE_NAME")]
    database_name: Option<String>,
    /// Overrides app_user from the config file
    #[arg(long, env = "APP_DB_USER")]
    app_user: Option<String>,
    #[arg(long, env = "APP_DB_PASSWORD", hide_env_values = true)]
    app_password: Option<String>,
    #[arg(long, env = "SERVER_SELECTION_TIMEOUT_SECS", default_value_t = 5)]
    server_selection_timeout_secs: u64,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Create the application user, then every index
    #[clap(name = "init-db")]
    InitDatabase,
    /// Create the indexes only; existing identical indexes are left alone
    #[clap(name = "create-indexes")]
    CreateIndexes,
    /// Compare the user's role and the indexes on the server against the declarations
    #[clap(name = "verify")]
    Verify,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse CLI args, using ENV vars if not provided
    let args = Args::parse();

    init_tracing()?;

    run(args).await.map_err(|e| {
        error!("{}", e);
        e
    })
}

fn init_tracing() -> Result<(), String> {
    LogTracer::init().map_err(|e| format!("Failed to set log tracer: {}", e))?;

    let env_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| format!("Invalid log filter: {}", e))?;
    let fmt_layer = fmt::layer().with_target(true);
    let subscriber = Registry::default().with(env_layer).with(fmt_layer);

    set_global_default(subscriber).map_err(|e| format!("Failed to set tracing subscriber: {}", e))
}

async fn run(args: Args) -> Result<(), String> {
    let config = Config::load(&args.config)?;
    let environment = config.environment(&args.environment)?;
    environment.admin_ui()?;

    let database_name = args
        .database_name
        .unwrap_or_else(|| environment.database_name.clone());
    let app_user = args
        .app_user
        .unwrap_or_else(|| environment.app_user.clone());

    let client = connection::connect(
        &args.database_uri,
        Duration::from_secs(args.server_selection_timeout_secs),
    )
    .await
    .map_err(|e| e.to_string())?;

    let bootstrap = Bootstrap::new(client.database(&database_name), &app_user);

    match args.subcommand {
        Subcommands::InitDatabase => {
            let password = args
                .app_password
                .ok_or("APP_DB_PASSWORD or --app-password is required for init-db")?;

            info!(
                "Initializing {} for the {} environment.",
                database_name, args.environment
            );
            let summary = bootstrap.run(&password).await.map_err(|e| e.to_string())?;

            for line in status::completion_lines(&summary, &environment.admin_ui_url) {
                println!("{}", line);
            }
        }
        Subcommands::CreateIndexes => {
            bootstrap.select_database().await.map_err(|e| e.to_string())?;
            bootstrap.create_indexes().await.map_err(|e| e.to_string())?;

            info!("Finished creating indexes on {}.", database_name);
        }
        Subcommands::Verify => {
            let verification = bootstrap.verify().await.map_err(|e| e.to_string())?;

            let report = serde_json::to_string_pretty(&verification)
                .map_err(|e| format!("Failed to render report: {}", e))?;
            println!("{}", report);

            verification.check().map_err(|e| e.to_string())?;
            info!("{} matches its declarations.", database_name);
        }
    }

    Ok(())
}
