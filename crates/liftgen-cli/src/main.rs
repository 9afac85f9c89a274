mod config;
mod generate_cmd;
mod serve_cmd;
mod show_cmd;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use liftgen_core::store::PgStore;
use liftgen_db::pool;

use config::{CliOverrides, LiftgenConfig};
use generate_cmd::GenerateArgs;

#[derive(Parser)]
#[command(name = "liftgen", about = "LLM-backed workout plan generator")]
struct Cli {
    /// Database URL (overrides LIFTGEN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Model name (overrides LIFTGEN_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a liftgen config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/liftgen")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the liftgen database and run migrations
    DbInit,
    /// Generate and store a workout
    Generate {
        /// User ID the workout belongs to
        #[arg(long)]
        user: Uuid,
        /// Muscle group to target (repeat for several)
        #[arg(long = "muscle", required = true)]
        muscles: Vec<String>,
        /// Workout focus (repeat for several)
        #[arg(long = "focus", required = true)]
        focus: Vec<String>,
        /// Number of exercises
        #[arg(long, default_value_t = 4)]
        count: u32,
        /// Free-text special instructions (max 140 characters)
        #[arg(long)]
        instructions: Option<String>,
        /// Print the prompt without calling the model or the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show a user's standing against the daily generation limit
    Quota {
        /// User ID to check
        #[arg(long)]
        user: Uuid,
    },
    /// Show a stored workout
    Show {
        /// Workout ID
        workout_id: String,
    },
    /// Serve the generation API over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Execute the `liftgen init` command: write config file.
fn cmd_init(db_url: &str, model: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
            max_connections: None,
        },
        generation: config::GenerationSection {
            model: model.map(str::to_string),
            ..Default::default()
        },
    };

    config::save_config_to(&cfg, &path)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if let Some(model) = model {
        println!("  generation.model = {model}");
    }
    println!();
    println!("Set LIFTGEN_API_KEY (or OPENAI_API_KEY), or add generation.api_key to the file.");
    println!("Next: run `liftgen db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `liftgen db-init` command: create database and run migrations.
async fn cmd_db_init(config: &LiftgenConfig) -> anyhow::Result<()> {
    println!("Initializing liftgen database...");

    pool::ensure_database_exists(&config.db_config).await?;
    let db_pool = pool::create_pool(&config.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("liftgen db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let overrides = CliOverrides {
        database_url: cli.database_url.clone(),
        model: cli.model.clone(),
    };

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, cli.model.as_deref(), force)?;
        }
        Commands::DbInit => {
            let resolved = LiftgenConfig::resolve(&overrides)?;
            cmd_db_init(&resolved).await?;
        }
        Commands::Generate {
            user,
            muscles,
            focus,
            count,
            instructions,
            dry_run,
        } => {
            let resolved = LiftgenConfig::resolve(&overrides)?;
            let args = GenerateArgs {
                user,
                muscles,
                focus,
                count,
                instructions,
                dry_run,
            };
            generate_cmd::run_generate(&resolved, args).await?;
        }
        Commands::Quota { user } => {
            let resolved = LiftgenConfig::resolve(&overrides)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgStore::new(db_pool.clone());
            let result = show_cmd::run_quota(&store, user).await;
            db_pool.close().await;
            result?;
        }
        Commands::Show { workout_id } => {
            let id = Uuid::parse_str(&workout_id)
                .with_context(|| format!("invalid workout ID: {workout_id}"))?;
            let resolved = LiftgenConfig::resolve(&overrides)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgStore::new(db_pool.clone());
            let result = show_cmd::run_show(&store, id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = LiftgenConfig::resolve(&overrides)?;
            serve_cmd::run_serve(&resolved, &bind, port).await?;
        }
    }

    Ok(())
}
