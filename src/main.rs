use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use challenge_board::{api, config::Config, db};

#[derive(Parser)]
#[command(name = "challenge-board")]
#[command(about = "Track startup challenges, their actions and who is on the hook")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Create an admin account, or reset an existing one
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Replace all challenges with demo data
    Seed,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "challenge_board=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<db::Database> {
    let path = config.database_path()?;
    tracing::debug!("Using database at {}", path.display());
    let db = db::Database::open(path)?;
    db.migrate()?;
    Ok(db)
}

async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting challenge board server on port {}", port);

    let db = open_database(&config)?;
    let app = api::create_router_with_config(db, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Challenge board listening on http://127.0.0.1:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env();

    match cli.command {
        Some(Commands::Serve { port }) => serve(config, port).await?,
        Some(Commands::CreateAdmin {
            email,
            name,
            password,
        }) => {
            let db = open_database(&config)?;
            let user = db.upsert_admin(&email, &name, &password)?;
            println!("Admin ready: {} <{}>", user.name, user.email);
        }
        Some(Commands::Seed) => {
            let db = open_database(&config)?;
            let today = chrono::Local::now().date_naive();
            let count = db.seed_demo_data(today)?;
            println!("Seeded {} challenges", count);
        }
        None => serve(config, 3000).await?,
    }

    Ok(())
}
