use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snipshell::client::EvalClient;
use snipshell::config::{ServerConfig, DEFAULT_PORT};
use snipshell::engine::{Engine, RecordingEngine};
use snipshell::session::SessionRegistry;
use snipshell::{api, db};

#[derive(Parser)]
#[command(name = "snipshell")]
#[command(about = "Evaluate code fragments and render a customizable feedback transcript")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the snipshell server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Send code or commands to a running server and print the transcript
    Eval {
        /// Code and commands, one command per line
        code: Option<String>,

        /// Read the input from a file instead
        #[arg(short, long, conflicts_with = "code")]
        file: Option<PathBuf>,

        /// Server base URL (overrides SNIPSHELL_URL)
        #[arg(long)]
        url: Option<String>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "snipshell=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting snipshell server on port {}", config.port);

    let db = match &config.database_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let engines = || -> Box<dyn Engine> { Box::new(RecordingEngine::new()) };
    let sessions = SessionRegistry::new(Arc::new(engines), Arc::new(db));
    let app = api::create_router(sessions, &config);

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("snipshell server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn eval(code: Option<String>, file: Option<PathBuf>, url: Option<String>) -> anyhow::Result<bool> {
    let code = match (code, file) {
        (_, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (Some(code), None) => code,
        (None, None) => anyhow::bail!("Nothing to evaluate: pass code or --file"),
    };

    let mut client = match url {
        Some(url) => EvalClient::new(url),
        None => EvalClient::from_env(),
    };
    let result = client.eval(&code).await?;
    print!("{}", result.message);
    client.end().await?;
    Ok(result.status)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port }) => serve(ServerConfig::from_env(port)).await?,
        Some(Commands::Eval { code, file, url }) => {
            if !eval(code, file, url).await? {
                std::process::exit(1);
            }
        }
        None => serve(ServerConfig::default()).await?,
    }

    Ok(())
}
