use anyhow::Result;
use clap::Parser;
use petstore_server::{ApiVariant, DemoCredentials, PetStoreServer};

#[derive(Parser)]
#[command(
    name = "petstore-server",
    version,
    about = "In-memory Pet Store API, optionally protected by a mock OAuth2 flow"
)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0:8000", env = "PETSTORE_BIND")]
    bind: String,

    /// Base URL clients use to reach this server
    #[arg(long, default_value = "http://127.0.0.1:8000", env = "PETSTORE_PUBLIC_URL")]
    public_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the pet endpoints without authentication
    Basic,
    /// Require OAuth2 bearer tokens on write endpoints and serve the mock authorization server
    Oauth {
        /// Username accepted by the login page
        #[arg(long, default_value = "user")]
        username: String,

        /// Password accepted by the login page
        #[arg(long, default_value = "password")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("petstore_server=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let builder = match cli.command {
        Command::Basic => PetStoreServer::builder(ApiVariant::Basic),
        Command::Oauth { username, password } => PetStoreServer::builder(ApiVariant::OAuth)
            .with_credentials(DemoCredentials::new(username, password)),
    };

    builder
        .with_public_url(cli.public_url)
        .build()
        .serve(cli.bind)
        .await?;

    Ok(())
}
