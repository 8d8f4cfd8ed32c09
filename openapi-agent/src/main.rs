use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use openapi_agent::config::{AgentDefinition, AgentLoader, AuthSettings, ModelConfig};
use openapi_agent::tools::openapi::{AuthConfig, OAuth2AuthorizationCode};
use openapi_agent::Session;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[derive(Parser)]
#[command(
    name = "openapi-agent",
    version,
    about = "Chat with an LLM agent that calls the Pet Store API for you"
)]
struct Cli {
    /// Agent definition (YAML)
    #[arg(long, env = "OPENAPI_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// OpenAPI document, as a file path or URL
    #[arg(long)]
    spec: Option<String>,

    /// Override the API base URL from the document's servers
    #[arg(long)]
    base_url: Option<String>,

    /// Gemini model name
    #[arg(long)]
    model: Option<String>,

    /// How the tools authenticate
    #[arg(long, value_enum)]
    auth: Option<AuthMode>,
}

#[derive(Clone, Copy, ValueEnum)]
enum AuthMode {
    None,
    ApiKey,
    Oauth2,
}

type StdinLines = Lines<BufReader<Stdin>>;

fn definition(cli: Cli) -> Result<AgentDefinition> {
    let mut definition = match &cli.config {
        Some(path) => AgentDefinition::from_file(path)
            .with_context(|| format!("loading agent config {}", path.display()))?,
        None => AgentDefinition::default(),
    };

    if let Some(location) = cli.spec {
        definition.spec.location = Some(location);
    }
    if let Some(base_url) = cli.base_url {
        definition.spec.base_url = Some(base_url);
    }
    if let Some(model) = cli.model {
        let ModelConfig::Gemini { name, .. } = &mut definition.model;
        *name = model;
    }
    match cli.auth {
        Some(AuthMode::None) => definition.auth = AuthSettings::None,
        Some(AuthMode::ApiKey) => definition.auth = AuthSettings::demo_api_key(),
        Some(AuthMode::Oauth2) => definition.auth = AuthSettings::default_oauth2(),
        None => {}
    }
    Ok(definition)
}

async fn prompt(lines: &mut StdinLines, text: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?)
}

async fn authorize(client: &OAuth2AuthorizationCode, lines: &mut StdinLines) -> Result<AuthConfig> {
    let state = OAuth2AuthorizationCode::new_state();
    let url = client.authorization_url(&state)?;

    println!("Open this URL in a browser and sign in:\n\n  {url}\n");
    let redirect = prompt(lines, "Paste the URL you were redirected to: ")
        .await?
        .context("stdin closed before the redirect URL was entered")?;

    let response = client.parse_redirect(&redirect, &state)?;
    let token = client.exchange_code(&response.code).await?;
    println!("Signed in.\n");
    Ok(token.into_auth_config())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("openapi_agent=info")),
        )
        .init();

    let definition = definition(Cli::parse())?;
    let loader = AgentLoader::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let model = loader.model(&definition.model)?;
    let spec = loader
        .load_spec(&definition.spec)
        .await
        .context("loading OpenAPI document")?;

    let auth = match loader.oauth2_client(&definition.auth, &spec)? {
        Some(client) => Some(authorize(&client, &mut lines).await?),
        None => loader.static_auth(&definition.auth)?,
    };

    let agent = loader.build_agent(&definition, model, spec, auth)?;
    let mut session = Session::new();
    println!(
        "{} ({}). Type 'exit' to quit.",
        agent.name(),
        agent.model_name()
    );

    while let Some(line) = prompt(&mut lines, "\n> ").await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        match agent.run(&mut session, input).await {
            Ok(reply) => println!("{reply}"),
            Err(e) => {
                tracing::error!(error = %e, "agent run failed");
                eprintln!("error: {e}");
            }
        }
    }

    agent.close().await;
    Ok(())
}
