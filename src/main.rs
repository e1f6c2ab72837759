use std::path::PathBuf;
use std::sync::Arc;

use authsession::config::normalize_base_url;
use authsession::{
    ApiError, AuthError, AuthGateway, ConfigError, Credentials, FileTokenStore, HttpAuthApi, ProfileUpdate,
    SessionConfig, SessionState,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not logged in; run `authsession login` first")]
    NotLoggedIn,
    #[error("--data must be a JSON object")]
    InvalidUpdate,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "authsession", about = "Log in to the account API and manage the stored session")]
struct Cli {
    /// Overrides `AUTH_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `AUTH_STORE_PATH`.
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a session and store it.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Re-validate the stored session and print it.
    Whoami,
    /// Update the current user's profile.
    Update {
        #[arg(long, help = "JSON object of fields to change")]
        data: String,
    },
    /// Forget the stored session.
    Logout,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = SessionConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = normalize_base_url(&base_url)?;
    }
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    let store = Arc::new(FileTokenStore::new(config.store_path.clone(), config.storage_key.clone()));
    let session = Arc::new(SessionState::new(store));
    let api = Arc::new(HttpAuthApi::new(&config.api)?);
    let gateway = AuthGateway::new(api, session.clone());

    match cli.command {
        Command::Login { email, password } => {
            let user = gateway.login(&Credentials::new(email, password)).await?;
            print_json(&user.into_value())
        }
        Command::Whoami => {
            session.initialize(&gateway).await;
            print_json(&serde_json::to_value(session.snapshot())?)
        }
        Command::Update { data } => {
            let update = ProfileUpdate::from_value(serde_json::from_str::<Value>(&data)?).ok_or(CliError::InvalidUpdate)?;
            session.initialize(&gateway).await;
            if !session.snapshot().authenticated {
                return Err(CliError::NotLoggedIn);
            }
            let user = gateway.update_profile(&update).await?;
            print_json(&user.into_value())
        }
        Command::Logout => {
            gateway.logout();
            eprintln!("logged out");
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
