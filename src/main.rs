//! Inspect and exercise REST client configuration.
//!
//! ```text
//! rest-client-config validate --config clients.toml
//! rest-client-config resolve  --config clients.toml --prefix echo
//! rest-client-config get      --config clients.toml --prefix echo /hello --query name=world
//! ```
//!
//! Environment variables override the file's `[properties]`, so
//! `ECHO_MP_REST_URL=http://staging:8080` redirects the `echo` client.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rest_client_config::config::{load_config, ConfigError};
use rest_client_config::{RestClientBase, RestClientContext, ReqwestClientBuilder, SettingsRecorder};

#[derive(Parser)]
#[command(name = "rest-client-config")]
#[command(about = "Resolve and test REST client configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a configuration file and report every problem
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the effective settings of one client as JSON
    Resolve(ClientArgs),
    /// Build a client and perform a GET request
    Get {
        #[command(flatten)]
        client: ClientArgs,

        /// Path relative to the base URL
        path: String,

        /// Query parameter, `key=value`; repeat for multiple values
        #[arg(short, long = "query")]
        query: Vec<String>,
    },
}

#[derive(Args)]
struct ClientArgs {
    #[arg(short, long)]
    config: PathBuf,

    /// Configuration prefix of the client
    #[arg(short, long)]
    prefix: String,

    /// Interface name for legacy lookups (defaults to the prefix)
    #[arg(short, long)]
    interface: Option<String>,

    /// Declared base URI, used when configuration provides none
    #[arg(short, long)]
    base_uri: Option<String>,
}

impl ClientArgs {
    fn base(&self, context: &RestClientContext) -> RestClientBase {
        let interface = self.interface.as_deref().unwrap_or(&self.prefix);
        RestClientBase::new(context, interface, Some(&self.prefix))
            .with_base_uri(self.base_uri.as_deref())
    }

    fn context(&self) -> Result<RestClientContext, ConfigError> {
        Ok(RestClientContext::from_config_file(load_config(&self.config)?))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rest_client_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => match load_config(&config) {
            Ok(_) => println!("{}: ok", config.display()),
            Err(ConfigError::Validation(errors)) => {
                for error in &errors {
                    eprintln!("{}", error);
                }
                return Err(format!("{} validation error(s)", errors.len()).into());
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Resolve(args) => {
            let context = args.context()?;
            let base = args.base(&context);
            let scope = base.resolve_scope()?;
            let settings = base.build(SettingsRecorder::new())?;
            let output = serde_json::json!({
                "prefix": base.prefix(),
                "scope": scope,
                "settings": settings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Get { client, path, query } => {
            let context = client.context()?;
            let rest_client = client.base(&context).build(ReqwestClientBuilder::new())?;

            let mut params = Vec::with_capacity(query.len());
            for pair in &query {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected key=value, found '{}'", pair))?;
                params.push((key, value));
            }

            let response = rest_client.get(&path, &params).await?;
            let status = response.status();
            let body = response.text().await?;
            println!("{}", status);
            println!("{}", body);
        }
    }

    Ok(())
}
