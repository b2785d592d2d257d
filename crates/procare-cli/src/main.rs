//! procare-setup - command-line front end for the Procare integration setup.
//!
//! Looks up Procare resources for an IKN, lists and connects integrations,
//! and turns a saved integration into the payload the setup screen submits.
//!
//! Settings come from `~/.config/procare-setup/config.json`; the global flags
//! (or their `PROCARE_SETUP_*` environment variables) override the file.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use procare_core::models::ProcareItemResponse;
use procare_core::{
    ApiClient, ApiError, Config, IntegrationDataSource, ProcareSetup, SettingsFormModel,
    StorageScope,
};

#[derive(Parser, Debug)]
#[command(name = "procare-setup")]
#[command(about = "Procare integration setup against the business API")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

// Overrides for the saved configuration. Empty values are ignored.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Business API base URL
    #[arg(long, global = true, env = "PROCARE_SETUP_BASE_URL")]
    base_url: Option<String>,

    /// Business the setup runs for
    #[arg(long, global = true, env = "PROCARE_SETUP_BUSINESS_ID")]
    business_id: Option<String>,

    /// Feature the custom fields and child statuses belong to
    #[arg(long, global = true, env = "PROCARE_SETUP_FEATURE_ID")]
    feature_id: Option<String>,

    /// Bearer token for the business API
    #[arg(long, global = true, env = "PROCARE_SETUP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Store integrations on the business rather than the signed-in user
    #[arg(long, global = true)]
    business_scoped: bool,
}

impl ConfigArgs {
    fn apply(self, config: &mut Config) {
        fn set(target: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                *target = Some(value);
            }
        }

        set(&mut config.base_url, self.base_url);
        set(&mut config.business_id, self.business_id);
        set(&mut config.feature_id, self.feature_id);
        set(&mut config.token, self.token);
        if self.business_scoped {
            config.business_scoped = true;
        }
    }
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// List connected integrations
    Integrations,
    /// Store a new integration
    Connect { provider: String, code: String },
    /// Show Procare config and schools
    Schools { ikn: String },
    /// Show classrooms of a school
    Classrooms { ikn: String, school_id: String },
    /// Show accounts of a school
    Accounts { ikn: String, school_id: String },
    /// Build the settings payload from a saved integration
    Export { path: PathBuf },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn api_client(config: &Config) -> Result<ApiClient> {
    let client = ApiClient::new(config.base_url()).context("Failed to create API client")?;
    Ok(match config.token {
        Some(ref token) => client.with_token(token.clone()),
        None => client,
    })
}

/// Procare lookups only need the IKN; business and feature ids may be unset.
fn setup_for(client: ApiClient, config: &Config) -> ProcareSetup<ApiClient> {
    ProcareSetup::new(
        client,
        config.business_id.clone().unwrap_or_default(),
        config.feature_id.clone().unwrap_or_default(),
    )
}

/// Report an API failure the way the setup screen would, as field errors.
fn report_setup_error(setup: &mut ProcareSetup<ApiClient>, err: ApiError) -> Result<()> {
    setup.handle_error(err)?;
    if let Some(field) = setup.take_scroll_target() {
        eprintln!("First invalid field: {}", field);
    }
    for (field, message) in setup.server_errors() {
        eprintln!("{}: {}", field, message);
    }
    Err(anyhow::anyhow!("Request rejected"))
}

fn integration_source(client: ApiClient, config: &Config) -> Result<IntegrationDataSource<ApiClient>> {
    let business_id = if config.business_scoped {
        config.require_business_id()?
    } else {
        ""
    };
    let scope = StorageScope::from_flag(config.business_scoped, business_id);
    Ok(IntegrationDataSource::new(client, scope))
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let client = api_client(config)?;

    match command {
        Command::Integrations => {
            let source = integration_source(client, config)?;
            print_json(&source.list().await?)
        }
        Command::Connect { provider, code } => {
            let source = integration_source(client, config)?;
            print_json(&source.store(&provider, &code).await?)
        }
        Command::Schools { ikn } => {
            let mut setup = setup_for(client, config);
            match setup.load_procare_data(&ikn).await {
                Ok(()) => print_json(setup.procare_data()),
                Err(e) => report_setup_error(&mut setup, e),
            }
        }
        Command::Classrooms { ikn, school_id } => {
            let mut setup = setup_for(client, config);
            match setup.classrooms(&ikn, &school_id).await {
                Ok(rooms) => print_json(&rooms),
                Err(e) => report_setup_error(&mut setup, e),
            }
        }
        Command::Accounts { ikn, school_id } => {
            let mut setup = setup_for(client, config);
            match setup.accounts(&ikn, &school_id).await {
                Ok(accounts) => print_json(&accounts),
                Err(e) => report_setup_error(&mut setup, e),
            }
        }
        Command::Export { path } => {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let saved: ProcareItemResponse = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse saved integration in {}", path.display()))?;

            let mut setup = ProcareSetup::new(
                client,
                config.require_business_id()?.to_string(),
                config.require_feature_id()?.to_string(),
            );
            if let Err(e) = setup.load_option_sets().await {
                return report_setup_error(&mut setup, e);
            }

            let mut form = SettingsFormModel::new();
            let values = form.import_data(&saved, setup.option_sets());
            form.set_values(values);
            if !form.validate_all() {
                for (field, message) in form.errors() {
                    eprintln!("{}: {}", field.as_str(), message);
                }
            }
            print_json(&form.export_data())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    cli.overrides.apply(&mut config);
    info!(base_url = config.base_url(), business_scoped = config.business_scoped, "procare-setup starting");

    run(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["procare-setup", "connect", "procare", "auth-code"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Connect { provider: "procare".into(), code: "auth-code".into() }
        );

        let cli = Cli::try_parse_from(["procare-setup", "classrooms", "IKN1", "S1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Classrooms { ikn: "IKN1".into(), school_id: "S1".into() }
        );

        let cli = Cli::try_parse_from(["procare-setup", "export", "saved.json"]).unwrap();
        assert_eq!(cli.command, Command::Export { path: PathBuf::from("saved.json") });
    }

    #[test]
    fn test_missing_and_extra_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["procare-setup", "accounts", "IKN1"]).is_err());
        assert!(Cli::try_parse_from(["procare-setup", "schools", "IKN1", "extra"]).is_err());
        assert!(Cli::try_parse_from(["procare-setup", "unknown"]).is_err());
        assert!(Cli::try_parse_from(["procare-setup"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "procare-setup",
            "integrations",
            "--business-id",
            "b1",
            "--business-scoped",
        ])
        .unwrap();
        assert_eq!(cli.command, Command::Integrations);
        assert_eq!(cli.overrides.business_id.as_deref(), Some("b1"));
        assert!(cli.overrides.business_scoped);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = Config {
            base_url: Some("https://file.test".into()),
            business_id: Some("file-biz".into()),
            feature_id: Some("file-feature".into()),
            ..Default::default()
        };
        let overrides = ConfigArgs {
            business_id: Some("flag-biz".into()),
            feature_id: Some(String::new()),
            token: Some("secret".into()),
            ..Default::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.base_url(), "https://file.test");
        assert_eq!(config.business_id.as_deref(), Some("flag-biz"));
        assert_eq!(config.feature_id.as_deref(), Some("file-feature"));
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert!(!config.business_scoped);
    }

    #[test]
    fn test_business_scope_requires_business_id() {
        let client = ApiClient::new("https://example.test/api").unwrap();
        let config = Config { business_scoped: true, ..Default::default() };
        assert!(integration_source(client.clone(), &config).is_err());

        let config = Config {
            business_scoped: true,
            business_id: Some("b1".into()),
            ..Default::default()
        };
        let source = integration_source(client.clone(), &config).unwrap();
        assert_eq!(source.scope(), &StorageScope::Business { business_id: "b1".into() });

        let source = integration_source(client, &Config::default()).unwrap();
        assert_eq!(source.scope(), &StorageScope::User);
    }
}
