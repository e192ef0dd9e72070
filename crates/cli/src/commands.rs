//! CLI commands

use anyhow::{Context as _, Result};
use clap::{Subcommand, ValueEnum};
use examkit_core::{FileCredentialStore, StateDir};
use examkit_http::ApiClient;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config;

/// Shared inputs for every command
pub struct Context {
    pub state_dir: StateDir,
    pub config_file: Option<PathBuf>,
}

impl Context {
    /// Build an API client backed by the on-disk credential file
    fn client(&self) -> Result<ApiClient> {
        let config = config::load_client_config(self.config_file.as_deref(), &self.state_dir)?;
        let credentials = config::credentials_path(&config, &self.state_dir);
        let store = Arc::new(FileCredentialStore::new(credentials));
        Ok(ApiClient::from_config(&config, store)?)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session credentials
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "EXAMKIT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and forget the stored credentials
    Logout,

    /// Exchange the stored refresh token for a new access token
    Refresh,

    /// Show the current user
    Whoami,

    /// Look up master data
    Master {
        /// Which collection to query
        entity: MasterEntity,

        /// Fetch a single entry instead of the whole list
        #[arg(long)]
        id: Option<String>,
    },

    /// Generate an exam from a JSON parameter file
    GenerateExam {
        /// JSON file with the generation parameters
        #[arg(long)]
        body: PathBuf,
    },

    /// Upload a document
    Upload {
        /// File to upload
        file: PathBuf,

        /// MIME type of the file
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Output file path (defaults to examkit.toml in the config directory)
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MasterEntity {
    Grades,
    Subjects,
    Chapters,
    Lessons,
}

impl Commands {
    pub async fn execute(self, context: Context) -> Result<()> {
        match self {
            Commands::Login { email, password } => {
                let client = context.client()?;
                client.login(email, password).await?;
                println!("Logged in");
                Ok(())
            }
            Commands::Logout => {
                context.client()?.logout().await?;
                println!("Logged out");
                Ok(())
            }
            Commands::Refresh => {
                context.client()?.refresh_token().await?;
                println!("Access token refreshed");
                Ok(())
            }
            Commands::Whoami => {
                let me: Value = context.client()?.me().await?;
                print_json(&me)
            }
            Commands::Master { entity, id } => {
                let client = context.client()?;
                let resource = match entity {
                    MasterEntity::Grades => client.grades::<Value>(),
                    MasterEntity::Subjects => client.subjects::<Value>(),
                    MasterEntity::Chapters => client.chapters::<Value>(),
                    MasterEntity::Lessons => client.lessons::<Value>(),
                };
                let result = match id {
                    Some(id) => resource.get(id).await?,
                    None => Value::Array(resource.list_all().await?),
                };
                print_json(&result)
            }
            Commands::GenerateExam { body } => {
                let content = tokio::fs::read_to_string(&body)
                    .await
                    .with_context(|| format!("failed to read {}", body.display()))?;
                let params: Value = serde_json::from_str(&content)
                    .with_context(|| format!("{} is not valid JSON", body.display()))?;
                let exam: Value = context.client()?.generate_exam(&params).await?;
                print_json(&exam)
            }
            Commands::Upload { file, mime } => upload(context, file, mime).await,
            Commands::Config { command } => command.execute(&context.state_dir),
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, state_dir: &StateDir) -> Result<()> {
        match self {
            ConfigCommands::Init { output } => {
                let config_path = output.unwrap_or_else(|| state_dir.config_path());
                config::generate_default_config(&config_path)?;
                println!("Generated configuration at: {}", config_path.display());
                Ok(())
            }
        }
    }
}

async fn upload(context: Context, file: PathBuf, mime: String) -> Result<()> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("{} has no usable file name", file.display()))?;
    let contents = tokio::fs::read(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    info!("Uploading {} ({} bytes)", file.display(), contents.len());
    let uploaded = context
        .client()?
        .upload_document(file_name, contents, &mime)
        .await?;
    println!("{}", uploaded.url);
    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
