use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use roster_core::{
    Identity, OperationFailed, Password, PhotoUpload, ProfileInput, RoleId, UserId, UserInput,
    UserWriteError,
};
use serde_json::json;
use thiserror::Error;

use crate::app::AppState;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("photo file not readable ({path}): {source}")]
    Photo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Write(#[from] UserWriteError),
    #[error(transparent)]
    Profile(OperationFailed),
    #[error("database error: {0}")]
    Db(#[from] sqlx_core::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx_core::migrate::MigrateError),
    #[error("output encoding failed: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Args)]
pub struct FieldArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// New password; empty keeps the current one
    #[arg(long)]
    pub password: Option<String>,
    /// Image file to store as the user's photo
    #[arg(long, value_name = "file")]
    pub photo: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum UserCommand {
    /// Create a user
    Create(CreateArgs),
    /// Update a user; the role list replaces the current membership
    Update(UpdateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub fields: FieldArgs,
    /// Role id to assign (repeatable)
    #[arg(long = "role", value_name = "id")]
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, Args)]
pub struct UpdateArgs {
    pub id: UserId,
    #[command(flatten)]
    pub fields: FieldArgs,
    /// Role id to keep or assign (repeatable); omit to clear all roles
    #[arg(long = "role", value_name = "id")]
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfileCommand {
    /// Update the profile of the given user, acting as that user
    Update(ProfileArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ProfileArgs {
    #[arg(long = "as", value_name = "id")]
    pub actor: UserId,
    #[command(flatten)]
    pub fields: FieldArgs,
}

async fn read_photo(path: Option<&Path>) -> Result<Option<PhotoUpload>, CliError> {
    let Some(path) = path else {
        return Ok(None);
    };
    tokio::fs::read(path)
        .await
        .map(|bytes| Some(PhotoUpload::new(bytes)))
        .map_err(|source| CliError::Photo {
            path: path.to_path_buf(),
            source,
        })
}

async fn user_input(fields: &FieldArgs, roles: &[RoleId]) -> Result<UserInput, CliError> {
    Ok(UserInput {
        name: fields.name.clone(),
        email: fields.email.clone(),
        phone: fields.phone.clone(),
        password: fields.password.clone().map(Password::from),
        role_ids: Some(roles.to_vec()),
        photo: read_photo(fields.photo.as_deref()).await?,
    })
}

async fn profile_input(fields: &FieldArgs) -> Result<ProfileInput, CliError> {
    Ok(ProfileInput {
        name: fields.name.clone(),
        email: fields.email.clone(),
        phone: fields.phone.clone(),
        password: fields.password.clone().map(Password::from),
        photo: read_photo(fields.photo.as_deref()).await?,
    })
}

/// Runs a user command and returns the JSON document to print.
pub async fn run_user(state: &AppState, command: &UserCommand) -> Result<String, CliError> {
    match command {
        UserCommand::Create(args) => {
            let input = user_input(&args.fields, &args.roles).await?;
            state.users.create(&input).await?;
            Ok(serde_json::to_string_pretty(&json!({ "status": "created" }))?)
        }
        UserCommand::Update(args) => {
            let input = user_input(&args.fields, &args.roles).await?;
            let user = state.users.update(args.id, &input).await?;
            Ok(serde_json::to_string_pretty(&user)?)
        }
    }
}

pub async fn run_profile(state: &AppState, command: &ProfileCommand) -> Result<String, CliError> {
    match command {
        ProfileCommand::Update(args) => {
            let input = profile_input(&args.fields).await?;
            let user = state
                .users
                .update_own_profile(&Identity::new(args.actor), &input)
                .await
                .into_result()
                .map_err(CliError::Profile)?;
            Ok(serde_json::to_string_pretty(&user)?)
        }
    }
}

pub async fn migrate(db: &roster_db::SqlitePool) -> Result<String, CliError> {
    roster_db::migrate(db).await?;
    tracing::info!(event = "migrations_applied", "Migrations applied");
    Ok(serde_json::to_string_pretty(&json!({ "status": "migrated" }))?)
}
