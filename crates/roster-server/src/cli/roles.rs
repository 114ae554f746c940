use clap::Subcommand;
use roster_db::repo::RoleRepo;
use roster_db::SqlitePool;

use super::CliError;

#[derive(Debug, Clone, Subcommand)]
pub enum RoleCommand {
    /// List the roles users can be assigned
    List,
}

pub async fn run_role(db: &SqlitePool, command: &RoleCommand) -> Result<String, CliError> {
    match command {
        RoleCommand::List => {
            let mut conn = db.acquire().await?;
            let roles = RoleRepo::new(&mut *conn).list().await?;
            Ok(serde_json::to_string_pretty(&roles)?)
        }
    }
}
