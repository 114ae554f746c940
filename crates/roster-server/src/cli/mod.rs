use clap::{Parser, Subcommand};

pub mod roles;
pub mod users;

pub use roles::RoleCommand;
pub use users::{CliError, ProfileCommand, UserCommand};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Roster user administration")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run database migrations
    Migrate,
    /// Create or update users as an administrator
    #[command(subcommand)]
    User(UserCommand),
    /// Update a user's own profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Inspect roles
    #[command(subcommand)]
    Role(RoleCommand),
}

#[derive(Debug, Clone)]
pub enum RunMode {
    Migrate,
    User(UserCommand),
    Profile(ProfileCommand),
    Role(RoleCommand),
}

impl From<Cli> for RunMode {
    fn from(cli: Cli) -> Self {
        match cli.command {
            Command::Migrate => Self::Migrate,
            Command::User(command) => Self::User(command),
            Command::Profile(command) => Self::Profile(command),
            Command::Role(command) => Self::Role(command),
        }
    }
}

pub fn parse_args() -> RunMode {
    Cli::parse().into()
}
