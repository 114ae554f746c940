#![deny(clippy::unwrap_used)]

use roster_server::cli::{self, RunMode};
use roster_server::{bootstrap, runtime, settings};

#[tokio::main]
async fn main() {
    let run_mode = cli::parse_args();
    runtime::init_tracing();
    let settings = settings::Settings::from_env();
    bootstrap::log_startup(&settings);

    let db = match bootstrap::connect_db(&settings).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(event = "db_connect_failed", error = %err);
            std::process::exit(1);
        }
    };

    let result = match run_mode {
        RunMode::Migrate => cli::users::migrate(&db).await,
        RunMode::Role(command) => cli::roles::run_role(&db, &command).await,
        RunMode::User(command) => {
            let state = bootstrap::build_state(&settings, db);
            cli::users::run_user(&state, &command).await
        }
        RunMode::Profile(command) => {
            let state = bootstrap::build_state(&settings, db);
            cli::users::run_profile(&state, &command).await
        }
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
