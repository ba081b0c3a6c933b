//! todos — command-line front end for the todo lists stores.
//!
//! Picks one backend per invocation and runs a single command against it:
//! - Storage: SQLite file (default) or the session-backed store, whose session
//!   is kept in a JSON file between runs.
//! - Auth: `login` checks credentials against the SQLite users table;
//!   `add-user` provisions them.
//!
//! Run:
//! ```bash
//! cargo run -p todos-cli -- new-list Groceries
//! STORAGE_PROVIDER=memory cargo run -p todos-cli -- lists
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod commands;
mod config;
mod session_file;

use std::env;
use std::process;

use domain::adapters::session_store::SessionStore;
use sqlite_adapter::SqliteStore;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{execute, Command, USAGE};
use crate::config::{Config, LogFormat, StorageProvider};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    if let Err(msg) = run(&cfg).await {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}

async fn run(cfg: &Config) -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let output = match cfg.storage_provider {
        StorageProvider::Sqlite => {
            let mut store = open_sqlite(cfg)?;
            match command {
                Command::AddUser { username, password } => {
                    store
                        .provision_user(&username, &password, cfg.bcrypt_cost)
                        .await
                        .map_err(|e| e.to_string())?;
                    format!("User {} provisioned.", username)
                }
                other => execute(&mut store, other).await?,
            }
        }
        StorageProvider::Memory => {
            if matches!(command, Command::AddUser { .. }) {
                return Err("add-user requires STORAGE_PROVIDER=sqlite".into());
            }
            let mut session = session_file::load(&cfg.session_path)?;
            let output = {
                let mut store = SessionStore::new(&mut session);
                execute(&mut store, command).await?
            };
            session_file::save(&cfg.session_path, &session)?;
            output
        }
    };

    println!("{}", output);
    Ok(())
}

fn open_sqlite(cfg: &Config) -> Result<SqliteStore, String> {
    let store = SqliteStore::create(&cfg.db_path).map_err(|e| e.to_string())?;
    info!(path = %store.path().display(), "using sqlite store");
    Ok(store)
}

fn init_tracing(cfg: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}
