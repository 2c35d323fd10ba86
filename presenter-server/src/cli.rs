//! `users add/remove/list` supervisor CLI (spec §6). Grounded on the
//! `clap::Parser` derive style of `ferrex-server`'s `Args`, generalized from
//! a single flat struct to a subcommand enum because this surface has more
//! than one verb.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use presenter_core::config::data_dir;
use presenter_core::error::AppError;
use presenter_core::stores::UserStore;

use crate::state::APP_ID;

#[derive(Parser, Debug)]
#[command(name = "presenter-server")]
#[command(about = "Authenticated reverse-proxy and live slide-viewer fan-out in front of a rehearsal presentation application")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the OAuth allow-list without going through the admin UI.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersAction {
    Add {
        email: String,
        #[arg(long)]
        admin: bool,
    },
    Remove {
        email: String,
    },
    List,
}

/// Runs a `users` subcommand against the on-disk allow-list and returns the
/// process exit code (spec §6: 0 success, 1 user error, 2 internal error).
/// Never starts the HTTP server.
pub fn run_users_command(action: UsersAction) -> ExitCode {
    let dir: PathBuf = data_dir(APP_ID);
    let store = match UserStore::open(&dir) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("presenter-server: failed to open user store: {err}");
            return ExitCode::from(2);
        }
    };

    let result = match action {
        UsersAction::Add { email, admin } => add_user(&store, &email, admin),
        UsersAction::Remove { email } => store.remove(&email),
        UsersAction::List => {
            for user in store.list_all() {
                let marker = if store.is_admin(&user.email) { " (admin)" } else { "" };
                println!("{}{}", user.email, marker);
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::BadRequest(msg)) | Err(AppError::NotFound(msg)) => {
            eprintln!("presenter-server: {msg}");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("presenter-server: {err}");
            ExitCode::from(2)
        }
    }
}

fn add_user(store: &UserStore, email: &str, admin: bool) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::bad_request("email is required"));
    }
    store.add(email)?;
    if admin {
        store.set_admin(email, true)?;
    }
    Ok(())
}
