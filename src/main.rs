use clap::Parser;
use commands::{handle_auth_commands, handle_roster_commands, handle_runtime_commands};
use env_logger::Env;

mod cli;
mod commands;
mod domain;
mod error;
mod services;

pub use cli::*;
pub use domain::constants::*;
pub use domain::models::*;
pub use error::*;
pub use services::auth::*;
pub use services::export::*;
pub use services::import::*;
pub use services::output::*;
pub use services::policy::*;
pub use services::report::*;
pub use services::roster::*;
pub use services::schedule::*;
pub use services::settings::*;
pub use services::storage::*;
pub use services::visits::*;

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = Env::new().filter_or("FIELDPLAN_LOG", default);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

/// Seeds the built-in admin and default activities on first run.
fn bootstrap(store: &FileStore, state: &mut State, settings: &Settings) -> anyhow::Result<()> {
    let admin_added = ensure_default_admin(state);
    let seeded = seed_activities(state, &settings.defaults.activities);
    if admin_added || seeded {
        store.save(state)?;
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = load_settings()?;
    let store = FileStore::new(settings.data_dir()?);
    log::debug!("data dir {}", store.dir().display());
    let mut state = store.load()?;
    bootstrap(&store, &mut state, &settings)?;

    if handle_auth_commands(cli, &state, &store)? {
        return Ok(());
    }
    if handle_roster_commands(cli, &mut state, &store, &settings)? {
        return Ok(());
    }
    handle_runtime_commands(cli, &mut state, &store, &settings)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(&cli) {
        log::debug!("command failed: {:?}", e);
        print_error(cli.json, &e);
        std::process::exit(1);
    }
}
