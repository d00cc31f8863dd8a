//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `admin.rs` — login/session plus the roster trees (clients, agents, routes,
//!   activities, users, reset).
//! - `runtime.rs` — visits, bulk planning, export and report.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic and permission checks to `services/*`.
//! - Save state only after the service call succeeds.

pub mod admin;
pub mod runtime;

pub use admin::{handle_auth_commands, handle_roster_commands};
pub use runtime::handle_runtime_commands;

use crate::*;

pub fn current_session(store: &FileStore, state: &State) -> anyhow::Result<Session> {
    FileSessionProvider::new(store.session_path()).current_session(state)
}

/// Both bounds or neither.
pub fn interval_range(interval: &Interval) -> anyhow::Result<Option<DateRange>> {
    match (interval.from, interval.to) {
        (Some(from), Some(to)) => Ok(Some(DateRange::new(from, to)?)),
        (None, None) => Ok(None),
        _ => Err(validation("--from and --to must be given together")),
    }
}

pub fn persist(
    store: &FileStore,
    state: &State,
    session: &Session,
    action: &str,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    store.save(state)?;
    store.audit(session.username(), action, data);
    Ok(())
}

pub fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}
