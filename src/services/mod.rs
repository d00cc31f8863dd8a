//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `schedule.rs` — week-of-month date rule and idempotent visit generation.
//! - `policy.rs` — role predicates and the visit visibility filter.
//! - `visits.rs` — manual visit edits, bulk generate/clear, sort, listing rows.
//! - `roster.rs` — clients, contacts, agents, routes, activities, users, reset.
//! - `auth.rs` — password hashing and the file-backed session provider.
//! - `import.rs` — spreadsheet/csv client import with dedupe.
//! - `export.rs` — xlsx/csv plan export.
//! - `report.rs` — interval statistics.
//! - `storage.rs` — state persistence + audit log.
//! - `settings.rs` — optional TOML configuration.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Services check permissions themselves and never save state.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod auth;
pub mod export;
pub mod import;
pub mod output;
pub mod policy;
pub mod report;
pub mod roster;
pub mod schedule;
pub mod settings;
pub mod storage;
pub mod visits;
