//! Shared data model layer (structs/constants only).
//!
//! ## Files
//! - `models.rs` — roster state, session record, report/output structs.
//! - `constants.rs` — stable constants (defaults, export header, import column names).
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem side effects.
//!
//! ## Compatibility note
//! Changes in these structs affect both `state.json` and `--json` outputs.
//! Keep schema-impacting changes explicit and synchronized with `docs/contracts/*`.

pub mod constants;
pub mod models;
