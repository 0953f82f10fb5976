//! Match-3 (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so binaries, integration tests, and
//! benches can write `match3::{core, adapter, types}`.

pub use match3_adapter as adapter;
pub use match3_core as core;
pub use match3_types as types;
