//! The sync pipeline: import, validate, export, promote
//!
//! [`engine::SyncEngine`] drives one run; the submodules hold the individual
//! stages so each can be tested against a scripted utility in isolation.

pub mod engine;
pub mod export;
pub mod import;
pub mod promote;
pub mod state;
pub mod validate;

pub use engine::{RunReport, SyncEngine};
pub use promote::{Decision, decide};
pub use state::RunState;
pub use validate::Verdict;
