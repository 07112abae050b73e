//! Slash commands: the catalogue and the per-field command-mode session.

mod catalogue;
pub mod session;

pub use catalogue::{SlashCommand, filter_commands};
pub use session::{CommandSession, CommitDecision, InputOutcome, decide_commit};
