//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: CliContext, ...) -> Result<()>`
//! - Thin wrappers that translate terminal input into orchestrator calls
//!   and orchestrator events into terminal output.

pub mod interactive;
pub mod speak;
