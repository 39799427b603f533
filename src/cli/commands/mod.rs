//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod play;
pub mod validate;
pub mod version;

use tokio::sync::watch;

use crate::cli::args::{Cli, Commands};
use crate::error::QuickdrawError;
use crate::observability::StopReason;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// `signals` carries the shutdown request raised by the process signal
/// handler; long-running commands stop when it becomes `Some`.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(
    cli: Cli,
    signals: watch::Receiver<Option<StopReason>>,
) -> Result<(), QuickdrawError> {
    match cli.command {
        Commands::Play(args) => play::run(&args, signals).await,
        Commands::Validate(args) => validate::run(&args),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
