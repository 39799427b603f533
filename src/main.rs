//! `quickdraw` - two-player reaction duel in the terminal

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;

use quickdraw::cli::args::Cli;
use quickdraw::cli::commands;
use quickdraw::error::ExitCode;
use quickdraw::observability::{StopReason, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    let (stop_tx, stop_rx) = watch::channel(None);

    // First signal asks the running command to stop; a second one forces exit
    tokio::spawn(async move {
        let reason = wait_for_signal().await;
        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        let _ = stop_tx.send(Some(reason));

        wait_for_signal().await;
        std::process::exit(exit_code_for(reason));
    });

    let result = commands::dispatch(cli, stop_rx.clone()).await;

    match result {
        Ok(()) => {
            let code = (*stop_rx.borrow()).map_or(ExitCode::SUCCESS, exit_code_for);
            std::process::exit(code)
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn wait_for_signal() -> StopReason {
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => StopReason::Interrupted,
                _ = sigterm.recv() => StopReason::Terminated,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to register SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            StopReason::Interrupted
        }
    }
}

const fn exit_code_for(reason: StopReason) -> i32 {
    match reason {
        StopReason::Terminated => ExitCode::TERMINATED,
        StopReason::Interrupted => ExitCode::INTERRUPTED,
        StopReason::Eof | StopReason::Quit => ExitCode::SUCCESS,
    }
}
