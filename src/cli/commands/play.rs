//! `play` command
//!
//! Runs one match driven by line commands on stdin and streams the
//! engine's push events as JSONL. The driver holds no game logic: every
//! command maps onto a single [`MatchController`] operation.

use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::cli::args::PlayArgs;
use crate::config::{ConfigLoader, DuelConfig};
use crate::duel::{DuelEvent, MatchController, PlayerId, RulesGate};
use crate::error::QuickdrawError;
use crate::observability::{EventEmitter, SessionEvent, StopReason};

/// One line of driver input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the current round's countdown
    Start,
    /// Fire for a player
    Fire(PlayerId),
    /// Open or close a player's rules panel
    Rules {
        /// Panel owner
        player: PlayerId,
        /// `true` to open
        open: bool,
    },
    /// Print a snapshot of the match
    Status,
    /// Start a fresh match
    Restart,
    /// Leave the session
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();

        match words.as_slice() {
            ["start"] => Ok(Self::Start),
            ["fire", p] => parse_player(p).map(Self::Fire),
            [p @ ("1" | "2")] => parse_player(p).map(Self::Fire),
            ["rules", action, p] => {
                let open = match *action {
                    "open" => true,
                    "close" => false,
                    other => return Err(format!("unknown rules action '{other}'")),
                };
                Ok(Self::Rules {
                    player: parse_player(p)?,
                    open,
                })
            }
            ["status"] => Ok(Self::Status),
            ["restart"] => Ok(Self::Restart),
            ["quit" | "exit"] => Ok(Self::Quit),
            [] => Err("empty command".to_string()),
            _ => Err(format!("unknown command '{}'", line.trim())),
        }
    }
}

fn parse_player(word: &str) -> Result<PlayerId, String> {
    PlayerId::from_number(word).ok_or_else(|| format!("unknown player '{word}' (use 1 or 2)"))
}

/// Play a match until EOF, `quit`, or a shutdown signal.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the events file
/// cannot be created, the metrics exporter fails to start, or stdin cannot
/// be read.
pub async fn run(
    args: &PlayArgs,
    signals: watch::Receiver<Option<StopReason>>,
) -> Result<(), QuickdrawError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let config = load_config(args)?;
    let seed = config.seed;

    let emitter = Arc::new(match args.events_file {
        Some(ref path) => EventEmitter::from_file(path)?,
        None => EventEmitter::stdout(),
    });

    let gate = Arc::new(RulesGate::new());
    let controller = MatchController::new(Arc::new(config))?.with_gate(gate.clone());
    let forwarder = spawn_forwarder(controller.subscribe(), Arc::clone(&emitter));

    emitter.emit(&SessionEvent::SessionStarted {
        match_id: controller.match_id(),
        seed,
    });

    let reason = drive(&controller, &gate, &emitter, signals).await?;
    tracing::info!(?reason, "session stopping");

    let round = controller.round();
    let winner = controller.winner();

    // Dropping the controller closes the event channel, which ends the
    // forwarder once it has drained.
    drop(controller);
    if let Err(e) = forwarder.await {
        tracing::warn!(error = %e, "event forwarder failed");
    }

    emitter.emit(&SessionEvent::SessionStopped {
        reason,
        round,
        winner,
    });
    Ok(())
}

fn load_config(args: &PlayArgs) -> Result<DuelConfig, QuickdrawError> {
    let mut config = match args.config {
        Some(ref path) => {
            tracing::info!(config = %path.display(), "loading configuration");
            let loaded = ConfigLoader::with_defaults().load(path)?;
            for warning in &loaded.warnings {
                tracing::warn!(
                    location = warning.location.as_deref().unwrap_or("<unknown>"),
                    "{}",
                    warning.message
                );
            }
            DuelConfig::clone(&loaded.config)
        }
        None => DuelConfig::default(),
    };

    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn spawn_forwarder(
    events: broadcast::Receiver<DuelEvent>,
    emitter: Arc<EventEmitter>,
) -> JoinHandle<()> {
    let mut stream = BroadcastStream::new(events);
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => emitter.emit(&event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
            }
        }
    })
}

async fn drive(
    controller: &MatchController,
    gate: &RulesGate,
    emitter: &EventEmitter,
    mut signals: watch::Receiver<Option<StopReason>>,
) -> Result<StopReason, QuickdrawError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            reason = stop_requested(&mut signals) => return Ok(reason),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(StopReason::Eof);
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => return Ok(StopReason::Quit),
                    Ok(command) => execute(controller, gate, emitter, command),
                    Err(message) => tracing::warn!(input = %line.trim(), "{message}"),
                }
            }
        }
    }
}

/// Resolves once the signal handler has asked the session to stop.
async fn stop_requested(signals: &mut watch::Receiver<Option<StopReason>>) -> StopReason {
    match signals.wait_for(Option::is_some).await {
        Ok(reason) => (*reason).unwrap_or(StopReason::Interrupted),
        // no signal handler installed
        Err(_) => std::future::pending().await,
    }
}

fn execute(controller: &MatchController, gate: &RulesGate, emitter: &EventEmitter, command: Command) {
    tracing::debug!(?command, "command");
    match command {
        Command::Start => {
            if !controller.start_round() {
                tracing::debug!(phase = %controller.current_phase(), "start ignored");
            }
        }
        Command::Fire(player) => {
            if controller.fire(player).is_none() {
                tracing::debug!(%player, "shot ignored");
            }
        }
        Command::Rules { player, open } => {
            if open {
                gate.open(player);
            } else {
                gate.close(player);
            }
        }
        Command::Status => emitter.emit(&SessionEvent::Status {
            snapshot: controller.snapshot(),
        }),
        Command::Restart => {
            controller.restart_match();
        }
        Command::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fire_forms() {
        assert_eq!("fire 1".parse::<Command>(), Ok(Command::Fire(PlayerId::One)));
        assert_eq!("  2 ".parse::<Command>(), Ok(Command::Fire(PlayerId::Two)));
        assert_eq!("fire 2".parse::<Command>(), Ok(Command::Fire(PlayerId::Two)));
    }

    #[test]
    fn parses_rules() {
        assert_eq!(
            "rules open 2".parse::<Command>(),
            Ok(Command::Rules {
                player: PlayerId::Two,
                open: true
            })
        );
        assert_eq!(
            "rules close 1".parse::<Command>(),
            Ok(Command::Rules {
                player: PlayerId::One,
                open: false
            })
        );
        assert!("rules toggle 1".parse::<Command>().is_err());
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!("start".parse::<Command>(), Ok(Command::Start));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert_eq!("restart".parse::<Command>(), Ok(Command::Restart));
        assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_unknown_input() {
        assert!("fire 3".parse::<Command>().is_err());
        assert!("reload".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn execute_drives_controller() {
        let gate = Arc::new(RulesGate::new());
        let config = DuelConfig {
            seed: Some(7),
            ..DuelConfig::default()
        };
        let controller = MatchController::new(Arc::new(config))
            .unwrap()
            .with_gate(gate.clone());
        let emitter = EventEmitter::noop();

        execute(&controller, &gate, &emitter, Command::Rules {
            player: PlayerId::One,
            open: true,
        });
        execute(&controller, &gate, &emitter, Command::Start);
        assert!(!controller.start_round(), "gate should still block");

        execute(&controller, &gate, &emitter, Command::Rules {
            player: PlayerId::One,
            open: false,
        });
        execute(&controller, &gate, &emitter, Command::Start);
        assert_eq!(controller.current_phase(), crate::duel::Phase::Ready);
        assert!(!controller.start_round(), "countdown already armed");

        execute(&controller, &gate, &emitter, Command::Status);
        assert_eq!(emitter.event_count(), 1);
    }
}
