use boardmatch_cli::{CliError, LogConfig, Result};
use boardmatch_client::{LoopbackConnection, LoopbackServer, SessionClient};
use boardmatch_core::{GameKind, Position, Selection, SessionPhase};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "boardmatch")]
#[command(
    version,
    about = "Boardmatch CLI - turn-based session demo over the in-process relay"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted two-player match over the in-process relay
    Demo {
        /// White player's display name (queues first, moves first)
        #[arg(long, default_value = "Alice")]
        white: String,

        /// Black player's display name
        #[arg(long, default_value = "Bob")]
        black: String,

        /// Game kind: chess, checkers or tic-tac-toe
        #[arg(short = 'k', long, default_value = "chess")]
        kind: String,

        /// Moves as from-to pairs, alternating white/black
        #[arg(value_name = "MOVE", default_values_t = [
            "d2-d4".to_string(),
            "d7-d5".to_string(),
            "c1-f4".to_string(),
        ])]
        moves: Vec<String>,

        /// Verbose library logging
        #[arg(long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Demo {
            white,
            black,
            kind,
            moves,
            verbose,
        } => run_demo(&white, &black, &kind, &moves, verbose),
    }
}

fn run_demo(white: &str, black: &str, kind: &str, moves: &[String], verbose: bool) -> Result<()> {
    let log_config = if verbose {
        LogConfig::dev()
    } else {
        LogConfig::quiet()
    };
    log_config.init().map_err(CliError::Observability)?;

    let kind: GameKind = kind
        .parse()
        .map_err(|e| CliError::InvalidArgument(format!("{}", e)))?;

    let server = LoopbackServer::new();
    let mut players = [
        SessionClient::new(server.connect()),
        SessionClient::new(server.connect()),
    ];
    let names = [white, black];

    for (client, name) in players.iter_mut().zip(names) {
        if !client.connect() {
            return Err(CliError::Demo(format!("{} could not connect", name)));
        }
        client.join_queue(name, kind)?;
    }
    for client in players.iter_mut() {
        client.poll();
    }
    if players.iter().any(|c| c.phase() != SessionPhase::Active) {
        return Err(CliError::Demo("matchmaking did not complete".to_string()));
    }
    info!(%kind, white, black, "match made, relaying scripted moves");

    println!("{} vs {} ({})", white, black, kind);
    print_board(&players[0]);

    for (turn, script) in moves.iter().enumerate() {
        let mover = turn % 2;
        let (from, to) = parse_move(script, kind)?;

        let name = names[mover];
        let client = &mut players[mover];
        match client.select_square(from)? {
            Selection::Picked(_) => {}
            _ => {
                return Err(CliError::Demo(format!(
                    "{} has no piece to pick up at {}",
                    name, from
                )));
            }
        }
        match client.select_square(to)? {
            Selection::Proposal(mv) => println!("\n{} plays {}", name, mv),
            _ => {
                return Err(CliError::Demo(format!(
                    "{} could not play {} as a destination",
                    name, to
                )));
            }
        }

        for client in players.iter_mut() {
            client.poll();
        }
        print_board(&players[0]);
    }

    let [white_client, black_client] = &players;
    let white_replica = white_client
        .session()
        .ok_or_else(|| CliError::Demo("white lost its session".to_string()))?;
    let black_replica = black_client
        .session()
        .ok_or_else(|| CliError::Demo("black lost its session".to_string()))?;
    if white_replica != black_replica {
        return Err(CliError::Demo("replicas diverged".to_string()));
    }

    println!("\nReplicas converged after {} moves.", moves.len());
    println!("\nHardware feed ({}):", names[0]);
    for entry in white_client.hardware_log().entries() {
        println!("  {}", entry);
    }
    Ok(())
}

fn parse_move(script: &str, kind: GameKind) -> Result<(Position, Position)> {
    let (width, height) = kind.board_size();
    let Some((from, to)) = script.split_once('-') else {
        return Err(CliError::InvalidArgument(format!(
            "moves look like d2-d4, got {:?}",
            script
        )));
    };
    let from = Position::decode_for(from, width, height)
        .map_err(|e| CliError::InvalidArgument(format!("{}: {}", script, e)))?;
    let to = Position::decode_for(to, width, height)
        .map_err(|e| CliError::InvalidArgument(format!("{}: {}", script, e)))?;
    Ok((from, to))
}

fn print_board(client: &SessionClient<LoopbackConnection>) {
    if let Some(session) = client.session() {
        println!();
        for line in session.board().to_string().lines() {
            println!("  {}", line);
        }
    }
}
