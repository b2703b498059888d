//! Clearlag - Entry Point
//!
//! Runs a headless server: a 20 TPS game loop that keeps spawning entities,
//! population control on top of it, and a console reading commands from stdin.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use clearlag::command::{parse_command, CommandExecutor, CommandSender};
use clearlag::control::PopulationControl;
use clearlag::core::config::FileConfig;
use clearlag::core::error::Result;
use clearlag::core::types::MILLIS_PER_TICK;
use clearlag::ecs::world::Server;
use clearlag::notify::messages::strip_colour_codes;
use clearlag::notify::{Audience, MessageCatalog, MessageRouter, Notifier};
use clearlag::simulation::{MutationDomain, PopulationSpawner};

const WORLD_NAMES: [&str; 3] = ["world", "world_nether", "world_the_end"];

/// Headless server with entity population control
#[derive(Parser, Debug)]
#[command(name = "clearlag")]
#[command(about = "Simulated server that keeps its entity population in check")]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, default_value = "clearlag.toml")]
    config: PathBuf,

    /// Number of worlds to simulate
    #[arg(long, default_value_t = 3)]
    worlds: usize,

    /// Entities spawned per game tick
    #[arg(long, default_value_t = 2)]
    spawn_per_tick: usize,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,
}

/// Prints broadcast outcomes to the console
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn deliver(&self, message: &str, audience: &Audience) {
        match audience {
            Audience::Permission(permission) => {
                println!("[broadcast {}] {}", permission, strip_colour_codes(message))
            }
            Audience::Invoker => println!("{}", strip_colour_codes(message)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clearlag=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, worlds = args.worlds, spawn_per_tick = args.spawn_per_tick, "Clearlag starting...");

    let mut server = Server::new();
    for i in 0..args.worlds {
        match WORLD_NAMES.get(i) {
            Some(name) => server.add_world(*name),
            None => server.add_world(format!("world_{}", i)),
        };
    }

    let mut spawner = PopulationSpawner::new(seed, args.spawn_per_tick);
    let domain = MutationDomain::spawn_with_game_loop(
        server,
        Duration::from_millis(MILLIS_PER_TICK),
        move |server| spawner.step(server),
    );

    let sink = Arc::new(MessageRouter::new(MessageCatalog::default(), ConsoleNotifier));
    let control = PopulationControl::new(
        domain.handle(),
        Arc::new(FileConfig::new(&args.config)),
        sink,
    );
    control.start();

    println!();
    println!("=== CLEARLAG ===");
    println!("Commands:");
    println!("  clearlag          - Clear filtered entities now");
    println!("  clearlag reload   - Reload {}", args.config.display());
    println!("  clearlag status   - Show population and schedules");
    println!("  quit / q          - Stop the server");
    println!();

    let console = CommandSender::console();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "q" {
            break;
        }

        match parse_command(input) {
            Some(command) => {
                let result = CommandExecutor::execute(&control, &console, &command).await;
                for reply in &result.replies {
                    println!("{}", strip_colour_codes(reply));
                }
                if let Some(error) = &result.error {
                    println!("Command failed: {}", error);
                }
            }
            None => println!("Unknown command. Available: clearlag [reload|status], quit"),
        }
    }

    control.stop();
    let server = domain.shutdown().await?;
    println!(
        "\nGoodbye! Final state: {} entities across {} worlds, {} ticks elapsed.",
        server.entity_count(),
        server.worlds.len(),
        server.current_tick
    );
    Ok(())
}
