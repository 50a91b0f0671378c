#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::sync::Arc;

#[cfg(feature = "std")]
use battleship::{
    bot, init_logging, BotPlayer, Connector, GameFlow, InProcessConnector, Phase, Server,
    SessionIntent, TcpConnector, DEFAULT_PORT, DEFAULT_STOP_TIMEOUT,
};
#[cfg(feature = "std")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum Mode {
    Host,
    Join,
}

#[cfg(feature = "std")]
impl From<Mode> for SessionIntent {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Host => SessionIntent::Host,
            Mode::Join => SessionIntent::Join,
        }
    }
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Run the session broker that pairs players and relays their moves.
    Server {
        #[arg(long, default_value_t = format!("0.0.0.0:{}", DEFAULT_PORT))]
        bind: String,
        #[arg(long, help = "Seconds to wait for open connections on Ctrl-C",
              default_value_t = DEFAULT_STOP_TIMEOUT.as_secs())]
        stop_timeout: u64,
    },
    /// Let a bot play one game through a running broker.
    Bot {
        #[arg(long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
        connect: String,
        #[arg(long, value_enum, default_value_t = Mode::Host)]
        mode: Mode,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Two bots against each other through an in-process broker.
    Local {
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Server { bind, stop_timeout } => {
            let server = Server::bind(&bind).await?;
            println!("Session broker listening on {}", server.local_addr()?);
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("Failed to listen for Ctrl-C: {}", e);
                }
                println!("Stopping...");
            };
            server
                .run(shutdown, Duration::from_secs(stop_timeout))
                .await?;
            println!("Stopped");
        }
        Commands::Bot {
            connect,
            mode,
            seed,
        } => {
            if let Some(s) = seed {
                println!("Using fixed seed: {} (placement and shots are reproducible)", s);
            }
            let connector: Arc<dyn Connector> = Arc::new(TcpConnector::new(connect));
            let mut flow = GameFlow::new(connector);
            let mut player = BotPlayer::new(mode.into(), seed);
            let result = bot::play(&mut flow, &mut player, bot::DEFAULT_TICK).await;
            report(result, flow.status());
        }
        Commands::Local { seed } => {
            println!("Starting local bot vs bot game...");
            let connector = InProcessConnector::default();
            let shared: Arc<dyn Connector> = Arc::new(connector.clone());

            let mut host_flow = GameFlow::new(shared.clone());
            let mut host = BotPlayer::new(SessionIntent::Host, seed);
            // the joiner must not see an empty session list
            host_flow.update(&host.next_inputs(&host_flow));
            while connector.broker().open_sessions().is_empty() {
                tokio::time::sleep(bot::DEFAULT_TICK).await;
                host_flow.update(&[]);
                if host_flow.phase() == Phase::Menu {
                    anyhow::bail!("Host could not create a session: {}", host_flow.status());
                }
            }

            let mut guest_flow = GameFlow::new(shared);
            let mut guest = BotPlayer::new(SessionIntent::Join, seed.map(|s| s.wrapping_add(1)));
            let (host_result, guest_result) = tokio::join!(
                bot::play(&mut host_flow, &mut host, bot::DEFAULT_TICK),
                bot::play(&mut guest_flow, &mut guest, bot::DEFAULT_TICK),
            );
            print!("Host: ");
            report(host_result, host_flow.status());
            print!("Guest: ");
            report(guest_result, guest_flow.status());
        }
    }
    Ok(())
}

#[cfg(feature = "std")]
fn report(result: Option<bool>, status: &str) {
    match result {
        Some(true) => println!("won"),
        Some(false) => println!("lost"),
        None => println!("no result ({})", status),
    }
}
