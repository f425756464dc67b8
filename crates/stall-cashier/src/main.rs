//! Stall-cashier: relay client between customers and the kitchen.
//!
//! Usage:
//!   stall-cashier [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>       Config file path (default: config/cashier.toml)
//!   --host <HOST>             Broker host to connect to on startup
//!   --port <PORT>             Broker port (overrides config)
//!   --log-level <LEVEL>       Log level (overrides config)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use stall_cashier::config::CashierConfig;
use stall_cashier::console::{Command, HELP};
use stall_cashier::{Intake, QueueView, RelayQueue};
use stall_link::{ConnectionManager, Effect};

const HOST_PROMPT: &str = "IP do Servidor:";

/// CLI arguments for stall-cashier.
#[derive(Parser, Debug)]
#[command(name = "stall-cashier")]
#[command(about = "Cashier relay client for the stall order relay")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/cashier.toml")]
    config: PathBuf,

    /// Broker host to connect to on startup (overrides config file)
    #[arg(long)]
    host: Option<String>,

    /// Broker port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let config_found = args.config.exists();
    let mut config = if config_found {
        CashierConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?
    } else {
        CashierConfig::default()
    };

    config.apply_overrides(args.host, args.port, args.log_level);

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    if !config_found {
        warn!("Config file not found at {:?}, using defaults", args.config);
    }

    info!("Starting stall-cashier");

    let mut queue = RelayQueue::new();
    let mut view = QueueView::default();
    let (mut link, mut events) = ConnectionManager::new(config.link.clone());

    println!("{HELP}");
    match config.host.as_deref() {
        Some(host) => connect(&mut link, host),
        None => println!("{HOST_PROMPT}"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                for effect in link.handle(event) {
                    match effect {
                        Effect::HidePrompt => {
                            println!("Conectado a {}.", link.endpoint().unwrap_or("?"));
                        }
                        Effect::ShowPrompt => println!("{HOST_PROMPT}"),
                        Effect::Notify(notice) => println!("{notice}"),
                        Effect::Inbound(frame) => {
                            if let Intake::Enqueued(_) = queue.on_frame(&frame) {
                                view = render(&queue);
                            }
                        }
                    }
                }
            }

            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read console input")? else {
                    info!("Console closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line, link.prompt_visible()) {
                    Ok(Command::Quit) => break,
                    Ok(command) => execute(&mut queue, &mut view, &mut link, command),
                    Err(e) => println!("{e}"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C");
                break;
            }
        }
    }

    info!("Shutting down...");
    tokio::time::timeout(Duration::from_secs(5), link.shutdown())
        .await
        .unwrap_or_else(|_| warn!("Link shutdown timed out"));
    info!("stall-cashier stopped");
    Ok(())
}

fn connect(link: &mut ConnectionManager, host: &str) {
    match link.connect(host) {
        Ok(()) => println!("Conectando a {}...", host.trim()),
        Err(e) => {
            println!("{e}");
            println!("{HOST_PROMPT}");
        }
    }
}

/// Run one console command against the queue.
fn execute(
    queue: &mut RelayQueue,
    view: &mut QueueView,
    link: &mut ConnectionManager,
    command: Command,
) {
    match command {
        Command::Connect(host) => connect(link, &host),
        Command::List => *view = render(queue),
        Command::Forward(index) => match queue.forward_to_kitchen(view, index, link) {
            Ok(entry) => {
                println!("Pedido de {} enviado para a cozinha.", entry.order.customer_name);
                *view = render(queue);
            }
            Err(e) => println!("{e}"),
        },
        Command::Cancel(index) => match queue.cancel(view, index) {
            Ok(entry) => {
                println!("Pedido de {} cancelado.", entry.order.customer_name);
                *view = render(queue);
            }
            Err(e) => println!("{e}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

/// Print the queue and return the snapshot the operator now sees.
fn render(queue: &RelayQueue) -> QueueView {
    if queue.is_empty() {
        println!("Nenhum pedido.");
    }
    for (i, entry) in queue.entries().iter().enumerate() {
        println!(
            "{:>2}. {}  ({})",
            i + 1,
            entry.order.customer_name,
            entry.received_at.format("%H:%M:%S")
        );
        for item in &entry.order.items {
            println!("    Produtos: {item}");
        }
        if let Some(total) = entry.order.total {
            println!("    Total: R$ {total}");
        }
    }
    queue.view()
}
