//! Stall-kiosk: customer order kiosk.
//!
//! Usage:
//!   stall-kiosk [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>       Config file path (default: config/kiosk.toml)
//!   --host <HOST>             Broker host (overrides config)
//!   --port <PORT>             Broker port (overrides config)
//!   --log-level <LEVEL>       Log level (overrides config)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use stall_common::line_total;
use stall_kiosk::config::KioskConfig;
use stall_kiosk::console::{Command, HELP};
use stall_kiosk::{Composer, ComposerError};
use stall_link::{ConnectionManager, Effect};

/// CLI arguments for stall-kiosk.
#[derive(Parser, Debug)]
#[command(name = "stall-kiosk")]
#[command(about = "Customer order kiosk for the stall order relay")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/kiosk.toml")]
    config: PathBuf,

    /// Broker host (overrides config file)
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
        KioskConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?
    } else {
        KioskConfig::default()
    };

    config.apply_overrides(args.host, args.port, args.log_level);

    // Initialize logging
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

    info!("Starting stall-kiosk");
    info!("Broker: {}:{}", config.host, config.link.port);

    let mut composer = Composer::new(config.menu.clone());
    let (mut link, mut events) = ConnectionManager::new(config.link.clone());
    link.connect(&config.host)
        .with_context(|| format!("Cannot connect to {:?}", config.host))?;

    let mut reconnect_delay = config.initial_reconnect_delay;
    let mut retry_at: Option<Instant> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                for effect in link.handle(event) {
                    match effect {
                        Effect::HidePrompt => {
                            reconnect_delay = config.initial_reconnect_delay;
                            println!("Conectado.");
                        }
                        Effect::ShowPrompt => {
                            if retry_at.is_none() {
                                info!("Reconnecting in {reconnect_delay:?}");
                                retry_at = Some(Instant::now() + reconnect_delay);
                                reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
                            }
                        }
                        Effect::Notify(notice) => println!("{notice}"),
                        // The broker echoes every order back to every peer.
                        Effect::Inbound(_) => debug!("Ignoring inbound frame"),
                    }
                }
            }

            _ = sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                retry_at = None;
                if let Err(e) = link.connect(&config.host) {
                    warn!("Reconnect failed: {e}");
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
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => execute(&mut composer, &mut link, command),
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
    info!("stall-kiosk stopped");
    Ok(())
}

/// Run one console command against the composer.
fn execute(composer: &mut Composer, link: &mut ConnectionManager, command: Command) {
    match command {
        Command::Menu => {
            for flavor in composer.menu().flavors() {
                println!("{:<40} R$ {}  [{}]", flavor.name, flavor.price, flavor.category);
            }
        }
        Command::Pick(flavor) => {
            if composer.menu().flavor(&flavor).is_none() {
                println!("Sabor desconhecido: {flavor}");
                return;
            }
            let description = composer
                .select_flavor(&flavor)
                .unwrap_or("Descrição não disponível.")
                .to_string();
            println!("{description}");
            let options = composer.ingredient_options();
            if composer.menu().is_combo(&flavor) {
                println!("Selecione exatamente três sabores: {}", options.join(", "));
            } else if !options.is_empty() {
                println!("Adicionais: {}", options.join(", "));
            }
        }
        Command::Toggle(ingredient) => match composer.toggle_ingredient(&ingredient) {
            Ok(true) => println!("+ {ingredient}"),
            Ok(false) => println!("- {ingredient}"),
            Err(ComposerError::NoFlavorSelected) => println!("Escolha um sabor primeiro."),
            Err(e) => println!("{e}"),
        },
        Command::Add => match composer.confirm_selection() {
            Ok(_) => println!("Total: R$ {}", composer.total()),
            Err(e) => println!("{e}"),
        },
        Command::Remove(position) => {
            let Some(id) = composer.cart().get(position).map(|entry| entry.id) else {
                println!("Posição inválida.");
                return;
            };
            composer.remove_from_cart(id);
            println!("Total: R$ {}", composer.total());
        }
        Command::Cart => {
            for (i, entry) in composer.cart().iter().enumerate() {
                let price = line_total(composer.menu(), &entry.item);
                println!("{:>2}. {}  R$ {}", i + 1, entry.item, price);
            }
            println!("Total: R$ {}", composer.total());
        }
        Command::Send(name) => match composer.submit(&name, link) {
            Ok(order) => println!(
                "Pedido enviado para {} (R$ {}).",
                order.customer_name,
                order.total.unwrap_or_default()
            ),
            Err(e) => println!("{e}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}
