use anyhow::{Context, Result};
use clap::Parser;
use interview_core::Input;
use interview_service::commands::{self, Command, HELP};
use interview_service::config::Config;
use interview_service::{session, view};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Voice-driven coding interview in the terminal")]
struct Cli {
    /// The assistant to interview with. Overrides VAPI_ASSISTANT_ID.
    #[arg(long)]
    assistant: Option<String>,
    /// Start the interview right away.
    #[arg(long)]
    start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let target = config
        .session_target(args.assistant)
        .context("No assistant to interview with")?;

    // --- 4. Open the Session ---
    let (session, task) = session::open_session(&config, target)?;

    // Print every change the controller publishes.
    let mut snapshots = session.snapshots();
    let renderer = tokio::spawn(async move {
        let mut shown = snapshots.borrow_and_update().clone();
        while snapshots.changed().await.is_ok() {
            let next = snapshots.borrow_and_update().clone();
            for line in view::changes(&shown, &next) {
                println!("{line}");
            }
            shown = next;
        }
    });

    println!("{HELP}");
    if args.start {
        session.send(Input::Start).await?;
    }

    // --- 5. Console Loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing the session.");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match commands::parse(&line) {
                    Ok(Some(Command::Session(input))) => session.send(input).await?,
                    Ok(Some(Command::Status)) => println!("{}", view::render(&session.snapshot())),
                    Ok(Some(Command::Help)) => println!("{HELP}"),
                    Ok(Some(Command::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    // --- 6. Teardown ---
    if let Err(e) = session.send(Input::Dispose).await {
        tracing::debug!("session already closed: {:?}", e);
    }
    drop(session);
    task.await.context("Interview session task failed")?;
    renderer.abort();

    tracing::info!("Interview service stopped.");
    Ok(())
}
