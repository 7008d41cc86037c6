//! triagestream
//!
//! Batches log lines, triages each batch with a language model, escalates
//! uncertain or serious batches to deep analysis, and speaks alerts.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::signal;
use tracing::info;
use triagestream::cli::{Cli, Commands};
use triagestream::{render, simulate, watch, AppConfig, TriageController, WatchEnd, WatchSettings};
use triagestream_alerts::NotificationQueue;
use triagestream_telemetry::SessionStats;

const VOICE_TEST_MESSAGE: &str = "Critical alert. Database connection failure detected. \
    Confidence: 95 percent. Escalating to deep analysis.";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.override_voice(cli.command.voice_override());

    match cli.command {
        Commands::Watch { file, .. } => run_watch(&config, file.as_deref()).await,
        Commands::Suggest { file } => run_suggest(&config, &file).await,
        Commands::Simulate => {
            simulate::simulate(&mut tokio::io::stdout(), simulate::LINE_INTERVAL).await?;
            eprintln!("Simulation complete. Pipe this into `triagestream watch --stdin`.");
            Ok(())
        }
        Commands::VoiceTest => run_voice_test(&config).await,
    }
}

async fn run_watch(config: &AppConfig, file: Option<&Path>) -> Result<()> {
    let client = Arc::new(config.gemini_client()?);
    let controller = TriageController::new(
        client.clone(),
        client,
        SessionStats::new(),
        config.notification_queue(),
    );

    info!(
        model = %config.model,
        voice = controller.alerts().is_enabled(),
        "Starting watch"
    );

    let end = match file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            println!("Watching {} (Ctrl+C to stop)", path.display());
            watch_input(&controller, BufReader::new(file)).await?
        }
        None => {
            println!("Watching stdin (Ctrl+C to stop)");
            watch_input(&controller, BufReader::new(tokio::io::stdin())).await?
        }
    };

    match end {
        WatchEnd::EndOfStream => {
            println!("Stream ended.");
            // let the last alerts finish unless the user is impatient
            tokio::select! {
                _ = controller.alerts().wait_idle() => {}
                _ = shutdown_signal() => {}
            }
        }
        WatchEnd::Interrupted => println!("Stopping watch..."),
    }

    println!();
    print!(
        "{}",
        render::session_summary(&controller.stats().summary(), &controller.metrics().snapshot())
    );
    Ok(())
}

async fn watch_input<R>(controller: &TriageController, input: R) -> Result<WatchEnd>
where
    R: AsyncBufRead + Unpin,
{
    let end = watch(
        controller,
        input,
        WatchSettings::default(),
        shutdown_signal(),
        |outcome| {
            if let Some(text) = render::batch_outcome(outcome) {
                println!("{}", text);
            }
        },
    )
    .await?;
    Ok(end)
}

async fn run_suggest(config: &AppConfig, file: &Path) -> Result<()> {
    let client = Arc::new(config.gemini_client()?);
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let controller = TriageController::new(
        client.clone(),
        client,
        SessionStats::new(),
        NotificationQueue::disabled(),
    );

    println!("Analyzing {} with {}", file.display(), config.model);
    let result = controller
        .analyze_source(&file.display().to_string(), &source)
        .await
        .context("Analysis failed")?;
    print!("{}", render::analysis(&result));
    Ok(())
}

async fn run_voice_test(config: &AppConfig) -> Result<()> {
    let voice = config.voice()?;

    println!(
        "Testing voice: model {}, voice {}, {}",
        config.voice.model,
        config.voice.voice_id,
        if voice.streaming { "streaming" } else { "buffered" }
    );
    voice
        .say(VOICE_TEST_MESSAGE)
        .await
        .context("Voice test failed")?;
    println!("Voice test successful");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging on stderr
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("triagestream=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("triagestream=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
