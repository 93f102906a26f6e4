//! `audiotally` - CLI for the clip duration calculator
//!
//! This binary watches the clipboard for Cubase/Nuendo clip lists and
//! reports aggregate durations, or calculates once on demand.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

use audiotally::cli::{CalcCommand, Cli, Command, ConfigCommand, WatchCommand};
use audiotally::config::KNOWN_SAMPLE_RATES;
use audiotally::session::{calculate_once, Session, SessionUpdate};
use audiotally::status::StatusState;
use audiotally::{init_logging, Config};
use audiotally_clipboard::SystemClipboard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Watch(watch_cmd) => handle_watch(config, watch_cmd, cli.config.as_deref()).await,
        Command::Calc(calc_cmd) => handle_calc(config, calc_cmd, cli.config.as_deref()).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd, cli.config.as_deref()),
    }
}

/// Resolve the path configuration changes are written to.
fn config_write_path(path_override: Option<&Path>) -> PathBuf {
    path_override.map_or_else(Config::default_config_path, Path::to_path_buf)
}

/// Apply a `--sample-rate` override and persist it, like the original app
/// remembered the last-used rate.
fn apply_sample_rate(
    config: &mut Config,
    sample_rate: Option<u32>,
    path_override: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(rate) = sample_rate {
        config.set_sample_rate(rate)?;
        let path = config_write_path(path_override);
        config
            .save_to(&path)
            .with_context(|| format!("persisting sample rate to {}", path.display()))?;
    }
    Ok(())
}

async fn handle_watch(
    mut config: Config,
    cmd: WatchCommand,
    path_override: Option<&Path>,
) -> anyhow::Result<()> {
    apply_sample_rate(&mut config, cmd.sample_rate, path_override)?;

    let reader = SystemClipboard::with_timeout(config.read_timeout());
    let session = Session::new(config.clone(), reader);
    let handle = session.stop_handle();

    let (tx, mut rx) = mpsc::channel(16);
    let runner = tokio::spawn(session.run(tx));

    let ctrl_c_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_handle.stop();
        }
    });

    if !cmd.json {
        println!(
            "Watching clipboard for Cubase/Nuendo clip lists at {} Hz (Ctrl-C to stop)",
            config.sample_rate()
        );
    }

    while let Some(update) = rx.recv().await {
        if cmd.json {
            println!("{}", serde_json::to_string(&update)?);
        } else {
            render_update(&update);
        }
    }

    runner.await.context("watch session failed")?;
    Ok(())
}

/// Render one status transition as a terminal line.
fn render_update(update: &SessionUpdate) {
    match update.state {
        StatusState::Ready => match &update.result {
            Some(result) => println!("▶ Ready (last calculated: {})", result.total_duration()),
            None => println!("▶ Ready"),
        },
        StatusState::Detecting { clip_count } => {
            println!("🔎 Detected {clip_count} events - calculating");
        }
        StatusState::CalculatedPhase1 { clip_count } => {
            if let Some(result) = &update.result {
                println!(
                    "✅ Calculated! ({clip_count} events) - total {}",
                    result.total_duration()
                );
            }
        }
        StatusState::CalculatedPhase2 { clip_count } => {
            if let Some(result) = &update.result {
                println!(
                    "Calculated ({clip_count} events) - total {}",
                    result.total_duration()
                );
            }
        }
    }
}

async fn handle_calc(
    mut config: Config,
    cmd: CalcCommand,
    path_override: Option<&Path>,
) -> anyhow::Result<()> {
    apply_sample_rate(&mut config, cmd.sample_rate, path_override)?;
    if cmd.no_restore {
        config.watch.restore_clipboard = false;
    }

    let reader = SystemClipboard::with_timeout(config.read_timeout());
    let result = calculate_once(&reader, &config)
        .await
        .context("reading clipboard")?;

    let Some(result) = result else {
        anyhow::bail!(
            "no valid Cubase/Nuendo clip data found in clipboard; \
             copy selected clips from Cubase/Nuendo and try again"
        );
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result.report());
    }
    Ok(())
}

fn handle_config(
    config: &Config,
    cmd: ConfigCommand,
    path_override: Option<&Path>,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Calculator]");
                println!("  Sample rate:        {} Hz", config.sample_rate());
                println!();
                println!("[Watch]");
                println!("  Poll interval:      {} ms", config.watch.poll_interval_ms);
                println!("  Detect delay:       {} ms", config.watch.detect_delay_ms);
                println!("  Phase delay:        {} ms", config.watch.phase_delay_ms);
                println!("  Read timeout:       {} ms", config.watch.read_timeout_ms);
                println!("  Restore clipboard:  {}", config.watch.restore_clipboard);
            }
        }
        ConfigCommand::Path => {
            println!("{}", config_write_path(path_override).display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(|| config_write_path(path_override));
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
        ConfigCommand::SetSampleRate { rate } => {
            if !KNOWN_SAMPLE_RATES.contains(&rate) {
                println!(
                    "Note: {rate} Hz is not a standard project rate ({})",
                    KNOWN_SAMPLE_RATES
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            let mut updated = config.clone();
            updated.set_sample_rate(rate)?;
            let path = config_write_path(path_override);
            updated
                .save_to(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Sample rate set to {rate} Hz");
        }
    }
    Ok(())
}
