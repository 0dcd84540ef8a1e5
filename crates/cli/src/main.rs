//! Storybar CLI - animate a segmented story progress bar in the terminal.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use storybar_core::{ConfigError, CornerStyle, Rgba, SegmentConfig, SegmentEvent};
use storybar_player::{Player, PlayerConfig};
use storybar_render::{TerminalRenderer, TextRenderer};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storybar")]
#[command(about = "Segmented story progress bar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the bar until the last segment finishes
    Play {
        #[command(flatten)]
        config: ConfigArgs,
        /// Clock ticks per second
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Bar width in columns
        #[arg(long, default_value = "60")]
        width: usize,
        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,
    },
    /// Print the resolved configuration as JSON
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of segments
    #[arg(long)]
    segments: Option<usize>,
    /// Seconds per segment
    #[arg(long)]
    duration: Option<f64>,
    /// Gap between segments
    #[arg(long)]
    padding: Option<f32>,
    /// Corner style
    #[arg(long, value_enum)]
    corner: Option<Corner>,
    /// Corner radius used with --corner
    #[arg(long, default_value = "4")]
    radius: f32,
    /// Unfilled color (#rrggbb or #rrggbbaa)
    #[arg(long)]
    track_color: Option<String>,
    /// Filled color (#rrggbb or #rrggbbaa)
    #[arg(long)]
    progress_color: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Corner {
    None,
    Segments,
    Bar,
}

impl ConfigArgs {
    /// File (or defaults) with command-line overrides applied.
    fn resolve(&self) -> Result<SegmentConfig> {
        let mut config = match &self.config {
            Some(path) => SegmentConfig::load(path)?,
            None => SegmentConfig::new(3),
        };

        if let Some(segments) = self.segments {
            config.segment_count = segments;
        }
        if let Some(duration) = self.duration {
            config.segment_duration = duration;
        }
        if let Some(padding) = self.padding {
            config.style.padding_between_segments = padding;
        }
        if let Some(corner) = self.corner {
            config.style.corner_style = match corner {
                Corner::None => CornerStyle::None,
                Corner::Segments => CornerStyle::RoundedSegments { radius: self.radius },
                Corner::Bar => CornerStyle::RoundedBar { radius: self.radius },
            };
        }
        if let Some(color) = &self.track_color {
            config.style.track_color = parse_color(color)?;
        }
        if let Some(color) = &self.progress_color {
            config.style.progress_color = parse_color(color)?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Filter used when `RUST_LOG` is unset. Higher levels would tear the bar's redraw.
const DEFAULT_LOG_FILTER: &str = "warn";

fn parse_color(s: &str) -> Result<Rgba, ConfigError> {
    Ok(s.parse::<Rgba>()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never land inside the bar on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            fps,
            width,
            no_color,
        } => {
            let config = config.resolve()?;
            play(config, PlayerConfig::default().with_fps(fps), width, !no_color).await?;
        }
        Commands::Config { config } => {
            let config = config.resolve()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn play(config: SegmentConfig, player_config: PlayerConfig, width: usize, color: bool) -> Result<()> {
    let segment_count = config.segment_count;
    let (mut player, handle) = Player::new(config, player_config)?;

    let renderer = Arc::new(TerminalRenderer::new(
        TextRenderer::new(width).with_color(color),
        std::io::stdout(),
    ));
    player.set_renderer(&renderer);

    let mut events = handle.subscribe_events();
    let task = player.spawn();

    if segment_count == 0 {
        warn!("no segments to play");
    } else {
        handle.start()?;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(SegmentEvent::Finished { index, is_last }) => {
                        info!(index, is_last, "segment finished");
                        if is_last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => warn!(missed, "missed segment events"),
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    break;
                }
            }
        }
    }

    handle.shutdown()?;
    task.await?;
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> ConfigArgs {
        let cli = Cli::parse_from(std::iter::once("storybar").chain(argv.iter().copied()));
        match cli.command {
            Commands::Config { config } => config,
            Commands::Play { config, .. } => config,
        }
    }

    #[test]
    fn test_defaults_to_three_segments() {
        let config = args(&["config"]).resolve().unwrap();
        assert_eq!(config.segment_count, 3);
        assert_eq!(config.segment_duration, 5.0);
    }

    #[test]
    fn test_overrides() {
        let config = args(&[
            "play", "--segments", "5", "--duration", "2.5", "--corner", "bar", "--radius", "2",
            "--progress-color", "#00ff00",
        ])
        .resolve()
        .unwrap();
        assert_eq!(config.segment_count, 5);
        assert_eq!(config.segment_duration, 2.5);
        assert_eq!(config.style.corner_style, CornerStyle::RoundedBar { radius: 2.0 });
        assert_eq!(config.style.progress_color, Rgba::rgb(0, 255, 0));
    }

    #[test]
    fn test_default_log_filter_hides_segment_info() {
        let filter = EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert_eq!(filter.max_level_hint(), Some(tracing::level_filters::LevelFilter::WARN));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(args(&["config", "--duration", "0"]).resolve().is_err());
        assert!(args(&["config", "--track-color", "blue"]).resolve().is_err());
    }
}
