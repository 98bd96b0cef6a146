use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber;

use shortreel::{
    config::{ComposeMode, Config},
    media,
    pipeline::{AssemblyEngine, InputSource},
    publish::PostingClient,
};

#[derive(Parser)]
#[command(
    name = "shortreel",
    version,
    about = "Assemble short social-video reels from clip libraries",
    long_about = "Shortreel picks random source clips, schedules trims, loops or fast cuts so \
the assembled reel lands inside a duration window, materializes the plan with ffmpeg, and can \
optionally narrate and publish the result."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a reel from a clip directory or share-folder URL
    Assemble {
        /// Local directory of clips, or a share-folder URL
        input: String,

        /// Output video file path
        #[arg(short, long, default_value = "reel.mp4")]
        output: PathBuf,

        /// Minimum acceptable duration in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        /// Maximum acceptable duration in seconds
        #[arg(long)]
        max_duration: Option<f64>,

        /// Minimum number of clips to select (trim strategy)
        #[arg(long)]
        min_clips: Option<usize>,

        /// Maximum number of clips to select (trim strategy)
        #[arg(long)]
        max_clips: Option<usize>,

        /// Scheduling strategy (auto, trim, fast_cut)
        #[arg(long)]
        mode: Option<String>,

        /// Keep the source audio in the final reel
        #[arg(long)]
        keep_audio: bool,

        /// Seed for reproducible selection and scheduling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Probe a media file and print its measured metadata
    Inspect {
        /// Path to the media file
        file: PathBuf,
    },

    /// Upload a finished reel to the posting service and schedule a post
    Publish {
        /// Path to the video file
        file: PathBuf,

        /// Caption for the scheduled post
        #[arg(long, default_value = "")]
        caption: String,

        /// Platform integration identifier
        #[arg(long, default_value = "tiktok")]
        platform: String,

        /// Minutes from now to schedule the post
        #[arg(long, default_value_t = 5)]
        delay_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("Starting shortreel v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Assemble {
            input,
            output,
            min_duration,
            max_duration,
            min_clips,
            max_clips,
            mode,
            keep_audio,
            seed,
        } => {
            let mut config = config;
            if let Some(min) = min_duration {
                config.target.min_duration = min;
            }
            if let Some(max) = max_duration {
                config.target.max_duration = max;
            }
            if let Some(min) = min_clips {
                config.selection.min_clips = min;
            }
            if let Some(max) = max_clips {
                config.selection.max_clips = max;
            }
            if let Some(mode) = mode {
                config.compose.mode = parse_mode(&mode)?;
            }

            let mut engine = match seed {
                Some(seed) => AssemblyEngine::with_seed(config, seed),
                None => AssemblyEngine::new(config),
            };

            let reel = engine
                .assemble(&InputSource::from_arg(&input), &output, keep_audio)
                .await?;

            println!(
                "Assembled {:.2}s reel ({:?}, {} elements from {} clips): {}",
                reel.duration,
                reel.strategy,
                reel.elements,
                reel.clips_used,
                reel.path.display()
            );
        }

        Command::Inspect { file } => {
            let probed = media::probe_video(&file).await?;
            println!("File:      {}", file.display());
            println!("Duration:  {:.2}s", probed.duration);
            println!("Format:    {}", probed.format);
            println!("Size:      {}x{}", probed.width, probed.height);
        }

        Command::Publish { file, caption, platform, delay_minutes } => {
            let client = PostingClient::from_env()?;
            let uploaded = client.upload_media(&file).await?;
            let integration = client.integration_id(&platform).await?;
            let schedule_at = chrono::Utc::now() + chrono::Duration::minutes(delay_minutes);
            let post = client
                .schedule_post(&integration, &uploaded.id, &caption, Some(schedule_at))
                .await?;

            println!("Scheduled post {} on {} at {}", post.id, platform, schedule_at.to_rfc3339());
        }
    }

    Ok(())
}

fn parse_mode(mode: &str) -> Result<ComposeMode> {
    match mode {
        "auto" => Ok(ComposeMode::Auto),
        "trim" => Ok(ComposeMode::Trim),
        "fast_cut" | "fastcut" => Ok(ComposeMode::FastCut),
        other => anyhow::bail!("unknown mode '{other}' (expected auto, trim or fast_cut)"),
    }
}
