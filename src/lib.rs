//! # Shortreel
//!
//! Assemble short social-video reels from clip libraries, landing the final
//! cut inside a tight duration window.
//!
//! Most of the crate is orchestration — probing clips with ffprobe, cutting
//! and concatenating with ffmpeg, talking to cloud services for retrieval,
//! narration and publishing. The heart of it is the duration-matching
//! scheduler in [`scheduler`]: a pure planning layer that decides which time
//! ranges to extract from which clips, how often to repeat them, and in what
//! order, without ever touching media bytes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shortreel::{
//!     config::Config,
//!     pipeline::{AssemblyEngine, InputSource},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let mut engine = AssemblyEngine::new(config);
//!
//! let reel = engine
//!     .assemble(
//!         &InputSource::Directory("clips/".into()),
//!         "reel.mp4".as_ref(),
//!         false,
//!     )
//!     .await?;
//! println!("assembled {:.1}s reel at {:?}", reel.duration, reel.path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`scheduler`] - duration-matching plan computation (pure, seedable)
//! - [`media`] - ffprobe/ffmpeg subprocess layer that materializes plans
//! - [`source`] - clip discovery, retrieval and random selection
//! - [`voice`] - optional script generation and speech synthesis
//! - [`publish`] - optional posting-service client
//! - [`pipeline`] - the engine wiring the steps together
//!
//! ## Using the scheduler on its own
//!
//! The planners work on plain duration metadata, so they are usable without
//! any of the I/O layers:
//!
//! ```rust
//! use rand::{rngs::SmallRng, SeedableRng};
//! use shortreel::scheduler::{Clip, SegmentComposer};
//!
//! let pool: Vec<Clip> = (0..20)
//!     .map(|i| Clip::new(format!("clip-{i}"), 10.0))
//!     .collect();
//!
//! let composer = SegmentComposer::new();
//! let mut rng = SmallRng::seed_from_u64(42);
//! let plan = composer.compute_plan(&pool, 30.0, 20, &mut rng).unwrap();
//!
//! let total: f64 = plan.iter().map(|s| s.duration).sum();
//! assert!((total - 30.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod publish;
pub mod scheduler;
pub mod source;
pub mod voice;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, ScheduleError, ShortreelError},
    pipeline::{AssemblyEngine, InputSource},
    scheduler::{Clip, DurationMatcher, SegmentComposer, TargetSpec},
};
