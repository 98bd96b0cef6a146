use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::{
    config::{ComposeMode, Config},
    error::{MediaError, Result, SourceError},
    media::{self, Assembler},
    publish::PostingClient,
    scheduler::{Clip, DurationMatcher, SegmentComposer, TargetSpec},
    source::{scan_directory, select_candidates, ShareFolderClient},
    voice::{ScriptGenerator, SpeechSynthesizer, DEFAULT_SCRIPT_PROMPT},
};

/// Where a run's candidate clips come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// A local directory of video files
    Directory(PathBuf),

    /// A share-folder URL fetched over HTTP
    ShareFolder(String),
}

impl InputSource {
    /// Treat arguments that look like URLs as share folders.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::ShareFolder(arg.to_string())
        } else {
            Self::Directory(PathBuf::from(arg))
        }
    }
}

/// Which scheduling strategy a run ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Trim,
    FastCut,
}

/// Summary of a finished assembly run.
#[derive(Debug)]
pub struct AssembledReel {
    /// Path of the final video
    pub path: PathBuf,

    /// Re-measured duration in seconds
    pub duration: f64,

    /// Strategy the scheduler used
    pub strategy: Strategy,

    /// Number of plan elements materialized
    pub elements: usize,

    /// Number of distinct source clips referenced
    pub clips_used: usize,
}

/// Main engine orchestrating the assembly pipeline
///
/// The pipeline runs in clear steps:
/// 1. Discovery - gather candidate clips (local scan or share-folder fetch)
/// 2. Inspection - probe every candidate's duration
/// 3. Scheduling - plan trims/loops or fast cuts to hit the duration window
/// 4. Materialization - cut and concatenate the plan with ffmpeg
/// 5. Verification - re-measure the assembled output
/// 6. Voiceover / publishing - optional finishing steps
pub struct AssemblyEngine {
    config: Config,
    rng: SmallRng,
}

impl AssemblyEngine {
    /// Create an engine with a random seed drawn from the OS.
    pub fn new(config: Config) -> Self {
        Self { config, rng: SmallRng::from_entropy() }
    }

    /// Create an engine with a fixed seed; identical runs over identical
    /// inputs reproduce the exact same reel.
    pub fn with_seed(config: Config, seed: u64) -> Self {
        Self { config, rng: SmallRng::seed_from_u64(seed) }
    }

    /// Run the full pipeline and produce the assembled reel.
    pub async fn assemble(
        &mut self,
        input: &InputSource,
        output: &Path,
        keep_audio: bool,
    ) -> Result<AssembledReel> {
        info!("🎬 Starting reel assembly");
        self.config.validate()?;

        if !media::ffmpeg_available() {
            return Err(MediaError::ToolMissing { tool: "ffmpeg".to_string() }.into());
        }

        let staging = tempfile::Builder::new().prefix("shortreel-run-").tempdir()?;

        // Step 1: Discovery
        let files = self.discover_clips(input, staging.path()).await?;

        // Step 2: Inspection
        let clips = self.inspect_clips(&files).await?;

        // Step 3 + 4: Scheduling and materialization
        let assembled = staging.path().join("assembled.mp4");
        let (strategy, elements, clips_used) =
            self.schedule_and_materialize(&files, &clips, &assembled).await?;

        // Step 5: Mute and verify
        let final_path = self.finalize_audio(&assembled, output, keep_audio).await?;
        let target = self.config.target.as_spec();
        let duration = media::verify_duration(&final_path, &target).await?;

        // Step 6: Optional finishing
        let final_path = if self.config.voice.enabled {
            self.attach_voiceover(&final_path, staging.path()).await?
        } else {
            final_path
        };
        if self.config.publish.enabled {
            self.publish(&final_path).await?;
        }

        info!("🎉 Assembly complete! Output saved to: {:?}", final_path);
        Ok(AssembledReel { path: final_path, duration, strategy, elements, clips_used })
    }

    // ==========================================
    // PIPELINE STEP 1: DISCOVERY
    // ==========================================

    async fn discover_clips(&self, input: &InputSource, staging: &Path) -> Result<Vec<PathBuf>> {
        info!("📂 Step 1: Discovering candidate clips...");

        let files = match input {
            InputSource::Directory(dir) => scan_directory(dir)?,
            InputSource::ShareFolder(url) => {
                let api_key = std::env::var("DRIVE_API_KEY").map_err(|_| {
                    SourceError::ShareRequestFailed {
                        reason: "DRIVE_API_KEY not set in environment".to_string(),
                    }
                })?;
                let client = ShareFolderClient::new("https://www.googleapis.com/drive/v3", api_key);
                let downloads = client.fetch_folder(url, &staging.join("downloads")).await?;
                self.normalize_downloads(downloads, staging).await?
            }
        };

        info!("   ✅ Found {} candidate clips", files.len());
        Ok(files)
    }

    /// Remote uploads arrive in whatever shape their owners left them;
    /// normalize each one so the concat step sees uniform fragments.
    async fn normalize_downloads(
        &self,
        downloads: Vec<PathBuf>,
        staging: &Path,
    ) -> Result<Vec<PathBuf>> {
        let normalized_dir = staging.join("normalized");
        tokio::fs::create_dir_all(&normalized_dir).await?;

        let mut normalized = Vec::with_capacity(downloads.len());
        for path in downloads {
            let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
            let dest = normalized_dir.join(name);
            match media::normalize_clip(&path, &self.config.media, &dest).await {
                Ok(()) => normalized.push(dest),
                Err(e) => warn!(path = %path.display(), "skipping clip that failed to normalize: {e}"),
            }
        }

        if normalized.is_empty() {
            return Err(SourceError::NoClipsFound {
                path: "share folder (all downloads failed normalization)".to_string(),
            }
            .into());
        }
        Ok(normalized)
    }

    // ==========================================
    // PIPELINE STEP 2: INSPECTION
    // ==========================================

    async fn inspect_clips(&self, files: &[PathBuf]) -> Result<Vec<Clip>> {
        info!("🔎 Step 2: Probing clip durations...");

        let mut clips = Vec::with_capacity(files.len());
        for path in files {
            let probed = media::probe_video(path).await?;
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("clip")
                .to_string();
            debug!(id = %id, duration = probed.duration, "measured clip");
            clips.push(Clip::new(id, probed.duration));
        }

        let total: f64 = clips.iter().map(|c| c.duration).sum();
        info!("   ✅ {} clips measured, {:.1}s of material", clips.len(), total);
        Ok(clips)
    }

    // ==========================================
    // PIPELINE STEPS 3+4: SCHEDULING & MATERIALIZATION
    // ==========================================

    async fn schedule_and_materialize(
        &mut self,
        files: &[PathBuf],
        clips: &[Clip],
        output: &Path,
    ) -> Result<(Strategy, usize, usize)> {
        let strategy = self.pick_strategy(clips.len());
        info!("⏱️  Step 3: Scheduling ({:?} strategy, {} clips in pool)...", strategy, clips.len());

        let assembler = Assembler::new(self.config.media.clone())?;
        let target = self.config.target.as_spec();

        match strategy {
            Strategy::Trim => {
                let (sel_files, sel_clips) = self.select_for_trim(files, clips)?;
                let matcher = DurationMatcher::new(target)?;
                let plan = matcher.compute_plan(&sel_clips)?;

                let loops: u32 = plan.iter().map(|i| i.loop_count).sum();
                info!("   ✅ Plan ready: {} instructions, {} total plays", plan.len(), loops);

                info!("🎞️  Step 4: Materializing trim plan...");
                assembler.materialize_trim_plan(&sel_files, &plan, output).await?;
                Ok((Strategy::Trim, plan.len(), sel_clips.len()))
            }
            Strategy::FastCut => {
                let composer = SegmentComposer::with_params(self.config.compose.composer_params());
                let fast_cut_target = fast_cut_target(&target);
                let plan = composer.compute_plan(
                    clips,
                    fast_cut_target,
                    self.config.compose.min_distinct_clips,
                    &mut self.rng,
                )?;

                let mut used: Vec<usize> = plan.iter().map(|s| s.clip).collect();
                used.sort_unstable();
                used.dedup();
                info!("   ✅ Plan ready: {} segments over {} distinct clips", plan.len(), used.len());

                info!("🎞️  Step 4: Materializing fast-cut plan...");
                assembler.materialize_segments(files, &plan, output).await?;
                Ok((Strategy::FastCut, plan.len(), used.len()))
            }
        }
    }

    fn pick_strategy(&self, pool_size: usize) -> Strategy {
        match self.config.compose.mode {
            ComposeMode::Trim => Strategy::Trim,
            ComposeMode::FastCut => Strategy::FastCut,
            ComposeMode::Auto => {
                if pool_size >= self.config.compose.fast_cut_threshold {
                    Strategy::FastCut
                } else {
                    Strategy::Trim
                }
            }
        }
    }

    fn select_for_trim(
        &mut self,
        files: &[PathBuf],
        clips: &[Clip],
    ) -> Result<(Vec<PathBuf>, Vec<Clip>)> {
        let selected = select_candidates(
            files,
            self.config.selection.min_clips,
            self.config.selection.max_clips,
            &mut self.rng,
        )?;

        // Carry the measured durations over to the selected subset.
        let mut sel_clips = Vec::with_capacity(selected.len());
        for path in &selected {
            let idx = files
                .iter()
                .position(|f| f == path)
                .expect("selection only returns discovered files");
            sel_clips.push(clips[idx].clone());
        }
        Ok((selected, sel_clips))
    }

    // ==========================================
    // PIPELINE STEP 5: AUDIO & VERIFICATION
    // ==========================================

    async fn finalize_audio(
        &self,
        assembled: &Path,
        output: &Path,
        keep_audio: bool,
    ) -> Result<PathBuf> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if keep_audio {
            info!("🔈 Step 5: Keeping source audio");
            tokio::fs::copy(assembled, output).await?;
        } else {
            info!("🔇 Step 5: Removing source audio");
            media::remove_audio(assembled, output).await?;
        }
        Ok(output.to_path_buf())
    }

    // ==========================================
    // PIPELINE STEP 6: OPTIONAL FINISHING
    // ==========================================

    async fn attach_voiceover(&self, video: &Path, staging: &Path) -> Result<PathBuf> {
        info!("🎙️  Step 6: Generating voiceover...");

        let voice = &self.config.voice;
        let generator = ScriptGenerator::from_env(&voice.script_model)?;
        let prompt = voice.prompt.as_deref().unwrap_or(DEFAULT_SCRIPT_PROMPT);
        let script = generator.generate(prompt).await?;
        info!("   Script ({} chars): {}", script.len(), script);

        let script_path = sibling_with_suffix(video, "_script", "txt");
        tokio::fs::write(&script_path, &script).await?;

        let synthesizer = SpeechSynthesizer::from_env(&voice.voice_id, &voice.tts_model)?;
        let narration = staging.join("narration.mp3");
        synthesizer.synthesize(&script, &narration).await?;

        let narrated = sibling_with_suffix(video, "_with_voice", "mp4");
        media::attach_narration(video, &narration, &narrated).await?;

        info!("   ✅ Voiceover attached: {:?}", narrated);
        Ok(narrated)
    }

    async fn publish(&self, video: &Path) -> Result<()> {
        info!("📤 Publishing to the posting service...");

        let publish = &self.config.publish;
        let client = PostingClient::from_env()?;
        let media_ref = client.upload_media(video).await?;
        let integration = client.integration_id(&publish.platform).await?;
        let schedule_at = chrono::Utc::now() + chrono::Duration::minutes(publish.delay_minutes);
        let post = client
            .schedule_post(&integration, &media_ref.id, &publish.caption, Some(schedule_at))
            .await?;

        info!("   ✅ Post {} scheduled on {}", post.id, publish.platform);
        Ok(())
    }
}

/// The fast-cut strategy aims at a single number: the middle of the window.
fn fast_cut_target(target: &TargetSpec) -> f64 {
    target.trim_anchor()
}

fn sibling_with_suffix(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let name = format!("{stem}{suffix}.{extension}");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_source_classifies_urls_and_paths() {
        assert!(matches!(
            InputSource::from_arg("https://drive.example.com/drive/folders/abc"),
            InputSource::ShareFolder(_)
        ));
        assert!(matches!(InputSource::from_arg("clips/"), InputSource::Directory(_)));
    }

    #[test]
    fn auto_mode_switches_on_pool_size() {
        let config = Config::default();
        let engine = AssemblyEngine::with_seed(config, 1);

        assert_eq!(engine.pick_strategy(5), Strategy::Trim);
        assert_eq!(engine.pick_strategy(20), Strategy::FastCut);
        assert_eq!(engine.pick_strategy(50), Strategy::FastCut);
    }

    #[test]
    fn forced_modes_ignore_pool_size() {
        let mut config = Config::default();
        config.compose.mode = ComposeMode::Trim;
        let engine = AssemblyEngine::with_seed(config, 1);
        assert_eq!(engine.pick_strategy(100), Strategy::Trim);

        let mut config = Config::default();
        config.compose.mode = ComposeMode::FastCut;
        let engine = AssemblyEngine::with_seed(config, 1);
        assert_eq!(engine.pick_strategy(3), Strategy::FastCut);
    }

    #[test]
    fn fast_cut_aims_at_the_window_midpoint() {
        let target = TargetSpec::Window { min: 21.0, max: 28.0 };
        assert!((fast_cut_target(&target) - 24.5).abs() < 1e-9);
    }

    #[test]
    fn suffixed_siblings_keep_the_directory() {
        let path = Path::new("out/final.mp4");
        let narrated = sibling_with_suffix(path, "_with_voice", "mp4");
        assert_eq!(narrated, Path::new("out/final_with_voice.mp4"));
    }

    #[tokio::test]
    async fn missing_input_directory_fails_discovery() {
        let config = Config::default();
        let mut engine = AssemblyEngine::with_seed(config, 1);
        let input = InputSource::Directory(PathBuf::from("definitely/not/here"));

        let result = engine
            .assemble(&input, Path::new("out.mp4"), false)
            .await;

        assert!(result.is_err());
    }
}
