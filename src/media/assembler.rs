//! Timeline materialization.
//!
//! Turns a declarative plan into a real media file: cuts each fragment with
//! ffmpeg, writes a concat-demuxer list honoring loop counts, encodes the
//! assembled reel, and re-measures the result.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{MediaError, Result};
use crate::scheduler::{Segment, TargetSpec, TrimInstruction};

use super::probe::media_duration;
use super::transcoder::{cut_clip, run_ffmpeg, EncodeParams};

/// Materializes scheduler plans into an assembled video.
///
/// Fragment files live in a private staging directory that is removed when
/// the assembler is dropped.
pub struct Assembler {
    params: EncodeParams,
    staging: TempDir,
}

impl Assembler {
    pub fn new(params: EncodeParams) -> Result<Self> {
        let staging = tempfile::Builder::new().prefix("shortreel-assembly-").tempdir()?;
        Ok(Self { params, staging })
    }

    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    /// Materialize a trim-and-loop plan: one fragment per source clip,
    /// repeated `loop_count` times in the concat list.
    pub async fn materialize_trim_plan(
        &self,
        sources: &[PathBuf],
        plan: &[TrimInstruction],
        output: impl AsRef<Path>,
    ) -> Result<()> {
        if sources.len() != plan.len() {
            return Err(MediaError::AssemblyFailed {
                reason: format!("{} sources but {} instructions", sources.len(), plan.len()),
            }
            .into());
        }

        let mut entries = Vec::with_capacity(plan.len());
        for (i, (source, instruction)) in sources.iter().zip(plan).enumerate() {
            let fragment = self.fragment_path(i);
            cut_clip(source, instruction.start, instruction.end, false, &fragment).await?;
            entries.push((fragment, instruction.loop_count));
        }

        self.concat(&entries, output.as_ref()).await
    }

    /// Materialize a fast-cut plan: one fragment per segment, each played once.
    pub async fn materialize_segments(
        &self,
        sources: &[PathBuf],
        plan: &[Segment],
        output: impl AsRef<Path>,
    ) -> Result<()> {
        let mut entries = Vec::with_capacity(plan.len());
        for (i, segment) in plan.iter().enumerate() {
            let source = sources.get(segment.clip).ok_or_else(|| MediaError::AssemblyFailed {
                reason: format!("segment {i} references missing source {}", segment.clip),
            })?;
            let fragment = self.fragment_path(i);
            cut_clip(source, segment.start, segment.end, segment.speed_up, &fragment).await?;
            entries.push((fragment, 1));
        }

        self.concat(&entries, output.as_ref()).await
    }

    /// Concatenate fragments in order, repeating each entry per its count.
    async fn concat(&self, entries: &[(PathBuf, u32)], output: &Path) -> Result<()> {
        if entries.is_empty() {
            return Err(MediaError::AssemblyFailed { reason: "no fragments to assemble".to_string() }.into());
        }

        let list_path = self.staging.path().join("fragment_list.txt");
        let mut list = String::new();
        for (path, count) in entries {
            let absolute = path.canonicalize().unwrap_or_else(|_| path.clone());
            for _ in 0..*count {
                list.push_str(&format!("file '{}'\n", absolute.display()));
            }
        }
        fs::write(&list_path, list).await?;

        debug!(fragments = entries.len(), output = %output.display(), "running concat assembly");
        run_ffmpeg([
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
            &list_path.display().to_string(),
            "-vf",
            &format!(
                "scale={}:{}:force_original_aspect_ratio=decrease",
                self.params.width, self.params.height
            ),
            "-c:v",
            "libx264",
            "-preset",
            &self.params.preset,
            "-crf",
            &self.params.crf.to_string(),
            "-maxrate",
            &self.params.maxrate,
            "-bufsize",
            &self.params.bufsize,
            "-max_muxing_queue_size",
            "1024",
            "-c:a",
            "aac",
            "-y",
            &output.display().to_string(),
        ])
        .await?;

        if !output.exists() {
            return Err(MediaError::AssemblyFailed {
                reason: format!("output file not created: {}", output.display()),
            }
            .into());
        }
        Ok(())
    }

    fn fragment_path(&self, index: usize) -> PathBuf {
        self.staging.path().join(format!("fragment_{index:03}.mp4"))
    }
}

/// Re-measure an assembled file and check it against the acceptable interval.
///
/// Returns the measured duration so callers can report achieved vs target.
pub async fn verify_duration(path: impl AsRef<Path>, target: &TargetSpec) -> Result<f64> {
    let path = path.as_ref();
    let measured = media_duration(path).await?;
    let (min, max) = target.bounds();

    // Container duration rounds to the frame, so allow half a second of slack
    // on top of the scheduler's own tolerance.
    const REMEASURE_SLACK: f64 = 0.5;
    if measured < min - REMEASURE_SLACK || measured > max + REMEASURE_SLACK {
        return Err(MediaError::DurationMismatch { measured, min, max }.into());
    }

    info!(path = %path.display(), measured, "assembled duration verified");
    Ok(measured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trim_plan_and_source_counts_must_match() {
        let assembler = Assembler::new(EncodeParams::default()).unwrap();
        let plan = vec![TrimInstruction { start: 0.0, end: 1.0, loop_count: 1 }];

        let result = assembler
            .materialize_trim_plan(&[], &plan, assembler.staging_dir().join("out.mp4"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_fragment_list_is_rejected() {
        let assembler = Assembler::new(EncodeParams::default()).unwrap();
        let result = assembler.concat(&[], &assembler.staging_dir().join("out.mp4")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn segments_referencing_missing_sources_fail() {
        let assembler = Assembler::new(EncodeParams::default()).unwrap();
        let plan = vec![Segment { clip: 3, start: 0.0, end: 1.0, duration: 1.0, speed_up: false }];

        let result = assembler
            .materialize_segments(&[], &plan, assembler.staging_dir().join("out.mp4"))
            .await;

        assert!(result.is_err());
    }
}
