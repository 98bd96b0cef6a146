//! ffmpeg invocation helpers.
//!
//! Every cut, loop, mute and mux in the pipeline runs through the external
//! `ffmpeg` binary; nothing in this crate decodes media itself.

use std::path::Path;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, Result};

/// Encoding parameters applied when fragments are cut and assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeParams {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Constant output frame rate
    pub fps: u32,

    /// x264 constant rate factor (lower is higher quality)
    pub crf: u8,

    /// x264 encoder preset
    pub preset: String,

    /// Bitrate ceiling, e.g. "8M"
    pub maxrate: String,

    /// Rate-control buffer size, e.g. "16M"
    pub bufsize: String,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            crf: 23,
            preset: "veryfast".to_string(),
            maxrate: "8M".to_string(),
            bufsize: "16M".to_string(),
        }
    }
}

/// Check that the ffmpeg binary is reachable.
pub fn ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok()
}

/// Run ffmpeg with the given arguments, failing with captured stderr.
pub async fn run_ffmpeg<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    which::which("ffmpeg").map_err(|_| MediaError::ToolMissing { tool: "ffmpeg".to_string() })?;

    let output = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut reason = stderr.trim().to_string();
        if stderr.contains("Error opening filters!") {
            reason.push_str("\nfilter chain error - check video compatibility");
        } else if stderr.contains("Invalid data found") {
            reason.push_str("\ncorrupt input data - check source videos");
        }
        return Err(MediaError::TranscodeFailed { reason }.into());
    }
    Ok(())
}

/// Cut `[start, end)` out of a clip, re-encoding for frame accuracy.
///
/// `speed_up` doubles the playback rate of the extract; the cut still covers
/// the full source range, so a sped-up fragment plays in half the wall-clock
/// time the range spans.
pub async fn cut_clip(
    input: impl AsRef<Path>,
    start: f64,
    end: f64,
    speed_up: bool,
    output: impl AsRef<Path>,
) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound { path: input.display().to_string() }.into());
    }

    debug!(
        input = %input.display(),
        start,
        end,
        speed_up,
        "cutting fragment"
    );

    let mut args: Vec<String> = vec![
        "-i".into(),
        input.display().to_string(),
        "-ss".into(),
        format!("{start:.3}"),
        "-t".into(),
        format!("{:.3}", end - start),
    ];
    if speed_up {
        args.extend(["-filter:v".into(), "setpts=PTS/2".into(), "-an".into()]);
    }
    args.extend([
        "-c:v".into(),
        "libx264".into(),
        "-c:a".into(),
        "aac".into(),
        "-y".into(),
        output.display().to_string(),
    ]);

    run_ffmpeg(&args).await?;
    ensure_created(output)
}

/// Normalize a source into a concat-friendly fragment: forced pixel format,
/// constant frame rate, no audio track.
pub async fn normalize_clip(
    input: impl AsRef<Path>,
    params: &EncodeParams,
    output: impl AsRef<Path>,
) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound { path: input.display().to_string() }.into());
    }

    run_ffmpeg([
        "-y",
        "-i",
        &input.display().to_string(),
        "-vf",
        "format=yuv420p",
        "-c:v",
        "libx264",
        "-preset",
        "medium",
        "-crf",
        &params.crf.to_string(),
        "-fps_mode",
        "cfr",
        "-r",
        &params.fps.to_string(),
        "-movflags",
        "+faststart",
        "-an",
        "-f",
        "mp4",
        &output.display().to_string(),
    ])
    .await?;
    ensure_created(output)
}

/// Strip the audio track with a stream-copy pass.
pub async fn remove_audio(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound { path: input.display().to_string() }.into());
    }

    run_ffmpeg([
        "-i",
        &input.display().to_string(),
        "-c:v",
        "copy",
        "-an",
        "-y",
        &output.display().to_string(),
    ])
    .await?;
    ensure_created(output)
}

/// Mux a narration track onto a video, ending at the shorter of the two.
pub async fn attach_narration(
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<()> {
    let video = video.as_ref();
    let audio = audio.as_ref();
    let output = output.as_ref();
    for path in [video, audio] {
        if !path.exists() {
            return Err(MediaError::FileNotFound { path: path.display().to_string() }.into());
        }
    }

    run_ffmpeg([
        "-i",
        &video.display().to_string(),
        "-i",
        &audio.display().to_string(),
        "-map",
        "0:v:0",
        "-map",
        "1:a:0",
        "-c:v",
        "copy",
        "-c:a",
        "aac",
        "-shortest",
        "-y",
        &output.display().to_string(),
    ])
    .await?;
    ensure_created(output)
}

fn ensure_created(output: &Path) -> Result<()> {
    if !output.exists() {
        return Err(MediaError::TranscodeFailed {
            reason: format!("output file not created: {}", output.display()),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_encode_params_match_the_delivery_profile() {
        let params = EncodeParams::default();
        assert_eq!((params.width, params.height), (1920, 1080));
        assert_eq!(params.fps, 30);
        assert_eq!(params.crf, 23);
    }

    #[tokio::test]
    async fn cutting_a_missing_input_fails_before_spawning() {
        let result = cut_clip("no/such/clip.mp4", 0.0, 1.0, false, "out.mp4").await;
        assert!(result.is_err());
    }
}
