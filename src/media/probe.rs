//! Clip inspection via ffprobe.
//!
//! The scheduler never re-derives durations; everything it knows about a
//! clip comes from here.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, Result};

/// Metadata measured from a media container.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,

    /// Container format name
    pub format: String,

    /// Width in pixels (0 when the file has no video stream dimensions)
    pub width: u32,

    /// Height in pixels
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a video file, requiring a video stream.
pub async fn probe_video(path: impl AsRef<Path>) -> Result<MediaInfo> {
    let path = path.as_ref();
    let probe = run_ffprobe(path).await?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::NoVideoStream { path: path.display().to_string() })?;

    let info = MediaInfo {
        duration: parse_duration(path, &probe.format)?,
        format: probe.format.format_name.clone().unwrap_or_default(),
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
    };
    debug!(path = %path.display(), duration = info.duration, "probed video");
    Ok(info)
}

/// Measure the duration of any media file (video or audio).
pub async fn media_duration(path: impl AsRef<Path>) -> Result<f64> {
    let path = path.as_ref();
    let probe = run_ffprobe(path).await?;
    parse_duration(path, &probe.format)
}

async fn run_ffprobe(path: &Path) -> Result<ProbeOutput> {
    if !path.exists() {
        return Err(MediaError::FileNotFound { path: path.display().to_string() }.into());
    }
    which::which("ffprobe").map_err(|_| MediaError::ToolMissing { tool: "ffprobe".to_string() })?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    serde_json::from_slice(&output.stdout).map_err(|e| {
        MediaError::ProbeFailed { path: path.display().to_string(), reason: e.to_string() }.into()
    })
}

fn parse_duration(path: &Path, format: &ProbeFormat) -> Result<f64> {
    let duration = format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: "no duration in container format".to_string(),
        })?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: format!("unusable duration {duration}"),
        }
        .into());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parsing_accepts_plain_seconds() {
        let format = ProbeFormat {
            duration: Some("27.432000".to_string()),
            format_name: Some("mov,mp4,m4a".to_string()),
        };
        let parsed = parse_duration(Path::new("x.mp4"), &format).unwrap();
        assert!((parsed - 27.432).abs() < 1e-9);
    }

    #[test]
    fn missing_duration_is_an_error() {
        let format = ProbeFormat { duration: None, format_name: None };
        assert!(parse_duration(Path::new("x.mp4"), &format).is_err());
    }

    #[test]
    fn negative_duration_is_an_error() {
        let format = ProbeFormat { duration: Some("-1.0".to_string()), format_name: None };
        assert!(parse_duration(Path::new("x.mp4"), &format).is_err());
    }

    #[tokio::test]
    async fn probing_a_missing_file_fails_fast() {
        let result = media_duration("definitely/not/here.mp4").await;
        assert!(result.is_err());
    }
}
