//! # Media Layer
//!
//! Subprocess plumbing around ffprobe (clip inspection) and ffmpeg
//! (cutting, looping, concatenation, muting, narration muxing). The
//! scheduler stays byte-free; this layer is where plans become files.

pub mod assembler;
pub mod probe;
pub mod transcoder;

pub use assembler::{verify_duration, Assembler};
pub use probe::{media_duration, probe_video, MediaInfo};
pub use transcoder::{
    attach_narration, cut_clip, ffmpeg_available, normalize_clip, remove_audio, EncodeParams,
};
