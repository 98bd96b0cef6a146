//! # Voiceover
//!
//! Optional narration for an assembled reel: a chat-completion client
//! writes the script, a TTS client turns it into audio, and the media
//! layer muxes it onto the video.

pub mod script;
pub mod tts;

pub use script::{ScriptGenerator, DEFAULT_SCRIPT_PROMPT};
pub use tts::{SpeechSynthesizer, VoiceSettings};
