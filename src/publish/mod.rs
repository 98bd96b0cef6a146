//! # Publishing
//!
//! Client for the posting service that schedules finished reels onto
//! social platforms.

pub mod postiz;

pub use postiz::{Integration, PostStatus, PostingClient, UploadedMedia};
