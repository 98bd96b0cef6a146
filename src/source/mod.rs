//! # Clip Sources
//!
//! Candidate discovery and selection: local directory scans, remote
//! share-folder retrieval, and the randomized pick of which candidates a
//! run will actually use.

pub mod local;
pub mod select;
pub mod share;

pub use local::{scan_directory, validate_files, VIDEO_EXTENSIONS};
pub use select::select_candidates;
pub use share::{folder_id_from_url, RemoteFile, ShareFolderClient};
