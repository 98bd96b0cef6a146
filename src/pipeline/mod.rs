//! # Assembly Pipeline
//!
//! End-to-end orchestration: discovery, inspection, scheduling,
//! materialization, verification and the optional finishing steps.

pub mod engine;

pub use engine::{AssembledReel, AssemblyEngine, InputSource, Strategy};
