//! A pairing and scoring engine for chess tournaments: Swiss (Dutch system),
//! round-robin, quad, single-elimination, and team Swiss, plus the standings
//! and round-lifecycle machinery around them (§1 overview).
//!
//! This crate is a pure engine: no network layer, no persistence beyond the
//! `repository` traits, no process entry point. A host process wires an
//! `EngineContext`, a concrete `repository` implementation, and the HTTP
//! surface described in §6.2 around the types exported here.

pub mod context;
pub mod domain;
pub mod error;
pub mod identifiers;
pub mod pairing;
pub mod player_registry;
pub mod repository;
pub mod result_recorder;
pub mod round_controller;
pub mod scoring;
pub mod section;

pub use context::{EngineContext, EngineContextSettings};
pub use error::{EngineError, EngineResult};
pub use player_registry::PlayerRegistry;
pub use result_recorder::ResultRecorder;
pub use round_controller::{RoundController, RoundState};
pub use section::SectionPartitioner;
