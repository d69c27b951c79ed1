#![warn(clippy::all, missing_docs)]

//! Core domain logic for Legends Showdown.
//!
//! This crate hosts the turn engine and its countdown clock, the legend
//! catalog, configuration handling and the small persistence layer used by
//! the terminal UI and any future frontends.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod sequencer;
pub mod session;
pub mod settings;

pub use catalog::{LegendCatalog, LegendDraw};
pub use clock::{ClockEvent, ClockPhase, TurnClock};
pub use config::AppConfig;
pub use error::{EngineError, EngineResult};
pub use models::{Legend, Outcome, Team};
pub use sequencer::{CategorySequencer, RepeatPolicy};
pub use session::{
    Cursor, GameEngine, GameSession, ScoreTable, SessionConfig, SessionId, Standing, Turn,
    TurnResolution,
};
pub use settings::{Settings, SettingsStore};
