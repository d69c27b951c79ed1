//! Game session turn engine.

/// Engine owning the active session and its state machine.
pub mod engine;
mod models;
mod turn;

pub use engine::{GameEngine, GameSession};
pub use models::{Cursor, ScoreTable, SessionConfig, SessionId, Standing, TurnResolution};
pub use turn::Turn;
