use crate::{
    catalog::LegendDraw,
    clock::TurnClock,
    error::{EngineError, EngineResult},
};

use super::models::Cursor;

/// One team's timed attempt: the category they chose, their card and their clock.
///
/// Owned by the session while it is being played and dropped when it is
/// resolved, replaced or the game is abandoned.
#[derive(Debug, Clone)]
pub struct Turn {
    cursor: Cursor,
    category: String,
    drawn: LegendDraw,
    clock: TurnClock,
}

impl Turn {
    pub(crate) fn new(cursor: Cursor, category: String, drawn: LegendDraw, seconds: u32) -> Self {
        Self {
            cursor,
            category,
            drawn,
            clock: TurnClock::start(seconds),
        }
    }

    /// Round and team this turn belongs to.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Category chosen for this turn.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Card drawn for this turn.
    pub fn drawn(&self) -> &LegendDraw {
        &self.drawn
    }

    /// Countdown of this turn.
    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    pub(crate) fn clock_mut(&mut self) -> &mut TurnClock {
        &mut self.clock
    }

    /// Fails once the clock has been cancelled; a verdict on such a turn is void.
    pub(crate) fn ensure_live(&self) -> EngineResult<()> {
        if self.clock.is_cancelled() {
            return Err(EngineError::ExpiredAfterCancel);
        }
        Ok(())
    }
}
