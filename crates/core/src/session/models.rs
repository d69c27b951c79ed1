#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::EngineError, models::Team};

/// Identifier handed out by `start_game`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Choices made on the setup screen. Immutable once the game starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub teams: Vec<Team>,
    pub num_rounds: u32,
    /// Seconds per turn.
    pub time_per_turn: u32,
}

impl SessionConfig {
    pub fn new<T: Into<Team>>(
        teams: impl IntoIterator<Item = T>,
        num_rounds: u32,
        time_per_turn: u32,
    ) -> Self {
        Self {
            teams: teams.into_iter().map(Into::into).collect(),
            num_rounds,
            time_per_turn,
        }
    }

    /// Check the configuration can be played.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.teams.len() < 2 {
            return Err(EngineError::InvalidConfiguration(format!(
                "at least 2 teams are required, got {}",
                self.teams.len()
            )));
        }
        if let Some(index) = self.teams.iter().position(Team::is_blank) {
            return Err(EngineError::InvalidConfiguration(format!(
                "team {} has an empty name",
                index + 1
            )));
        }
        if self.num_rounds == 0 {
            return Err(EngineError::InvalidConfiguration(
                "number of rounds must be at least 1".to_string(),
            ));
        }
        if self.time_per_turn == 0 {
            return Err(EngineError::InvalidConfiguration(
                "time per turn must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Turns in a full game: one per team per round.
    pub fn total_turns(&self) -> usize {
        self.num_rounds as usize * self.teams.len()
    }

    pub(crate) fn trimmed(&self) -> Self {
        Self {
            teams: self.teams.iter().map(Team::trimmed).collect(),
            num_rounds: self.num_rounds,
            time_per_turn: self.time_per_turn,
        }
    }
}

/// Position of the turn about to be played or in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub round: u32,
    pub team_index: usize,
}

impl Cursor {
    pub fn new(round: u32, team_index: usize) -> Self {
        Self { round, team_index }
    }

    /// `true` when this cursor denotes the final turn of the game.
    pub fn is_last(&self, config: &SessionConfig) -> bool {
        self.team_index + 1 == config.teams.len() && self.round + 1 == config.num_rounds
    }

    /// Round-robin successor: next team, next round on wrap.
    pub(crate) fn advance(&self, team_count: usize) -> Self {
        let team_index = (self.team_index + 1).checked_rem(team_count).unwrap_or(0);
        let round = if team_index == 0 {
            self.round + 1
        } else {
            self.round
        };
        Self { round, team_index }
    }

    /// Zero-based position in the total turn order.
    pub fn ordinal(&self, team_count: usize) -> usize {
        self.round as usize * team_count + self.team_index
    }
}

/// Correct-turn counts per team index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreTable(Vec<u32>);

impl ScoreTable {
    pub fn zeroed(teams: usize) -> Self {
        Self(vec![0; teams])
    }

    pub fn get(&self, team_index: usize) -> Option<u32> {
        self.0.get(team_index).copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum over every team.
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.0.iter().copied().enumerate()
    }

    pub(crate) fn award(&mut self, team_index: usize, points: u32) {
        if let Some(score) = self.0.get_mut(team_index) {
            *score += points;
        }
    }
}

/// Answer to `resolve_turn`; the frontend routes on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnResolution {
    /// Play continues with the turn at `cursor`.
    NextTurn { cursor: Cursor },
    /// The last turn was resolved; no further turn may start.
    GameComplete { scores: ScoreTable },
    /// The turn's clock had been cancelled, so nothing was recorded.
    Discarded,
}

impl TurnResolution {
    pub fn is_complete(&self) -> bool {
        matches!(self, TurnResolution::GameComplete { .. })
    }
}

/// A team's line on the results screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub team_index: usize,
    pub team: Team,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_bad_configs() {
        let solo = SessionConfig::new(["Solo"], 2, 60);
        assert!(matches!(
            solo.validate(),
            Err(EngineError::InvalidConfiguration(_))
        ));

        let blank = SessionConfig::new(["Red", "  "], 2, 60);
        assert!(blank.validate().is_err());

        let no_rounds = SessionConfig::new(["Red", "Blue"], 0, 60);
        assert!(no_rounds.validate().is_err());

        let no_time = SessionConfig::new(["Red", "Blue"], 1, 0);
        assert!(no_time.validate().is_err());

        let duplicates = SessionConfig::new(["Red", "Red"], 1, 1);
        assert!(duplicates.validate().is_ok());
    }

    #[test]
    fn cursor_wraps_into_next_round() {
        let cursor = Cursor::new(0, 2).advance(3);
        assert_eq!(cursor, Cursor::new(1, 0));
        assert_eq!(Cursor::new(1, 1).ordinal(3), 4);

        let config = SessionConfig::new(["A", "B", "C"], 2, 30);
        assert!(Cursor::new(1, 2).is_last(&config));
        assert!(!Cursor::new(0, 2).is_last(&config));
    }

    #[test]
    fn advance_without_teams_moves_to_next_round() {
        assert_eq!(Cursor::new(0, 0).advance(0), Cursor::new(1, 0));
        assert_eq!(Cursor::new(3, 5).advance(1), Cursor::new(4, 0));
    }

    #[test]
    fn score_table_totals() {
        let mut scores = ScoreTable::zeroed(3);
        scores.award(1, 1);
        scores.award(1, 1);
        scores.award(2, 0);
        scores.award(9, 1);
        assert_eq!(scores.as_slice(), &[0, 2, 0]);
        assert_eq!(scores.total(), 2);
    }
}
