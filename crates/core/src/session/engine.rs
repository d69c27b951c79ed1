#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::{
    catalog::LegendCatalog,
    clock::ClockEvent,
    error::{EngineError, EngineResult},
    models::{Outcome, Team},
};

use super::{
    models::{Cursor, ScoreTable, SessionConfig, SessionId, Standing, TurnResolution},
    turn::Turn,
};

/// State of one match, from `start_game` until it is abandoned or replaced.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    config: SessionConfig,
    scores: ScoreTable,
    cursor: Cursor,
    turns_played: usize,
    complete: bool,
    turn: Option<Turn>,
    started_at: DateTime<Utc>,
}

impl GameSession {
    fn new(id: SessionId, config: SessionConfig) -> Self {
        let scores = ScoreTable::zeroed(config.teams.len());
        Self {
            id,
            config,
            scores,
            cursor: Cursor::default(),
            turns_played: 0,
            complete: false,
            turn: None,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    /// Current turn position. After the final resolution this is one past the
    /// last turn: `(num_rounds, 0)`.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_team(&self) -> &Team {
        &self.config.teams[self.cursor.team_index]
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }

    pub fn turns_played(&self) -> usize {
        self.turns_played
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Teams with their scores, best first; ties keep rotation order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .config
            .teams
            .iter()
            .enumerate()
            .map(|(team_index, team)| Standing {
                team_index,
                team: team.clone(),
                score: self.scores.get(team_index).unwrap_or(0),
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }

    /// Standings of every team sharing the top score, identified by index.
    pub fn leaders(&self) -> Vec<Standing> {
        let standings = self.standings();
        let Some(best) = standings.first().map(|standing| standing.score) else {
            return Vec::new();
        };
        standings
            .into_iter()
            .take_while(|standing| standing.score == best)
            .collect()
    }

    fn resolve(&mut self, outcome: Outcome) -> EngineResult<TurnResolution> {
        if let Some(turn) = self.turn.as_ref() {
            turn.ensure_live()?;
        }
        self.turn = None;

        let resolved = self.cursor;
        let team = self.current_team().clone();
        self.scores.award(resolved.team_index, outcome.points());
        let was_last = resolved.is_last(&self.config);
        self.cursor = resolved.advance(self.config.teams.len());
        self.turns_played += 1;

        info!(
            session = %self.id,
            round = resolved.round,
            team = %team,
            ?outcome,
            "Turn resolved"
        );

        if was_last {
            self.complete = true;
            info!(session = %self.id, total = self.scores.total(), "Game complete");
            return Ok(TurnResolution::GameComplete {
                scores: self.scores.clone(),
            });
        }
        Ok(TurnResolution::NextTurn {
            cursor: self.cursor,
        })
    }
}

/// Owner of the single authoritative game session.
#[derive(Debug, Default)]
pub struct GameEngine {
    session: Option<GameSession>,
    next_id: u64,
}

impl GameEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config` and start a fresh game, replacing any previous one.
    ///
    /// On failure the previous session, if any, is kept as it was.
    pub fn start_game(&mut self, config: SessionConfig) -> EngineResult<SessionId> {
        config.validate()?;
        self.abandon();

        self.next_id += 1;
        let id = SessionId(self.next_id);
        let config = config.trimmed();
        info!(
            session = %id,
            teams = config.teams.len(),
            rounds = config.num_rounds,
            seconds = config.time_per_turn,
            "Game started"
        );
        self.session = Some(GameSession::new(id, config));
        Ok(id)
    }

    /// Session if one exists, finished or not.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn config(&self) -> EngineResult<&SessionConfig> {
        Ok(self.require()?.config())
    }

    pub fn current_team(&self) -> EngineResult<&Team> {
        Ok(self.require()?.current_team())
    }

    pub fn current_round(&self) -> EngineResult<u32> {
        Ok(self.require()?.cursor().round)
    }

    pub fn cursor(&self) -> EngineResult<Cursor> {
        Ok(self.require()?.cursor())
    }

    pub fn scores(&self) -> EngineResult<&ScoreTable> {
        Ok(self.require()?.scores())
    }

    pub fn standings(&self) -> EngineResult<Vec<Standing>> {
        Ok(self.require()?.standings())
    }

    pub fn leaders(&self) -> EngineResult<Vec<Standing>> {
        Ok(self.require()?.leaders())
    }

    pub fn total_turns(&self) -> EngineResult<usize> {
        Ok(self.require()?.config().total_turns())
    }

    pub fn turns_played(&self) -> EngineResult<usize> {
        Ok(self.require()?.turns_played())
    }

    pub fn is_complete(&self) -> bool {
        self.session
            .as_ref()
            .map(GameSession::is_complete)
            .unwrap_or(false)
    }

    /// Active turn, if one has begun and not yet been resolved.
    pub fn turn(&self) -> Option<&Turn> {
        self.session.as_ref().and_then(GameSession::turn)
    }

    /// Draw a card from `category` and start the clock for the current team.
    ///
    /// An unresolved turn that is still held is cancelled and replaced.
    pub fn begin_turn<R: Rng + ?Sized>(
        &mut self,
        category: &str,
        catalog: &LegendCatalog,
        rng: &mut R,
    ) -> EngineResult<&Turn> {
        let session = self.require_active_mut()?;
        if let Some(previous) = session.turn.as_mut() {
            debug!(session = %session.id, "Replacing unresolved turn");
            previous.clock_mut().cancel();
        }

        let drawn = catalog.draw_legend(category, rng);
        info!(
            session = %session.id,
            round = session.cursor.round,
            team = %session.current_team(),
            category,
            legend = drawn.name(),
            "Turn started"
        );
        let turn = Turn::new(
            session.cursor,
            category.to_string(),
            drawn,
            session.config.time_per_turn,
        );
        let turn = session.turn.insert(turn);
        Ok(&*turn)
    }

    /// Deliver one scheduler tick to the active turn's clock.
    pub fn tick(&mut self) -> EngineResult<ClockEvent> {
        let session = self.require_active_mut()?;
        let Some(turn) = session.turn.as_mut() else {
            return Ok(ClockEvent::Idle);
        };
        let event = turn.clock_mut().tick();
        if event == ClockEvent::Expired {
            info!(session = %session.id, category = turn.category(), "Turn clock expired");
        }
        Ok(event)
    }

    /// Pause the active turn's clock. `false` when nothing changed.
    pub fn pause_turn(&mut self) -> EngineResult<bool> {
        Ok(self
            .require_active_mut()?
            .turn
            .as_mut()
            .map(|turn| turn.clock_mut().pause())
            .unwrap_or(false))
    }

    /// Resume the active turn's clock. `false` when nothing changed.
    pub fn resume_turn(&mut self) -> EngineResult<bool> {
        Ok(self
            .require_active_mut()?
            .turn
            .as_mut()
            .map(|turn| turn.clock_mut().resume())
            .unwrap_or(false))
    }

    /// Cancel the active turn's clock; a later verdict on it is discarded.
    pub fn cancel_turn(&mut self) -> EngineResult<()> {
        if let Some(turn) = self.require_active_mut()?.turn.as_mut() {
            turn.clock_mut().cancel();
        }
        Ok(())
    }

    /// Record the verdict for the current turn and advance the rotation.
    pub fn resolve_turn(&mut self, outcome: Outcome) -> EngineResult<TurnResolution> {
        let session = self.require_active_mut()?;
        match session.resolve(outcome) {
            Err(EngineError::ExpiredAfterCancel) => {
                debug!(session = %session.id, ?outcome, "Ignoring verdict for cancelled turn");
                Ok(TurnResolution::Discarded)
            }
            other => other,
        }
    }

    /// Drop the session and stop its clock. Safe to call at any time.
    pub fn abandon(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(turn) = session.turn.as_mut() {
                turn.clock_mut().cancel();
            }
            info!(
                session = %session.id,
                turns_played = session.turns_played,
                complete = session.complete,
                "Game abandoned"
            );
        }
    }

    fn require(&self) -> EngineResult<&GameSession> {
        self.session.as_ref().ok_or(EngineError::NoActiveSession)
    }

    fn require_active_mut(&mut self) -> EngineResult<&mut GameSession> {
        match self.session.as_mut() {
            Some(session) if !session.complete => Ok(session),
            _ => Err(EngineError::NoActiveSession),
        }
    }
}
