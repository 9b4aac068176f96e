//! Game session state.
//!
//! A `Game` binds two participants to one board and enforces the rules.
//! It is driven one intent at a time (see `runtime`) and answers every
//! intent with notifications queued on the participants' outboxes.

use std::fmt;

use tracing::{debug, error, info, instrument, warn};

use super::board::{Board, Color};
use super::connection::Outbox;
use super::player::{Phase, PhaseInputs, Player, START_CHECKERS};
use super::protocol::{decode, ClientMessage, InboundFrame, ServerMessage};

/// Participants per session.
pub const PLAYERS_IN_SESSION: usize = 2;

/// Color that moves first in every game.
pub const FIRST_COLOR: Color = Color::Blue;

/// Checkers in play across both players.
pub const TOTAL_CHECKERS: usize = PLAYERS_IN_SESSION * START_CHECKERS as usize;

/// Which of the two bound endpoints a participant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub const ALL: [Seat; PLAYERS_IN_SESSION] = [Seat::First, Seat::Second];

    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameStatus {
    /// Accepting intents
    #[default]
    Active,
    /// Torn down; every further intent is ignored
    Destroyed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Destroyed => "destroyed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

/// A well-formed intent the rules reject. Nothing changes on rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("another player is moving")]
    NotYourTurn,
    #[error("you can't move your checkers now")]
    CannotMoveNow,
    #[error("cell {0} does not exist")]
    UnknownTarget(String),
    #[error("previous cell {0} does not exist")]
    UnknownSource(String),
    #[error("move does not match the game phase")]
    PhaseMismatch,
    #[error("cell {0} is already occupied")]
    Occupied(String),
    #[error("cell {from} is not yours or {to} is not empty")]
    NotYourChecker { from: String, to: String },
    #[error("move from {from} to {to} breaks the phase rules: only one step along a line")]
    NotAdjacent { from: String, to: String },
    #[error("you can't remove an opponent checker now")]
    CannotRemoveNow,
    #[error("cell {0} does not exist")]
    UnknownCell(String),
    #[error("cell {0} is empty or holds your checker")]
    NotOpponentChecker(String),
    #[error("game session is closed")]
    SessionClosed,
}

/// What an accepted intent led to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Lines that became mills
    pub mills: Vec<String>,
    /// New turn holder, if the turn passed
    pub next_turn: Option<Color>,
    /// Winner, if the game just ended
    pub winner: Option<Color>,
}

/// One two-player session.
#[derive(Debug)]
pub struct Game {
    /// Unique game ID
    pub id: String,

    pub status: GameStatus,

    board: Board,

    /// Indexed by `Seat::index`; the first seat always plays `FIRST_COLOR`
    players: [Player; PLAYERS_IN_SESSION],

    /// Color whose turn it is
    turn: Color,

    /// Set when a result was announced, cleared on restart
    winner: Option<Color>,

    pub created_at: chrono::DateTime<chrono::Utc>,

    /// When the current game (re)started
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,

    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Game {
    /// Bind two outboxes into a new session. Nothing is sent until `start`.
    pub fn new(id: String, outboxes: [Outbox; PLAYERS_IN_SESSION]) -> Self {
        let [first, second] = outboxes;
        info!(game_id = %id, "Creating game session");
        Self {
            id,
            status: GameStatus::Active,
            board: Board::new(),
            players: [
                Player::new(FIRST_COLOR, first),
                Player::new(FIRST_COLOR.opponent(), second),
            ],
            turn: FIRST_COLOR,
            winner: None,
            created_at: chrono::Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Announce the game to both participants.
    pub fn start(&mut self) {
        if !self.status.is_active() {
            return;
        }
        self.started_at = Some(chrono::Utc::now());
        info!(game_id = %self.id, first = %self.turn, "Game started");
        self.send_start_messages();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn seat_of(&self, color: Color) -> Seat {
        if self.players[0].color() == color {
            Seat::First
        } else {
            Seat::Second
        }
    }

    // Inbound

    /// Decode and process one inbound frame from `seat`.
    pub fn handle_frame(&mut self, seat: Seat, frame: &InboundFrame) {
        if !self.status.is_active() {
            return;
        }

        match decode(frame) {
            Ok(message) => self.handle_message(seat, message),
            Err(e) => {
                warn!(game_id = %self.id, %seat, error = %e, "Malformed inbound message");
                self.notify(seat, ServerMessage::incorrect_request(e.to_string()));
            }
        }
    }

    /// Process one decoded intent from `seat`.
    pub fn handle_message(&mut self, seat: Seat, message: ClientMessage) {
        if !self.status.is_active() {
            return;
        }

        let result = match message {
            ClientMessage::PlayerMoveChecker { from, to } => {
                self.move_checker(seat, from.as_deref(), &to).map(|_| ())
            }
            ClientMessage::PlayerRemoveChecker { from } => {
                self.remove_checker(seat, &from).map(|_| ())
            }
            ClientMessage::RepeatGame => self.restart(),
            ClientMessage::GameAborted => {
                self.destroy(Some(seat));
                Ok(())
            }
            ClientMessage::IncorrectRequest { message } => {
                self.notify(seat, ServerMessage::IncorrectRequest { message });
                Ok(())
            }
            ClientMessage::IncorrectResponse { message } => {
                error!(game_id = %self.id, %seat, report = %message, "Client rejected a server message");
                Ok(())
            }
        };

        if let Err(violation) = result {
            self.reject(seat, violation);
        }
    }

    fn reject(&mut self, seat: Seat, violation: RuleViolation) {
        warn!(game_id = %self.id, %seat, reason = %violation, "Rejected intent");
        self.notify(seat, ServerMessage::incorrect_request(violation.to_string()));
    }

    // Rules

    /// Place a checker from supply (`from` is `None`) or move one.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn move_checker(
        &mut self,
        seat: Seat,
        from: Option<&str>,
        to: &str,
    ) -> Result<Outcome, RuleViolation> {
        self.ensure_active()?;

        let color = self.players[seat.index()].color();
        let phase = self.players[seat.index()].phase();

        if color != self.turn {
            return Err(RuleViolation::NotYourTurn);
        }
        if !phase.can_move() {
            return Err(RuleViolation::CannotMoveNow);
        }
        if !self.board.exists(to) {
            return Err(RuleViolation::UnknownTarget(to.to_string()));
        }

        match from.filter(|f| !f.is_empty()) {
            None => {
                if phase != Phase::Placing {
                    return Err(RuleViolation::PhaseMismatch);
                }
                if !self.board.is_empty_cell(to) {
                    return Err(RuleViolation::Occupied(to.to_string()));
                }

                self.board.place(to, color);
                let free_checkers = self.players[seat.index()].place_one_from_supply();
                debug!(%color, to, free_checkers, "Checker placed");
                self.broadcast(ServerMessage::ChangeFreeCheckers {
                    color,
                    free_checkers,
                });
            }
            Some(from) => {
                if !self.board.exists(from) {
                    return Err(RuleViolation::UnknownSource(from.to_string()));
                }
                if self.board.occupant_of(from) != Some(color) || !self.board.is_empty_cell(to) {
                    return Err(RuleViolation::NotYourChecker {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
                match phase {
                    Phase::Flying => {}
                    Phase::Sliding if self.board.is_adjacent(from, to) => {}
                    Phase::Sliding => {
                        return Err(RuleViolation::NotAdjacent {
                            from: from.to_string(),
                            to: to.to_string(),
                        })
                    }
                    _ => return Err(RuleViolation::PhaseMismatch),
                }

                self.board.move_checker(from, to);
                debug!(%color, from, to, %phase, "Checker moved");
            }
        }

        self.broadcast_board();

        let mills = self.new_mills_at(to, color);
        for line in &mills {
            self.board.record_mill(line, color);
        }

        self.refresh_phases();
        debug_assert!(self.is_conserved(), "checker conservation broken");

        if !mills.is_empty() {
            info!(game_id = %self.id, %color, ?mills, "Mill formed");
            self.broadcast(ServerMessage::ChangeMerellus {
                lines: self.board.mills().clone(),
            });
            return Ok(Outcome {
                mills,
                ..Outcome::default()
            });
        }

        Ok(self.pass_turn())
    }

    /// Remove an opponent checker after forming a mill.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn remove_checker(&mut self, seat: Seat, cell: &str) -> Result<Outcome, RuleViolation> {
        self.ensure_active()?;

        let color = self.players[seat.index()].color();

        if color != self.turn {
            return Err(RuleViolation::NotYourTurn);
        }
        if self.players[seat.index()].phase() != Phase::Removing {
            return Err(RuleViolation::CannotRemoveNow);
        }
        if !self.board.exists(cell) {
            return Err(RuleViolation::UnknownCell(cell.to_string()));
        }
        if self.board.occupant_of(cell) != Some(color.opponent()) {
            return Err(RuleViolation::NotOpponentChecker(cell.to_string()));
        }

        self.board.remove(cell);
        debug!(%color, cell, "Checker removed");
        self.broadcast_board();

        // Two mills from one move owe two removals
        if self.unresolved_mills() > 0 {
            return Ok(Outcome::default());
        }

        self.refresh_phases();
        debug_assert!(self.is_conserved(), "checker conservation broken");

        Ok(self.pass_turn())
    }

    /// Clear the board and start over with the same participants.
    pub fn restart(&mut self) -> Result<(), RuleViolation> {
        self.ensure_active()?;

        self.board.reset();
        self.players[Seat::First.index()].initialize(FIRST_COLOR);
        self.players[Seat::Second.index()].initialize(FIRST_COLOR.opponent());
        self.turn = FIRST_COLOR;
        self.winner = None;
        self.started_at = Some(chrono::Utc::now());

        info!(game_id = %self.id, "Game restarted");
        self.send_start_messages();
        Ok(())
    }

    /// Tear the session down. Every open participant other than `initiator`
    /// is told the game was aborted, then both outboxes close.
    ///
    /// Returns `false` if the session was already destroyed.
    pub fn destroy(&mut self, initiator: Option<Seat>) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.status = GameStatus::Destroyed;
        self.ended_at = Some(chrono::Utc::now());

        for seat in Seat::ALL {
            if Some(seat) == initiator || self.players[seat.index()].outbox.is_closed() {
                continue;
            }
            self.notify(seat, ServerMessage::GameAborted);
        }
        for player in &mut self.players {
            player.outbox.close();
        }
        self.board.reset();

        info!(game_id = %self.id, initiator = ?initiator, "Game destroyed");
        true
    }

    /// Tear down if either participant's channel is gone.
    pub fn check_connections(&mut self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        let closed = Seat::ALL
            .into_iter()
            .find(|seat| self.players[seat.index()].outbox.is_closed());
        match closed {
            Some(seat) => {
                info!(game_id = %self.id, %seat, "Participant channel closed");
                self.destroy(None)
            }
            None => false,
        }
    }

    // Bookkeeping

    fn ensure_active(&self) -> Result<(), RuleViolation> {
        if self.status.is_active() {
            Ok(())
        } else {
            Err(RuleViolation::SessionClosed)
        }
    }

    /// Lines through `cell` that `color` just completed and that carry no
    /// earlier mill record.
    fn new_mills_at(&self, cell: &str, color: Color) -> Vec<String> {
        self.board
            .lines_of(cell)
            .iter()
            .filter(|line| self.board.mill_on(line).is_none())
            .filter(|line| self.board.line_filled_by(line, color))
            .cloned()
            .collect()
    }

    /// Checkers accounted for: supplies, checkers on board, recorded mills.
    pub fn accounted_checkers(&self) -> usize {
        let supplies: usize = self.players.iter().map(|p| p.supply() as usize).sum();
        supplies + self.board.total_occupied() + self.board.total_mills()
    }

    /// Mills whose removal has not been carried out yet.
    pub fn unresolved_mills(&self) -> usize {
        self.accounted_checkers().saturating_sub(TOTAL_CHECKERS)
    }

    /// Every mill stands for exactly one removed checker once its removal
    /// is done; until then only the mill's owner may be in `Removing`.
    pub fn is_conserved(&self) -> bool {
        let accounted = self.accounted_checkers();
        if accounted < TOTAL_CHECKERS {
            return false;
        }
        let removing = self
            .players
            .iter()
            .any(|p| p.phase() == Phase::Removing);
        removing == (accounted > TOTAL_CHECKERS)
    }

    fn derive_phase(&self, seat: Seat) -> Phase {
        let player = &self.players[seat.index()];
        let opponent = &self.players[seat.other().index()];
        let color = player.color();

        Phase::derive(&PhaseInputs {
            supply: player.supply(),
            on_board: self.board.count_occupied(color),
            mills: self.board.count_mills(color),
            all_closed: self.board.all_closed(color),
            opponent_supply: opponent.supply(),
            opponent_on_board: self.board.count_occupied(opponent.color()),
        })
    }

    /// Recompute both phases and tell each player about its own change.
    fn refresh_phases(&mut self) {
        for seat in Seat::ALL {
            let phase = self.derive_phase(seat);
            if self.players[seat.index()].set_phase(phase) {
                debug!(game_id = %self.id, %seat, %phase, "Phase changed");
                self.notify(seat, ServerMessage::ChangePlayerState { my_state: phase });
            }
        }
    }

    /// Hand the turn over and end the game if the new holder can't move.
    fn pass_turn(&mut self) -> Outcome {
        self.turn = self.turn.opponent();
        for seat in Seat::ALL {
            let my_turn = self.players[seat.index()].color() == self.turn;
            self.notify(seat, ServerMessage::ChangePlayer { my_turn });
        }

        let holder = self.seat_of(self.turn);
        let winner = if self.players[holder.index()].phase() == Phase::Finished {
            let winner = self.turn.opponent();
            self.winner = Some(winner);
            info!(game_id = %self.id, %winner, "Game over");
            for seat in Seat::ALL {
                let win = self.players[seat.index()].color() != self.turn;
                self.notify(seat, ServerMessage::GameResult { win });
            }
            Some(winner)
        } else {
            None
        };

        Outcome {
            mills: Vec::new(),
            next_turn: Some(self.turn),
            winner,
        }
    }

    // Outbound

    fn send_start_messages(&mut self) {
        for seat in Seat::ALL {
            let my_turn = self.players[seat.index()].color() == self.turn;
            self.notify(seat, ServerMessage::GameStarted { my_turn });
        }
    }

    fn broadcast_board(&mut self) {
        self.broadcast(ServerMessage::ChangeBoard {
            busy_field: self.board.busy_field().clone(),
        });
    }

    fn broadcast(&mut self, message: ServerMessage) {
        for seat in Seat::ALL {
            self.notify(seat, message.clone());
        }
    }

    /// Queue a message for one participant. Failures are logged only.
    fn notify(&mut self, seat: Seat, message: ServerMessage) {
        let kind = message.kind();
        if let Err(e) = self.players[seat.index()].outbox.send(message) {
            warn!(game_id = %self.id, %seat, kind, error = %e, "Failed to send notification");
        }
    }

    /// Full state snapshot for diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "game_id": self.id,
            "status": self.status.as_str(),
            "turn": self.turn,
            "winner": self.winner,
            "board": self.board.to_json(),
            "players": [self.players[0].to_json(), self.players[1].to_json()],
            "created_at": self.created_at.to_rfc3339(),
            "started_at": self.started_at.map(|t| t.to_rfc3339()),
            "ended_at": self.ended_at.map(|t| t.to_rfc3339())
        })
    }
}
