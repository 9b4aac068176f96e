//! Player records and the phase each player is in.
//!
//! # Phases
//!
//! ```text
//!            ┌────────────────────────────────────────────┐
//!            │               mill formed                  │
//!            ▼                                            │
//! ┌──────────────┐  supply empty  ┌──────────┐  3 left ┌────────┐
//! │   Placing    │───────────────▶│ Sliding  │────────▶│ Flying │
//! └──────────────┘                └──────────┘         └────────┘
//!        │ ▲                         │    │                │
//!   mill │ │ removal done       mill │    │ all closed     │ < 3 left
//!        ▼ │                         ▼    ▼                ▼
//! ┌──────────────┐                ┌──────────┐
//! │   Removing   │                │ Finished │
//! └──────────────┘                └──────────┘
//! ```
//!
//! A phase is never assigned by move code. It is derived from the board and
//! the supplies after every mutation, see [`Phase::derive`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::board::Color;
use super::connection::Outbox;

/// Checkers each player starts with.
pub const START_CHECKERS: u8 = 9;

/// Checkers on board at which a player may fly.
pub const FLYING_CHECKERS: usize = 3;

/// A player's legal-move regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Putting checkers from supply onto empty cells
    #[default]
    Placing,
    /// Moving one step along a line
    Sliding,
    /// Moving to any empty cell
    Flying,
    /// Owes the removal of one opponent checker
    Removing,
    /// No legal move left; this player has lost
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placing => "placing",
            Self::Sliding => "sliding",
            Self::Flying => "flying",
            Self::Removing => "removing",
            Self::Finished => "finished",
        }
    }

    /// Check if the player may put or move a checker.
    pub fn can_move(&self) -> bool {
        matches!(self, Self::Placing | Self::Sliding | Self::Flying)
    }

    /// Derive the phase of a player from counts taken off the board.
    pub fn derive(inputs: &PhaseInputs) -> Self {
        let opponent_lost = (START_CHECKERS as usize)
            .saturating_sub(inputs.opponent_supply as usize)
            .saturating_sub(inputs.opponent_on_board);

        if inputs.mills != opponent_lost {
            return Self::Removing;
        }

        if inputs.supply > 0 {
            return Self::Placing;
        }

        if inputs.on_board > FLYING_CHECKERS && !inputs.all_closed {
            Self::Sliding
        } else if inputs.on_board == FLYING_CHECKERS {
            Self::Flying
        } else {
            Self::Finished
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything phase derivation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseInputs {
    /// Player's remaining supply
    pub supply: u8,
    /// Player's checkers on board
    pub on_board: usize,
    /// Mills recorded for the player's color
    pub mills: usize,
    /// No checker of the player can slide
    pub all_closed: bool,
    pub opponent_supply: u8,
    pub opponent_on_board: usize,
}

/// Per-participant record inside a session.
#[derive(Debug)]
pub struct Player {
    color: Color,
    supply: u8,
    phase: Phase,
    pub outbox: Outbox,
}

impl Player {
    pub fn new(color: Color, outbox: Outbox) -> Self {
        Self {
            color,
            supply: START_CHECKERS,
            phase: Phase::Placing,
            outbox,
        }
    }

    /// Reset to the start of a game, keeping the outbox.
    pub fn initialize(&mut self, color: Color) {
        self.color = color;
        self.supply = START_CHECKERS;
        self.phase = Phase::Placing;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn supply(&self) -> u8 {
        self.supply
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Take one checker from supply, returning what is left.
    pub fn place_one_from_supply(&mut self) -> u8 {
        self.supply = self.supply.saturating_sub(1);
        self.supply
    }

    /// Set the phase, returning whether it changed.
    pub fn set_phase(&mut self, phase: Phase) -> bool {
        let changed = self.phase != phase;
        self.phase = phase;
        changed
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "color": self.color,
            "freeCheckers": self.supply,
            "state": self.phase,
            "connected": !self.outbox.is_closed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inputs() -> PhaseInputs {
        PhaseInputs {
            supply: START_CHECKERS,
            on_board: 0,
            mills: 0,
            all_closed: false,
            opponent_supply: START_CHECKERS,
            opponent_on_board: 0,
        }
    }

    #[test]
    fn test_initial_phase() {
        assert_eq!(Phase::derive(&inputs()), Phase::Placing);
    }

    #[test]
    fn test_unresolved_mill_means_removing() {
        let i = PhaseInputs {
            supply: 6,
            on_board: 3,
            mills: 1,
            opponent_supply: 7,
            opponent_on_board: 2,
            ..inputs()
        };
        assert_eq!(Phase::derive(&i), Phase::Removing);

        // Removal done: opponent is one checker short
        let i = PhaseInputs {
            opponent_on_board: 1,
            ..i
        };
        assert_eq!(Phase::derive(&i), Phase::Placing);
    }

    #[test]
    fn test_sliding_flying_finished() {
        let base = PhaseInputs {
            supply: 0,
            opponent_supply: 0,
            opponent_on_board: 9,
            ..inputs()
        };

        let sliding = PhaseInputs {
            on_board: 9,
            ..base
        };
        assert_eq!(Phase::derive(&sliding), Phase::Sliding);

        let stuck = PhaseInputs {
            all_closed: true,
            ..sliding
        };
        assert_eq!(Phase::derive(&stuck), Phase::Finished);

        let flying = PhaseInputs {
            on_board: 3,
            all_closed: true,
            ..base
        };
        assert_eq!(Phase::derive(&flying), Phase::Flying);

        let beaten = PhaseInputs {
            on_board: 2,
            ..base
        };
        assert_eq!(Phase::derive(&beaten), Phase::Finished);
    }

    #[test]
    fn test_player_supply_floor() {
        let (outbox, _rx) = Outbox::channel();
        let mut player = Player::new(Color::Blue, outbox);

        for expected in (0..START_CHECKERS).rev() {
            assert_eq!(player.place_one_from_supply(), expected);
        }
        assert_eq!(player.place_one_from_supply(), 0);
        assert_eq!(player.supply(), 0);
    }

    #[test]
    fn test_player_initialize() {
        let (outbox, _rx) = Outbox::channel();
        let mut player = Player::new(Color::Red, outbox);
        player.place_one_from_supply();
        assert!(player.set_phase(Phase::Removing));
        assert!(!player.set_phase(Phase::Removing));

        player.initialize(Color::Red);
        assert_eq!(player.supply(), START_CHECKERS);
        assert_eq!(player.phase(), Phase::Placing);
        assert_eq!(player.color(), Color::Red);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(format!("{}", Phase::Flying), "flying");
        assert_eq!(serde_json::to_string(&Phase::Sliding).unwrap(), "\"sliding\"");
        assert!(Phase::Flying.can_move());
        assert!(!Phase::Removing.can_move());
    }
}
