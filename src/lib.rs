//! Merels State Library
//!
//! This crate provides the session state and rules of two-player
//! Nine Men's Morris.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Board** - 24 cells joined by 16 lines of three, loaded from an
//!   embedded topology, with adjacency derived from the lines.
//!
//! - **Rules** - Placement, sliding, flying, mills and removals. A player's
//!   phase is derived from the board and supplies after every change.
//!
//! - **Protocol** - JSON messages discriminated by `type`, decoded from
//!   inbound frames and queued per participant.
//!
//! - **Sessions** - One tokio task per game processing intents one at a
//!   time, and a registry routing frames from endpoints to sessions.
//!
//! # Design Principles
//!
//! 1. **Rejected intents change nothing** - Every check runs before the
//!    first mutation, and the sender gets an `incorrectRequest`.
//!
//! 2. **Derived, not assigned** - Phases and pending removals are computed
//!    from counts, never set by move code.
//!
//! 3. **No networking** - The transport owns sockets; sessions only see
//!    `InboundFrame`s and `Outbox`es.
//!
//! # Example
//!
//! ```rust
//! use merels_state::state::{Game, Outbox, Phase, Seat, ServerMessage};
//!
//! let (blue, mut blue_rx) = Outbox::channel();
//! let (red, _red_rx) = Outbox::channel();
//!
//! let mut game = Game::new("game-1".to_string(), [blue, red]);
//! game.start();
//! assert_eq!(
//!     blue_rx.try_recv().unwrap(),
//!     ServerMessage::GameStarted { my_turn: true }
//! );
//!
//! // Blue places a checker from supply
//! game.move_checker(Seat::First, None, "d2").unwrap();
//! assert_eq!(game.player(Seat::First).supply(), 8);
//! assert_eq!(game.player(Seat::First).phase(), Phase::Placing);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
