//! Session state for Nine Men's Morris.
//!
//! - `topology` - Cells, lines and adjacency of the board
//! - `board` - Occupancy and recorded mills
//! - `player` - Per-participant supply and phase derivation
//! - `protocol` - Wire messages and inbound decoding
//! - `connection` - Outbound channel per participant
//! - `game` - One session and its rules
//! - `runtime` - Session actors and the registry routing frames to them
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                           GameManager                              │
//! │                                                                    │
//! │   endpoint_id → (game_id, seat)        game_id → SessionHandle     │
//! └───────────────┬───────────────────────────────────┬───────────────┘
//!                 │ SessionEvent                      │
//!                 ▼                                   │
//! ┌───────────────────────────────────────────────┐   │
//! │          session actor (one tokio task)        │◀──┘
//! │                                                │
//! │  ┌─────────┐   ┌──────────────┐   ┌─────────┐  │
//! │  │  Board  │◀──│     Game     │──▶│ Player  │  │
//! │  │         │   │              │   │ ×2      │  │
//! │  └────┬────┘   └──────────────┘   └────┬────┘  │
//! │       │                                │       │
//! │   Topology                          Outbox ────┼──▶ transport
//! └────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use merels_state::state::{GameManager, InboundFrame, Outbox};
//!
//! let mut games = GameManager::new();
//!
//! // Inside a tokio runtime: bind two accepted connections
//! let (blue, blue_rx) = Outbox::channel();
//! let (red, red_rx) = Outbox::channel();
//! let game_id = games.bind([(1, blue), (2, red)]);
//!
//! // Feed frames as the transport reads them
//! games.route(1, InboundFrame::from(r#"{"type":"playerMoveChecker","to":"d2"}"#))?;
//!
//! // And disconnects
//! games.disconnect(2)?;
//! ```

pub mod board;
pub mod connection;
pub mod game;
pub mod player;
pub mod protocol;
pub mod runtime;
pub mod topology;

// Re-export commonly used types
pub use board::{Board, Color};
pub use connection::{Outbox, OutboxError, OutboxStatus};
pub use game::{
    Game, GameStatus, Outcome, RuleViolation, Seat, FIRST_COLOR, PLAYERS_IN_SESSION,
    TOTAL_CHECKERS,
};
pub use player::{Phase, PhaseInputs, Player, FLYING_CHECKERS, START_CHECKERS};
pub use protocol::{decode, ClientMessage, InboundFrame, ProtocolError, ServerMessage};
pub use runtime::{
    spawn_session, EndpointId, GameManager, RouteError, SessionEvent, SessionHandle,
};
pub use topology::{Topology, TopologyError, CELLS_PER_LINE};
