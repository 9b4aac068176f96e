//! Session actors and the session registry.
//!
//! Each session runs as one tokio task that owns its `Game` and consumes
//! `SessionEvent`s in arrival order, so two intents never interleave. The
//! transport feeds events in through a `SessionHandle` and drains each
//! participant's outbox receiver on its own. A receiver dropped by the
//! transport ends the session even when no event follows.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::connection::Outbox;
use super::game::{Game, Seat, PLAYERS_IN_SESSION};
use super::protocol::InboundFrame;

/// Transport-assigned identifier of one connection.
pub type EndpointId = u64;

/// Input to a session actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A frame arrived from a participant
    Frame { seat: Seat, frame: InboundFrame },
    /// A participant's connection went away
    Closed { seat: Seat },
}

/// Error when an event can't reach a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("endpoint {0} is not bound to a session")]
    UnknownEndpoint(EndpointId),
    #[error("session {0} has stopped")]
    SessionStopped(String),
}

/// Sending side of a running session actor.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: String,
    events: mpsc::UnboundedSender<SessionEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Queue an event for the actor.
    pub fn send(&self, event: SessionEvent) -> Result<(), RouteError> {
        self.events
            .send(event)
            .map_err(|_| RouteError::SessionStopped(self.id.clone()))
    }

    /// Check if the actor has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the actor to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(game_id = %self.id, error = %e, "Session task failed");
        }
    }
}

/// Start a session actor for two bound outboxes. Must run inside a tokio
/// runtime.
pub fn spawn_session(id: String, outboxes: [Outbox; PLAYERS_IN_SESSION]) -> SessionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let game = Game::new(id.clone(), outboxes);
    let task = tokio::spawn(run_session(game, rx));
    SessionHandle {
        id,
        events: tx,
        task,
    }
}

/// What woke the actor loop.
enum Wake {
    Event(Option<SessionEvent>),
    ChannelClosed,
}

/// Actor loop: the only place a running `Game` is mutated.
async fn run_session(mut game: Game, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    game.start();
    game.check_connections();

    while game.status.is_active() {
        let wake = {
            let first = game.player(Seat::First).outbox.closed();
            let second = game.player(Seat::Second).outbox.closed();
            tokio::select! {
                event = events.recv() => Wake::Event(event),
                _ = first => Wake::ChannelClosed,
                _ = second => Wake::ChannelClosed,
            }
        };

        match wake {
            Wake::Event(Some(event)) => apply_event(&mut game, event),
            Wake::Event(None) => {
                debug!(game_id = %game.id, "All session handles dropped");
                game.destroy(None);
            }
            Wake::ChannelClosed => {
                game.check_connections();
            }
        }
    }

    info!(game_id = %game.id, "Session actor stopped");
}

/// Apply one event, then tear down if a participant is gone.
pub fn apply_event(game: &mut Game, event: SessionEvent) {
    match event {
        SessionEvent::Frame { seat, frame } => game.handle_frame(seat, &frame),
        SessionEvent::Closed { seat } => {
            debug!(game_id = %game.id, %seat, "Participant disconnected");
            game.destroy(Some(seat));
        }
    }
    game.check_connections();
}

/// Registry of running sessions.
#[derive(Debug, Default)]
pub struct GameManager {
    games: HashMap<String, SessionHandle>,
    /// Endpoint to the session and seat it is bound to
    endpoint_index: HashMap<EndpointId, (String, Seat)>,
    next_id: u64,
}

impl GameManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind two endpoints into a new session and start it. The first
    /// endpoint moves first.
    pub fn bind(&mut self, endpoints: [(EndpointId, Outbox); PLAYERS_IN_SESSION]) -> String {
        self.next_id += 1;
        let id = format!("game-{}", self.next_id);

        let [(first_id, first), (second_id, second)] = endpoints;
        self.endpoint_index
            .insert(first_id, (id.clone(), Seat::First));
        self.endpoint_index
            .insert(second_id, (id.clone(), Seat::Second));

        let handle = spawn_session(id.clone(), [first, second]);
        self.games.insert(id.clone(), handle);
        info!(game_id = %id, first_id, second_id, "Endpoints bound");
        id
    }

    /// Get a session handle.
    pub fn get(&self, game_id: &str) -> Option<&SessionHandle> {
        self.games.get(game_id)
    }

    /// Get the session and seat an endpoint is bound to.
    pub fn lookup(&self, endpoint: EndpointId) -> Option<(&str, Seat)> {
        self.endpoint_index
            .get(&endpoint)
            .map(|(id, seat)| (id.as_str(), *seat))
    }

    fn handle_for(&self, endpoint: EndpointId) -> Result<(&SessionHandle, Seat), RouteError> {
        let (id, seat) = self
            .endpoint_index
            .get(&endpoint)
            .ok_or(RouteError::UnknownEndpoint(endpoint))?;
        let handle = self
            .games
            .get(id)
            .ok_or_else(|| RouteError::SessionStopped(id.clone()))?;
        Ok((handle, *seat))
    }

    /// Forward a frame from an endpoint to its session.
    pub fn route(&self, endpoint: EndpointId, frame: InboundFrame) -> Result<(), RouteError> {
        let (handle, seat) = self.handle_for(endpoint)?;
        handle.send(SessionEvent::Frame { seat, frame })
    }

    /// Tell the session an endpoint disconnected and forget the endpoint.
    pub fn disconnect(&mut self, endpoint: EndpointId) -> Result<(), RouteError> {
        let result = self
            .handle_for(endpoint)
            .and_then(|(handle, seat)| handle.send(SessionEvent::Closed { seat }));
        self.endpoint_index.remove(&endpoint);
        result
    }

    /// Remove a session and its endpoints.
    pub fn remove(&mut self, game_id: &str) -> Option<SessionHandle> {
        let handle = self.games.remove(game_id)?;
        self.endpoint_index.retain(|_, (id, _)| id != game_id);
        Some(handle)
    }

    /// Drop sessions whose actor has exited.
    pub fn cleanup_finished(&mut self) -> Vec<String> {
        let finished: Vec<String> = self
            .games
            .iter()
            .filter(|(_, h)| h.is_finished())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &finished {
            self.remove(id);
        }

        finished
    }

    /// Count sessions still running.
    pub fn active_count(&self) -> usize {
        self.games.values().filter(|h| !h.is_finished()).count()
    }

    /// Total session count.
    pub fn count(&self) -> usize {
        self.games.len()
    }
}
