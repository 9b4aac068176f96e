//! Wire messages.
//!
//! One JSON object per frame, discriminated by `type`. Field names are
//! camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::board::Color;
use super::player::Phase;

/// Server -> client notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Session (re)started; tells each side whether it moves first
    GameStarted { my_turn: bool },
    ChangePlayer { my_turn: bool },
    /// Full occupancy snapshot
    ChangeBoard { busy_field: BTreeMap<String, Color> },
    /// Full recorded-mill snapshot
    ChangeMerellus { lines: BTreeMap<String, Color> },
    ChangeFreeCheckers { color: Color, free_checkers: u8 },
    /// Recipient's own phase changed
    ChangePlayerState { my_state: Phase },
    GameResult { win: bool },
    GameAborted,
    /// The last inbound message was rejected
    IncorrectRequest { message: String },
    IncorrectResponse { message: String },
}

impl ServerMessage {
    pub fn incorrect_request(message: impl Into<String>) -> Self {
        Self::IncorrectRequest {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameStarted { .. } => "gameStarted",
            Self::ChangePlayer { .. } => "changePlayer",
            Self::ChangeBoard { .. } => "changeBoard",
            Self::ChangeMerellus { .. } => "changeMerellus",
            Self::ChangeFreeCheckers { .. } => "changeFreeCheckers",
            Self::ChangePlayerState { .. } => "changePlayerState",
            Self::GameResult { .. } => "gameResult",
            Self::GameAborted => "gameAborted",
            Self::IncorrectRequest { .. } => "incorrectRequest",
            Self::IncorrectResponse { .. } => "incorrectResponse",
        }
    }

    /// Encode as a text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Client -> server intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Place from supply (`from` absent or null) or move a placed checker
    PlayerMoveChecker {
        #[serde(default)]
        from: Option<String>,
        to: String,
    },
    /// Remove an opponent checker after forming a mill
    PlayerRemoveChecker { from: String },
    RepeatGame,
    GameAborted,
    IncorrectRequest { message: String },
    /// The client could not use a server message
    IncorrectResponse { message: String },
}

impl ClientMessage {
    /// Every `type` a client may send.
    pub const TYPES: [&'static str; 6] = [
        "playerMoveChecker",
        "playerRemoveChecker",
        "repeatGame",
        "gameAborted",
        "incorrectRequest",
        "incorrectResponse",
    ];
}

/// A frame as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl From<&str> for InboundFrame {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for InboundFrame {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Inbound payload that can't be turned into a `ClientMessage`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("wrong data type")]
    WrongDataType,
    #[error("can't parse JSON data: {0}")]
    InvalidJson(String),
    #[error("message has no type")]
    MissingType,
    #[error("unknown message type: \"{0}\"")]
    UnknownType(String),
    #[error("malformed \"{kind}\" message: {reason}")]
    Malformed { kind: String, reason: String },
}

/// Decode one inbound frame.
pub fn decode(frame: &InboundFrame) -> Result<ClientMessage, ProtocolError> {
    let text = match frame {
        InboundFrame::Text(text) => text,
        InboundFrame::Binary(_) => return Err(ProtocolError::WrongDataType),
    };

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let kind = match value.get("type") {
        Some(serde_json::Value::String(kind)) => kind.clone(),
        Some(other) => return Err(ProtocolError::UnknownType(other.to_string())),
        None => return Err(ProtocolError::MissingType),
    };

    if !ClientMessage::TYPES.contains(&kind.as_str()) {
        return Err(ProtocolError::UnknownType(kind));
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
        kind,
        reason: e.to_string(),
    })
}
