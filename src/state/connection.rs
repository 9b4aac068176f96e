//! Outbound channel handles.
//!
//! An `Outbox` is the session's only view of a participant's connection. The
//! transport owns the receiving half and writes each message to the socket
//! in the order it was queued. Sending never blocks the session.

use std::time::Instant;

use tokio::sync::mpsc;

use super::protocol::ServerMessage;

/// Outbox status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    /// Messages are delivered to the transport
    Open,

    /// Closed by the session, or the transport dropped its receiver
    Closed,
}

impl OutboxStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Error when a message can't be queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutboxError {
    #[error("outbound channel is closed")]
    Closed,
}

/// Outbound half of one participant's connection.
#[derive(Debug)]
pub struct Outbox {
    sender: Option<mpsc::UnboundedSender<ServerMessage>>,

    pub status: OutboxStatus,

    /// Last successful send
    pub last_send: Option<Instant>,

    /// Sequence number of the last queued message
    pub send_seq: u64,
}

impl Outbox {
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            sender: Some(sender),
            status: OutboxStatus::Open,
            last_send: None,
            send_seq: 0,
        }
    }

    /// Create an outbox together with the receiver the transport drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queue a message, returning its sequence number.
    ///
    /// A failed send marks the outbox closed.
    pub fn send(&mut self, message: ServerMessage) -> Result<u64, OutboxError> {
        let sender = match (&self.sender, self.status) {
            (Some(sender), OutboxStatus::Open) => sender,
            _ => return Err(OutboxError::Closed),
        };

        if sender.send(message).is_err() {
            self.status = OutboxStatus::Closed;
            return Err(OutboxError::Closed);
        }

        self.send_seq += 1;
        self.last_send = Some(Instant::now());
        Ok(self.send_seq)
    }

    /// Close the outbox. The transport sees end-of-stream after draining
    /// what was already queued.
    pub fn close(&mut self) {
        self.status = OutboxStatus::Closed;
        self.sender = None;
    }

    /// Resolve once the transport has dropped its receiver, or right away if
    /// the outbox is already closed.
    pub async fn closed(&self) {
        if let (Some(sender), OutboxStatus::Open) = (&self.sender, self.status) {
            sender.closed().await;
        }
    }

    /// Check if the outbox is closed, including a receiver dropped by the
    /// transport since the last send.
    pub fn is_closed(&self) -> bool {
        match (&self.sender, self.status) {
            (Some(sender), OutboxStatus::Open) => sender.is_closed(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_send_sequence() {
        let (mut outbox, mut rx) = Outbox::channel();

        let seq1 = outbox.send(ServerMessage::GameAborted).unwrap();
        let seq2 = outbox
            .send(ServerMessage::ChangePlayer { my_turn: true })
            .unwrap();

        assert_eq!(seq1, 1);
        assert_eq!(seq2, 2);
        assert!(outbox.last_send.is_some());
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::GameAborted);
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerMessage::ChangePlayer { my_turn: true }
        );
    }

    #[test]
    fn test_dropped_receiver() {
        let (mut outbox, rx) = Outbox::channel();
        assert!(!outbox.is_closed());

        drop(rx);
        assert!(outbox.is_closed());
        assert_eq!(
            outbox.send(ServerMessage::GameAborted),
            Err(OutboxError::Closed)
        );
        assert_eq!(outbox.status, OutboxStatus::Closed);
        assert_eq!(outbox.send_seq, 0);
    }

    #[test]
    fn test_close() {
        let (mut outbox, mut rx) = Outbox::channel();
        outbox.send(ServerMessage::GameAborted).unwrap();
        outbox.close();

        assert!(outbox.is_closed());
        assert!(outbox.send(ServerMessage::GameAborted).is_err());

        // Queued message still delivered, then end of stream
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::GameAborted);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_resolves_on_dropped_receiver() {
        let (outbox, rx) = Outbox::channel();
        drop(rx);
        outbox.closed().await;
        assert!(outbox.is_closed());

        let (mut outbox, _rx) = Outbox::channel();
        outbox.close();
        outbox.closed().await;
    }
}
