//! Room aggregate
//!
//! A room has two seats. A seat is taken by authorizing a player id; a seated
//! player then attaches a live connection. Every roster change and every
//! broadcast happens through `&mut Room`, i.e. under the room's lock, so
//! recipients always see status derived from the current connection count.

use std::time::{Duration, Instant};
use tokio::sync::mpsc::{error::TrySendError, Sender};

use crate::error::{RoomError, RoomResult};
use crate::protocol::{RoomSnapshot, ServerEvent};
use crate::types::*;

/// Events a session may have queued but not yet written to its socket
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Status for a given number of live connections (`None` when nobody is there to tell)
pub fn status_for(connected: usize) -> Option<RoomStatus> {
    match connected {
        0 => None,
        1 => Some(RoomStatus::Waiting),
        _ => Some(RoomStatus::Player2Connected),
    }
}

/// Non-owning send side of a live session.
///
/// The session task owns the socket and drains the matching receiver; the room
/// only ever pushes events into it. The queue is bounded by
/// [`OUTBOUND_QUEUE_CAPACITY`]; a peer that stops reading loses events
/// instead of growing it.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: Sender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(sender: Sender<ServerEvent>) -> Self {
        Self {
            id: ulid::Ulid::new(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, event: ServerEvent) -> Result<(), TrySendError<ServerEvent>> {
        self.sender.try_send(event)
    }
}

#[derive(Debug)]
struct ConnectedPlayer {
    player_id: PlayerId,
    handle: ConnectionHandle,
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    challenge: Challenge,
    authorized: Vec<PlayerId>,
    connected: Vec<ConnectedPlayer>,
    challenge_delivered: bool,
    /// Set when the registry drops the room; late arrivals see it as gone
    closed: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    last_activity: Instant,
}

impl Room {
    pub fn new(id: RoomId, challenge: Challenge) -> Self {
        Self {
            id,
            challenge,
            authorized: Vec::with_capacity(ROOM_CAPACITY),
            connected: Vec::with_capacity(ROOM_CAPACITY),
            challenge_delivered: false,
            closed: false,
            created_at: chrono::Utc::now(),
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn authorized_players(&self) -> &[PlayerId] {
        &self.authorized
    }

    pub fn connected_players(&self) -> Vec<PlayerId> {
        self.connected.iter().map(|c| c.player_id.clone()).collect()
    }

    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }

    pub fn is_authorized(&self, player_id: &str) -> bool {
        self.authorized.iter().any(|p| p == player_id)
    }

    pub fn is_connected(&self, player_id: &str) -> bool {
        self.connected.iter().any(|c| c.player_id == player_id)
    }

    pub fn is_full(&self) -> bool {
        self.authorized.len() >= ROOM_CAPACITY
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn challenge_delivered(&self) -> bool {
        self.challenge_delivered
    }

    pub fn status(&self) -> Option<RoomStatus> {
        status_for(self.connected.len())
    }

    /// True if nobody is connected and nothing happened for `max_idle`
    pub fn is_idle(&self, max_idle: Duration) -> bool {
        self.connected.is_empty() && self.last_activity.elapsed() >= max_idle
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            question_type: self.challenge.category(),
            authorized_players: self.authorized.len(),
            connected_players: self.connected.len(),
            status: self.status(),
            created_at: self.created_at.to_rfc3339(),
        }
    }

    /// Reserve a seat. Mints a fresh id unless a non-blank one is requested.
    pub fn authorize(&mut self, requested: Option<PlayerId>) -> RoomResult<PlayerId> {
        if self.closed {
            return Err(RoomError::RoomNotFound);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        let player_id = match requested.map(|p| p.trim().to_string()) {
            Some(p) if !p.is_empty() => {
                if self.is_authorized(&p) {
                    return Err(RoomError::PlayerIdTaken);
                }
                p
            }
            _ => loop {
                let candidate = ulid::Ulid::new().to_string();
                if !self.is_authorized(&candidate) {
                    break candidate;
                }
            },
        };

        self.authorized.push(player_id.clone());
        self.last_activity = Instant::now();
        Ok(player_id)
    }

    /// Check that `player_id` may open a session right now
    pub fn check_joinable(&self, player_id: &str) -> RoomResult<()> {
        if self.closed {
            return Err(RoomError::RoomNotFound);
        }
        if !self.is_authorized(player_id) {
            return Err(RoomError::PlayerNotAuthorized);
        }
        Ok(())
    }

    /// Register a live connection and announce the new occupancy.
    ///
    /// A player who is already connected takes over with the new connection;
    /// dropping the old handle ends the previous session.
    ///
    /// The first time two players are connected the challenge follows the
    /// status event. It is never sent again for this room.
    pub fn attach(&mut self, player_id: PlayerId, handle: ConnectionHandle) -> RoomResult<()> {
        self.check_joinable(&player_id)?;

        let existing = self.connected.iter().position(|c| c.player_id == player_id);
        if let Some(pos) = existing {
            tracing::info!(
                "Player {} reconnected to room {}, replacing connection {}",
                player_id,
                self.id,
                self.connected[pos].handle.id()
            );
            self.connected[pos].handle = handle;
        } else {
            tracing::info!(
                "Player {} connected to room {} ({} live)",
                player_id,
                self.id,
                self.connected.len() + 1
            );
            self.connected.push(ConnectedPlayer { player_id, handle });
        }
        self.last_activity = Instant::now();

        self.broadcast_status();

        if self.connected.len() == ROOM_CAPACITY && !self.challenge_delivered {
            self.challenge_delivered = true;
            tracing::info!("Room {} is complete, sending challenge", self.id);
            self.broadcast(&ServerEvent::Question(self.challenge.clone()));
        }

        Ok(())
    }

    /// Drop a live connection. The seat stays reserved.
    ///
    /// Only the connection that attached can detach itself; returns false if
    /// `connection` is not the player's current one.
    pub fn detach(&mut self, player_id: &str, connection: ConnectionId) -> bool {
        let Some(pos) = self
            .connected
            .iter()
            .position(|c| c.player_id == player_id && c.handle.id() == connection)
        else {
            return false;
        };

        self.connected.remove(pos);
        self.last_activity = Instant::now();
        tracing::info!(
            "Player {} disconnected from room {} ({} live)",
            player_id,
            self.id,
            self.connected.len()
        );

        self.broadcast_status();
        true
    }

    /// Fan a guess out to every occupant, sender included
    pub fn relay_guess(&mut self, guess: PlayerGuess) {
        tracing::debug!(
            "Relaying guess from {} in room {}: {:?}",
            guess.player_id,
            self.id,
            guess.guess
        );
        self.last_activity = Instant::now();
        self.broadcast(&ServerEvent::PlayerGuess(guess));
    }

    /// Best-effort send to every live connection; returns how many accepted it.
    ///
    /// A closed queue means that session is already going away; a full one
    /// means its peer stopped reading. Either way the event is skipped for
    /// that recipient only. The session's own loop detaches it, so nobody is
    /// removed here.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let mut delivered = 0;
        for player in &self.connected {
            match player.handle.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => tracing::warn!(
                    "Outbound queue full for {} in room {}, dropping event",
                    player.player_id,
                    self.id
                ),
                Err(TrySendError::Closed(_)) => tracing::debug!(
                    "Dropped event for {} in room {}: session is closing",
                    player.player_id,
                    self.id
                ),
            }
        }
        delivered
    }

    fn broadcast_status(&self) {
        if let Some(status) = self.status() {
            self.broadcast(&ServerEvent::status(status));
        }
    }
}
