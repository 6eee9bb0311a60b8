// Playback controller state management

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Identifier of one `play()` attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No session
    Idle,
    /// Resolving the playlist, fetching the stream, reading codec headers
    Loading,
    /// Frames are being fed to the output sink
    Playing,
    /// `stop()` is tearing the session down
    Stopping,
}

impl PlayerState {
    /// Whether moving from `self` to `to` is a transition of the controller state machine
    pub fn can_transition(self, to: PlayerState) -> bool {
        use PlayerState::*;
        match (self, to) {
            (Idle, Loading) => true,
            // A new play() supersedes the running attempt
            (Loading, Loading) | (Playing, Loading) => true,
            (Loading, Playing) => true,
            // Failure or natural end of stream
            (Loading, Idle) | (Playing, Idle) => true,
            (Loading, Stopping) | (Playing, Stopping) => true,
            (Stopping, Idle) => true,
            _ => false,
        }
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    /// Catalog index last passed to play/next/previous
    pub selected: usize,
    /// Session that currently owns the output, if any
    pub session: Option<SessionId>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            state: PlayerState::Idle,
            selected: 0,
            session: None,
        }
    }
}

/// Thread-safe player state container
#[derive(Clone, Default)]
pub struct PlayerStateContainer {
    inner: Arc<RwLock<PlayerSnapshot>>,
}

impl PlayerStateContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_state(&self) -> PlayerState {
        self.inner.read().state
    }

    /// Set the state and return the previous one
    pub fn set_state(&self, new_state: PlayerState) -> PlayerState {
        let mut snapshot = self.inner.write();
        let old_state = snapshot.state;
        if old_state != new_state && !old_state.can_transition(new_state) {
            log::warn!("Unexpected state transition {:?} -> {:?}", old_state, new_state);
        }
        snapshot.state = new_state;
        log::debug!("Player state changed to: {:?}", new_state);
        old_state
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        *self.inner.read()
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PlayerSnapshot),
    {
        let mut snapshot = self.inner.write();
        f(&mut snapshot);
    }
}
