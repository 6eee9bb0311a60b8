// Thread-safe callback mechanism for player events
// Events are dispatched from the caller thread and from session threads

use crate::error::EngineError;
use crate::state::{PlayerState, SessionId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Player event types
#[derive(Debug, Clone)]
pub enum CallbackEvent {
    /// A play attempt started resolving its stream
    LoadingStarted { session: SessionId },

    /// A play attempt finished loading, whatever the outcome
    LoadingStopped { session: SessionId },

    /// Controller state changed
    StateChanged {
        old_state: PlayerState,
        new_state: PlayerState,
    },

    /// The stream ran out naturally
    PlaybackEnded { session: SessionId },

    /// A play attempt failed
    Error {
        session: SessionId,
        error: Arc<EngineError>,
    },

    /// Output gain changed
    GainChanged { gain: f32 },
}

impl CallbackEvent {
    /// Session the event belongs to, if it is session-scoped
    pub fn session(&self) -> Option<SessionId> {
        match self {
            CallbackEvent::LoadingStarted { session }
            | CallbackEvent::LoadingStopped { session }
            | CallbackEvent::PlaybackEnded { session }
            | CallbackEvent::Error { session, .. } => Some(*session),
            CallbackEvent::StateChanged { .. } | CallbackEvent::GainChanged { .. } => None,
        }
    }
}

/// Player callback trait
/// Implementations should be lightweight and non-blocking
pub trait PlayerCallback: Send + Sync {
    /// Called when an event occurs
    /// This may run on a session thread and must not block it
    fn on_event(&self, event: CallbackEvent);
}

impl<F> PlayerCallback for F
where
    F: Fn(CallbackEvent) + Send + Sync,
{
    fn on_event(&self, event: CallbackEvent) {
        self(event)
    }
}

/// Callback manager for handling multiple callbacks
pub struct CallbackManager {
    callbacks: Mutex<Vec<Arc<dyn PlayerCallback>>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn add_callback(&self, callback: Arc<dyn PlayerCallback>) {
        self.callbacks.lock().push(callback);
    }

    pub fn clear_callbacks(&self) {
        self.callbacks.lock().clear();
    }

    pub fn dispatch_event(&self, event: CallbackEvent) {
        // Snapshot the list so a callback may register or clear callbacks
        let callbacks: Vec<_> = self.callbacks.lock().clone();
        for callback in callbacks.iter() {
            callback.on_event(event.clone());
        }
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple callback implementation for testing
#[cfg(test)]
pub struct TestCallback {
    events: Mutex<Vec<CallbackEvent>>,
}

#[cfg(test)]
impl TestCallback {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<CallbackEvent> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
impl PlayerCallback for TestCallback {
    fn on_event(&self, event: CallbackEvent) {
        self.events.lock().push(event);
    }
}
