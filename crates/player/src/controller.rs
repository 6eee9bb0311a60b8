// Playback controller state machine
//
// Idle -> Loading -> Playing -> Idle, with Stopping as the transient state of
// stop(). Each play() attempt runs on its own session thread; the controller
// only ever lets the newest session touch the output sink.

use crate::catalog::{Catalog, Station};
use crate::pipeline;
use crate::session::{is_current, SessionHandle};
use boombap_core::{
    CallbackEvent, CallbackManager, CancellationToken, EngineConfig, EngineError, PlayerCallback,
    PlayerSnapshot, PlayerState, PlayerStateContainer, Result, SessionId,
};
use boombap_decode::{CodecDispatch, DecoderFactory, FrameSource};
use boombap_renderer::OutputSink;
use boombap_transport_http::{HttpClient, StreamFetcher};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

/// Engine entry point for the presentation shell.
///
/// Every method returns promptly; network and decode work happens on
/// session threads and is reported through [`PlayerCallback`]s.
pub struct PlaybackController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    catalog: Catalog,
    fetcher: Arc<dyn StreamFetcher>,
    decoders: Arc<dyn DecoderFactory>,
    sink: Arc<dyn OutputSink>,
    config: EngineConfig,
    callbacks: CallbackManager,
    state: PlayerStateContainer,
    session: Mutex<Option<SessionHandle>>,
    // Serializes configure+enqueue between sessions. Never taken by stop or
    // play, and always taken before `session`.
    attach_lock: Mutex<()>,
    next_id: AtomicU64,
}

pub struct PlaybackControllerBuilder {
    sink: Arc<dyn OutputSink>,
    fetcher: Option<Arc<dyn StreamFetcher>>,
    decoders: Option<Arc<dyn DecoderFactory>>,
    catalog: Catalog,
    config: EngineConfig,
}

impl PlaybackControllerBuilder {
    pub fn fetcher(mut self, fetcher: Arc<dyn StreamFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn decoders(mut self, decoders: Arc<dyn DecoderFactory>) -> Self {
        self.decoders = Some(decoders);
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> PlaybackController {
        let config = self.config;
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpClient::new(&config)));
        let decoders = self.decoders.unwrap_or_else(|| Arc::new(CodecDispatch));

        PlaybackController {
            inner: Arc::new(ControllerInner {
                catalog: self.catalog,
                fetcher,
                decoders,
                sink: self.sink,
                config,
                callbacks: CallbackManager::new(),
                state: PlayerStateContainer::new(),
                session: Mutex::new(None),
                attach_lock: Mutex::new(()),
                next_id: AtomicU64::new(0),
            }),
        }
    }
}

impl PlaybackController {
    /// Controller over the default catalog, network client and codecs
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self::builder(sink).build()
    }

    pub fn builder(sink: Arc<dyn OutputSink>) -> PlaybackControllerBuilder {
        PlaybackControllerBuilder {
            sink,
            fetcher: None,
            decoders: None,
            catalog: Catalog::default(),
            config: EngineConfig::default(),
        }
    }

    /// Start playing the station at `index`, superseding whatever plays now
    pub fn play(&self, index: usize) -> Result<SessionId> {
        let catalog = &self.inner.catalog;
        let station = catalog.get(index).ok_or(EngineError::StationOutOfRange {
            index,
            len: catalog.len(),
        })?;

        log::info!("[controller] play station {} ({})", index, station.name);
        self.inner.state.update(|snapshot| snapshot.selected = index);
        Ok(self.inner.start_session(station.url.to_string()))
    }

    /// Start playing the stream behind an arbitrary playlist URL
    pub fn play_url(&self, playlist_url: &str) -> SessionId {
        log::info!("[controller] play url {}", playlist_url);
        self.inner.start_session(playlist_url.to_string())
    }

    /// Silence the output and drop the current session. No-op when idle.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn next(&self) -> Result<SessionId> {
        self.step(1)
    }

    pub fn previous(&self) -> Result<SessionId> {
        self.step(-1)
    }

    fn step(&self, delta: isize) -> Result<SessionId> {
        let selected = self.inner.state.snapshot().selected;
        let index = self
            .inner
            .catalog
            .wrap_index(selected, delta)
            .ok_or(EngineError::StationOutOfRange {
                index: selected,
                len: 0,
            })?;
        self.stop();
        self.play(index)
    }

    /// Set the output gain, clamped to [0.0, 1.0]. Returns the applied value.
    pub fn set_gain(&self, gain: f32) -> f32 {
        let applied = self.inner.sink.gain().set(gain);
        log::debug!("[controller] gain set to {}", applied);
        self.inner
            .callbacks
            .dispatch_event(CallbackEvent::GainChanged { gain: applied });
        applied
    }

    pub fn gain(&self) -> f32 {
        self.inner.sink.gain().get()
    }

    pub fn get_station(&self, index: usize) -> Option<Station> {
        self.inner.catalog.get(index).copied()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn get_state(&self) -> PlayerState {
        self.inner.state.get_state()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.inner.state.snapshot()
    }

    pub fn add_callback(&self, callback: Arc<dyn PlayerCallback>) {
        self.inner.callbacks.add_callback(callback);
    }

    pub fn clear_callbacks(&self) {
        self.inner.callbacks.clear_callbacks();
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

impl ControllerInner {
    fn start_session(self: &Arc<Self>, playlist_url: String) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let session = SessionHandle::new(id);
        let token = session.token.clone();

        let old_state = {
            let mut current = self.session.lock();
            if let Some(old) = current.take() {
                log::info!("[controller] session {} superseded by {}", old.id, id);
                old.cancel();
            }
            // The old session's audio is gone before the new one exists
            self.sink.silence();
            *current = Some(session);
            self.state.update(|snapshot| snapshot.session = Some(id));
            self.state.set_state(PlayerState::Loading)
        };

        self.emit_state(old_state, PlayerState::Loading);
        self.callbacks
            .dispatch_event(CallbackEvent::LoadingStarted { session: id });

        let inner = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("boombap-session-{}", id))
            .spawn(move || inner.run_session(id, playlist_url, token));
        if let Err(e) = spawned {
            log::error!("[session {}] failed to spawn session thread: {}", id, e);
            self.fail(id, EngineError::Io(e));
        }
        id
    }

    fn stop(&self) {
        let (id, old_state) = {
            let mut current = self.session.lock();
            let Some(session) = current.take() else {
                return;
            };
            session.cancel();
            self.sink.silence();
            self.state.update(|snapshot| snapshot.session = None);
            let old_state = self.state.set_state(PlayerState::Stopping);
            self.state.set_state(PlayerState::Idle);
            (session.id, old_state)
        };

        log::info!("[controller] stopped session {}", id);
        self.emit_state(old_state, PlayerState::Stopping);
        self.emit_state(PlayerState::Stopping, PlayerState::Idle);
    }

    fn run_session(&self, id: SessionId, playlist_url: String, token: CancellationToken) {
        log::info!("[session {}] loading {}", id, playlist_url);

        let opened = pipeline::open_stream(
            self.fetcher.as_ref(),
            self.decoders.as_ref(),
            &self.config,
            &playlist_url,
            &token,
        );

        match opened.and_then(|source| self.attach(id, source)) {
            Ok(Some(done)) => {
                self.callbacks
                    .dispatch_event(CallbackEvent::LoadingStopped { session: id });
                self.watch(id, &token, done);
            }
            Ok(None) => {
                log::debug!("[session {}] superseded before playback started", id);
                self.callbacks
                    .dispatch_event(CallbackEvent::LoadingStopped { session: id });
            }
            Err(e) => self.fail(id, e),
        }
    }

    /// Hand the opened source to the sink if this session still owns it.
    /// Returns the completion receiver, or `None` when superseded.
    fn attach(&self, id: SessionId, source: Box<dyn FrameSource>) -> Result<Option<Receiver<()>>> {
        let _attaching = self.attach_lock.lock();
        if !is_current(&self.session.lock(), id) {
            return Ok(None);
        }

        // Opening the device can block, so the session lock is not held here
        let format = source.format();
        self.sink.configure(format, self.config.buffer_duration)?;

        let current = self.session.lock();
        if !is_current(&current, id) {
            return Ok(None);
        }
        let (done_tx, done_rx) = mpsc::channel();
        self.sink.enqueue(
            source,
            Box::new(move || {
                let _ = done_tx.send(());
            }),
        )?;
        let old_state = self.state.set_state(PlayerState::Playing);
        drop(current);

        log::info!("[session {}] playing at {} Hz", id, format.sample_rate);
        self.emit_state(old_state, PlayerState::Playing);
        Ok(Some(done_rx))
    }

    /// Wait for the sink to finish with the source, then release the
    /// connection and return to idle if nothing superseded the session
    fn watch(&self, id: SessionId, token: &CancellationToken, done: Receiver<()>) {
        // A dropped sender means the sink discarded the callback
        let _ = done.recv();
        token.cancel();

        let Some(old_state) = self.release(id) else {
            log::debug!("[session {}] finished after being stopped", id);
            return;
        };

        log::info!("[session {}] stream ended", id);
        self.emit_state(old_state, PlayerState::Idle);
        self.callbacks
            .dispatch_event(CallbackEvent::PlaybackEnded { session: id });
        self.callbacks
            .dispatch_event(CallbackEvent::LoadingStopped { session: id });
    }

    fn fail(&self, id: SessionId, error: EngineError) {
        match self.release(id) {
            Some(old_state) => {
                log::warn!("[session {}] playback failed: {}", id, error);
                self.emit_state(old_state, PlayerState::Idle);
                self.callbacks.dispatch_event(CallbackEvent::Error {
                    session: id,
                    error: Arc::new(error),
                });
            }
            None => log::debug!("[session {}] failed after being superseded: {}", id, error),
        }
        self.callbacks
            .dispatch_event(CallbackEvent::LoadingStopped { session: id });
    }

    /// Clear the session slot and go idle if `id` still owns it.
    /// Returns the state left behind.
    fn release(&self, id: SessionId) -> Option<PlayerState> {
        let mut current = self.session.lock();
        if !is_current(&current, id) {
            return None;
        }
        *current = None;
        self.state.update(|snapshot| snapshot.session = None);
        Some(self.state.set_state(PlayerState::Idle))
    }

    fn emit_state(&self, old_state: PlayerState, new_state: PlayerState) {
        if old_state != new_state {
            self.callbacks.dispatch_event(CallbackEvent::StateChanged {
                old_state,
                new_state,
            });
        }
    }
}
