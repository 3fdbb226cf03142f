use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use cueroom_state::{Intent, SessionState};
use cueroom_transport::{RoomSocket, RoomStream, TransportError};
use cueroom_wire::{Envelope, EnvelopeReader, EnvelopeWriter, Reaction};
use tracing::{debug, info, warn};

use crate::election::{elect, Election};
use crate::error::Result;
use crate::executor::{IntentExecutor, LocalExecutor, RelayExecutor};
use crate::room_id::RoomId;
use crate::store::SnapshotStore;

/// Peer id reserved for a viewer's upstream host connection.
const UPSTREAM_PEER: u64 = 0;

/// How long the shot clock waits between decrements.
const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Role a participant holds in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the canonical document and the listening endpoint.
    Host,
    /// Holds a replica and relays every mutation upstream.
    Viewer,
}

/// Where a room keeps its runtime endpoints and snapshots.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Directory for rendezvous socket endpoints.
    pub runtime_dir: PathBuf,
    /// Directory for durable snapshots.
    pub state_dir: PathBuf,
}

impl RoomConfig {
    /// Both directories under a single root.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            state_dir: root.join("snapshots"),
            runtime_dir: root,
        }
    }
}

/// Everything the event loop feeds into the room thread.
enum Event {
    /// A downstream viewer connected to the host's endpoint.
    Accepted(RoomStream),
    /// A complete envelope arrived from a peer.
    Inbound { peer: u64, envelope: Envelope },
    /// A peer's connection ended.
    Closed { peer: u64 },
}

/// A connected downstream viewer, host side.
struct Downstream {
    id: u64,
    writer: EnvelopeWriter<RoomStream>,
    /// Clone kept solely to shut the reader thread down.
    handle: RoomStream,
}

/// The viewer's connection to the host.
struct Upstream {
    writer: EnvelopeWriter<RoomStream>,
    handle: RoomStream,
}

type ChangeCallback = Box<dyn FnMut(&SessionState) + Send>;
type ReactionCallback = Box<dyn FnMut(&Reaction) + Send>;

/// Mutable room internals shared between the event loop and the
/// executors. All access happens on the thread driving [`Room::step`];
/// nothing here is behind a lock.
pub(crate) struct Core {
    id: RoomId,
    role: Role,
    state: SessionState,
    store: SnapshotStore,
    /// Set once startup completes. Commands arriving earlier have no
    /// canonical document to apply against and are dropped.
    started: bool,
    connected: bool,
    transport_error: Option<TransportError>,
    peers: Vec<Downstream>,
    upstream: Option<Upstream>,
    /// Single-slot command mailbox. A newer command overwrites an
    /// undrained older one; the slot drains once per step.
    pending: Option<Intent>,
    clock_deadline: Option<Instant>,
    on_change: Option<ChangeCallback>,
    on_reaction: Option<ReactionCallback>,
}

impl Core {
    fn notify_change(&mut self) {
        if let Some(cb) = self.on_change.as_mut() {
            cb(&self.state);
        }
    }

    fn notify_reaction(&mut self, reaction: &Reaction) {
        if let Some(cb) = self.on_reaction.as_mut() {
            cb(reaction);
        }
    }

    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    /// Install `next` as the canonical document, persist it, broadcast
    /// it downstream and fire the change callback.
    pub(crate) fn commit(&mut self, next: SessionState) {
        self.state = next;
        if let Err(err) = self.store.save(&self.id, &self.state) {
            warn!(room = %self.id, %err, "snapshot persist failed");
        }
        self.broadcast_state();
        self.arm_clock();
        self.notify_change();
    }

    fn broadcast_state(&mut self) {
        if self.peers.is_empty() {
            return;
        }
        let payload = match Envelope::State(self.state.clone()).to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "state envelope failed to encode");
                return;
            }
        };
        self.peers.retain_mut(|peer| {
            match peer.writer.send_payload(&payload) {
                Ok(()) => true,
                Err(err) => {
                    debug!(peer = peer.id, %err, "dropping unreachable viewer");
                    let _ = peer.handle.shutdown();
                    false
                }
            }
        });
    }

    /// Forward a reaction payload verbatim to every downstream viewer
    /// except the one it came from.
    fn relay_reaction(&mut self, payload: &[u8], from: Option<u64>) {
        self.peers.retain_mut(|peer| {
            if from == Some(peer.id) {
                return true;
            }
            match peer.writer.send_payload(payload) {
                Ok(()) => true,
                Err(err) => {
                    debug!(peer = peer.id, %err, "dropping unreachable viewer");
                    let _ = peer.handle.shutdown();
                    false
                }
            }
        });
    }

    /// Send an envelope to the host. A failed send marks the viewer
    /// disconnected; the envelope is lost, which is acceptable for
    /// both commands (host state will say so) and reactions.
    pub(crate) fn send_upstream(&mut self, envelope: &Envelope) {
        let Some(upstream) = self.upstream.as_mut() else {
            debug!(kind = envelope.kind_name(), "dropped: no upstream connection");
            return;
        };
        if let Err(err) = upstream.writer.send(envelope) {
            debug!(%err, "upstream send failed, going offline");
            let _ = upstream.handle.shutdown();
            self.upstream = None;
            self.connected = false;
        }
    }

    /// Schedule the next clock tick if this side runs the clock.
    fn arm_clock(&mut self) {
        if self.role == Role::Host && self.state.shot_clock.running {
            if self.clock_deadline.is_none() {
                self.clock_deadline = Some(Instant::now() + CLOCK_TICK);
            }
        } else {
            self.clock_deadline = None;
        }
    }

    fn tick_clock(&mut self) {
        self.clock_deadline = None;
        if !self.state.shot_clock.running {
            return;
        }
        let mut next = self.state.clone();
        next.shot_clock.seconds = next.shot_clock.seconds.saturating_sub(1);
        if next.shot_clock.seconds == 0 {
            next.shot_clock.running = false;
        }
        self.commit(next);
    }
}

/// A participant's view of one synchronized room.
///
/// Single-threaded at its core: background threads only ever feed the
/// event channel, and all state mutation happens inside [`Room::step`]
/// on the caller's thread.
pub struct Room {
    core: Core,
    events: Receiver<Event>,
    /// Kept so the channel never disconnects while the room lives.
    events_tx: Sender<Event>,
    shutdown: Arc<AtomicBool>,
    socket_path: PathBuf,
    next_peer: u64,
    stopped: bool,
}

impl Room {
    /// Open a room: run the election, connect or start listening, and
    /// seed the local document from the snapshot store.
    pub fn open(id: RoomId, config: &RoomConfig) -> Result<Self> {
        let store = SnapshotStore::open(&config.state_dir)?;
        let state = store.load(&id).unwrap_or_else(SessionState::template);

        std::fs::create_dir_all(&config.runtime_dir)?;
        let socket_path = id.socket_path(&config.runtime_dir);

        let (tx, rx) = channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut core = Core {
            id,
            role: Role::Host,
            state,
            store,
            started: false,
            connected: false,
            transport_error: None,
            peers: Vec::new(),
            upstream: None,
            pending: None,
            clock_deadline: None,
            on_change: None,
            on_reaction: None,
        };

        match elect(&socket_path) {
            Election::Host(socket) => {
                core.role = Role::Host;
                core.connected = true;
                spawn_acceptor(socket, tx.clone(), Arc::clone(&shutdown));
            }
            Election::Viewer(stream) => {
                core.role = Role::Viewer;
                let reader = stream.try_clone()?;
                let handle = stream.try_clone()?;
                core.upstream = Some(Upstream {
                    writer: EnvelopeWriter::new(stream),
                    handle,
                });
                core.connected = true;
                spawn_reader(UPSTREAM_PEER, reader, tx.clone());
            }
            Election::Offline(err) => {
                // Local-only session. Mutations still work and persist;
                // nothing replicates until the room is reopened.
                warn!(room = %core.id, %err, "endpoint unavailable, running offline");
                core.role = Role::Host;
                core.transport_error = Some(err);
            }
        }

        core.started = true;
        info!(room = %core.id, role = ?core.role, "room open");

        Ok(Self {
            core,
            events: rx,
            events_tx: tx,
            shutdown,
            socket_path,
            next_peer: UPSTREAM_PEER + 1,
            stopped: false,
        })
    }

    /// The room this participant is in.
    pub fn id(&self) -> &RoomId {
        &self.core.id
    }

    pub fn role(&self) -> Role {
        self.core.role
    }

    pub fn is_host(&self) -> bool {
        self.core.role == Role::Host
    }

    /// Whether this participant currently reaches any other peer.
    pub fn is_connected(&self) -> bool {
        self.core.connected
    }

    /// Number of connected downstream viewers (always 0 on a viewer).
    pub fn peer_count(&self) -> usize {
        self.core.peers.len()
    }

    /// The error that forced this room offline, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        self.core.transport_error.as_ref()
    }

    /// The current local document. On the host this is canonical; on a
    /// viewer it is the latest replica.
    pub fn state(&self) -> &SessionState {
        self.core.state()
    }

    /// Called after every local document replacement.
    pub fn on_change(&mut self, cb: impl FnMut(&SessionState) + Send + 'static) {
        self.core.on_change = Some(Box::new(cb));
    }

    /// Called for every observed reaction, including this side's own.
    pub fn on_reaction(&mut self, cb: impl FnMut(&Reaction) + Send + 'static) {
        self.core.on_reaction = Some(Box::new(cb));
    }

    /// Submit a mutation intent.
    ///
    /// On the host this applies immediately. On a viewer it is relayed
    /// upstream and the local replica stays untouched until the host's
    /// next state broadcast comes back around.
    pub fn dispatch(&mut self, intent: Intent) {
        let executor: &dyn IntentExecutor = match self.core.role {
            Role::Host => &LocalExecutor,
            Role::Viewer => &RelayExecutor,
        };
        executor.execute(&mut self.core, intent, now_ms());
    }

    /// Emit an ephemeral reaction.
    ///
    /// Reactions never touch the document and are never persisted. The
    /// local callback fires immediately either way; delivery to others
    /// is best effort.
    pub fn emit(&mut self, token: impl Into<String>) {
        let reaction = Reaction::new(token, now_ms());
        self.core.notify_reaction(&reaction);

        let envelope = Envelope::Reaction(reaction);
        match self.core.role {
            Role::Host => {
                if let Ok(payload) = envelope.to_payload() {
                    self.core.relay_reaction(&payload, None);
                }
            }
            Role::Viewer => self.core.send_upstream(&envelope),
        }
    }

    /// Drive the room for at most `timeout`.
    ///
    /// Processes every queued event, drains the command slot once, and
    /// ticks the shot clock when its deadline passes.
    pub fn step(&mut self, timeout: Duration) {
        let wait = match self.core.clock_deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(timeout),
            None => timeout,
        };

        match self.events.recv_timeout(wait) {
            Ok(event) => {
                self.handle_event(event);
                while let Ok(event) = self.events.try_recv() {
                    self.handle_event(event);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {}
        }

        self.drain_pending();

        if let Some(deadline) = self.core.clock_deadline {
            if Instant::now() >= deadline {
                self.core.tick_clock();
            }
        }
    }

    /// Run until [`Room::stop`] is observed via the shutdown flag.
    pub fn run(&mut self) {
        while !self.shutdown.load(Ordering::SeqCst) {
            self.step(Duration::from_millis(200));
        }
    }

    /// Flag another thread can set to make [`Room::run`] return.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Tear the room down. Idempotent; also runs on drop.
    ///
    /// The host's endpoint file disappears with the listening socket,
    /// which is what lets the next claimant win the election.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.shutdown.store(true, Ordering::SeqCst);
        self.core.clock_deadline = None;

        // Wake the acceptor so it observes the flag and drops the
        // listener.
        if self.core.role == Role::Host && self.core.transport_error.is_none() {
            let _ = RoomSocket::connect(&self.socket_path);
        }

        for peer in self.core.peers.drain(..) {
            let _ = peer.handle.shutdown();
        }
        if let Some(upstream) = self.core.upstream.take() {
            let _ = upstream.handle.shutdown();
        }
        self.core.connected = false;
        info!(room = %self.core.id, "room stopped");
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Accepted(stream) => self.register_peer(stream),
            Event::Inbound { peer, envelope } => self.handle_inbound(peer, envelope),
            Event::Closed { peer } => self.handle_closed(peer),
        }
    }

    fn register_peer(&mut self, stream: RoomStream) {
        let id = self.next_peer;
        self.next_peer += 1;

        let (reader, handle) = match (stream.try_clone(), stream.try_clone()) {
            (Ok(reader), Ok(handle)) => (reader, handle),
            _ => {
                debug!("failed to clone accepted stream, dropping peer");
                return;
            }
        };

        let mut writer = EnvelopeWriter::new(stream);
        // New viewers get the canonical document before anything else.
        if let Err(err) = writer.send(&Envelope::State(self.core.state.clone())) {
            debug!(peer = id, %err, "initial state send failed, dropping peer");
            return;
        }

        spawn_reader(id, reader, self.events_tx.clone());
        self.core.peers.push(Downstream { id, writer, handle });
        info!(room = %self.core.id, peer = id, peers = self.core.peers.len(), "viewer joined");
    }

    fn handle_inbound(&mut self, peer: u64, envelope: Envelope) {
        match (self.core.role, envelope) {
            (Role::Host, Envelope::Command(intent)) => {
                if !self.core.started {
                    debug!(peer, "command dropped: session not started");
                    return;
                }
                // Last writer wins; an undrained older command is
                // overwritten, not queued.
                self.core.pending = Some(intent);
            }
            (Role::Host, Envelope::Reaction(reaction)) => {
                if let Ok(payload) = Envelope::Reaction(reaction.clone()).to_payload() {
                    self.core.relay_reaction(&payload, Some(peer));
                }
                self.core.notify_reaction(&reaction);
            }
            (Role::Host, Envelope::State(_)) => {
                debug!(peer, "ignoring state envelope from downstream");
            }
            (Role::Viewer, Envelope::State(state)) => {
                // Full replacement, never a merge.
                self.core.state = state;
                if let Err(err) = self.core.store.save(&self.core.id, &self.core.state) {
                    warn!(room = %self.core.id, %err, "snapshot persist failed");
                }
                self.core.notify_change();
            }
            (Role::Viewer, Envelope::Reaction(reaction)) => {
                self.core.notify_reaction(&reaction);
            }
            (Role::Viewer, Envelope::Command(_)) => {
                debug!(peer, "ignoring command envelope from upstream");
            }
        }
    }

    fn handle_closed(&mut self, peer: u64) {
        if peer == UPSTREAM_PEER && self.core.role == Role::Viewer {
            info!(room = %self.core.id, "lost upstream host");
            self.core.upstream = None;
            self.core.connected = false;
        } else {
            let before = self.core.peers.len();
            self.core.peers.retain(|p| p.id != peer);
            if self.core.peers.len() != before {
                info!(room = %self.core.id, peer, peers = self.core.peers.len(), "viewer left");
            }
        }
    }

    fn drain_pending(&mut self) {
        // Only the host ever fills the slot.
        if let Some(intent) = self.core.pending.take() {
            LocalExecutor.execute(&mut self.core, intent, now_ms());
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_acceptor(socket: RoomSocket, tx: Sender<Event>, shutdown: Arc<AtomicBool>) {
    thread::spawn(move || {
        loop {
            match socket.accept() {
                Ok(stream) => {
                    if shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    if tx.send(Event::Accepted(stream)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    if !shutdown.load(Ordering::SeqCst) {
                        warn!(%err, "accept failed, endpoint closing");
                    }
                    break;
                }
            }
        }
        // Dropping the socket here removes the endpoint file.
    });
}

fn spawn_reader(peer: u64, stream: RoomStream, tx: Sender<Event>) {
    thread::spawn(move || {
        let mut reader = EnvelopeReader::new(stream);
        loop {
            match reader.recv() {
                Ok(envelope) => {
                    if tx.send(Event::Inbound { peer, envelope }).is_err() {
                        break;
                    }
                }
                Err(err) if err.is_recoverable() => {
                    debug!(peer, %err, "discarding malformed envelope");
                }
                Err(err) => {
                    debug!(peer, %err, "peer connection ended");
                    let _ = tx.send(Event::Closed { peer });
                    break;
                }
            }
        }
    });
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
