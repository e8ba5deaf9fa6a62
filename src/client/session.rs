// ABOUTME: Session lifecycle: bind handshake, per-link reader and keep-alive tasks, rebind, stop
// ABOUTME: A supervisor task turns link-loss events into Rebinding or Failed

use crate::client::config::SessionConfig;
use crate::client::dispatcher::{Dispatch, Dispatcher};
use crate::client::error::{SegmentError, SmppError, SmppResult};
use crate::client::handlers::{Handlers, Unsolicited};
use crate::client::keepalive::{KeepAliveMonitor, KeepAliveStatus, MissVerdict};
use crate::client::pending::PendingResponses;
use crate::client::segmenter::Segmenter;
use crate::client::state::{SessionState, StateCell};
use crate::connection::{
    Connection, ConnectionError, ConnectionReader, ConnectionWriter, Connector, TcpConnector,
};
use crate::datatypes::{
    BindTransceiver, EnquireLink, GenericNack, Unbind, command_id::is_response_id,
};
use crate::receipt::DeliveryReceipt;
use crate::Frame;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, sleep, timeout, timeout_at};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

/// Highest sequence number SMPP allows
const MAX_SEQUENCE_NUMBER: u32 = 0x7FFF_FFFF;

pub(crate) type LinkReader<C> = ConnectionReader<ReadHalf<<C as Connector>::Stream>>;
pub(crate) type LinkWriter<C> = ConnectionWriter<WriteHalf<<C as Connector>::Stream>>;

/// Why a link stopped being usable
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkLoss {
    KeepAliveMissed,
    /// Keep-alive misses reached the configured ceiling
    KeepAliveExhausted,
    ReadTimeout,
    Closed,
    Transport(String),
    WriteFailed,
    PeerUnbind,
}

impl fmt::Display for LinkLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkLoss::KeepAliveMissed => f.write_str("enquire_link went unanswered"),
            LinkLoss::KeepAliveExhausted => f.write_str("keep-alive failure ceiling reached"),
            LinkLoss::ReadTimeout => f.write_str("read timeout"),
            LinkLoss::Closed => f.write_str("peer closed the connection"),
            LinkLoss::Transport(reason) => write!(f, "transport error: {reason}"),
            LinkLoss::WriteFailed => f.write_str("write failed"),
            LinkLoss::PeerUnbind => f.write_str("peer sent unbind"),
        }
    }
}

/// How a rebind run ended
enum Rebind {
    Bound,
    /// Stopped, or the state moved on, while rebinding
    Abandoned,
    /// No attempt succeeded; carries the last failure
    Exhausted(SmppError),
}

/// Link loss tagged with the link it happened on
#[derive(Debug)]
pub(crate) struct LinkEvent {
    generation: u64,
    loss: LinkLoss,
}

/// State shared by the session handle and its background tasks
pub(crate) struct Shared<C: Connector> {
    pub(crate) config: SessionConfig,
    connector: C,
    pub(crate) state: StateCell,
    sequence: AtomicU32,
    writer: tokio::sync::Mutex<Option<LinkWriter<C>>>,
    pub(crate) pending: Arc<PendingResponses>,
    keepalive: Arc<KeepAliveMonitor>,
    handlers: Arc<Handlers>,
    dispatcher: Dispatcher,
    pub(crate) segmenter: Segmenter,
    last_activity: Mutex<Instant>,
    generation: AtomicU64,
    link: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
    events: mpsc::UnboundedSender<LinkEvent>,
    /// Why the session failed, once it has
    failure: Mutex<Option<Arc<SmppError>>>,
}

impl<C: Connector> Shared<C> {
    /// Next sequence number, 1 through 0x7FFFFFFF, wrapping back to 1
    pub(crate) fn next_sequence(&self) -> u32 {
        let advance = |n: u32| if n >= MAX_SEQUENCE_NUMBER { 1 } else { n + 1 };
        let previous = self
            .sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(advance(n)))
            .unwrap_or_else(|n| n);
        advance(previous)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn link(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Record the cause and move to Failed
    fn fail(&self, cause: SmppError) {
        error!(error = %cause, "session failed");
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(cause));
        self.state.transition(SessionState::Failed);
    }

    /// Tell the supervisor a link is gone
    pub(crate) fn report(&self, generation: u64, loss: LinkLoss) {
        // The supervisor is gone only once the session is shut down
        let _ = self.events.send(LinkEvent { generation, loss });
    }

    /// Write one frame under the session write lock.
    ///
    /// Waiting for the lock and the write itself both end at `deadline`
    /// (`TimedOut`) or when the link is torn down (`Interrupted`), so a peer
    /// that stops reading cannot hold the lock forever.
    pub(crate) async fn write(
        &self,
        frame: &Frame,
        deadline: Instant,
    ) -> Result<(), ConnectionError> {
        let not_connected =
            || ConnectionError::Io(io::Error::new(io::ErrorKind::NotConnected, "no bound link"));
        let Some(link) = self.link().clone() else {
            return Err(not_connected());
        };

        let write = async {
            let mut writer = self.writer.lock().await;
            let Some(writer) = writer.as_mut() else {
                return Err(not_connected());
            };
            writer.write_frame(frame).await
        };

        tokio::select! {
            _ = link.cancelled() => Err(ConnectionError::Io(io::Error::new(
                io::ErrorKind::Interrupted,
                "link torn down",
            ))),
            written = timeout_at(deadline, write) => match written {
                Ok(result) => result,
                Err(_) => Err(ConnectionError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{} not written before the deadline", frame.name()),
                ))),
            },
        }
    }

    /// Connect and bind within the bind timeout. Every failure is a
    /// `BindFailure`.
    async fn establish(&self) -> SmppResult<(LinkReader<C>, LinkWriter<C>)> {
        let limit = self.config.bind_timeout;
        match timeout(limit, self.handshake()).await {
            Ok(Ok(link)) => Ok(link),
            Ok(Err(err @ SmppError::BindFailure { .. })) => Err(err),
            Ok(Err(err)) => Err(SmppError::BindFailure {
                status: None,
                reason: err.to_string(),
            }),
            Err(_) => Err(SmppError::BindFailure {
                status: None,
                reason: format!("no bind_transceiver_resp within {limit:?}"),
            }),
        }
    }

    async fn handshake(&self) -> SmppResult<(LinkReader<C>, LinkWriter<C>)> {
        let address = &self.config.address;
        debug!(%address, "connecting");
        let stream = self.connector.connect(address).await?;
        let mut connection = Connection::new(stream);

        let credentials = &self.config.credentials;
        let sequence_number = self.next_sequence();
        let bind = BindTransceiver::new(
            sequence_number,
            credentials.system_id.as_str(),
            credentials.password.as_str(),
            credentials.system_type.as_str(),
        );
        connection
            .write_frame(&Frame::BindTransceiver(bind))
            .await?;

        loop {
            match connection.read_frame().await? {
                Some(Frame::BindTransceiverResp(resp))
                    if resp.sequence_number == sequence_number =>
                {
                    if !resp.command_status.is_ok() {
                        return Err(SmppError::BindFailure {
                            status: Some(resp.command_status),
                            reason: format!("bind_transceiver rejected: {}", resp.command_status),
                        });
                    }
                    info!(%address, smsc = %resp.system_id, "bound as transceiver");
                    return Ok(connection.split());
                }
                Some(Frame::GenericNack(nack)) => {
                    return Err(SmppError::BindFailure {
                        status: Some(nack.command_status),
                        reason: format!("generic_nack during bind: {}", nack.command_status),
                    });
                }
                Some(other) => {
                    debug!(pdu = other.name(), "ignoring frame before bind completes");
                }
                None => {
                    return Err(SmppError::BindFailure {
                        status: None,
                        reason: "connection closed during bind".to_string(),
                    });
                }
            }
        }
    }

    /// Make a freshly bound link the current one and start its tasks
    async fn install_link(self: &Arc<Self>, (reader, writer): (LinkReader<C>, LinkWriter<C>)) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.shutdown.child_token();

        *self.writer.lock().await = Some(writer);
        *self.link() = Some(token.clone());
        self.touch();

        tokio::spawn(read_loop(
            Arc::clone(self),
            reader,
            generation,
            token.clone(),
        ));
        if self.config.keepalive.enabled {
            tokio::spawn(keepalive_loop(Arc::clone(self), generation, token));
        }
        debug!(generation, "link installed");
    }

    /// Stop the current link's tasks, fail what was in flight on it and
    /// release the transport
    async fn teardown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let link = self.link().take();
        if let Some(link) = link {
            link.cancel();
        }

        let interrupted = self.pending.fail_all(SegmentError::Interrupted);
        if interrupted > 0 {
            warn!(interrupted, "in-flight requests interrupted");
        }

        // a write that was in progress gave up the lock when the link was cancelled
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            // flushing into a peer that stopped reading would never finish
            match timeout(self.config.close_timeout, writer.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => debug!(error = %err, "shutting down write half"),
                Err(_) => debug!("write half not flushed before close timeout, dropping it"),
            }
        }
    }

    /// Re-run the bind handshake until it succeeds or the policy gives up
    async fn rebind(self: &Arc<Self>, loss: &LinkLoss) -> Rebind {
        let policy = self.config.rebind;
        let mut last_failure = SmppError::BindFailure {
            status: None,
            reason: format!("link lost ({loss}) and no rebind attempts are allowed"),
        };

        for attempt in 1..=policy.max_attempts {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Rebind::Abandoned,
                _ = sleep(policy.delay) => {}
            }
            if self.state.get() != SessionState::Rebinding {
                return Rebind::Abandoned;
            }

            info!(attempt, max_attempts = policy.max_attempts, "rebinding");
            let result = tokio::select! {
                _ = self.shutdown.cancelled() => return Rebind::Abandoned,
                result = self.establish() => result,
            };

            match result {
                Ok(link) => {
                    self.install_link(link).await;
                    if self.state.transition(SessionState::Bound) {
                        return Rebind::Bound;
                    }
                    // stopped while the handshake ran
                    self.teardown().await;
                    return Rebind::Abandoned;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "rebind attempt failed");
                    last_failure = err;
                }
            }
        }
        Rebind::Exhausted(last_failure)
    }

    /// Send unbind and wait briefly for the answer
    async fn unbind(&self, limit: Duration) {
        let sequence_number = self.next_sequence();
        let response = self.pending.register(sequence_number);

        let deadline = Instant::now() + limit;
        if let Err(err) = self
            .write(&Frame::Unbind(Unbind::new(sequence_number)), deadline)
            .await
        {
            self.pending.cancel(sequence_number);
            debug!(error = %err, "unbind not sent");
            return;
        }

        match timeout_at(deadline, response).await {
            Ok(Ok(_)) => debug!(sequence_number, "unbind acknowledged"),
            _ => {
                self.pending.cancel(sequence_number);
                debug!(sequence_number, "no unbind_resp before close timeout");
            }
        }
    }
}

async fn read_loop<C: Connector>(
    shared: Arc<Shared<C>>,
    mut reader: LinkReader<C>,
    generation: u64,
    token: CancellationToken,
) {
    let read_timeout = shared.config.read_timeout;

    let loss = loop {
        let next = tokio::select! {
            _ = token.cancelled() => return,
            next = timeout(read_timeout, reader.read_frame()) => next,
        };

        let frame = match next {
            Err(_) => break LinkLoss::ReadTimeout,
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => break LinkLoss::Closed,
            Ok(Err(ConnectionError::Malformed {
                command_id,
                sequence_number,
                source,
            })) => {
                shared.touch();
                warn!(
                    command_id = format_args!("{command_id:#010x}"),
                    sequence_number,
                    error = %source,
                    "malformed PDU from peer"
                );
                if !is_response_id(command_id) {
                    let nack = Frame::GenericNack(GenericNack::system_error(sequence_number));
                    if let Err(err) = shared.write(&nack, Instant::now() + read_timeout).await {
                        break LinkLoss::Transport(err.to_string());
                    }
                }
                continue;
            }
            Ok(Err(err)) => break LinkLoss::Transport(err.to_string()),
        };

        shared.touch();
        match shared.dispatcher.dispatch(frame) {
            Dispatch::Handled => {}
            Dispatch::Reply(reply) => {
                if let Err(err) = shared.write(&reply, Instant::now() + read_timeout).await {
                    break LinkLoss::Transport(err.to_string());
                }
            }
            Dispatch::PeerUnbind(reply) => {
                if let Err(err) = shared.write(&reply, Instant::now() + read_timeout).await {
                    debug!(error = %err, "unbind_resp not sent");
                }
                break LinkLoss::PeerUnbind;
            }
        }
    };

    debug!(generation, %loss, "reader stopped");
    shared.report(generation, loss);
}

async fn keepalive_loop<C: Connector>(
    shared: Arc<Shared<C>>,
    generation: u64,
    token: CancellationToken,
) {
    let interval = shared.keepalive.interval();
    let response_timeout = shared.keepalive.timeout();
    let mut pongs = shared.keepalive.subscribe();
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        pongs.borrow_and_update();
        let sequence_number = shared.next_sequence();
        let ping = Frame::EnquireLink(EnquireLink::new(sequence_number));
        // the write and the answer share one response timeout
        let deadline = Instant::now() + response_timeout;
        match shared.write(&ping, deadline).await {
            Ok(()) => {}
            Err(ConnectionError::Io(err)) if err.kind() == io::ErrorKind::TimedOut => {
                report_miss(&shared, generation, sequence_number);
                return;
            }
            Err(err) => {
                shared.report(generation, LinkLoss::Transport(err.to_string()));
                return;
            }
        }
        shared.keepalive.record_ping();
        debug!(sequence_number, "enquire_link sent");

        let answered = tokio::select! {
            _ = token.cancelled() => return,
            answered = timeout_at(deadline, pongs.changed()) => answered,
        };
        match answered {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return,
            Err(_) => {
                report_miss(&shared, generation, sequence_number);
                return;
            }
        }
    }
}

/// Count an unanswered enquire_link and report the link as lost
fn report_miss<C: Connector>(shared: &Shared<C>, generation: u64, sequence_number: u32) {
    let loss = match shared.keepalive.record_miss() {
        MissVerdict::Rebind => LinkLoss::KeepAliveMissed,
        MissVerdict::Fail => LinkLoss::KeepAliveExhausted,
    };
    let status = shared.keepalive.status();
    warn!(
        sequence_number,
        consecutive_failures = status.consecutive_failures,
        "enquire_link unanswered"
    );
    shared.report(generation, loss);
}

async fn supervise<C: Connector>(
    shared: Arc<Shared<C>>,
    mut events: mpsc::UnboundedReceiver<LinkEvent>,
) {
    loop {
        let event = tokio::select! {
            _ = shared.shutdown.cancelled() => return,
            event = events.recv() => match event {
                Some(event) => event,
                None => return,
            },
        };

        if event.generation != shared.generation() {
            debug!(generation = event.generation, loss = %event.loss, "ignoring stale link event");
            continue;
        }
        if shared.state.get() != SessionState::Bound {
            continue;
        }

        if event.loss == LinkLoss::KeepAliveExhausted {
            shared.teardown().await;
            let failures = shared.keepalive.status().consecutive_failures;
            shared.fail(SmppError::KeepAliveExhausted { failures });
            return;
        }

        warn!(loss = %event.loss, "link lost");
        if !shared.state.transition(SessionState::Rebinding) {
            continue;
        }
        shared.teardown().await;

        match shared.rebind(&event.loss).await {
            Rebind::Bound | Rebind::Abandoned => {}
            Rebind::Exhausted(cause) => {
                if shared.state.get() == SessionState::Rebinding {
                    warn!(
                        max_attempts = shared.config.rebind.max_attempts,
                        "rebind attempts exhausted"
                    );
                    shared.fail(cause);
                }
                return;
            }
        }
    }
}

/// A transceiver session with one SMSC
///
/// Cloning gives another handle to the same session. Background tasks stop
/// when [`Session::stop`] is called or the last handle is dropped.
pub struct Session<C: Connector = TcpConnector> {
    pub(crate) shared: Arc<Shared<C>>,
    _shutdown: Arc<DropGuard>,
}

impl<C: Connector> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _shutdown: Arc::clone(&self._shutdown),
        }
    }
}

impl<C: Connector> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.shared.config.address)
            .field("state", &self.shared.state.get())
            .field("pending", &self.shared.pending.len())
            .finish()
    }
}

impl Session {
    /// Connect over TCP and bind with no handlers registered
    pub async fn start(config: SessionConfig) -> SmppResult<Self> {
        Self::launch(config, TcpConnector, Handlers::default()).await
    }
}

impl<C: Connector> Session<C> {
    pub(crate) async fn launch(
        config: SessionConfig,
        connector: C,
        handlers: Handlers,
    ) -> SmppResult<Self> {
        config.validate()?;

        let pending = Arc::new(PendingResponses::new());
        let keepalive = Arc::new(KeepAliveMonitor::new(config.keepalive.clone()));
        let handlers = Arc::new(handlers);
        let dispatcher = Dispatcher::new(
            Arc::clone(&pending),
            Arc::clone(&keepalive),
            Arc::clone(&handlers),
        );
        let (events, inbox) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let shared = Arc::new(Shared {
            segmenter: Segmenter::new(config.capacities),
            config,
            connector,
            state: StateCell::new(),
            sequence: AtomicU32::new(0),
            writer: tokio::sync::Mutex::new(None),
            pending,
            keepalive,
            handlers,
            dispatcher,
            last_activity: Mutex::new(Instant::now()),
            generation: AtomicU64::new(0),
            link: Mutex::new(None),
            shutdown: shutdown.clone(),
            events,
            failure: Mutex::new(None),
        });

        shared.state.transition(SessionState::Binding);
        let link = match shared.establish().await {
            Ok(link) => link,
            Err(err) => {
                error!(address = %shared.config.address, error = %err, "bind failed");
                shared.state.transition(SessionState::Failed);
                return Err(err);
            }
        };
        shared.install_link(link).await;
        shared.state.transition(SessionState::Bound);

        tokio::spawn(supervise(Arc::clone(&shared), inbox));

        Ok(Self {
            shared,
            _shutdown: Arc::new(shutdown.drop_guard()),
        })
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.get()
    }

    /// Receiver that sees every state change
    pub fn watch_state(&self) -> tokio::sync::watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// When the last frame arrived, or the current link was bound
    pub fn last_activity(&self) -> Instant {
        *self
            .shared
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Why the session reached `Failed`: the last bind failure once rebind
    /// attempts ran out, or the keep-alive ceiling. `None` while the session
    /// has not failed.
    pub fn failure(&self) -> Option<Arc<SmppError>> {
        self.shared
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn keepalive_status(&self) -> KeepAliveStatus {
        self.shared.keepalive.status()
    }

    /// Inbound frames nothing could route
    pub fn unhandled_frames(&self) -> u64 {
        self.shared.dispatcher.unhandled_frames()
    }

    /// Register a handler for delivery receipts. Runs on the reader task.
    pub fn on_receipt<F>(&self, handler: F)
    where
        F: Fn(&DeliveryReceipt) + Send + Sync + 'static,
    {
        self.shared.handlers.add_receipt(Arc::new(handler));
    }

    /// Register a handler for inbound traffic that is not a receipt
    pub fn on_unsolicited<F>(&self, handler: F)
    where
        F: Fn(&Unsolicited) + Send + Sync + 'static,
    {
        self.shared.handlers.add_unsolicited(Arc::new(handler));
    }

    /// Unbind and release the connection
    ///
    /// In-flight submissions get up to the close timeout to finish. Calling
    /// `stop` again, or on a failed session, does nothing.
    pub async fn stop(&self) -> SmppResult<()> {
        let shared = &self.shared;
        if !shared.state.transition(SessionState::Closing) {
            debug!(state = %shared.state.get(), "stop: session already stopped");
            return Ok(());
        }

        let close_timeout = shared.config.close_timeout;
        if !shared.pending.wait_drained(close_timeout).await {
            warn!(
                outstanding = shared.pending.len(),
                "close timeout reached with submissions in flight"
            );
        }
        shared.pending.fail_all(SegmentError::Interrupted);

        shared.unbind(close_timeout).await;
        shared.shutdown.cancel();
        shared.teardown().await;

        shared.state.transition(SessionState::Closed);
        Ok(())
    }
}
