//! Bound sessions: the caller-facing handle plus the tasks behind it.
//!
//! A [`Session`] is a cheap clone over two channels into the session's event
//! loop. All writes to the peer funnel through that loop, which owns the
//! write half of the transport, the table of in-flight requests and the idle
//! watchdog clock. The loop lives in [`correlator`]; this module holds the
//! public surface.

mod correlator;
mod event;

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::trace;

pub(crate) use correlator::{send_frame, start};
pub(crate) use event::{Event, Outcome};

use crate::error::{Error, Result};
use crate::pdu::{Command, EnquireLink, Pdu, Status, Unbind, INTERFACE_VERSION};

/// Which directions of business traffic a bound peer may originate.
///
/// The mode describes the local side. Accepting a `bind_receiver` makes the
/// local side a [`Transmitter`](BindMode::Transmitter) and vice versa; a
/// transceiver bind is symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    Transmitter,
    Receiver,
    Transceiver,
}

impl BindMode {
    /// True when the local side may originate submit_sm/deliver_sm traffic.
    pub fn can_transmit(self) -> bool {
        matches!(self, BindMode::Transmitter | BindMode::Transceiver)
    }

    /// True when the local side accepts inbound submit_sm/deliver_sm traffic.
    pub fn can_receive(self) -> bool {
        matches!(self, BindMode::Receiver | BindMode::Transceiver)
    }

    /// The bind command an outbound connection sends to obtain this mode.
    pub(crate) fn bind_command(self) -> Command {
        match self {
            BindMode::Transmitter => Command::BindTransmitter,
            BindMode::Receiver => Command::BindReceiver,
            BindMode::Transceiver => Command::BindTransceiver,
        }
    }
}

impl fmt::Display for BindMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindMode::Transmitter => f.write_str("transmitter"),
            BindMode::Receiver => f.write_str("receiver"),
            BindMode::Transceiver => f.write_str("transceiver"),
        }
    }
}

/// Lifecycle of a session.
///
/// `Unbound` and `Handshaking` are passed through inside
/// [`Engine::accept`](crate::Engine::accept) and
/// [`Engine::connect`](crate::Engine::connect); a [`Session`] handle only
/// ever observes `Active`, `Closing` and `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Handshaking,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unbound => f.write_str("unbound"),
            SessionState::Handshaking => f.write_str("handshaking"),
            SessionState::Active => f.write_str("active"),
            SessionState::Closing => f.write_str("closing"),
            SessionState::Closed => f.write_str("closed"),
        }
    }
}

/// Identity settled by a completed handshake.
///
/// `system_id` is the local identity, `peer_id` the one the remote side
/// presented. `version` is the negotiated interface version and drives
/// whether optional TLVs are written on this session.
#[derive(Debug, Clone)]
pub struct BindInfo {
    pub mode: BindMode,
    pub system_id: String,
    pub peer_id: String,
    pub password: String,
    pub system_type: String,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
    pub version: u8,
}

impl Default for BindInfo {
    fn default() -> BindInfo {
        BindInfo {
            mode: BindMode::Transceiver,
            system_id: String::new(),
            peer_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            addr_ton: 0,
            addr_npi: 0,
            address_range: String::new(),
            version: INTERFACE_VERSION,
        }
    }
}

/// Parameters for an outbound bind, consumed by
/// [`Engine::connect`](crate::Engine::connect).
#[derive(Debug, Clone)]
pub struct BindRequest {
    pub mode: BindMode,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
}

impl Default for BindRequest {
    fn default() -> BindRequest {
        BindRequest {
            mode: BindMode::Transceiver,
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            addr_ton: 0,
            addr_npi: 0,
            address_range: String::new(),
        }
    }
}

/// A peer's answer to a correlated request.
///
/// `pdu` is `None` when the peer reported a failure status with a body that
/// is absent or undecodable; a failure never hides behind a decode error.
/// With [`Status::Ok`] the body must decode, so `pdu` is always present.
#[derive(Debug, Clone)]
pub struct Response {
    pub command: Command,
    pub status: Status,
    pub pdu: Option<Pdu>,
}

impl Response {
    fn from_frame(frame: crate::codec::Frame) -> Result<Response> {
        let pdu = match Pdu::from_body(frame.command, frame.body.clone()) {
            Ok(pdu) => Some(pdu),
            Err(_) if !frame.status.is_ok() => None,
            Err(e) => return Err(e),
        };
        Ok(Response { command: frame.command, status: frame.status, pdu })
    }
}

/// Handle to a bound session.
///
/// Clones share the same session; dropping every handle does not close it.
/// Use [`Session::close`] for an orderly unbind or rely on the peer and the
/// watchdog to end it.
#[derive(Debug, Clone)]
pub struct Session {
    info: Arc<BindInfo>,
    events: mpsc::Sender<Event>,
    state: watch::Receiver<SessionState>,
}

impl Session {
    pub(crate) fn new(
        info: Arc<BindInfo>,
        events: mpsc::Sender<Event>,
        state: watch::Receiver<SessionState>,
    ) -> Session {
        Session { info, events, state }
    }

    /// Identity negotiated at bind time.
    pub fn info(&self) -> &BindInfo {
        &self.info
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Sends a request and waits for the matching response.
    ///
    /// The sequence number is allocated by the session; the caller never
    /// sees it. Waits at most the engine's configured expire time before
    /// failing with [`Error::RequestTimeout`]. On an inactive session this
    /// fails immediately with [`Error::ClosedSession`].
    pub async fn send(&self, pdu: Pdu) -> Result<Response> {
        if !self.is_active() {
            return Err(Error::ClosedSession);
        }
        self.call(pdu).await
    }

    /// Liveness probe: a correlated enquire_link round trip.
    pub async fn enquire(&self) -> Result<Response> {
        self.send(Pdu::EnquireLink(EnquireLink)).await
    }

    /// Orderly shutdown: an unbind is sent through the correlated path and
    /// the transport is closed once its response arrives or expires. No-op
    /// on a session that already left Active.
    ///
    /// The session is Closed when this returns either way; the error only
    /// reports whether the peer acknowledged the unbind.
    pub async fn close(&self) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let acked = self.call(Pdu::Unbind(Unbind)).await;
        let _ = self.events.send(Event::Shutdown).await;
        self.closed().await;
        acked.map(|_| ())
    }

    /// Resolves once the session reaches [`SessionState::Closed`].
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        loop {
            if *state.borrow() == SessionState::Closed {
                return;
            }
            if state.changed().await.is_err() {
                return;
            }
        }
    }

    async fn call(&self, pdu: Pdu) -> Result<Response> {
        let command = pdu.command();
        let body = pdu.to_body(self.info.version);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.events
            .send(Event::Call { command, body, reply: reply_tx })
            .await
            .map_err(|_| Error::ClosedSession)?;

        match reply_rx.await {
            Ok(Outcome::Answer(frame)) => Response::from_frame(frame),
            Ok(Outcome::TimedOut) => Err(Error::RequestTimeout),
            Ok(Outcome::Closed) | Err(_) => Err(Error::ClosedSession),
        }
    }

    /// Queues a response produced by the worker pool for writing.
    pub(crate) async fn respond(&self, pdu: Pdu, status: Status, sequence: u32) {
        let event = Event::Respond {
            command: pdu.command(),
            status,
            sequence,
            body: pdu.to_body(self.info.version),
        };
        if self.events.send(event).await.is_err() {
            trace!(sequence, "response dropped, session is gone");
        }
    }

    pub(crate) fn events(&self) -> &mpsc::Sender<Event> {
        &self.events
    }
}
