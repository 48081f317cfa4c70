//! Messages into and out of a session's event loop.

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::codec::Frame;
use crate::pdu::{Command, Status};

/// Everything a session's event loop reacts to. Peer frames, caller
/// requests, worker responses and timer firings all arrive on one queue, so
/// the loop itself never locks.
#[derive(Debug)]
pub(crate) enum Event {
    /// A correlated request from a [`Session`](super::Session) handle. The
    /// loop assigns the sequence number and resolves `reply` exactly once.
    Call {
        command: Command,
        body: Bytes,
        reply: oneshot::Sender<Outcome>,
    },
    /// A response produced by the worker pool, ready to write.
    Respond {
        command: Command,
        status: Status,
        sequence: u32,
        body: Bytes,
    },
    /// A frame read from the peer.
    Peer(Frame),
    /// The expire timer for an in-flight request fired.
    Expired { sequence: u32 },
    /// The transport failed or the peer hung up; tear down.
    Closed,
    /// A handle asked for the session to end now.
    Shutdown,
}

/// Resolution of one correlated call.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// The matching response frame.
    Answer(Frame),
    /// No response within the expire window.
    TimedOut,
    /// The session ended while the request was in flight.
    Closed,
}
