//! Host-side session behavior.

use std::fmt;

use async_trait::async_trait;

use crate::codec::Frame;
use crate::pdu::{Pdu, Status};
use crate::session::BindInfo;

/// Direction of travel for a traced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("rx"),
            Direction::Outbound => f.write_str("tx"),
        }
    }
}

/// Behavior an [`Engine`](crate::Engine) delegates to its host.
///
/// `handle` runs on the shared worker pool and may block on I/O or take its
/// time; every other hook runs inline on a session task and must return
/// quickly.
#[async_trait]
pub trait SessionHandler: Send + Sync + 'static {
    /// Answers an inbound business request (submit_sm, deliver_sm or
    /// data_sm). The returned status becomes the response's command_status;
    /// returning `None` for the body sends the default response PDU for the
    /// request.
    ///
    /// A panic here is caught by the pool and answered with
    /// [`Status::SystemError`]; it never takes the session down.
    async fn handle(&self, session: &BindInfo, request: Pdu) -> (Status, Option<Pdu>);

    /// Screens an inbound bind after its fields parse but before it is
    /// answered. Anything but [`Status::Ok`] is returned to the peer in the
    /// bind response and the connection is dropped.
    fn authorize(&self, bind: &BindInfo) -> Status {
        let _ = bind;
        Status::Ok
    }

    /// Called once when a session reaches Active.
    fn on_bound(&self, bind: &BindInfo) {
        let _ = bind;
    }

    /// Called once when a session reaches Closed.
    fn on_unbound(&self, bind: &BindInfo) {
        let _ = bind;
    }

    /// Wire tap invoked for every frame read from or written to the peer,
    /// handshake frames included.
    fn on_trace(&self, direction: Direction, frame: &Frame) {
        let _ = (direction, frame);
    }
}

/// Accepts every bind and answers every request with its default response
/// and [`Status::Ok`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

#[async_trait]
impl SessionHandler for DefaultHandler {
    async fn handle(&self, _session: &BindInfo, _request: Pdu) -> (Status, Option<Pdu>) {
        (Status::Ok, None)
    }
}
