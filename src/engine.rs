//! The engine: shared state behind every session, plus both sides of the
//! bind handshake.
//!
//! One [`Engine`] owns a [`Config`], a [`SessionHandler`], the sequence
//! allocator and the worker pool. Sessions created through
//! [`Engine::accept`], [`Engine::connect`] or [`Engine::serve`] all draw
//! from that shared state, so a process can bind in both directions and to
//! many peers with a single pool and one sequence space.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{Sink, Stream, StreamExt};
use tokio::io::{self, AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::codec::{Frame, SmppCodec};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::handler::{Direction, SessionHandler};
use crate::pdu::{tags, BindFields, BindRespFields, Command, Status, TlvMap, INTERFACE_VERSION};
use crate::sequence::Sequence;
use crate::session::{self, BindInfo, BindMode, BindRequest, Session};
use crate::worker::WorkerPool;

/// Depth of the work queue feeding the shared pool.
const WORK_QUEUE_DEPTH: usize = 8192;

/// Shared protocol engine. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: Config,
    handler: Arc<dyn SessionHandler>,
    sequence: Sequence,
    pool: WorkerPool,
}

impl Engine {
    /// Builds an engine and starts the worker pool's floor workers, so this
    /// must run inside a tokio runtime.
    pub fn new(config: Config, handler: Arc<dyn SessionHandler>) -> Engine {
        let pool = WorkerPool::new(
            handler.clone(),
            config.min_workers,
            config.max_workers,
            WORK_QUEUE_DEPTH,
        );
        Engine {
            inner: Arc::new(EngineInner {
                config,
                handler,
                sequence: Sequence::new(),
                pool,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn handler(&self) -> Arc<dyn SessionHandler> {
        self.inner.handler.clone()
    }

    pub(crate) fn next_sequence(&self) -> u32 {
        self.inner.sequence.next()
    }

    pub(crate) fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }

    /// Passive handshake: waits for the peer's bind request on an
    /// established transport and answers it.
    ///
    /// The local mode mirrors the peer's: accepting a `bind_receiver` makes
    /// this side a transmitter and vice versa. The bind wait is bounded by
    /// [`Config::keep_alive`]. A wrong opening command is answered with a
    /// generic_nack, a bind that will not parse or carries an unusable
    /// interface version with a failed bind response; in every rejection
    /// case no session is created and the transport is dropped.
    pub async fn accept<T>(&self, io: T) -> Result<Session>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = io::split(io);
        let mut reader = FramedRead::new(read_half, SmppCodec::new());
        let mut writer = FramedWrite::new(write_half, SmppCodec::new());
        let handler = self.handler();

        let frame = handshake_frame(&mut reader, self.inner.config.keep_alive).await?;
        handler.on_trace(Direction::Inbound, &frame);
        debug!(command = %frame.command, sequence = frame.sequence, "bind request");

        let mode = match frame.command {
            Command::BindReceiver => BindMode::Transmitter,
            Command::BindTransmitter => BindMode::Receiver,
            Command::BindTransceiver => BindMode::Transceiver,
            other => {
                warn!(command = %other, "connection opened with a non-bind command");
                reject(
                    &mut writer,
                    &handler,
                    Command::GenericNack,
                    Status::InvalidCommandId,
                    frame.sequence,
                )
                .await;
                return Err(Error::UnexpectedCommand(other));
            }
        };

        let resp_command = frame.command.response();
        let mut body = frame.body.clone();
        let fields = match BindFields::read(&mut body) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, "malformed bind request");
                reject(&mut writer, &handler, resp_command, Status::BindFailed, frame.sequence)
                    .await;
                return Err(e);
            }
        };

        let declared = fields.interface_version;
        if declared >> 4 != 0x3 {
            warn!(version = declared, "unusable interface version");
            reject(&mut writer, &handler, resp_command, Status::BindFailed, frame.sequence).await;
            return Err(Error::UnsupportedVersion(declared));
        }
        let version = declared.min(INTERFACE_VERSION);

        let info = BindInfo {
            mode,
            system_id: self.inner.config.system_id.clone(),
            peer_id: fields.system_id,
            password: fields.password,
            system_type: fields.system_type,
            addr_ton: fields.addr_ton,
            addr_npi: fields.addr_npi,
            address_range: fields.address_range,
            version,
        };

        let verdict = handler.authorize(&info);
        if !verdict.is_ok() {
            warn!(peer = %info.peer_id, status = %verdict, "bind refused");
            reject(&mut writer, &handler, resp_command, verdict, frame.sequence).await;
            return Err(Error::BindRejected(verdict));
        }

        let mut resp = BindRespFields {
            system_id: self.inner.config.system_id.clone(),
            tlvs: TlvMap::new(),
        };
        if declared >= 0x34 {
            resp.tlvs.insert_u8(tags::SC_INTERFACE_VERSION, version);
        }
        let mut resp_body = BytesMut::new();
        resp.write(&mut resp_body);
        session::send_frame(
            &mut writer,
            &handler,
            Frame::response(resp_command, Status::Ok, frame.sequence, resp_body.freeze()),
        )
        .await?;

        info!(peer = %info.peer_id, mode = %info.mode, version = info.version, "session bound");
        Ok(session::start(self.clone(), reader, writer, info))
    }

    /// Active handshake: sends the bind request for `bind.mode` and waits
    /// for the answer, bounded by [`Config::expire`].
    ///
    /// The response must carry the paired response command, a zero status
    /// and the request's sequence number; anything else fails the bind with
    /// no session created.
    pub async fn connect<T>(&self, io: T, bind: BindRequest) -> Result<Session>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = io::split(io);
        let mut reader = FramedRead::new(read_half, SmppCodec::new());
        let mut writer = FramedWrite::new(write_half, SmppCodec::new());
        let handler = self.handler();

        let command = bind.mode.bind_command();
        let sequence = self.next_sequence();
        let fields = BindFields {
            system_id: bind.system_id.clone(),
            password: bind.password.clone(),
            system_type: bind.system_type.clone(),
            interface_version: INTERFACE_VERSION,
            addr_ton: bind.addr_ton,
            addr_npi: bind.addr_npi,
            address_range: bind.address_range.clone(),
        };
        let mut body = BytesMut::new();
        fields.write(&mut body);
        debug!(command = %command, system_id = %bind.system_id, "binding");
        session::send_frame(
            &mut writer,
            &handler,
            Frame::request(command, sequence, body.freeze()),
        )
        .await?;

        let frame = handshake_frame(&mut reader, self.inner.config.expire).await?;
        handler.on_trace(Direction::Inbound, &frame);

        if frame.command != command.response() {
            warn!(command = %frame.command, "unexpected bind answer");
            return Err(Error::UnexpectedCommand(frame.command));
        }
        if !frame.status.is_ok() {
            warn!(status = %frame.status, "bind rejected by peer");
            return Err(Error::BindRejected(frame.status));
        }
        if frame.sequence != sequence {
            return Err(Error::SequenceMismatch { sent: sequence, answered: frame.sequence });
        }

        let mut resp_body = frame.body.clone();
        let resp = BindRespFields::read(&mut resp_body)?;
        // No sc_interface_version parameter means a pre-3.4 peer.
        let peer_version = resp.sc_interface_version().unwrap_or(0x33);
        let version = peer_version.min(INTERFACE_VERSION);

        let info = BindInfo {
            mode: bind.mode,
            system_id: bind.system_id,
            peer_id: resp.system_id,
            password: bind.password,
            system_type: bind.system_type,
            addr_ton: bind.addr_ton,
            addr_npi: bind.addr_npi,
            address_range: bind.address_range,
            version,
        };
        info!(peer = %info.peer_id, mode = %info.mode, version = info.version, "session bound");
        Ok(session::start(self.clone(), reader, writer, info))
    }

    /// Accept loop over a TCP listener. Each connection is handshaken on
    /// its own task; sessions that bind successfully come out of the
    /// returned channel. Dropping the receiver leaves the sessions running,
    /// it only stops handles from being delivered.
    pub fn serve(&self, listener: TcpListener) -> mpsc::Receiver<Session> {
        let (sessions, inbound) = mpsc::channel(16);
        let engine = self.clone();
        tokio::spawn(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        break;
                    }
                };
                debug!(peer = %peer, "inbound connection");
                let engine = engine.clone();
                let sessions = sessions.clone();
                tokio::spawn(async move {
                    match engine.accept(stream).await {
                        Ok(session) => {
                            let _ = sessions.send(session).await;
                        }
                        Err(e) => debug!(peer = %peer, error = %e, "bind failed"),
                    }
                });
            }
        });
        inbound
    }
}

/// First frame of a handshake, or why there was none.
async fn handshake_frame<S>(reader: &mut S, wait: Duration) -> Result<Frame>
where
    S: Stream<Item = Result<Frame>> + Unpin,
{
    match timeout(wait, reader.next()).await {
        Ok(Some(Ok(frame))) => Ok(frame),
        Ok(Some(Err(e))) => Err(e),
        Ok(None) => Err(Error::ConnectionClosed),
        Err(_) => Err(Error::RequestTimeout),
    }
}

/// Best-effort rejection write during a failed handshake. The connection is
/// being dropped anyway, so a write failure only gets a log line.
async fn reject<W>(
    writer: &mut W,
    handler: &Arc<dyn SessionHandler>,
    command: Command,
    status: Status,
    sequence: u32,
) where
    W: Sink<Frame, Error = Error> + Unpin,
{
    let frame = Frame::response(command, status, sequence, Bytes::new());
    if let Err(e) = session::send_frame(writer, handler, frame).await {
        debug!(error = %e, "reject write failed");
    }
}
