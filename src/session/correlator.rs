//! The per-session tasks: a reader that turns wire frames into events and an
//! event loop that owns the write half, the in-flight request table and the
//! idle watchdog clock.
//!
//! Correlation is single-writer by construction. Only the event loop
//! allocates sequence numbers and touches the pending table, so a response
//! either finds its caller there or it finds nothing; there is no state to
//! lock and no window where two writers interleave half a frame.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, span, trace, warn, Instrument, Level};

use super::event::{Event, Outcome};
use super::{BindInfo, Session, SessionState};
use crate::codec::{Frame, SmppCodec};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::handler::{Direction, SessionHandler};
use crate::pdu::{Command, Pdu, Status};
use crate::worker::WorkItem;

/// Depth of the per-session event queue shared by callers, the reader and
/// the worker pool.
const EVENT_QUEUE_DEPTH: usize = 1024;

/// One in-flight correlated request.
struct PendingCall {
    reply: oneshot::Sender<Outcome>,
    /// Timer task that posts [`Event::Expired`]; aborted when the response
    /// wins the race.
    expire: JoinHandle<()>,
}

/// Spawns the session tasks over a framed transport whose handshake already
/// completed. The returned handle observes the session from birth in
/// [`SessionState::Active`].
pub(crate) fn start<T>(
    engine: Engine,
    reader: FramedRead<ReadHalf<T>, SmppCodec>,
    writer: FramedWrite<WriteHalf<T>, SmppCodec>,
    info: BindInfo,
) -> Session
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let info = Arc::new(info);
    let (events, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (state_tx, state_rx) = watch::channel(SessionState::Active);
    let session = Session::new(info.clone(), events.clone(), state_rx.clone());
    let handler = engine.handler();

    let span = span!(
        Level::INFO,
        "session",
        peer = %info.peer_id,
        mode = %info.mode
    );

    handler.on_bound(&info);
    tokio::spawn(read_loop(reader, events, state_rx, handler).instrument(span.clone()));
    tokio::spawn(event_loop(engine, writer, events_rx, state_tx, session.clone()).instrument(span));
    session
}

/// Turns inbound frames into [`Event::Peer`] until the transport or the
/// session ends.
async fn read_loop<T>(
    mut reader: FramedRead<ReadHalf<T>, SmppCodec>,
    events: mpsc::Sender<Event>,
    mut state: watch::Receiver<SessionState>,
    handler: Arc<dyn SessionHandler>,
) where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() || *state.borrow() == SessionState::Closed {
                    break;
                }
            }
            next = reader.next() => match next {
                Some(Ok(frame)) => {
                    trace!(command = %frame.command, sequence = frame.sequence, "recv");
                    handler.on_trace(Direction::Inbound, &frame);
                    if events.send(Event::Peer(frame)).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "read failed");
                    let _ = events.send(Event::Closed).await;
                    break;
                }
                None => {
                    debug!("connection closed by peer");
                    let _ = events.send(Event::Closed).await;
                    break;
                }
            }
        }
    }
}

async fn event_loop<T>(
    engine: Engine,
    mut writer: FramedWrite<WriteHalf<T>, SmppCodec>,
    mut events: mpsc::Receiver<Event>,
    state: watch::Sender<SessionState>,
    session: Session,
) where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let handler = engine.handler();
    let keep_alive = engine.config().keep_alive;
    let expire = engine.config().expire;

    let mut pending: HashMap<u32, PendingCall> = HashMap::new();
    let mut closing = false;
    let mut idle_at = Instant::now() + keep_alive;

    loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                // The loop itself holds a sender through `session`, so the
                // queue cannot close while we run; treat it as shutdown
                // anyway.
                let Some(event) = event else { break };
                match event {
                    Event::Call { command, body, reply } => {
                        if closing {
                            let _ = reply.send(Outcome::Closed);
                            continue;
                        }
                        let sequence = engine.next_sequence();
                        let frame = Frame::request(command, sequence, body);
                        if let Err(e) = send_frame(&mut writer, &handler, frame).await {
                            warn!(error = %e, "write failed");
                            let _ = reply.send(Outcome::Closed);
                            break;
                        }
                        idle_at = Instant::now() + keep_alive;
                        let timer = spawn_expire(session.events().clone(), expire, sequence);
                        pending.insert(sequence, PendingCall { reply, expire: timer });
                        if command == Command::Unbind {
                            debug!("unbind sent");
                            closing = true;
                            let _ = state.send(SessionState::Closing);
                        }
                    }

                    Event::Respond { command, status, sequence, body } => {
                        let frame = Frame::response(command, status, sequence, body);
                        if let Err(e) = send_frame(&mut writer, &handler, frame).await {
                            warn!(error = %e, "write failed");
                            break;
                        }
                        idle_at = Instant::now() + keep_alive;
                    }

                    Event::Peer(frame) => {
                        idle_at = Instant::now() + keep_alive;
                        if frame.is_response() {
                            match pending.remove(&frame.sequence) {
                                Some(call) => {
                                    call.expire.abort();
                                    let _ = call.reply.send(Outcome::Answer(frame));
                                }
                                None => {
                                    // Late or invented; the session carries on.
                                    trace!(
                                        command = %frame.command,
                                        sequence = frame.sequence,
                                        "uncorrelated response discarded"
                                    );
                                }
                            }
                        } else {
                            match handle_request(&engine, &session, &mut writer, &handler, closing, frame).await {
                                Ok(Flow::Continue) => {}
                                Ok(Flow::Teardown) => break,
                                Err(e) => {
                                    warn!(error = %e, "write failed");
                                    break;
                                }
                            }
                        }
                    }

                    Event::Expired { sequence } => {
                        if let Some(call) = pending.remove(&sequence) {
                            debug!(sequence, "request expired without a response");
                            let _ = call.reply.send(Outcome::TimedOut);
                        }
                    }

                    Event::Closed => {
                        debug!("transport closed");
                        break;
                    }

                    Event::Shutdown => {
                        debug!("shutdown requested");
                        break;
                    }
                }
            }

            _ = time::sleep_until(idle_at) => {
                idle_at = Instant::now() + keep_alive;
                if !closing {
                    debug!("session idle, probing peer");
                    tokio::spawn(probe(session.clone()).in_current_span());
                }
            }
        }
    }

    // Teardown. Order matters: flip the state first so the reader and every
    // handle stop producing, then fail whatever was still in flight.
    let _ = state.send(SessionState::Closed);
    for (_, call) in pending.drain() {
        call.expire.abort();
        let _ = call.reply.send(Outcome::Closed);
    }
    let _ = writer.close().await;
    handler.on_unbound(session.info());
    debug!("session closed");
}

/// What the event loop should do after answering an inbound request.
enum Flow {
    Continue,
    Teardown,
}

/// Answers one inbound request frame. Link queries and unbinds are answered
/// right here; business requests go to the worker pool.
async fn handle_request<W>(
    engine: &Engine,
    session: &Session,
    writer: &mut W,
    handler: &Arc<dyn SessionHandler>,
    closing: bool,
    frame: Frame,
) -> Result<Flow>
where
    W: Sink<Frame, Error = Error> + Unpin,
{
    let info = session.info();
    match frame.command {
        Command::EnquireLink => {
            let resp = Frame::response(Command::EnquireLinkResp, Status::Ok, frame.sequence, Bytes::new());
            send_frame(writer, handler, resp).await?;
            Ok(Flow::Continue)
        }

        Command::Unbind => {
            debug!("peer unbinding");
            let resp = Frame::response(Command::UnbindResp, Status::Ok, frame.sequence, Bytes::new());
            // Best effort; the session ends either way.
            if let Err(e) = send_frame(writer, handler, resp).await {
                warn!(error = %e, "unbind_resp write failed");
            }
            Ok(Flow::Teardown)
        }

        Command::SubmitSm | Command::DeliverSm | Command::DataSm => {
            let permitted = match frame.command {
                // data_sm is legal in either direction on any bind.
                Command::DataSm => !closing,
                _ => !closing && info.mode.can_receive(),
            };
            if !permitted {
                warn!(
                    command = %frame.command,
                    mode = %info.mode,
                    "request outside bind role"
                );
                let nack = Frame::response(
                    Command::GenericNack,
                    Status::InvalidBindStatus,
                    frame.sequence,
                    Bytes::new(),
                );
                send_frame(writer, handler, nack).await?;
                return Ok(Flow::Continue);
            }

            let item = WorkItem {
                session: session.clone(),
                command: frame.command,
                sequence: frame.sequence,
                body: frame.body,
            };
            if let Err(item) = engine.pool().try_submit(item) {
                warn!(
                    command = %item.command,
                    sequence = item.sequence,
                    workers = engine.pool().active(),
                    "work queue full"
                );
                if let Some(pdu) = Pdu::default_response(item.command) {
                    let resp = Frame::response(
                        pdu.command(),
                        Status::MessageQueueFull,
                        item.sequence,
                        pdu.to_body(info.version),
                    );
                    send_frame(writer, handler, resp).await?;
                }
            }
            Ok(Flow::Continue)
        }

        other => {
            debug!(command = %other, "unsupported request");
            let nack = Frame::response(
                Command::GenericNack,
                Status::InvalidCommandId,
                frame.sequence,
                Bytes::new(),
            );
            send_frame(writer, handler, nack).await?;
            Ok(Flow::Continue)
        }
    }
}

/// Writes one frame and reports it to the wire tap. The tap only sees
/// frames that actually reached the transport.
pub(crate) async fn send_frame<W>(
    writer: &mut W,
    handler: &Arc<dyn SessionHandler>,
    frame: Frame,
) -> Result<()>
where
    W: Sink<Frame, Error = Error> + Unpin,
{
    trace!(
        command = %frame.command,
        status = %frame.status,
        sequence = frame.sequence,
        "send"
    );
    let traced = frame.clone();
    writer.send(frame).await?;
    handler.on_trace(Direction::Outbound, &traced);
    Ok(())
}

/// One keepalive round trip, run off the loop so the probe's own response
/// can be correlated. Any failure closes the session.
async fn probe(session: Session) {
    match session.enquire().await {
        Ok(resp) if resp.status.is_ok() => {
            trace!("keepalive answered");
        }
        Ok(resp) => {
            warn!(status = %resp.status, "keepalive rejected, closing");
            let _ = session.close().await;
        }
        Err(e) => {
            warn!(error = %e, "keepalive failed, closing");
            let _ = session.close().await;
        }
    }
}

fn spawn_expire(events: mpsc::Sender<Event>, after: Duration, sequence: u32) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep(after).await;
        let _ = events.send(Event::Expired { sequence }).await;
    })
}
