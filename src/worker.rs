//! Shared worker pool for inbound business requests.
//!
//! Sessions never run host logic on their own tasks: the event loop hands
//! submit_sm/deliver_sm/data_sm frames to this pool and goes back to the
//! wire. The pool keeps a floor of permanent workers and grows toward a
//! ceiling while the queue runs deeper than the floor; growth workers retire
//! after sitting idle long enough.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, warn};

use crate::handler::SessionHandler;
use crate::pdu::{Command, Pdu, Status};
use crate::session::Session;

/// How long an idle growth worker waits on the queue per poll.
const IDLE_POLL: Duration = Duration::from_millis(10);
/// Consecutive empty polls before a growth worker retires.
const IDLE_BUDGET: u32 = 500;

/// One inbound request, undecoded. Decoding happens on the worker so a
/// malformed body burns pool time, not session time.
#[derive(Debug)]
pub(crate) struct WorkItem {
    pub(crate) session: Session,
    pub(crate) command: Command,
    pub(crate) sequence: u32,
    pub(crate) body: Bytes,
}

/// Cloneable handle to the pool. Workers themselves only hold
/// [`PoolInner`], so dropping every handle (the engine and its sessions)
/// drains the queue and lets the floor workers exit.
#[derive(Clone)]
pub(crate) struct WorkerPool {
    queue: mpsc::Sender<WorkItem>,
    inner: Arc<PoolInner>,
}

struct PoolInner {
    /// Weak side of `queue`, for depth arithmetic without keeping the
    /// channel alive from inside the workers.
    queue: mpsc::WeakSender<WorkItem>,
    receiver: Mutex<mpsc::Receiver<WorkItem>>,
    active: AtomicUsize,
    handler: Arc<dyn SessionHandler>,
    floor: usize,
    ceiling: usize,
}

impl WorkerPool {
    /// Starts the floor workers immediately; must run inside a runtime.
    pub(crate) fn new(
        handler: Arc<dyn SessionHandler>,
        floor: usize,
        ceiling: usize,
        queue_depth: usize,
    ) -> WorkerPool {
        let floor = floor.max(1);
        let ceiling = ceiling.max(floor);
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let inner = Arc::new(PoolInner {
            queue: tx.downgrade(),
            receiver: Mutex::new(rx),
            active: AtomicUsize::new(floor),
            handler,
            floor,
            ceiling,
        });
        for _ in 0..floor {
            tokio::spawn(floor_worker(inner.clone()));
        }
        WorkerPool { queue: tx, inner }
    }

    /// Non-blocking enqueue. On a full queue the item comes back so the
    /// session can answer queue-full in-band instead of stalling the wire.
    pub(crate) fn try_submit(&self, item: WorkItem) -> Result<(), WorkItem> {
        self.queue.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(item) => item,
            mpsc::error::TrySendError::Closed(item) => item,
        })
    }

    /// Workers currently alive, floor included.
    pub(crate) fn active(&self) -> usize {
        self.inner.active.load(Ordering::Relaxed)
    }
}

fn depth(inner: &PoolInner) -> usize {
    match inner.queue.upgrade() {
        Some(tx) => tx.max_capacity() - tx.capacity(),
        None => 0,
    }
}

/// Spawns one growth worker when the backlog is deeper than the floor and
/// the ceiling leaves room. Racing callers may both fail the exchange; the
/// next pop tries again.
fn maybe_grow(inner: &Arc<PoolInner>) {
    if depth(inner) <= inner.floor {
        return;
    }
    let active = inner.active.load(Ordering::Relaxed);
    if active < inner.ceiling
        && inner
            .active
            .compare_exchange(active, active + 1, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    {
        debug!(active = active + 1, "worker pool grows");
        tokio::spawn(growth_worker(inner.clone()));
    }
}

async fn pop(inner: &PoolInner) -> Option<WorkItem> {
    inner.receiver.lock().await.recv().await
}

async fn floor_worker(inner: Arc<PoolInner>) {
    while let Some(item) = pop(&inner).await {
        maybe_grow(&inner);
        process(&inner, item).await;
    }
}

async fn growth_worker(inner: Arc<PoolInner>) {
    let mut idle = 0u32;
    while idle < IDLE_BUDGET {
        match timeout(IDLE_POLL, pop(&inner)).await {
            Ok(Some(item)) => {
                idle = 0;
                maybe_grow(&inner);
                process(&inner, item).await;
            }
            Ok(None) => break,
            Err(_) => idle += 1,
        }
    }
    let active = inner.active.fetch_sub(1, Ordering::Relaxed) - 1;
    debug!(active, "worker pool shrinks");
}

/// Decode, run the handler, queue the response. A panic or a body that will
/// not decode becomes a [`Status::SystemError`] response with the request's
/// default response PDU; the session never notices.
async fn process(inner: &PoolInner, item: WorkItem) {
    let WorkItem { session, command, sequence, body } = item;

    let (status, pdu) = match Pdu::from_body(command, body) {
        Err(e) => {
            warn!(command = %command, sequence, error = %e, "undecodable request");
            (Status::SystemError, None)
        }
        Ok(request) => {
            let handled = AssertUnwindSafe(inner.handler.handle(session.info(), request))
                .catch_unwind()
                .await;
            match handled {
                Ok(answer) => answer,
                Err(_) => {
                    error!(command = %command, sequence, "handler panicked");
                    (Status::SystemError, None)
                }
            }
        }
    };

    let Some(response) = pdu.or_else(|| Pdu::default_response(command)) else {
        return;
    };
    session.respond(response, status, sequence).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::DefaultHandler;
    use crate::pdu::SubmitSm;
    use crate::session::{BindInfo, Event, SessionState};
    use async_trait::async_trait;
    use bytes::BytesMut;
    use tokio::sync::watch;
    use tokio::time::sleep;

    fn test_session() -> (
        Session,
        mpsc::Receiver<Event>,
        watch::Sender<SessionState>,
    ) {
        let (tx, rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(SessionState::Active);
        let session = Session::new(Arc::new(BindInfo::default()), tx, state_rx);
        (session, rx, state_tx)
    }

    fn submit_item(session: &Session, sequence: u32) -> WorkItem {
        let sm = SubmitSm {
            dest_addr: "258840000001".into(),
            short_message: b"hello".to_vec(),
            ..Default::default()
        };
        let mut body = BytesMut::new();
        sm.write(&mut body, 0x34);
        WorkItem {
            session: session.clone(),
            command: Command::SubmitSm,
            sequence,
            body: body.freeze(),
        }
    }

    async fn next_respond(rx: &mut mpsc::Receiver<Event>) -> (Command, Status, u32, Bytes) {
        match rx.recv().await {
            Some(Event::Respond { command, status, sequence, body }) => {
                (command, status, sequence, body)
            }
            other => panic!("expected respond event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn default_handler_answers_with_default_response() {
        let pool = WorkerPool::new(Arc::new(DefaultHandler), 1, 1, 8);
        let (session, mut rx, _state) = test_session();

        pool.try_submit(submit_item(&session, 42)).unwrap();

        let (command, status, sequence, body) = next_respond(&mut rx).await;
        assert_eq!(command, Command::SubmitSmResp);
        assert_eq!(status, Status::Ok);
        assert_eq!(sequence, 42);
        match Pdu::from_body(command, body).unwrap() {
            Pdu::SubmitSmResp(resp) => assert_eq!(resp.message_id, ""),
            other => panic!("unexpected pdu {other:?}"),
        }
    }

    #[tokio::test]
    async fn handler_answer_overrides_default_body() {
        struct Assigning;

        #[async_trait]
        impl SessionHandler for Assigning {
            async fn handle(&self, _: &BindInfo, request: Pdu) -> (Status, Option<Pdu>) {
                match request {
                    Pdu::SubmitSm(_) => (
                        Status::Ok,
                        Some(Pdu::SubmitSmResp(crate::pdu::SubmitSmResp {
                            message_id: "mt-0001".into(),
                            ..Default::default()
                        })),
                    ),
                    _ => (Status::InvalidCommandId, None),
                }
            }
        }

        let pool = WorkerPool::new(Arc::new(Assigning), 1, 1, 8);
        let (session, mut rx, _state) = test_session();

        pool.try_submit(submit_item(&session, 7)).unwrap();

        let (command, status, _, body) = next_respond(&mut rx).await;
        assert_eq!(status, Status::Ok);
        match Pdu::from_body(command, body).unwrap() {
            Pdu::SubmitSmResp(resp) => assert_eq!(resp.message_id, "mt-0001"),
            other => panic!("unexpected pdu {other:?}"),
        }
    }

    #[tokio::test]
    async fn panicking_handler_becomes_system_error() {
        struct Bomb;

        #[async_trait]
        impl SessionHandler for Bomb {
            async fn handle(&self, _: &BindInfo, _: Pdu) -> (Status, Option<Pdu>) {
                panic!("boom");
            }
        }

        let pool = WorkerPool::new(Arc::new(Bomb), 1, 1, 8);
        let (session, mut rx, _state) = test_session();

        pool.try_submit(submit_item(&session, 9)).unwrap();

        let (command, status, sequence, _) = next_respond(&mut rx).await;
        assert_eq!(command, Command::SubmitSmResp);
        assert_eq!(status, Status::SystemError);
        assert_eq!(sequence, 9);

        // The pool survives the panic.
        pool.try_submit(submit_item(&session, 10)).unwrap();
        let (_, status, sequence, _) = next_respond(&mut rx).await;
        assert_eq!(status, Status::SystemError);
        assert_eq!(sequence, 10);
    }

    #[tokio::test]
    async fn undecodable_body_becomes_system_error() {
        let pool = WorkerPool::new(Arc::new(DefaultHandler), 1, 1, 8);
        let (session, mut rx, _state) = test_session();

        // deliver_sm body with no terminators at all
        pool.try_submit(WorkItem {
            session: session.clone(),
            command: Command::DeliverSm,
            sequence: 3,
            body: Bytes::from_static(&[0x41, 0x42, 0x43]),
        })
        .unwrap();

        let (command, status, _, body) = next_respond(&mut rx).await;
        assert_eq!(command, Command::DeliverSmResp);
        assert_eq!(status, Status::SystemError);
        match Pdu::from_body(command, body).unwrap() {
            Pdu::DeliverSmResp(resp) => assert_eq!(resp.message_id, ""),
            other => panic!("unexpected pdu {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_queue_hands_the_item_back() {
        struct Stuck;

        #[async_trait]
        impl SessionHandler for Stuck {
            async fn handle(&self, _: &BindInfo, _: Pdu) -> (Status, Option<Pdu>) {
                sleep(Duration::from_secs(3600)).await;
                (Status::Ok, None)
            }
        }

        let pool = WorkerPool::new(Arc::new(Stuck), 1, 1, 1);
        let (session, _rx, _state) = test_session();

        // First item occupies the worker, second fills the queue slot.
        pool.try_submit(submit_item(&session, 1)).unwrap();
        sleep(Duration::from_millis(50)).await;
        pool.try_submit(submit_item(&session, 2)).unwrap();

        let rejected = pool.try_submit(submit_item(&session, 3));
        let item = rejected.err().unwrap();
        assert_eq!(item.sequence, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pool_grows_under_backlog_and_shrinks_when_idle() {
        struct Slow;

        #[async_trait]
        impl SessionHandler for Slow {
            async fn handle(&self, _: &BindInfo, _: Pdu) -> (Status, Option<Pdu>) {
                sleep(Duration::from_secs(1)).await;
                (Status::Ok, None)
            }
        }

        let pool = WorkerPool::new(Arc::new(Slow), 1, 4, 64);
        let (session, mut rx, _state) = test_session();

        for n in 0..12 {
            pool.try_submit(submit_item(&session, n)).unwrap();
        }

        let mut grew = pool.active();
        for _ in 0..12 {
            let _ = next_respond(&mut rx).await;
            grew = grew.max(pool.active());
        }
        assert!(grew > 1, "pool never grew past the floor (saw {grew})");
        assert!(grew <= 4, "pool exceeded its ceiling (saw {grew})");

        // Sit idle through every poll of the retire budget, plus slack. A
        // single clock jump fires each pending poll timer only once; the
        // spanning sleep lets the paused clock walk all of them.
        sleep(IDLE_POLL * (IDLE_BUDGET + 50)).await;
        assert_eq!(pool.active(), 1);
    }
}
