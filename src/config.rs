//! Engine configuration.

use std::time::Duration;

/// Tunables shared by every session an [`Engine`](crate::Engine) creates.
///
/// The defaults match common operator practice: a 30 second keepalive
/// interval with a 10 second answer window, and a worker pool that idles at
/// 32 tasks but may grow under burst load.
#[derive(Debug, Clone)]
pub struct Config {
    /// Local system id, sent in bind requests and bind responses.
    pub system_id: String,
    /// Idle time on a session before the watchdog probes the peer with an
    /// enquire_link. Also bounds how long an inbound connection may sit
    /// silent before its bind request must arrive.
    pub keep_alive: Duration,
    /// How long a correlated request may wait for its response before it is
    /// abandoned.
    pub expire: Duration,
    /// Worker tasks started with the engine and kept for its lifetime.
    pub min_workers: usize,
    /// Ceiling on worker pool growth under load.
    pub max_workers: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            system_id: String::new(),
            keep_alive: Duration::from_secs(30),
            expire: Duration::from_secs(10),
            min_workers: 32,
            max_workers: 4096,
        }
    }
}
