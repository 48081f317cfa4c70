//! SMPP 3.4 session engine.
//!
//! Binary framing, bind handshakes in both directions, request/response
//! correlation over a single connection, keepalive supervision and a shared
//! worker pool for inbound traffic. The crate speaks the wire protocol and
//! runs the sessions; what the messages mean is left to a
//! [`SessionHandler`] supplied by the host.
//!
//! Connecting out is one chain:
//!
//! ```no_run
//! use smpp::Client;
//!
//! # async fn run() -> Result<(), smpp::Error> {
//! let client = Client::new("127.0.0.1:2775")
//!     .auth(("esme01", "secret"))
//!     .connect()
//!     .await?;
//! client.submit(Default::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Accepting binds takes an [`Engine`] and a listener:
//!
//! ```no_run
//! use std::sync::Arc;
//! use smpp::{Config, DefaultHandler, Engine};
//! use tokio::net::TcpListener;
//!
//! # async fn run() -> Result<(), smpp::Error> {
//! let engine = Engine::new(
//!     Config { system_id: "smsc01".into(), ..Config::default() },
//!     Arc::new(DefaultHandler),
//! );
//! let listener = TcpListener::bind("0.0.0.0:2775").await?;
//! let mut sessions = engine.serve(listener);
//! while let Some(session) = sessions.recv().await {
//!     println!("bound: {}", session.info().peer_id);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod codec;
mod config;
mod engine;
mod error;
mod handler;
pub mod pdu;
mod sequence;
mod session;
mod worker;

pub use client::{Client, ClientBuilder};
pub use codec::{Frame, SmppCodec};
pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
pub use handler::{DefaultHandler, Direction, SessionHandler};
pub use pdu::{Command, Pdu, Status, TlvMap, INTERFACE_VERSION};
pub use session::{BindInfo, BindMode, BindRequest, Response, Session, SessionState};
