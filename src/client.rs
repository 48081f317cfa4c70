//! Builder-style outbound client.
//!
//! ```no_run
//! use smpp::Client;
//!
//! # async fn run() -> Result<(), smpp::Error> {
//! let client = Client::new("smsc.example.net:2775")
//!     .auth(("esme01", "secret"))
//!     .connect()
//!     .await?;
//!
//! let resp = client.submit(Default::default()).await?;
//! println!("accepted: {}", resp.status);
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::net::TcpStream;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::handler::DefaultHandler;
use crate::pdu::{DataSm, Pdu, SubmitSm};
use crate::session::{BindMode, BindRequest, Response, Session};

/// A bound outbound connection. Wraps a [`Session`] together with the
/// [`Engine`] that runs it.
#[derive(Clone)]
pub struct Client {
    session: Session,
    engine: Engine,
}

/// Collects bind parameters for [`Client::new`]. Nothing touches the
/// network until [`connect`](ClientBuilder::connect).
pub struct ClientBuilder {
    address: String,
    system_id: String,
    password: String,
    system_type: String,
    mode: BindMode,
    addr_ton: u8,
    addr_npi: u8,
    address_range: String,
    engine: Option<Engine>,
}

impl Client {
    /// Starts a builder for a transceiver bind to `address`.
    pub fn new(address: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            address: address.into(),
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            mode: BindMode::Transceiver,
            addr_ton: 0,
            addr_npi: 0,
            address_range: String::new(),
            engine: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_active()
    }

    /// Submits a short message and waits for its submit_sm_resp.
    pub async fn submit(&self, sm: SubmitSm) -> Result<Response> {
        self.session.send(Pdu::SubmitSm(sm)).await
    }

    /// Sends a data_sm and waits for its data_sm_resp.
    pub async fn data(&self, sm: DataSm) -> Result<Response> {
        self.session.send(Pdu::DataSm(sm)).await
    }

    /// Any correlated request; see [`Session::send`].
    pub async fn send(&self, pdu: Pdu) -> Result<Response> {
        self.session.send(pdu).await
    }

    /// One enquire_link round trip.
    pub async fn enquire(&self) -> Result<Response> {
        self.session.enquire().await
    }

    /// Unbinds and closes; see [`Session::close`].
    pub async fn close(&self) -> Result<()> {
        self.session.close().await
    }
}

impl ClientBuilder {
    /// Credentials as a `(system_id, password)` pair.
    pub fn auth<S, P>(mut self, credentials: (S, P)) -> ClientBuilder
    where
        S: Into<String>,
        P: Into<String>,
    {
        self.system_id = credentials.0.into();
        self.password = credentials.1.into();
        self
    }

    pub fn system_type(mut self, system_type: impl Into<String>) -> ClientBuilder {
        self.system_type = system_type.into();
        self
    }

    /// Bind as something other than a transceiver.
    pub fn bind_mode(mut self, mode: BindMode) -> ClientBuilder {
        self.mode = mode;
        self
    }

    pub fn address_range(mut self, ton: u8, npi: u8, range: impl Into<String>) -> ClientBuilder {
        self.addr_ton = ton;
        self.addr_npi = npi;
        self.address_range = range.into();
        self
    }

    /// Runs the session on an existing engine instead of a private one.
    /// Connections sharing an engine share its worker pool and sequence
    /// space.
    pub fn engine(mut self, engine: Engine) -> ClientBuilder {
        self.engine = Some(engine);
        self
    }

    /// Dials, binds and returns the connected client.
    pub async fn connect(self) -> Result<Client> {
        let engine = match self.engine {
            Some(engine) => engine,
            None => Engine::new(
                Config { system_id: self.system_id.clone(), ..Config::default() },
                Arc::new(DefaultHandler),
            ),
        };

        let stream = TcpStream::connect(&self.address).await?;
        let session = engine
            .connect(
                stream,
                BindRequest {
                    mode: self.mode,
                    system_id: self.system_id,
                    password: self.password,
                    system_type: self.system_type,
                    addr_ton: self.addr_ton,
                    addr_npi: self.addr_npi,
                    address_range: self.address_range,
                },
            )
            .await?;

        Ok(Client { session, engine })
    }
}
