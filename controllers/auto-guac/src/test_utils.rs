//! Test utilities for unit testing the provisioning loop
//!
//! Builds identities and mock-backed provisioners, and captures log output so
//! tests can assert on skip and error messages.

use crate::identity::{MacAddress, NetworkIdentity};
use crate::provision::{Gateway, Provisioner};
use guacamole_client::{MockGuacamoleClient, MockWolStore};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use ubiquiti_client::MockEdgeRouter;

pub const TEST_MAC: &str = "AA:00:00:01:01:00";
pub const TEST_IP: &str = "172.16.1.100";

pub fn test_identity() -> NetworkIdentity {
    NetworkIdentity {
        mac: TEST_MAC.parse::<MacAddress>().unwrap(),
        ip: TEST_IP.parse().unwrap(),
    }
}

/// Handles on the mocks behind a [`Provisioner`] built by [`mock_provisioner`]
pub struct Mocks {
    pub router: MockEdgeRouter,
    pub guacamole: MockGuacamoleClient,
    pub wol: MockWolStore,
}

impl Mocks {
    pub fn new() -> Self {
        Self {
            router: MockEdgeRouter::new("172.16.1.1"),
            guacamole: MockGuacamoleClient::new("http://guacamole.test"),
            wol: MockWolStore::new(),
        }
    }
}

/// A provisioner backed by clones of `mocks`; disabled sections get `None`
pub fn mock_provisioner(mocks: &Mocks, router_enabled: bool, gateway_enabled: bool) -> Provisioner {
    let router = router_enabled
        .then(|| Box::new(mocks.router.clone()) as Box<dyn ubiquiti_client::EdgeRouter>);
    let gateway = gateway_enabled.then(|| Gateway {
        client: Box::new(mocks.guacamole.clone()),
        wol: Box::new(mocks.wol.clone()),
    });
    Provisioner::new(router, gateway)
}

/// In-memory log sink
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Capture everything logged on this thread until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
