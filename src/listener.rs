//! Always-on discovery listener.
//!
//! New nodes announce themselves with a 3-byte hello probe on the
//! well-known port. The listener answers each probe with a full handshake
//! attempt against the sender and reports the outcome through a
//! caller-supplied callback. It runs until explicitly shut down.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::engine::Engine;
use crate::error::Error;
use crate::handshake::{run_client_handshake, HandshakeTransport};
use crate::util::lock;

/// Handle of a running discovery listener.
pub struct NodeListener {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl NodeListener {
    /// Bind the discovery port and start listening for hello probes.
    ///
    /// For every probe, a handshake with the sender runs on the listener
    /// thread and `callback(peer, outcome)` is invoked with the result.
    pub fn spawn<F>(
        engine: Arc<Engine>,
        transport: Arc<Mutex<dyn HandshakeTransport + Send>>,
        callback: F,
    ) -> io::Result<NodeListener>
    where
        F: Fn(std::net::IpAddr, Result<(), Error>) + Send + 'static,
    {
        let port = engine.config().discovery_port();
        let socket = UdpSocket::bind(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)))
            .or_else(|_| UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))))?;
        socket.set_read_timeout(Some(engine.config().probe_poll()))?;
        let local_addr = socket.local_addr()?;
        let probe = engine.config().probe();

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = std::thread::Builder::new()
            .name("codtls-discovery".into())
            .spawn(move || {
                let mut buf = [0u8; 16];
                while !flag.load(Ordering::Relaxed) {
                    match socket.recv_from(&mut buf) {
                        Ok((n, from)) if buf[..n] == probe => {
                            // Dual-stack sockets report v4 peers as
                            // v4-mapped v6 addresses.
                            let peer = from.ip().to_canonical();
                            debug!("hello probe from {}", peer);
                            let outcome = {
                                let mut transport = lock(&transport);
                                run_client_handshake(&engine, &mut *transport, peer)
                            };
                            callback(peer, outcome);
                        }
                        Ok((n, from)) => {
                            debug!("ignoring {} stray bytes from {}", n, from);
                        }
                        Err(e)
                            if e.kind() == io::ErrorKind::WouldBlock
                                || e.kind() == io::ErrorKind::TimedOut => {}
                        Err(e) => warn!("discovery listener: {}", e),
                    }
                }
            })?;

        Ok(NodeListener {
            shutdown,
            handle: Some(handle),
            local_addr,
        })
    }

    /// The address the listener is bound to; useful with an ephemeral
    /// port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the listener and wait for its thread to exit.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for NodeListener {
    fn drop(&mut self) {
        // The thread notices the flag on its next poll; no join here, a
        // dropped handle must not block.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
