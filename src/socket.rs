//! A UDP socket with the record pipelines on the send and receive paths.
//!
//! Mirrors the plain `UdpSocket` surface: bind, connect, send, receive.
//! Outbound payloads are wrapped by [`Engine::protect`]; inbound datagrams
//! run through [`Engine::unprotect`], and any alert the engine produces
//! for a hostile datagram is transmitted back to the sender right away.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;

use log::warn;

use crate::engine::Engine;
use crate::error::Error;

pub struct SecureSocket {
    socket: UdpSocket,
    engine: Arc<Engine>,
}

impl SecureSocket {
    /// Bind a secure socket to `addr`.
    pub fn bind<A: ToSocketAddrs>(engine: Arc<Engine>, addr: A) -> Result<Self, Error> {
        let socket = UdpSocket::bind(addr)?;
        Ok(SecureSocket { socket, engine })
    }

    /// Set the default peer for [`send`](Self::send).
    pub fn connect<A: ToSocketAddrs>(&self, addr: A) -> Result<(), Error> {
        self.socket.connect(addr)?;
        Ok(())
    }

    /// Protect and send `payload` to the connected peer. Returns the
    /// payload length; zero-length sends are a no-op.
    pub fn send(&self, payload: &[u8]) -> Result<usize, Error> {
        if payload.is_empty() {
            return Ok(0);
        }
        let peer = self.socket.peer_addr()?;
        let wire = self.engine.protect(payload, peer.ip(), None)?;
        self.socket.send(&wire)?;
        Ok(payload.len())
    }

    /// Protect and send `payload` to `addr`.
    pub fn send_to<A: ToSocketAddrs>(&self, payload: &[u8], addr: A) -> Result<usize, Error> {
        if payload.is_empty() {
            return Ok(0);
        }
        let target = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::AddrNotAvailable))?;
        let wire = self.engine.protect(payload, target.ip(), None)?;
        self.socket.send_to(&wire, target)?;
        Ok(payload.len())
    }

    /// Receive one datagram, unprotect it and return at most `max_len`
    /// payload bytes plus the sender address.
    ///
    /// Corrupt or hostile datagrams yield an empty payload; the engine's
    /// alert, if any, is sent back to the sender before returning.
    pub fn recv_from(&self, max_len: usize) -> Result<(Vec<u8>, SocketAddr), Error> {
        let mut buf = vec![0u8; max_len + self.engine.config().record_margin()];
        let (n, from) = self.socket.recv_from(&mut buf)?;

        let received = self.engine.unprotect(&buf[..n], from.ip(), max_len);
        if let Some(alert) = received.alert {
            if let Err(e) = self.socket.send_to(&alert, from) {
                warn!("failed to send alert to {}: {}", from, e);
            }
        }
        Ok((received.payload, from))
    }

    /// Local address of the underlying socket.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }
}
