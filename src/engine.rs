//! The record protection pipelines.
//!
//! `protect` wraps an outgoing payload in a record at the peer's current
//! epoch; `unprotect` validates, decrypts and strips an incoming datagram.
//! Hostile or corrupt input never raises: protocol violations come back as
//! an empty payload plus a fatal alert for the caller to transmit.

use std::net::IpAddr;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::config::Config;
use crate::crypto::aead;
use crate::error::{Error, RecordError, SessionError};
use crate::message::{Alert, AlertDescription};
use crate::psk::{PskEntry, PskStore, UUID_LEN};
use crate::record::{ContentType, Epoch, Record, SequenceNumber};
use crate::session::{SessionStore, SessionStoreExt};

/// Outcome of [`Engine::unprotect`]. An empty payload with an alert means
/// the datagram was rejected; the alert is ready-made wire bytes the
/// caller should send back to the offending peer.
#[derive(Debug, Default)]
pub struct Received {
    pub payload: Vec<u8>,
    pub alert: Option<Vec<u8>>,
}

impl Received {
    fn empty() -> Self {
        Received::default()
    }

    fn rejected(alert: Option<Vec<u8>>) -> Self {
        Received {
            payload: Vec::new(),
            alert,
        }
    }
}

enum Reject {
    /// Answer with a fatal alert of this description.
    Alert(AlertDescription),
    /// A peer alert arrived; the session is gone, nothing is sent back.
    SessionClosed,
}

/// The protocol engine: session and PSK stores plus the two record
/// pipelines. Cheap to share behind an [`Arc`].
pub struct Engine {
    config: Arc<Config>,
    sessions: Arc<dyn SessionStore>,
    psks: Arc<dyn PskStore>,
}

impl Engine {
    pub fn new(
        config: Arc<Config>,
        sessions: Arc<dyn SessionStore>,
        psks: Arc<dyn PskStore>,
    ) -> Self {
        Engine {
            config,
            sessions,
            psks,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    pub fn psks(&self) -> &dyn PskStore {
        self.psks.as_ref()
    }

    /// Register a pre-shared key for a device UUID.
    pub fn add_psk(&self, uuid: [u8; UUID_LEN], psk: &[u8], description: &str) {
        self.psks.set(uuid, psk, description);
    }

    /// All registered devices.
    pub fn psk_entries(&self) -> Vec<PskEntry> {
        self.psks.list()
    }

    /// Remove a device by store handle.
    pub fn del_psk(&self, handle: u64) -> bool {
        self.psks.delete(handle)
    }

    /// Drop all session state for a peer.
    pub fn clear_session(&self, peer: IpAddr) {
        self.sessions.remove(peer.to_canonical());
    }

    /// Wrap `payload` for `peer`.
    ///
    /// With `content_type` unset, the record is tagged handshake or
    /// application data depending on the session's handshake-mode flag. At
    /// epoch 0 the payload travels in the clear; from epoch 1 on it is
    /// AEAD-protected under the active key block.
    pub fn protect(
        &self,
        payload: &[u8],
        peer: IpAddr,
        content_type: Option<ContentType>,
    ) -> Result<Vec<u8>, Error> {
        if payload.len() > u16::MAX as usize {
            return Err(RecordError::PayloadTooBig(payload.len()).into());
        }

        let peer = peer.to_canonical();
        self.sessions.with(peer, |session| {
            let content_type = content_type.unwrap_or(if session.is_handshake() {
                ContentType::Handshake
            } else {
                ContentType::ApplicationData
            });

            let epoch = session.epoch();
            let sequence = session.next_write_seq();
            let record = Record::new(
                content_type,
                Epoch::Value(epoch),
                SequenceNumber::Value(sequence),
            );

            let mut wire = Vec::with_capacity(crate::record::MAX_HEADER_LEN + payload.len() + aead::TAG_LEN);
            record.serialize(&mut wire)?;

            if epoch > 0 {
                let key_block = session
                    .key_block()
                    .ok_or(SessionError::NoActiveKeyBlock)?;
                let sealed = aead::seal(
                    key_block.write_key(),
                    &record.nonce(key_block.write_iv()),
                    &record.additional_data(payload.len() as u16),
                    payload,
                )?;
                wire.extend_from_slice(&sealed);
            } else {
                wire.extend_from_slice(payload);
            }

            trace!(
                "protect {:?} epoch {} seq {} ({} bytes) for {}",
                content_type,
                epoch,
                sequence,
                payload.len(),
                peer
            );
            Ok(wire)
        })
    }

    /// Unwrap one datagram from `peer`, truncating the payload to
    /// `max_len`.
    ///
    /// Never fails on remote input: rejected datagrams yield an empty
    /// payload, usually with an alert to send back. A received alert
    /// clears the peer's session and yields an empty payload with nothing
    /// to send.
    pub fn unprotect(&self, datagram: &[u8], peer: IpAddr, max_len: usize) -> Received {
        match self.try_unprotect(datagram, peer, max_len) {
            Ok(payload) => Received {
                payload,
                alert: None,
            },
            Err(Reject::SessionClosed) => {
                debug!("alert from {}, clearing session", peer);
                self.sessions.remove(peer.to_canonical());
                Received::empty()
            }
            Err(Reject::Alert(description)) => {
                warn!("rejecting datagram from {}: {:?}", peer, description);
                let alert = Alert::fatal(description);
                let wire = self
                    .protect(&alert.to_bytes(), peer, Some(ContentType::Alert))
                    .ok();
                Received::rejected(wire)
            }
        }
    }

    fn try_unprotect(
        &self,
        datagram: &[u8],
        peer: IpAddr,
        max_len: usize,
    ) -> Result<Vec<u8>, Reject> {
        let (record, payload, _rest) = Record::parse(datagram)
            .map_err(|_| Reject::Alert(AlertDescription::DecodeError))?;

        let peer = peer.to_canonical();
        self.sessions.with(peer, |session| {
            let sequence = record.sequence_number.canonical();
            if !session.check_seq(sequence) {
                return Err(Reject::Alert(AlertDescription::DecodeError));
            }

            let epoch = match record.epoch {
                Epoch::Value(value) => value,
                Epoch::Implicit => session.epoch(),
            };

            let data = if epoch > 0 {
                let Some(key_block) = session.key_block() else {
                    return Err(Reject::Alert(AlertDescription::DecodeError));
                };
                if payload.len() < aead::TAG_LEN {
                    return Err(Reject::Alert(AlertDescription::DecodeError));
                }
                let aad = record.additional_data((payload.len() - aead::TAG_LEN) as u16);
                match aead::open(
                    key_block.read_key(),
                    &record.nonce(key_block.read_iv()),
                    &aad,
                    payload,
                ) {
                    Ok(plain) => plain,
                    Err(_) => return Err(Reject::Alert(AlertDescription::BadRecordMac)),
                }
            } else {
                if session.epoch() > 0 {
                    // Once a handshake completed, plaintext records are a
                    // downgrade attempt.
                    return Err(Reject::Alert(AlertDescription::UnexpectedMessage));
                }
                payload.to_vec()
            };

            if record.content_type == ContentType::Alert {
                return Err(Reject::SessionClosed);
            }

            if let SequenceNumber::Value(value) = record.sequence_number {
                session.set_read_seq(value);
            }

            let mut data = data;
            data.truncate(max_len);
            Ok(data)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psk::InMemoryPskStore;
    use crate::session::InMemorySessionStore;

    fn engine() -> Engine {
        Engine::new(
            Arc::new(Config::default()),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryPskStore::new()),
        )
    }

    fn peer() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    const KEY_BLOCK: &[u8] = b"ABCDEFGHIJKLMNOPABCDEFGHIJKLMNOPABCDABCD";

    #[test]
    fn epoch0_payload_travels_in_the_clear() {
        let engine = engine();
        let wire = engine.protect(b"Hallo Welt!", peer(), None).unwrap();

        let (record, payload, _) = Record::parse(&wire).unwrap();
        assert_eq!(record.content_type, ContentType::ApplicationData);
        assert_eq!(record.epoch, Epoch::Value(0));
        assert_eq!(record.sequence_number, SequenceNumber::Value(1));
        assert_eq!(payload, b"Hallo Welt!");
    }

    #[test]
    fn handshake_mode_tags_records() {
        let engine = engine();
        engine.sessions().with(peer(), |s| s.enable_handshake());

        let wire = engine.protect(b"Hallo Welt!", peer(), None).unwrap();
        let (record, _, _) = Record::parse(&wire).unwrap();
        assert_eq!(record.content_type, ContentType::Handshake);

        // An explicit type wins over the flag.
        let wire = engine
            .protect(b"\x02\x32", peer(), Some(ContentType::Alert))
            .unwrap();
        let (record, _, _) = Record::parse(&wire).unwrap();
        assert_eq!(record.content_type, ContentType::Alert);
    }

    #[test]
    fn protected_roundtrip_after_epoch_bump() {
        let engine = engine();
        engine.sessions().with(peer(), |s| {
            s.set_key_block(KEY_BLOCK).unwrap();
            s.increase_epoch().unwrap();
        });

        let wire = engine.protect(b"Hello World!", peer(), None).unwrap();
        let (record, payload, _) = Record::parse(&wire).unwrap();
        assert_eq!(record.epoch, Epoch::Value(1));
        assert_ne!(payload, b"Hello World!");

        let received = engine.unprotect(&wire, peer(), 64);
        assert_eq!(received.payload, b"Hello World!");
        assert!(received.alert.is_none());
    }

    #[test]
    fn unprotect_truncates_to_max_len() {
        let engine = engine();
        let wire = engine.protect(b"Hallo Welt!", peer(), None).unwrap();
        let received = engine.unprotect(&wire, peer(), 5);
        assert_eq!(received.payload, b"Hallo");
    }

    #[test]
    fn garbage_yields_empty_and_a_decode_alert() {
        let engine = engine();
        let received = engine.unprotect(&[], peer(), 64);
        assert!(received.payload.is_empty());

        let alert_wire = received.alert.expect("decode alert");
        let (record, payload, _) = Record::parse(&alert_wire).unwrap();
        assert_eq!(record.content_type, ContentType::Alert);
        assert_eq!(payload, &[0x02, 0x32]); // fatal, decode_error
    }

    #[test]
    fn out_of_window_sequence_is_rejected() {
        let engine = engine();
        let mut wire = Vec::new();
        Record::new(
            ContentType::Handshake,
            Epoch::Value(0),
            SequenceNumber::Value(102),
        )
        .serialize(&mut wire)
        .unwrap();
        wire.extend_from_slice(b"Hallo Welt!");

        let received = engine.unprotect(&wire, peer(), 64);
        assert!(received.payload.is_empty());
        assert!(received.alert.is_some());

        // 101 is still inside the window.
        let mut wire = Vec::new();
        Record::new(
            ContentType::Handshake,
            Epoch::Value(0),
            SequenceNumber::Value(101),
        )
        .serialize(&mut wire)
        .unwrap();
        wire.extend_from_slice(b"Hallo Welt!");
        let received = engine.unprotect(&wire, peer(), 64);
        assert_eq!(received.payload, b"Hallo Welt!");
        // The read sequence advanced to the accepted record.
        assert!(engine.sessions().with(peer(), |s| s.check_seq(202)));
    }

    #[test]
    fn bad_tag_yields_bad_record_mac_and_keeps_counters() {
        let engine = engine();
        engine.sessions().with(peer(), |s| {
            s.set_key_block(KEY_BLOCK).unwrap();
            s.increase_epoch().unwrap();
        });

        let mut wire = engine.protect(b"Hello World!", peer(), None).unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 1;

        let received = engine.unprotect(&wire, peer(), 64);
        assert!(received.payload.is_empty());
        let alert_wire = received.alert.expect("bad_record_mac alert");
        let (record, payload, _) = Record::parse(&alert_wire).unwrap();
        assert_eq!(record.content_type, ContentType::Alert);
        // The alert itself is protected at the current epoch.
        let key_block = crate::session::KeyBlock::new(KEY_BLOCK).unwrap();
        let plain = aead::open(
            key_block.read_key(),
            &record.nonce(key_block.read_iv()),
            &record.additional_data(2),
            payload,
        )
        .unwrap();
        assert_eq!(plain, [0x02, 0x14]); // fatal, bad_record_mac

        // The read sequence did not advance past the rejected record:
        // the window still ends at 101, not 102.
        assert!(engine.sessions().with(peer(), |s| s.check_seq(101)));
        assert!(!engine.sessions().with(peer(), |s| s.check_seq(102)));
    }

    #[test]
    fn epoch0_after_handshake_is_a_downgrade() {
        let engine = engine();
        engine.sessions().with(peer(), |s| {
            s.set_key_block(KEY_BLOCK).unwrap();
            s.increase_epoch().unwrap();
        });

        let mut wire = Vec::new();
        Record::new(
            ContentType::ApplicationData,
            Epoch::Value(0),
            SequenceNumber::Value(1),
        )
        .serialize(&mut wire)
        .unwrap();
        wire.extend_from_slice(b"Hallo Welt!");

        let received = engine.unprotect(&wire, peer(), 64);
        assert!(received.payload.is_empty());
        let alert_wire = received.alert.expect("unexpected_message alert");
        let (record, _, _) = Record::parse(&alert_wire).unwrap();
        assert_eq!(record.content_type, ContentType::Alert);
    }

    #[test]
    fn received_alert_clears_the_session() {
        let engine = engine();
        engine.sessions().with(peer(), |s| s.enable_handshake());

        let mut wire = Vec::new();
        Record::new(
            ContentType::Alert,
            Epoch::Value(0),
            SequenceNumber::Value(1),
        )
        .serialize(&mut wire)
        .unwrap();
        wire.extend_from_slice(&[0x02, 0x32]);

        let received = engine.unprotect(&wire, peer(), 64);
        assert!(received.payload.is_empty());
        assert!(received.alert.is_none());
        // Session is back to defaults.
        assert!(!engine.sessions().with(peer(), |s| s.is_handshake()));
    }

    #[test]
    fn oversized_payload_is_a_caller_error() {
        let engine = engine();
        let payload = vec![0u8; u16::MAX as usize + 1];
        assert!(engine.protect(&payload, peer(), None).is_err());
    }
}
