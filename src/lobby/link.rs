//! Replication channel: how requests reach the owner
//!
//! The state machine is written once against `LobbyRole`; the two
//! concrete roles differ only in where a request goes. The owner feeds
//! its own requests through the same serialized inbound queue the
//! transport uses for remote peers, which is what keeps team balancing
//! and all-locked detection race-free.

use crate::lobby::roster::Outbound;
use crate::network::protocol::{LobbyRequest, PeerId};
use std::sync::mpsc;

/// One identity-tagged message on the owner's inbound queue. The reply
/// channel rides along with the first request after a peer's stream
/// opens; it is `None` for every later request and for the owner's own.
#[derive(Debug)]
pub struct Inbound {
    pub from: PeerId,
    pub request: LobbyRequest,
    pub outbound: Option<Outbound>,
}

/// Capability surface a concrete lobby role provides to the state
/// machine.
pub trait LobbyRole {
    /// Deliver a request to the owner. Returns false on transport
    /// failure; the caller surfaces that as the operation's result.
    fn write_request(&mut self, from: &PeerId, request: &LobbyRequest) -> bool;

    /// Only the owner may drive `start`/`launch`/`stop`.
    fn can_start(&self) -> bool;
}

/// The hosting peer's role: requests loop back into the owner's own
/// inbound queue and take effect on the next `poll`.
#[derive(Debug)]
pub struct HostRole {
    inbound_tx: mpsc::Sender<Inbound>,
}

impl HostRole {
    pub fn new(inbound_tx: mpsc::Sender<Inbound>) -> Self {
        HostRole { inbound_tx }
    }

    /// Clone of the queue the transport pushes remote requests into.
    pub fn request_sender(&self) -> mpsc::Sender<Inbound> {
        self.inbound_tx.clone()
    }
}

impl LobbyRole for HostRole {
    fn write_request(&mut self, from: &PeerId, request: &LobbyRequest) -> bool {
        self.inbound_tx
            .send(Inbound {
                from: from.clone(),
                request: request.clone(),
                outbound: None,
            })
            .is_ok()
    }

    fn can_start(&self) -> bool {
        true
    }
}

/// A joined peer's role: one upstream channel to the owner. The reply
/// channel for owner notifications is handed over with the first write.
#[derive(Debug)]
pub struct PeerRole {
    owner: mpsc::Sender<Inbound>,
    reply: Option<Outbound>,
}

impl PeerRole {
    pub fn new(owner: mpsc::Sender<Inbound>, reply: Outbound) -> Self {
        PeerRole {
            owner,
            reply: Some(reply),
        }
    }
}

impl LobbyRole for PeerRole {
    fn write_request(&mut self, from: &PeerId, request: &LobbyRequest) -> bool {
        self.owner
            .send(Inbound {
                from: from.clone(),
                request: request.clone(),
                outbound: self.reply.take(),
            })
            .is_ok()
    }

    fn can_start(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::protocol::JoinRequest;

    #[test]
    fn host_role_loops_back_into_own_queue() {
        let (tx, rx) = mpsc::channel();
        let mut role = HostRole::new(tx);
        let id = PeerId::new("owner");
        let req = LobbyRequest::Join(JoinRequest::new("Host"));
        assert!(role.write_request(&id, &req));

        let inbound = rx.try_recv().unwrap();
        assert_eq!(inbound.from, id);
        assert_eq!(inbound.request, req);
        assert!(inbound.outbound.is_none());
    }

    #[test]
    fn peer_role_attaches_reply_channel_once() {
        let (owner_tx, owner_rx) = mpsc::channel();
        let (reply_tx, _reply_rx) = mpsc::channel();
        let mut role = PeerRole::new(owner_tx, reply_tx);
        let id = PeerId::new("p1");

        assert!(role.write_request(&id, &LobbyRequest::Join(JoinRequest::new("A"))));
        assert!(role.write_request(&id, &LobbyRequest::Leave));

        let first = owner_rx.try_recv().unwrap();
        let second = owner_rx.try_recv().unwrap();
        assert!(first.outbound.is_some());
        assert!(second.outbound.is_none());
    }

    #[test]
    fn write_fails_when_owner_is_gone() {
        let (owner_tx, owner_rx) = mpsc::channel();
        let (reply_tx, _reply_rx) = mpsc::channel();
        let mut role = PeerRole::new(owner_tx, reply_tx);
        drop(owner_rx);
        assert!(!role.write_request(&PeerId::new("p1"), &LobbyRequest::Leave));
    }

    #[test]
    fn only_host_can_start() {
        let (tx, _rx) = mpsc::channel();
        assert!(HostRole::new(tx.clone()).can_start());
        let (reply_tx, _reply_rx) = mpsc::channel();
        assert!(!PeerRole::new(tx, reply_tx).can_start());
    }
}
