//! Lobby protocol message types
//!
//! Logical shapes exchanged between a lobby owner and its joined peers.
//! Requests flow peer -> owner over the peer's single upstream stream;
//! notifications flow owner -> peer(s). Byte framing is left to the
//! transport collaborator; everything here is plain serde data.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a peer, usable as a roster key.
///
/// The transport collaborator guarantees each connected peer presents the
/// same identity for the lifetime of its connection. The coordination
/// layer treats it as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap an identity handed over by the transport.
    pub fn new(id: impl Into<String>) -> Self {
        PeerId(id.into())
    }

    /// Generate a fresh local identity.
    pub fn random() -> Self {
        PeerId(format!("peer-{:016x}", rand::rng().random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ask the owner to add us to the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Display name the player wants to appear under
    pub name: String,
    /// Credential for password-protected lobbies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl JoinRequest {
    pub fn new(name: impl Into<String>) -> Self {
        JoinRequest {
            name: name.into(),
            password: None,
        }
    }
}

/// Sparse draft-field update: only the fields present in this request
/// change. Absent fields are untouched on every receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell1: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell2: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<bool>,
}

impl PickRequest {
    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.team.is_none()
            && self.champion.is_none()
            && self.spell1.is_none()
            && self.spell2.is_none()
            && self.lock.is_none()
    }
}

/// A request written by a peer to the lobby owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyRequest {
    Join(JoinRequest),
    Pick(PickRequest),
    Leave,
}

/// Lobby-level state switch announced by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    Started,
    Launched,
    Stopped,
}

/// One per-peer delta inside a notification. At most one of `join`,
/// `pick`, `leave` is meaningful per delta in practice, but the shape
/// allows a join and its initial pick to travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDelta {
    /// Which roster entry this delta describes
    pub peer: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick: Option<PickRequest>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub leave: bool,
}

impl PeerDelta {
    pub fn new(peer: PeerId) -> Self {
        PeerDelta {
            peer,
            join: None,
            pick: None,
            leave: false,
        }
    }

    pub fn join(peer: PeerId, join: JoinRequest) -> Self {
        PeerDelta {
            join: Some(join),
            ..PeerDelta::new(peer)
        }
    }

    pub fn pick(peer: PeerId, pick: PickRequest) -> Self {
        PeerDelta {
            pick: Some(pick),
            ..PeerDelta::new(peer)
        }
    }

    pub fn leave(peer: PeerId) -> Self {
        PeerDelta {
            leave: true,
            ..PeerDelta::new(peer)
        }
    }
}

/// A notification broadcast by the owner to one or more peers. May batch
/// several peer deltas plus at most one state switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyNotification {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<PeerDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_state: Option<SwitchState>,
}

impl LobbyNotification {
    /// Notification carrying a single peer delta.
    pub fn delta(delta: PeerDelta) -> Self {
        LobbyNotification {
            peers: vec![delta],
            switch_state: None,
        }
    }

    /// Notification carrying only a state switch.
    pub fn switch(state: SwitchState) -> Self {
        LobbyNotification {
            peers: Vec::new(),
            switch_state: Some(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn peer_id_roundtrip() {
        let id = PeerId::new("abc");
        let json = serde_json::to_string(&id).unwrap();
        let back: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn random_peer_ids_differ() {
        assert_ne!(PeerId::random(), PeerId::random());
    }

    #[test]
    fn sparse_pick_skips_absent_fields() {
        let req = PickRequest {
            team: Some(1),
            ..Default::default()
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"team":1}"#);

        let back: PickRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.team, Some(1));
        assert_eq!(back.champion, None);
        assert_eq!(back.lock, None);
    }

    #[test]
    fn empty_pick_is_empty() {
        assert!(PickRequest::default().is_empty());
        let req = PickRequest {
            lock: Some(true),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }

    #[test]
    fn join_request_roundtrip() {
        let req = LobbyRequest::Join(JoinRequest {
            name: "Alice".to_string(),
            password: Some("hunter2".to_string()),
        });
        let json = serde_json::to_string(&req).unwrap();
        let back: LobbyRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }

    #[test]
    fn join_without_password_omits_field() {
        let req = JoinRequest::new("Bob");
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"name":"Bob"}"#);
    }

    #[test]
    fn leave_request_roundtrip() {
        let json = serde_json::to_string(&LobbyRequest::Leave).unwrap();
        let back: LobbyRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LobbyRequest::Leave);
    }

    #[test]
    fn notification_with_switch_roundtrip() {
        let note = LobbyNotification {
            peers: vec![PeerDelta::leave(PeerId::new("p1"))],
            switch_state: Some(SwitchState::Stopped),
        };
        let json = serde_json::to_string(&note).unwrap();
        let back: LobbyNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(note, back);
    }

    #[test]
    fn leave_delta_serializes_flag() {
        let delta = PeerDelta::leave(PeerId::new("p1"));
        let json = serde_json::to_string(&delta).unwrap();
        assert_eq!(json, r#"{"peer":"p1","leave":true}"#);

        // absent flag decodes as false
        let back: PeerDelta = serde_json::from_str(r#"{"peer":"p1"}"#).unwrap();
        assert!(!back.leave);
    }

    #[test]
    fn switch_only_notification_has_no_peers() {
        let note = LobbyNotification::switch(SwitchState::Launched);
        let json = serde_json::to_string(&note).unwrap();
        assert_eq!(json, r#"{"switch_state":"launched"}"#);
    }
}
