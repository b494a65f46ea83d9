//! Wire-visible data: peer identity, lobby protocol messages, and the
//! advertisement payloads handed to the discovery collaborator.
//!
//! The transport itself (streams, framing, encryption, NAT traversal) is
//! an external collaborator; this module only defines what travels over
//! it.

pub mod advert;
pub mod protocol;

pub use advert::{HostAd, LobbyAd, ServerSettings, DEFAULT_TICK_RATE};
pub use protocol::{
    JoinRequest, LobbyNotification, LobbyRequest, PeerDelta, PeerId, PickRequest, SwitchState,
};
