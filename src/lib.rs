//! Peer-hosted game lobby coordination.
//!
//! One peer owns each lobby and holds the authoritative roster; everyone
//! else mirrors it from owner notifications. The crate covers the
//! join/pick/leave protocol, team balancing, the champion draft with its
//! lock-driven launch trigger, and the advertisement payloads a discovery
//! layer publishes. Transports, discovery, and the game process itself
//! are external collaborators wired in at the edges.
//!
//! Hosting:
//!
//! ```
//! use skirmish::lobby::{Lobby, LobbySettings};
//! use skirmish::network::{PeerId, ServerSettings};
//!
//! let mut lobby = Lobby::host(PeerId::random(), LobbySettings::default(), ServerSettings::stock());
//! lobby.join("Host", None);
//! lobby.poll();
//! assert_eq!(lobby.players_count(), 1);
//! ```
//!
//! A joined peer attaches with [`lobby::Lobby::join_via`], feeds owner
//! notifications through [`lobby::Lobby::handle_notification`], and reacts
//! to [`lobby::LobbyEvent`]s from [`lobby::Lobby::subscribe`].

pub mod draft;
pub mod lobby;
pub mod network;

pub use draft::{DraftField, DraftSheet, DecodeError};
pub use lobby::{Lobby, LobbyEvent, LobbySettings, LobbyState};
pub use network::{LobbyAd, PeerId, ServerSettings};
