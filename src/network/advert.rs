//! Advertisement payloads exchanged with the discovery collaborator
//!
//! A hosting peer publishes its server settings bundled with one summary
//! per open lobby. Browsing peers decode the bundle to render the lobby
//! list; the summary never contains per-player data.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Settings the hosting peer's game server imposes on every lobby it
/// carries: which maps, modes, champions and summoner spells are enabled,
/// and the simulation tick rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub name: String,
    pub maps: Vec<u32>,
    pub modes: Vec<u32>,
    pub champions: Vec<u32>,
    pub spells: Vec<u32>,
    pub tick_rate: u32,
}

/// Default tick rate for locally hosted servers.
pub const DEFAULT_TICK_RATE: u32 = 30;

static STOCK: Lazy<ServerSettings> = Lazy::new(|| ServerSettings {
    name: "Server".to_string(),
    maps: vec![1, 8, 10, 12],
    modes: vec![0, 1],
    champions: (1..=50).collect(),
    spells: (1..=13).collect(),
    tick_rate: DEFAULT_TICK_RATE,
});

impl ServerSettings {
    /// The stock enabled-set bundle shipped with the launcher, used when
    /// the host has not curated its own.
    pub fn stock() -> ServerSettings {
        STOCK.clone()
    }

    /// A server is usable only if every enabled set is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.maps.is_empty()
            && !self.modes.is_empty()
            && !self.champions.is_empty()
            && !self.spells.is_empty()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings::stock()
    }
}

/// Advertisement-sized summary of one lobby: enough to render a browser
/// row and decide whether joining is worth attempting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyAd {
    pub name: String,
    pub map: u32,
    pub mode: u32,
    /// Exact count on the owner; last-known on everyone else
    pub players: u32,
    /// Per-team cap; total capacity is twice this
    pub players_max: u32,
    pub password_protected: bool,
}

/// Everything a hosting peer publishes to discovery: its server settings
/// plus a summary per open lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAd {
    /// Hosting player's display name
    pub name: String,
    pub server: ServerSettings,
    pub lobbies: Vec<LobbyAd>,
}

impl HostAd {
    /// Browsers skip hosts whose server settings are unusable.
    pub fn is_valid(&self) -> bool {
        self.server.is_valid()
    }
}
