//! Lobby state machine and replication protocol
//!
//! One peer (the owner) holds the authoritative roster; every other peer
//! mirrors it from owner notifications. The same `Lobby` type drives both
//! roles, parameterized over a [`LobbyRole`] that decides where requests
//! go. Handles:
//! - join/pick/leave request handling with team balancing
//! - draft locking and the all-locked launch trigger
//! - lobby state switches (started/launched/stopped)
//! - advertisement encode/decode for the discovery collaborator

pub mod events;
pub mod link;
pub mod roster;

use crate::draft::prompt::{CancelToken, DraftPrompt, PromptOutcome};
use crate::draft::{validate_name, DecodeError, DraftField, DraftSheet, PLAYERS_MAX_LIMIT, TEAM_COUNT};
use crate::network::advert::{LobbyAd, ServerSettings};
use crate::network::protocol::{
    JoinRequest, LobbyNotification, LobbyRequest, PeerDelta, PeerId, PickRequest, SwitchState,
};
pub use events::LobbyEvent;
pub use link::{HostRole, Inbound, LobbyRole, PeerRole};
pub use roster::PlayerRecord;

use events::EventBus;
use roster::{Outbound, Roster};
use std::sync::mpsc;

/// Settings the owner chose when opening the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySettings {
    pub name: String,
    pub map: u32,
    pub mode: u32,
    /// Per-team player cap; lobby capacity is twice this
    pub players_max: u32,
    /// `Some` gates joining behind a matching credential
    pub password: Option<String>,
}

impl Default for LobbySettings {
    fn default() -> Self {
        LobbySettings {
            name: "Custom Game".to_string(),
            map: 1,
            mode: 0,
            players_max: 5,
            password: None,
        }
    }
}

/// The lobby's resting states. Derived from the four flags that drive
/// behavior; `Stopped` is a transient notification that clears both
/// `started` and `launched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyState {
    Disconnected,
    Connected,
    Joined,
    Started,
    Launched,
}

/// The replicated lobby, generic over the role that routes requests.
///
/// Construct with [`Lobby::host`] (owner) or [`Lobby::join_via`] (joined
/// peer). The owner drains its inbound queue with [`Lobby::poll`]; a
/// joined peer feeds owner notifications through
/// [`Lobby::handle_notification`].
pub struct Lobby<R: LobbyRole> {
    role: R,
    local_id: PeerId,
    pub settings: LobbySettings,
    server: ServerSettings,
    roster: Roster,
    /// Last-known player count from the advertisement, used until joined
    players_size: u32,
    inbound: Option<mpsc::Receiver<Inbound>>,
    connected: bool,
    joined: bool,
    started: bool,
    launched: bool,
    events: EventBus,
    cancel: CancelToken,
}

impl<R: LobbyRole> Lobby<R> {
    fn with_role(
        local_id: PeerId,
        role: R,
        settings: LobbySettings,
        server: ServerSettings,
        inbound: Option<mpsc::Receiver<Inbound>>,
    ) -> Self {
        Lobby {
            role,
            local_id,
            settings,
            server,
            roster: Roster::new(),
            players_size: 0,
            inbound,
            connected: false,
            joined: false,
            started: false,
            launched: false,
            events: EventBus::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.roster.iter()
    }

    pub fn player(&self, id: &PeerId) -> Option<&PlayerRecord> {
        self.roster.get(id)
    }

    pub fn local_player(&self) -> Option<&PlayerRecord> {
        self.roster.get(&self.local_id)
    }

    /// Exact roster size once joined; the advertised count before that.
    pub fn players_count(&self) -> u32 {
        if self.joined {
            self.roster.len() as u32
        } else {
            self.players_size
        }
    }

    /// Whether a new peer could join right now.
    pub fn is_joinable(&self) -> bool {
        !self.started && self.players_count() < 2 * self.settings.players_max
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn state(&self) -> LobbyState {
        if self.launched {
            LobbyState::Launched
        } else if self.started {
            LobbyState::Started
        } else if self.joined {
            LobbyState::Joined
        } else if self.connected {
            LobbyState::Connected
        } else {
            LobbyState::Disconnected
        }
    }

    /// Register a presentation-layer listener.
    pub fn subscribe(&mut self) -> mpsc::Receiver<LobbyEvent> {
        self.events.subscribe()
    }

    /// Token guarding in-flight interactive picks. Re-armed on every
    /// state switch; fired when this peer is kicked.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The transport reports the stream to the owner is up.
    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Tear down the local mirror of the lobby.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.joined = false;
        self.started = false;
        self.launched = false;
        self.roster.clear();
        self.fire_cancel();
    }

    /// Ask the owner to add us to the roster. Idempotent once joined;
    /// returns false when not connected or the write fails.
    pub fn join(&mut self, name: &str, password: Option<&str>) -> bool {
        if !self.connected {
            return false;
        }
        if self.joined {
            return true;
        }
        if let Err(err) = validate_name(name) {
            log::debug!("refusing to join as {:?}: {}", name, err);
            return false;
        }
        let request = LobbyRequest::Join(JoinRequest {
            name: name.to_string(),
            password: password.map(str::to_string),
        });
        self.joined = self.role.write_request(&self.local_id, &request);
        self.joined
    }

    /// Write a single-field draft update for the local player. Nothing is
    /// applied locally here: the value lands on every mirror, this one
    /// included, when the owner broadcasts it back.
    pub fn set(&mut self, field: DraftField, value: u32) -> bool {
        if !self.roster.contains(&self.local_id) {
            return false;
        }
        let mut update = PickRequest::default();
        match field {
            DraftField::Team => {
                if value >= TEAM_COUNT as u32 {
                    return false;
                }
                update.team = Some(value as u8);
            }
            DraftField::Champion => update.champion = Some(value),
            DraftField::Spell1 => update.spell1 = Some(value),
            DraftField::Spell2 => update.spell2 = Some(value),
            DraftField::Lock => update.lock = Some(value != 0),
        }
        if let Err(err) = DraftSheet::validate(&update, &self.server) {
            log::debug!("refusing local pick of {}: {}", field, err);
            return false;
        }
        self.role
            .write_request(&self.local_id, &LobbyRequest::Pick(update))
    }

    /// Solicit a value for `field` from the input collaborator, then
    /// `set` it. Returns false when cancelled or the write fails.
    pub fn pick(&mut self, field: DraftField, prompt: &mut dyn DraftPrompt) -> bool {
        if !self.roster.contains(&self.local_id) {
            return false;
        }
        let options = self.field_options(field);
        let token = self.cancel.clone();
        match prompt.choose(field, &options, &token) {
            PromptOutcome::Picked(value) => {
                // the token may have fired while we were suspended
                if token.is_cancelled() {
                    return false;
                }
                self.set(field, value)
            }
            PromptOutcome::Cancelled => false,
        }
    }

    /// Ask the owner to drop us from the roster.
    pub fn leave(&mut self) -> bool {
        if !self.joined {
            return true;
        }
        let ok = self.role.write_request(&self.local_id, &LobbyRequest::Leave);
        self.joined = false;
        if !self.role.can_start() {
            // the owner keeps serving the remaining roster; a joined
            // peer's mirror is dead the moment it leaves
            self.roster.clear();
            self.fire_cancel();
        }
        ok
    }

    /// Freeze teams and open the draft. Owner only; idempotent.
    pub fn start(&mut self) -> bool {
        if !self.role.can_start() {
            return false;
        }
        if self.started {
            return true;
        }
        self.started = true;
        log::debug!("lobby {:?} started", self.settings.name);
        self.broadcast(&LobbyNotification::switch(SwitchState::Started), None);
        true
    }

    /// Hand off to the game. Owner only; idempotent. Triggered
    /// automatically when the last player locks.
    pub fn launch(&mut self) -> bool {
        if !self.role.can_start() {
            return false;
        }
        if self.launched {
            return true;
        }
        self.launched = true;
        log::debug!("lobby {:?} launched", self.settings.name);
        self.broadcast(&LobbyNotification::switch(SwitchState::Launched), None);
        true
    }

    /// Roll a launched lobby back to the draft. Owner only; clears both
    /// the started and launched flags, matching the STOPPED handler.
    pub fn stop(&mut self) -> bool {
        if !self.role.can_start() {
            return false;
        }
        if !self.started || !self.launched {
            return true;
        }
        self.started = false;
        self.launched = false;
        log::debug!("lobby {:?} stopped", self.settings.name);
        self.broadcast(&LobbyNotification::switch(SwitchState::Stopped), None);
        true
    }

    /// Apply an owner notification to the local mirror. The transport
    /// calls this for each notification read off the stream; the owner's
    /// own broadcasts loop back through it as well.
    pub fn handle_notification(&mut self, note: &LobbyNotification) {
        for delta in &note.peers {
            if let Some(join) = &delta.join {
                self.handle_join_response(&delta.peer, join);
            }
            if let Some(pick) = &delta.pick {
                self.handle_pick_response(&delta.peer, pick);
            }
            if delta.leave {
                self.handle_leave_response(&delta.peer);
            }
        }
        if let Some(state) = note.switch_state {
            self.handle_switch_state(state);
        }
    }

    /// Advertisement-sized summary for the discovery collaborator. Never
    /// contains per-player data.
    pub fn encode(&self) -> LobbyAd {
        LobbyAd {
            name: self.settings.name.clone(),
            map: self.settings.map,
            mode: self.settings.mode,
            players: self.roster.len() as u32,
            players_max: self.settings.players_max,
            password_protected: self.settings.password.is_some(),
        }
    }

    /// Apply another peer's advertised summary. Commits nothing when any
    /// field fails validation against the local enabled sets.
    pub fn decode_inplace(&mut self, ad: &LobbyAd) -> Result<(), DecodeError> {
        validate_name(&ad.name)?;
        if !self.server.maps.contains(&ad.map) {
            return Err(DecodeError::DisabledMap(ad.map));
        }
        if !self.server.modes.contains(&ad.mode) {
            return Err(DecodeError::DisabledMode(ad.mode));
        }
        if ad.players_max == 0 || ad.players_max > PLAYERS_MAX_LIMIT {
            return Err(DecodeError::BadPlayerCap(ad.players_max));
        }
        self.settings.name = ad.name.clone();
        self.settings.map = ad.map;
        self.settings.mode = ad.mode;
        self.settings.players_max = ad.players_max;
        self.players_size = ad.players;
        self.settings.password = if ad.password_protected {
            // protected; the credential stays unknown until typed
            Some(self.settings.password.take().unwrap_or_default())
        } else {
            None
        };
        Ok(())
    }

    fn field_options(&self, field: DraftField) -> Vec<u32> {
        match field {
            DraftField::Team => (0..TEAM_COUNT as u32).collect(),
            DraftField::Champion => self.server.champions.clone(),
            DraftField::Spell1 | DraftField::Spell2 => self.server.spells.clone(),
            DraftField::Lock => vec![0, 1],
        }
    }

    /// Deliver `note` to every roster entry except `ignore`. Remote
    /// deliveries are fire-and-forget; the owner's own entry applies the
    /// notification locally, which is how the owner's events fire.
    fn broadcast(&mut self, note: &LobbyNotification, ignore: Option<&PeerId>) {
        let mut deliver_local = false;
        for record in self.roster.iter() {
            if Some(&record.id) == ignore {
                continue;
            }
            if record.id == self.local_id {
                deliver_local = true;
                continue;
            }
            if !record.push(note) {
                log::debug!("failed to deliver notification to {}", record.id);
            }
        }
        if deliver_local {
            self.handle_notification(note);
        }
    }

    /// Deliver `note` to one player only.
    fn send_to(&mut self, target: &PeerId, note: &LobbyNotification) {
        if *target == self.local_id {
            self.handle_notification(note);
        } else if let Some(record) = self.roster.get(target) {
            if !record.push(note) {
                log::debug!("failed to deliver notification to {}", target);
            }
        }
    }

    fn handle_join_response(&mut self, peer: &PeerId, join: &JoinRequest) {
        if let Err(err) = validate_name(&join.name) {
            log::debug!("dropping join update for {}: {}", peer, err);
            return;
        }
        let record = self.roster.add(peer);
        record.draft.name = join.name.clone();
        self.events.emit(LobbyEvent::Update);
    }

    fn handle_pick_response(&mut self, peer: &PeerId, pick: &PickRequest) {
        let server = self.server.clone();
        let Some(record) = self.roster.get_mut(peer) else {
            log::debug!("dropping pick update for unknown peer {}", peer);
            return;
        };
        match record.draft.decode_inplace(pick, &server) {
            Ok(()) => self.events.emit(LobbyEvent::Update),
            Err(err) => log::debug!("dropping pick update for {}: {}", peer, err),
        }
    }

    fn handle_leave_response(&mut self, peer: &PeerId) {
        if *peer == self.local_id {
            // the owner dropped us
            self.roster.clear();
            self.joined = false;
            self.fire_cancel();
            self.events.emit(LobbyEvent::Kick);
            return;
        }
        if self.roster.remove(peer).is_some() {
            self.events.emit(LobbyEvent::Update);
        }
    }

    fn handle_switch_state(&mut self, state: SwitchState) {
        // any in-flight prompt belongs to the phase we just left
        self.fire_cancel();
        match state {
            SwitchState::Started => {
                self.started = true;
                self.launched = false;
                self.events.emit(LobbyEvent::Start);
            }
            SwitchState::Launched => {
                self.started = true;
                self.launched = true;
                self.events.emit(LobbyEvent::Launch);
            }
            SwitchState::Stopped => {
                self.started = false;
                self.launched = false;
                self.events.emit(LobbyEvent::Stop);
            }
        }
    }

    fn fire_cancel(&mut self) {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
    }
}

impl Lobby<HostRole> {
    /// Open a lobby with this peer as owner.
    pub fn host(local_id: PeerId, settings: LobbySettings, server: ServerSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut lobby = Lobby::with_role(local_id, HostRole::new(tx), settings, server, Some(rx));
        // the owner is trivially connected to itself
        lobby.connected = true;
        lobby
    }

    /// Queue the transport pushes identity-tagged peer requests into.
    pub fn request_sender(&self) -> mpsc::Sender<Inbound> {
        self.role.request_sender()
    }

    /// Drain the inbound queue, handling each request fully before the
    /// next. This serialization is what keeps team balancing and the
    /// all-locked launch check race-free.
    pub fn poll(&mut self) {
        let pending: Vec<Inbound> = match &self.inbound {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for inbound in pending {
            self.handle_request(inbound);
        }
    }

    /// Handle one identity-tagged request. Requests referencing a peer
    /// that never joined are ignored.
    pub fn handle_request(&mut self, inbound: Inbound) {
        let Inbound {
            from,
            request,
            outbound,
        } = inbound;
        match request {
            LobbyRequest::Join(join) => self.handle_join_request(from, join, outbound),
            LobbyRequest::Pick(pick) => {
                if self.roster.contains(&from) {
                    self.handle_pick_request(&from, pick);
                } else {
                    log::debug!("ignoring pick from unknown peer {}", from);
                }
            }
            LobbyRequest::Leave => {
                if self.roster.contains(&from) {
                    self.handle_leave_request(&from);
                } else {
                    log::debug!("ignoring leave from unknown peer {}", from);
                }
            }
        }
    }

    /// Drop a player from the lobby. The kicked peer is notified so it
    /// can abort any in-flight operation, then the rest of the roster.
    pub fn kick(&mut self, target: &PeerId) -> bool {
        if *target == self.local_id {
            return false;
        }
        let Some(record) = self.roster.remove(target) else {
            return false;
        };
        log::debug!("kicking {}", target);
        let note = LobbyNotification::delta(PeerDelta::leave(target.clone()));
        record.push(&note);
        self.broadcast(&note, None);
        self.events.emit(LobbyEvent::Update);
        true
    }

    /// Tear down the roster, closing every outbound channel. Peers see
    /// their streams drop.
    pub fn shutdown(&mut self) {
        log::debug!("tearing down lobby {:?}", self.settings.name);
        self.roster.clear();
        self.players_size = 0;
        self.joined = false;
        self.started = false;
        self.launched = false;
        self.fire_cancel();
    }

    /// Owner-side join gate. Checks the exact roster size: the coarse
    /// advertised count is meaningless here and the owner need not have
    /// joined its own lobby for the cap to hold.
    fn accepting_joins(&self) -> bool {
        !self.started && (self.roster.len() as u32) < 2 * self.settings.players_max
    }

    fn handle_join_request(&mut self, from: PeerId, join: JoinRequest, outbound: Option<Outbound>) {
        if let Err(err) = validate_name(&join.name) {
            log::debug!("ignoring join from {}: {}", from, err);
            return;
        }
        if let Some(expected) = &self.settings.password {
            if join.password.as_deref() != Some(expected.as_str()) {
                log::debug!("ignoring join from {}: bad credential", from);
                return;
            }
        }
        if !self.roster.contains(&from) && !self.accepting_joins() {
            log::debug!("ignoring join from {}: lobby not joinable", from);
            return;
        }

        // a repeat join reuses the record; balancing sees its old team
        let record = self.roster.add(&from);
        if let Some(tx) = outbound {
            record.set_outbound(tx);
        }
        let team = self.roster.least_loaded_team();
        if let Some(record) = self.roster.get_mut(&from) {
            record.draft.name = join.name.clone();
            record.draft.team = Some(team);
        }
        log::debug!("{} joined as {:?} on team {}", from, join.name, team);

        // incremental update for everyone already present
        let delta = PeerDelta {
            peer: from.clone(),
            // the credential is never echoed back out
            join: Some(JoinRequest::new(join.name.clone())),
            pick: self
                .roster
                .get(&from)
                .map(|r| r.draft.encode_field(DraftField::Team)),
            leave: false,
        };
        self.broadcast(&LobbyNotification::delta(delta), Some(&from));

        // full snapshot for the newcomer, sent after it is in the roster
        // so it sees every earlier join, itself included
        let snapshot = LobbyNotification {
            peers: self
                .roster
                .iter()
                .map(|record| PeerDelta {
                    peer: record.id.clone(),
                    join: Some(JoinRequest::new(record.draft.name.clone())),
                    pick: Some(record.draft.encode()),
                    leave: false,
                })
                .collect(),
            switch_state: None,
        };
        self.send_to(&from, &snapshot);
    }

    fn handle_pick_request(&mut self, from: &PeerId, pick: PickRequest) {
        let Some(record) = self.roster.get(from) else {
            return;
        };
        // locked players are frozen entirely
        if record.draft.lock {
            log::debug!("dropping pick from {}: player locked", from);
            return;
        }
        // teams freeze once the lobby starts
        if self.started && pick.team.is_some() {
            log::debug!("dropping pick from {}: team frozen after start", from);
            return;
        }
        // before start, team is the only mutable field
        if !self.started && pick.team.is_none() {
            log::debug!("dropping pick from {}: draft not started", from);
            return;
        }

        if self.started && pick.lock == Some(true) {
            if let Some(record) = self.roster.get_mut(from) {
                record.draft.lock = true;
            }
            if self.roster.all_locked() {
                log::debug!("all players locked, launching");
                // the state-switch broadcast supersedes the pick broadcast
                self.launch();
                return;
            }
        }

        self.broadcast(
            &LobbyNotification::delta(PeerDelta::pick(from.clone(), pick)),
            None,
        );
    }

    fn handle_leave_request(&mut self, from: &PeerId) {
        if self.roster.remove(from).is_none() {
            return;
        }
        log::debug!("{} left", from);
        self.broadcast(
            &LobbyNotification::delta(PeerDelta::leave(from.clone())),
            None,
        );
        self.events.emit(LobbyEvent::Update);
        if *from == self.local_id {
            self.joined = false;
        }
    }
}

impl Lobby<PeerRole> {
    /// Attach to a remote lobby reachable through `owner`. Returns the
    /// lobby and the receiver the transport delivers owner notifications
    /// on; feed each one to [`Lobby::handle_notification`].
    pub fn join_via(
        local_id: PeerId,
        server: ServerSettings,
        owner: mpsc::Sender<Inbound>,
    ) -> (Self, mpsc::Receiver<LobbyNotification>) {
        let (reply_tx, reply_rx) = mpsc::channel();
        let lobby = Lobby::with_role(
            local_id,
            PeerRole::new(owner, reply_tx),
            LobbySettings::default(),
            server,
            None,
        );
        (lobby, reply_rx)
    }
}
