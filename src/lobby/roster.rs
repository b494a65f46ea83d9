//! The owner-authoritative player roster
//!
//! Maps peer identity to player record. The owner's copy carries an
//! outbound notification channel per remote peer; joined peers mirror the
//! roster without channels.

use crate::draft::{DraftSheet, TEAM_COUNT};
use crate::network::protocol::{LobbyNotification, PeerId};
use std::collections::HashMap;
use std::sync::mpsc;

/// Channel used to push notifications to one remote peer. Dropped (and
/// therefore closed) when the record leaves the roster.
pub type Outbound = mpsc::Sender<LobbyNotification>;

/// One player in the lobby.
#[derive(Debug)]
pub struct PlayerRecord {
    pub id: PeerId,
    pub draft: DraftSheet,
    outbound: Option<Outbound>,
}

impl PlayerRecord {
    pub fn new(id: PeerId) -> Self {
        PlayerRecord {
            id,
            draft: DraftSheet::default(),
            outbound: None,
        }
    }

    /// Attach the reply channel captured when this peer's stream opened.
    pub fn set_outbound(&mut self, tx: Outbound) {
        self.outbound = Some(tx);
    }

    /// True for the owner's entries of remotely connected peers.
    pub fn is_remote(&self) -> bool {
        self.outbound.is_some()
    }

    /// Fire-and-forget delivery. Returns false when the record has no
    /// channel or the peer's end is gone.
    pub fn push(&self, note: &LobbyNotification) -> bool {
        match &self.outbound {
            Some(tx) => tx.send(note.clone()).is_ok(),
            None => false,
        }
    }
}

/// Identity-keyed player records. Insertion order is irrelevant.
#[derive(Debug, Default)]
pub struct Roster {
    players: HashMap<PeerId, PlayerRecord>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Look up or create the record for `id`. A repeat join reuses the
    /// existing record.
    pub fn add(&mut self, id: &PeerId) -> &mut PlayerRecord {
        self.players
            .entry(id.clone())
            .or_insert_with(|| PlayerRecord::new(id.clone()))
    }

    pub fn remove(&mut self, id: &PeerId) -> Option<PlayerRecord> {
        self.players.remove(id)
    }

    pub fn get(&self, id: &PeerId) -> Option<&PlayerRecord> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &PeerId) -> Option<&mut PlayerRecord> {
        self.players.get_mut(id)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    pub fn ids(&self) -> Vec<PeerId> {
        self.players.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }

    /// Players per team, indexed by team id. Unassigned players are not
    /// counted.
    pub fn team_counts(&self) -> [usize; TEAM_COUNT as usize] {
        let mut counts = [0usize; TEAM_COUNT as usize];
        for record in self.players.values() {
            if let Some(team) = record.draft.team {
                if let Some(count) = counts.get_mut(team as usize) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Team with the fewest players; ties go to the lowest index.
    pub fn least_loaded_team(&self) -> u8 {
        let counts = self.team_counts();
        counts
            .iter()
            .enumerate()
            .min_by_key(|&(_, count)| *count)
            .map(|(team, _)| team as u8)
            .unwrap_or(0)
    }

    /// True when the roster is non-empty and every player has locked.
    pub fn all_locked(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.draft.lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::protocol::LobbyNotification;

    fn id(n: u32) -> PeerId {
        PeerId::new(format!("p{}", n))
    }

    #[test]
    fn add_is_idempotent() {
        let mut roster = Roster::new();
        roster.add(&id(1)).draft.name = "Alice".to_string();
        roster.add(&id(1));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get(&id(1)).unwrap().draft.name, "Alice");
    }

    #[test]
    fn remove_returns_record() {
        let mut roster = Roster::new();
        roster.add(&id(1));
        assert!(roster.remove(&id(1)).is_some());
        assert!(roster.remove(&id(1)).is_none());
        assert!(roster.is_empty());
    }

    #[test]
    fn team_counts_skip_unassigned() {
        let mut roster = Roster::new();
        roster.add(&id(1)).draft.team = Some(0);
        roster.add(&id(2)).draft.team = Some(0);
        roster.add(&id(3)).draft.team = Some(1);
        roster.add(&id(4)); // no team yet
        assert_eq!(roster.team_counts(), [2, 1]);
    }

    #[test]
    fn least_loaded_prefers_lowest_index_on_tie() {
        let mut roster = Roster::new();
        assert_eq!(roster.least_loaded_team(), 0);

        roster.add(&id(1)).draft.team = Some(0);
        assert_eq!(roster.least_loaded_team(), 1);

        roster.add(&id(2)).draft.team = Some(1);
        // tied again: lowest index wins
        assert_eq!(roster.least_loaded_team(), 0);
    }

    #[test]
    fn all_locked_requires_nonempty_roster() {
        let mut roster = Roster::new();
        assert!(!roster.all_locked());

        roster.add(&id(1)).draft.lock = true;
        assert!(roster.all_locked());

        roster.add(&id(2));
        assert!(!roster.all_locked());

        roster.get_mut(&id(2)).unwrap().draft.lock = true;
        assert!(roster.all_locked());
    }

    #[test]
    fn push_without_channel_reports_failure() {
        let mut roster = Roster::new();
        roster.add(&id(1));
        let note = LobbyNotification::default();
        assert!(!roster.get(&id(1)).unwrap().push(&note));
    }

    #[test]
    fn removing_record_closes_its_channel() {
        let mut roster = Roster::new();
        let (tx, rx) = mpsc::channel();
        roster.add(&id(1)).set_outbound(tx);
        assert!(roster.get(&id(1)).unwrap().is_remote());

        roster.remove(&id(1));
        // sender side is gone, so the receiver reports disconnect
        assert!(rx.recv().is_err());
    }
}
