//! Draft state: per-player field holders and their encode/decode rules
//!
//! Each player carries a draft sheet (name, team, champion, two summoner
//! spells, lock flag). Enumerated fields are only valid against the
//! hosting server's enabled sets; a sparse update either decodes fully or
//! commits nothing.

pub mod prompt;

use crate::network::advert::ServerSettings;
use crate::network::protocol::PickRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of teams in every lobby.
pub const TEAM_COUNT: u8 = 2;

/// Longest accepted display name, in bytes.
pub const NAME_MAX: usize = 32;

/// Upper bound on the per-team player cap a lobby may advertise.
pub const PLAYERS_MAX_LIMIT: u32 = 16;

/// The draft fields a pick operation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Team,
    Champion,
    Spell1,
    Spell2,
    Lock,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::Team => "team",
            DraftField::Champion => "champion",
            DraftField::Spell1 => "spell1",
            DraftField::Spell2 => "spell2",
            DraftField::Lock => "lock",
        };
        f.write_str(name)
    }
}

/// Why a decode was refused. The caller commits nothing when any field
/// fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    EmptyName,
    NameTooLong,
    UnknownTeam(u8),
    DisabledChampion(u32),
    DisabledSpell(u32),
    DisabledMap(u32),
    DisabledMode(u32),
    BadPlayerCap(u32),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::EmptyName => write!(f, "name is empty"),
            DecodeError::NameTooLong => write!(f, "name exceeds {} bytes", NAME_MAX),
            DecodeError::UnknownTeam(t) => write!(f, "team {} out of range", t),
            DecodeError::DisabledChampion(c) => write!(f, "champion {} is not enabled", c),
            DecodeError::DisabledSpell(s) => write!(f, "spell {} is not enabled", s),
            DecodeError::DisabledMap(m) => write!(f, "map {} is not enabled", m),
            DecodeError::DisabledMode(m) => write!(f, "mode {} is not enabled", m),
            DecodeError::BadPlayerCap(n) => write!(f, "player cap {} out of range", n),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Validate a display name against the shared naming rules.
pub fn validate_name(name: &str) -> Result<(), DecodeError> {
    if name.trim().is_empty() {
        return Err(DecodeError::EmptyName);
    }
    if name.len() > NAME_MAX {
        return Err(DecodeError::NameTooLong);
    }
    Ok(())
}

/// One player's draft picks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSheet {
    pub name: String,
    pub team: Option<u8>,
    pub champion: Option<u32>,
    pub spell1: Option<u32>,
    pub spell2: Option<u32>,
    pub lock: bool,
}

impl DraftSheet {
    /// Encode the full pick state, one `Some` per assigned field.
    pub fn encode(&self) -> PickRequest {
        PickRequest {
            team: self.team,
            champion: self.champion,
            spell1: self.spell1,
            spell2: self.spell2,
            lock: if self.lock { Some(true) } else { None },
        }
    }

    /// Encode only the given field as a sparse update.
    pub fn encode_field(&self, field: DraftField) -> PickRequest {
        let mut req = PickRequest::default();
        match field {
            DraftField::Team => req.team = self.team,
            DraftField::Champion => req.champion = self.champion,
            DraftField::Spell1 => req.spell1 = self.spell1,
            DraftField::Spell2 => req.spell2 = self.spell2,
            DraftField::Lock => req.lock = Some(self.lock),
        }
        req
    }

    /// Check a sparse update against the server's enabled sets without
    /// touching the sheet.
    pub fn validate(req: &PickRequest, server: &ServerSettings) -> Result<(), DecodeError> {
        if let Some(team) = req.team {
            if team >= TEAM_COUNT {
                return Err(DecodeError::UnknownTeam(team));
            }
        }
        if let Some(champion) = req.champion {
            if !server.champions.contains(&champion) {
                return Err(DecodeError::DisabledChampion(champion));
            }
        }
        for spell in [req.spell1, req.spell2].into_iter().flatten() {
            if !server.spells.contains(&spell) {
                return Err(DecodeError::DisabledSpell(spell));
            }
        }
        Ok(())
    }

    /// Validate and apply a sparse update. On error nothing is committed.
    pub fn decode_inplace(
        &mut self,
        req: &PickRequest,
        server: &ServerSettings,
    ) -> Result<(), DecodeError> {
        Self::validate(req, server)?;

        if let Some(team) = req.team {
            self.team = Some(team);
        }
        if let Some(champion) = req.champion {
            self.champion = Some(champion);
        }
        if let Some(spell) = req.spell1 {
            self.spell1 = Some(spell);
        }
        if let Some(spell) = req.spell2 {
            self.spell2 = Some(spell);
        }
        if let Some(lock) = req.lock {
            self.lock = lock;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn server() -> ServerSettings {
        ServerSettings {
            name: "test".to_string(),
            maps: vec![1],
            modes: vec![0],
            champions: vec![10, 11, 12],
            spells: vec![4, 7],
            tick_rate: 30,
        }
    }

    #[test]
    fn encode_field_is_sparse() {
        let sheet = DraftSheet {
            name: "Alice".to_string(),
            team: Some(1),
            champion: Some(10),
            spell1: Some(4),
            spell2: Some(7),
            lock: false,
        };
        let req = sheet.encode_field(DraftField::Team);
        assert_eq!(req.team, Some(1));
        assert!(req.champion.is_none());
        assert!(req.lock.is_none());
    }

    #[test]
    fn encode_omits_unassigned_fields() {
        let sheet = DraftSheet {
            team: Some(0),
            ..Default::default()
        };
        let req = sheet.encode();
        assert_eq!(req.team, Some(0));
        assert!(req.champion.is_none());
        assert!(req.lock.is_none());
    }

    #[test]
    fn full_encode_decode_roundtrip() {
        let sheet = DraftSheet {
            name: String::new(),
            team: Some(0),
            champion: Some(12),
            spell1: Some(4),
            spell2: Some(7),
            lock: true,
        };
        let mut other = DraftSheet::default();
        other.decode_inplace(&sheet.encode(), &server()).unwrap();
        assert_eq!(other.team, sheet.team);
        assert_eq!(other.champion, sheet.champion);
        assert_eq!(other.spell1, sheet.spell1);
        assert_eq!(other.spell2, sheet.spell2);
        assert_eq!(other.lock, sheet.lock);
    }

    #[test]
    fn disabled_champion_rejected() {
        let mut sheet = DraftSheet::default();
        let req = PickRequest {
            champion: Some(99),
            ..Default::default()
        };
        let err = sheet.decode_inplace(&req, &server()).unwrap_err();
        assert_eq!(err, DecodeError::DisabledChampion(99));
        assert_eq!(sheet.champion, None);
    }

    #[test]
    fn disabled_spell_rejected() {
        let mut sheet = DraftSheet::default();
        let req = PickRequest {
            spell2: Some(99),
            ..Default::default()
        };
        assert_eq!(
            sheet.decode_inplace(&req, &server()),
            Err(DecodeError::DisabledSpell(99))
        );
    }

    #[test]
    fn out_of_range_team_rejected() {
        let mut sheet = DraftSheet::default();
        let req = PickRequest {
            team: Some(TEAM_COUNT),
            ..Default::default()
        };
        assert_eq!(
            sheet.decode_inplace(&req, &server()),
            Err(DecodeError::UnknownTeam(TEAM_COUNT))
        );
    }

    #[test]
    fn partial_failure_commits_nothing() {
        let mut sheet = DraftSheet::default();
        // team is valid but the champion is disabled; neither lands
        let req = PickRequest {
            team: Some(1),
            champion: Some(99),
            ..Default::default()
        };
        assert!(sheet.decode_inplace(&req, &server()).is_err());
        assert_eq!(sheet.team, None);
        assert_eq!(sheet.champion, None);
    }

    #[test]
    fn empty_update_is_a_noop() {
        let mut sheet = DraftSheet {
            team: Some(1),
            ..Default::default()
        };
        sheet
            .decode_inplace(&PickRequest::default(), &server())
            .unwrap();
        assert_eq!(sheet.team, Some(1));
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("Alice").is_ok());
        assert_eq!(validate_name(""), Err(DecodeError::EmptyName));
        assert_eq!(validate_name("   "), Err(DecodeError::EmptyName));
        assert_eq!(
            validate_name(&"x".repeat(NAME_MAX + 1)),
            Err(DecodeError::NameTooLong)
        );
    }
}
