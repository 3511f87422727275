//! Persistence: the serialized tournament record and a JSON file store.
//!
//! A `Tournament` (de)serializes through `TournamentRecord`. Matches embed
//! player snapshots for readers of the file, but restoring relinks every match
//! to the canonical standings entry by id.

use crate::logic::Standings;
use crate::models::{
    EliminationStage, Match, MatchId, MatchPhase, MatchResult, Player, PlayerId, Round,
    Tournament, TournamentPhase,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// Key a tournament is stored under: the external chat or session identifier.
pub type TournamentId = String;

/// Every stored tournament by key.
pub type TournamentMap = HashMap<TournamentId, Tournament>;

/// A match as stored: round, players (snapshots at save time), and result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub round: Round,
    pub player1: Player,
    pub player2: Player,
    pub result: Option<MatchResult>,
    pub phase: MatchPhase,
}

/// Serialized shape of a tournament.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRecord {
    pub name: String,
    pub players: Vec<Player>,
    pub group_stage_matches: Vec<MatchRecord>,
    pub elimination_matches: Vec<MatchRecord>,
    pub standings: Vec<(PlayerId, Player)>,
    #[serde(alias = "currentPhase")]
    pub phase: TournamentPhase,
    pub current_round: u32,
    #[serde(default)]
    pub match_results: Vec<(MatchId, MatchResult)>,
}

/// Why a stored record could not be turned back into a tournament.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RestoreError {
    /// A standings entry's key differs from the id of the player it holds.
    StandingsKeyMismatch { key: PlayerId, player: PlayerId },
    DuplicatePlayer(PlayerId),
    /// Present in the roster, the standings, or a match, but not in all the places it must be.
    UnknownPlayer(PlayerId),
    DuplicateMatch(MatchId),
    /// `matchResults` names a match that does not exist.
    UnknownMatch(MatchId),
    /// `matchResults` disagrees with the result stored on the match.
    ConflictingResult(MatchId),
    /// The knockout matches do not form a bracket that can be played out.
    UnsupportedBracket { stage: EliminationStage, matches: usize },
}

impl std::fmt::Display for RestoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreError::StandingsKeyMismatch { key, player } => {
                write!(f, "Standings entry {} holds player {}", key, player)
            }
            RestoreError::DuplicatePlayer(id) => write!(f, "Player {} appears twice", id),
            RestoreError::UnknownPlayer(id) => write!(f, "Player {} is not in the standings", id),
            RestoreError::DuplicateMatch(id) => write!(f, "Match {} appears twice", id),
            RestoreError::UnknownMatch(id) => write!(f, "Result for unknown match {}", id),
            RestoreError::ConflictingResult(id) => {
                write!(f, "Match {} has conflicting stored results", id)
            }
            RestoreError::UnsupportedBracket { stage, matches } => {
                write!(f, "Bracket has {} {:?} matches", matches, stage)
            }
        }
    }
}

impl std::error::Error for RestoreError {}

fn match_record(game: &Match, standings: &Standings) -> MatchRecord {
    let snapshot = |id: PlayerId| {
        standings
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Player::new(id, String::new()))
    };
    MatchRecord {
        id: game.id,
        round: game.round,
        player1: snapshot(game.player1),
        player2: snapshot(game.player2),
        result: game.result,
        phase: game.phase(),
    }
}

impl From<Tournament> for TournamentRecord {
    fn from(tournament: Tournament) -> Self {
        let standings = tournament.standings_table();
        let mut match_results: Vec<(MatchId, MatchResult)> = tournament
            .group_matches()
            .iter()
            .chain(tournament.elimination_matches())
            .filter_map(|m| m.result.map(|r| (m.id, r)))
            .collect();
        match_results.sort_by_key(|(id, _)| *id);

        Self {
            name: tournament.name().to_string(),
            players: tournament.roster().into_iter().cloned().collect(),
            group_stage_matches: tournament
                .group_matches()
                .iter()
                .map(|m| match_record(m, standings))
                .collect(),
            elimination_matches: tournament
                .elimination_matches()
                .iter()
                .map(|m| match_record(m, standings))
                .collect(),
            standings: standings.iter().map(|(id, p)| (*id, p.clone())).collect(),
            phase: tournament.phase(),
            current_round: tournament.current_round(),
            match_results,
        }
    }
}

/// Matches each knockout stage may hold. Later stages are only generated from a
/// complete earlier one, so anything else cannot be advanced.
const STAGE_SIZES: &[(EliminationStage, &[usize])] = &[
    (EliminationStage::Quarterfinals, &[0, 4]),
    (EliminationStage::Semifinals, &[0, 2]),
    (EliminationStage::Final, &[0, 1]),
    (EliminationStage::ThirdPlace, &[0, 1]),
];

fn check_bracket(elimination_matches: &[Match]) -> Result<(), RestoreError> {
    let count = |stage: EliminationStage| {
        elimination_matches
            .iter()
            .filter(|m| m.stage() == Some(stage))
            .count()
    };
    for (stage, allowed) in STAGE_SIZES {
        let matches = count(*stage);
        if !allowed.contains(&matches) {
            return Err(RestoreError::UnsupportedBracket {
                stage: *stage,
                matches,
            });
        }
    }
    let third_place = count(EliminationStage::ThirdPlace);
    if third_place > 0 && count(EliminationStage::Final) == 0 {
        return Err(RestoreError::UnsupportedBracket {
            stage: EliminationStage::ThirdPlace,
            matches: third_place,
        });
    }
    Ok(())
}

fn relink(
    records: Vec<MatchRecord>,
    standings: &Standings,
    seen: &mut HashSet<MatchId>,
) -> Result<Vec<Match>, RestoreError> {
    records
        .into_iter()
        .map(|r| {
            if !seen.insert(r.id) {
                return Err(RestoreError::DuplicateMatch(r.id));
            }
            for pid in [r.player1.id, r.player2.id] {
                if !standings.contains_key(&pid) {
                    return Err(RestoreError::UnknownPlayer(pid));
                }
            }
            let mut game = Match::new(r.id, r.round, r.player1.id, r.player2.id);
            game.result = r.result;
            Ok(game)
        })
        .collect()
}

impl TryFrom<TournamentRecord> for Tournament {
    type Error = RestoreError;

    fn try_from(record: TournamentRecord) -> Result<Self, Self::Error> {
        let mut standings = Standings::new();
        for (key, player) in record.standings {
            if key != player.id {
                return Err(RestoreError::StandingsKeyMismatch {
                    key,
                    player: player.id,
                });
            }
            if standings.insert(key, player).is_some() {
                return Err(RestoreError::DuplicatePlayer(key));
            }
        }

        let mut players = Vec::with_capacity(record.players.len());
        for p in &record.players {
            if !standings.contains_key(&p.id) {
                return Err(RestoreError::UnknownPlayer(p.id));
            }
            if players.contains(&p.id) {
                return Err(RestoreError::DuplicatePlayer(p.id));
            }
            players.push(p.id);
        }
        if let Some(missing) = standings.keys().find(|id| !players.contains(*id)) {
            return Err(RestoreError::UnknownPlayer(*missing));
        }

        let mut seen = HashSet::new();
        let mut group_matches = relink(record.group_stage_matches, &standings, &mut seen)?;
        let mut elimination_matches = relink(record.elimination_matches, &standings, &mut seen)?;
        check_bracket(&elimination_matches)?;

        for (id, result) in record.match_results {
            let game = group_matches
                .iter_mut()
                .chain(elimination_matches.iter_mut())
                .find(|m| m.id == id)
                .ok_or(RestoreError::UnknownMatch(id))?;
            match game.result {
                Some(existing) if existing != result => {
                    return Err(RestoreError::ConflictingResult(id))
                }
                _ => game.result = Some(result),
            }
        }

        Ok(Tournament::from_parts(
            record.name,
            players,
            standings,
            group_matches,
            elimination_matches,
            record.phase,
            record.current_round,
        ))
    }
}

/// Errors from loading or saving the store.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Store I/O failed: {}", e),
            StoreError::Json(e) => write!(f, "Store data is not valid: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

/// Durable storage for every tournament, loaded at startup and saved after each mutation.
pub trait TournamentStore: Send + Sync {
    fn load(&self) -> Result<TournamentMap, StoreError>;
    fn save(&self, tournaments: &TournamentMap) -> Result<(), StoreError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreFileOut<'a> {
    saved_at: DateTime<Utc>,
    tournaments: &'a TournamentMap,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StoreFileIn {
    saved_at: Option<DateTime<Utc>>,
    tournaments: TournamentMap,
}

/// An object holding `tournaments` and nothing but `savedAt` besides. Anything
/// else is read as the flat `{ "<key>": record }` map older files use.
fn is_envelope(value: &serde_json::Value) -> bool {
    value.as_object().is_some_and(|o| {
        o.contains_key("tournaments") && o.keys().all(|k| k == "savedAt" || k == "tournaments")
    })
}

/// Stores all tournaments in a single pretty-printed JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move an unreadable store file aside so the next save cannot overwrite it.
    /// Returns where it went.
    pub fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let aside = self.path.with_extension(format!("json.bad-{}", stamp));
        std::fs::rename(&self.path, &aside)?;
        Ok(aside)
    }
}

impl TournamentStore for JsonFileStore {
    /// A missing file is an empty store. Both the `{ savedAt, tournaments }`
    /// envelope and the flat key-to-record map are accepted.
    fn load(&self) -> Result<TournamentMap, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TournamentMap::new()),
            Err(e) => return Err(e.into()),
        };
        let value: serde_json::Value = serde_json::from_str(&contents)?;
        if !is_envelope(&value) {
            log::info!("{} uses the flat store layout", self.path.display());
            return Ok(serde_json::from_value(value)?);
        }
        let file: StoreFileIn = serde_json::from_value(value)?;
        if let Some(saved_at) = file.saved_at {
            log::debug!("{} last saved at {}", self.path.display(), saved_at);
        }
        Ok(file.tournaments)
    }

    /// Writes to a sibling temp file and renames it over the old one.
    fn save(&self, tournaments: &TournamentMap) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&StoreFileOut {
            saved_at: Utc::now(),
            tournaments,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
