use crate::{Card, Catalog, CountMap, DeckPartition, GameId, Phase, Preferences, SessionState};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SNAPSHOT_VERSION: u32 = 1;

/// The persisted form of a session. Cards are stored by id and resolved
/// against the catalog again on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    pub version: u32,
    /// Absent in older saves; the deck contents decide then.
    pub phase: Option<Phase>,
    pub selected_games: Vec<GameId>,
    pub card_counts: CountMap,
    pub special_card_counts: CountMap,
    pub sentry_card_counts: CountMap,
    pub sentry_enabled: bool,
    pub corrupter_enabled: bool,
    pub current_deck_ids: Vec<String>,
    /// `-1` before the first draw.
    pub current_index: i64,
    pub discard_pile_ids: Vec<String>,
    pub in_play_card_ids: Vec<String>,
    pub sentry_deck_ids: Vec<String>,
    pub initial_deck_size: usize,
    pub difficulty_index: Option<usize>,
    pub preferences: Preferences,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            phase: None,
            selected_games: Vec::new(),
            card_counts: CountMap::new(),
            special_card_counts: CountMap::new(),
            sentry_card_counts: CountMap::new(),
            sentry_enabled: false,
            corrupter_enabled: false,
            current_deck_ids: Vec::new(),
            current_index: -1,
            discard_pile_ids: Vec::new(),
            in_play_card_ids: Vec::new(),
            sentry_deck_ids: Vec::new(),
            initial_deck_size: 0,
            difficulty_index: None,
            preferences: Preferences::default(),
        }
    }
}

fn ids(cards: &[Card]) -> Vec<String> {
    cards.iter().map(|card| card.id.clone()).collect()
}

impl SessionSnapshot {
    pub fn capture(state: &SessionState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            phase: Some(state.phase),
            selected_games: state.selected_games.clone(),
            card_counts: state.card_counts.clone(),
            special_card_counts: state.special_card_counts.clone(),
            sentry_card_counts: state.sentry_card_counts.clone(),
            sentry_enabled: state.sentry_enabled,
            corrupter_enabled: state.corrupter_enabled,
            current_deck_ids: ids(&state.deck.combined),
            current_index: state
                .current_index
                .and_then(|index| i64::try_from(index).ok())
                .unwrap_or(-1),
            discard_pile_ids: ids(&state.deck.discard),
            in_play_card_ids: ids(&state.deck.in_play),
            sentry_deck_ids: ids(&state.deck.sentry),
            initial_deck_size: state.initial_deck_size,
            difficulty_index: state.difficulty_index,
            preferences: state.preferences,
        }
    }

    /// Rebuilds session state, dropping ids and games the catalog no longer has.
    pub fn restore(&self, catalog: &Catalog) -> SessionState {
        let by_id: HashMap<&str, &Card> = catalog
            .games
            .values()
            .flat_map(|cards| cards.iter())
            .map(|card| (card.id.as_str(), card))
            .collect();
        let resolve = |pile: &str, ids: &[String]| -> Vec<Card> {
            ids.iter()
                .filter_map(|id| {
                    let card = by_id.get(id.as_str()).map(|card| (*card).clone());
                    if card.is_none() {
                        debug!("dropping unknown card {id} from {pile}");
                    }
                    card
                })
                .collect()
        };

        let deck = DeckPartition {
            combined: resolve("deck", &self.current_deck_ids),
            discard: resolve("discard", &self.discard_pile_ids),
            in_play: resolve("in-play", &self.in_play_card_ids),
            sentry: resolve("sentry", &self.sentry_deck_ids),
            ..DeckPartition::default()
        };
        let current_index = usize::try_from(self.current_index)
            .ok()
            .filter(|_| !deck.combined.is_empty())
            .map(|index| index.min(deck.combined.len() - 1));
        let selected_games = self
            .selected_games
            .iter()
            .filter(|game| {
                let known = catalog.has_game(game);
                if !known {
                    debug!("dropping unknown game {game}");
                }
                known
            })
            .cloned()
            .collect();
        let phase = if deck.is_empty() {
            self.phase.unwrap_or(Phase::Empty)
        } else {
            Phase::Browsing
        };

        SessionState {
            phase,
            current_index,
            selected_games,
            card_counts: self.card_counts.clone(),
            special_card_counts: self.special_card_counts.clone(),
            sentry_card_counts: self.sentry_card_counts.clone(),
            sentry_enabled: self.sentry_enabled,
            corrupter_enabled: self.corrupter_enabled,
            initial_deck_size: self.initial_deck_size,
            difficulty_index: self.difficulty_index,
            preferences: self.preferences,
            deck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn catalog() -> Catalog {
        let mut games = BTreeMap::new();
        games.insert(
            "base".to_string(),
            (0..5)
                .map(|i| Card::new(format!("c{i}"), format!("Card {i}"), Some("Trap")))
                .collect(),
        );
        Catalog {
            games,
            ..Catalog::default()
        }
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let json = serde_json::to_value(SessionSnapshot::default()).expect("encode");
        assert_eq!(json["currentIndex"], -1);
        assert!(json.get("currentDeckIds").is_some());
        assert!(json.get("inPlayCardIds").is_some());
        assert_eq!(json["preferences"]["darkMode"], true);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let snapshot: SessionSnapshot =
            serde_json::from_str(r#"{"selectedGames":["base"]}"#).expect("decode");
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.current_index, -1);
        assert!(snapshot.preferences.dark_mode);
    }

    #[test]
    fn restore_drops_unknown_ids_and_clamps_index() {
        let snapshot = SessionSnapshot {
            selected_games: vec!["base".to_string(), "gone".to_string()],
            current_deck_ids: vec!["c0".to_string(), "zz".to_string(), "c1".to_string()],
            current_index: 7,
            ..SessionSnapshot::default()
        };
        let state = snapshot.restore(&catalog());
        assert_eq!(state.phase, Phase::Browsing);
        assert_eq!(state.selected_games, vec!["base".to_string()]);
        assert_eq!(state.deck.combined.len(), 2);
        assert_eq!(state.current_index, Some(1));
    }

    #[test]
    fn zero_card_deck_stays_browsing() {
        let mut state = SessionSnapshot::default().restore(&catalog());
        state.phase = Phase::Browsing;
        state.selected_games = vec!["base".to_string()];
        let snapshot = SessionSnapshot::capture(&state);
        assert_eq!(snapshot.phase, Some(Phase::Browsing));
        let restored = snapshot.restore(&catalog());
        assert_eq!(restored.phase, Phase::Browsing);
        assert!(restored.deck.combined.is_empty());
    }

    #[test]
    fn restore_of_empty_snapshot_is_empty() {
        let state = SessionSnapshot::default().restore(&catalog());
        assert_eq!(state.phase, Phase::Empty);
        assert_eq!(state.current_index, None);
    }
}
