use crate::{
    Card, CardAction, Catalog, CatalogIndex, CatalogProvider, CountMap, DeckComposer,
    DeckPartition, DeckRequest, Difficulty, DifficultyTable, GameId, LoadedCatalog, Notice,
    NoticeKind, NoticeLog, Preferences, RngState, SessionSnapshot, SnapshotStore, TypeRegistry,
    SNAPSHOT_VERSION,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no games selected")]
    NoGamesSelected,
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid index: {0}")]
    InvalidIndex(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("no other cards of type \"{0}\"")]
    NoCandidates(String),
    #[error("no sentry cards available")]
    NoSentryCards,
    #[error("no cards ahead of the current card")]
    NoCardsAhead,
    #[error("unknown card: {0}")]
    UnknownCard(String),
    #[error("catalog load failed: {0}")]
    CatalogLoadFailure(String),
}

impl SessionError {
    pub fn kind(&self) -> NoticeKind {
        match self {
            Self::NoGamesSelected => NoticeKind::NoGamesSelected,
            Self::InvalidState(_) | Self::NoSentryCards | Self::NoCardsAhead => {
                NoticeKind::InvalidState
            }
            Self::InvalidIndex(_) | Self::UnknownCard(_) => NoticeKind::InvalidIndex,
            Self::UnknownAction(_) => NoticeKind::UnknownAction,
            Self::NoCandidates(_) => NoticeKind::NoCandidates,
            Self::CatalogLoadFailure(_) => NoticeKind::CatalogLoadFailure,
        }
    }
}

impl From<&SessionError> for Notice {
    fn from(err: &SessionError) -> Self {
        Notice::new(err.kind(), err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Empty,
    Browsing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    /// `None` before the first draw.
    pub current_index: Option<usize>,
    pub selected_games: Vec<GameId>,
    pub card_counts: CountMap,
    pub special_card_counts: CountMap,
    pub sentry_card_counts: CountMap,
    pub sentry_enabled: bool,
    pub corrupter_enabled: bool,
    pub deck: DeckPartition,
    pub initial_deck_size: usize,
    pub difficulty_index: Option<usize>,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Navigation {
    Advanced,
    Reshuffled,
    Exhausted,
    Retreated,
    AtStart,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// 1-based; 0 before the first draw.
    pub current_position: usize,
    pub total_cards: usize,
    pub initial_deck_size: usize,
}

/// One running session: the catalog it was opened with, the live state, the
/// random source and the store every mutation is saved to.
pub struct Session<S: SnapshotStore> {
    catalog: Catalog,
    difficulties: DifficultyTable,
    registry: TypeRegistry,
    index: CatalogIndex,
    state: SessionState,
    rng: RngState,
    store: S,
    notices: NoticeLog,
}

impl<S: SnapshotStore> Session<S> {
    pub fn open_with<P: CatalogProvider>(
        provider: &P,
        store: S,
        rng: RngState,
    ) -> Result<Self, SessionError> {
        let loaded = provider.load()?;
        Ok(Self::open(loaded, store, rng))
    }

    /// Resumes from the store when it holds a usable snapshot, otherwise starts empty.
    pub fn open(loaded: LoadedCatalog, store: S, rng: RngState) -> Self {
        let LoadedCatalog {
            catalog,
            difficulties,
        } = loaded;
        let mut notices = NoticeLog::default();
        let state = match store.get() {
            Ok(Some(snapshot)) if snapshot.version == SNAPSHOT_VERSION => {
                info!("resuming session snapshot");
                snapshot.restore(&catalog)
            }
            Ok(Some(snapshot)) => {
                warn!(
                    "ignoring snapshot version {} (expected {})",
                    snapshot.version, SNAPSHOT_VERSION
                );
                SessionState::default()
            }
            Ok(None) => SessionState::default(),
            Err(err) => {
                warn!("could not read session snapshot: {err}");
                notices.notify(
                    NoticeKind::PersistenceFailure,
                    format!("Saved session could not be loaded: {err}"),
                );
                SessionState::default()
            }
        };
        let registry = TypeRegistry::from_catalog(&catalog);
        let index = CatalogIndex::build(&state.selected_games, &catalog);
        Self {
            catalog,
            difficulties,
            registry,
            index,
            state,
            rng,
            store,
            notices,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn difficulties(&self) -> &DifficultyTable {
        &self.difficulties
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.state
            .current_index
            .and_then(|index| self.state.deck.combined.get(index))
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current_position: self.state.current_index.map_or(0, |index| index + 1),
            total_cards: self.state.deck.combined.len(),
            initial_deck_size: self.state.initial_deck_size,
        }
    }

    pub fn in_play(&self) -> &[Card] {
        &self.state.deck.in_play
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain().collect()
    }

    /// Keeps the known games, in the order given, without repeats.
    pub fn select_games(&mut self, games: &[GameId]) -> usize {
        let mut selected: Vec<GameId> = Vec::new();
        for game in games {
            if !self.catalog.has_game(game) {
                debug!("ignoring unknown game {game}");
                continue;
            }
            if !selected.contains(game) {
                selected.push(game.clone());
            }
        }
        self.index = CatalogIndex::build(&selected, &self.catalog);
        self.state.selected_games = selected;
        self.persist();
        self.state.selected_games.len()
    }

    pub fn set_difficulty(&mut self, index: usize) -> Result<Difficulty, SessionError> {
        let difficulty = self
            .difficulties
            .apply(index, &mut self.state.card_counts)
            .cloned()
            .ok_or_else(|| {
                SessionError::InvalidIndex(format!(
                    "difficulty {index} of {}",
                    self.difficulties.len()
                ))
            })?;
        self.state.difficulty_index = Some(index);
        self.persist();
        Ok(difficulty)
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.state.preferences.dark_mode = enabled;
        self.persist();
    }

    pub fn generate_deck(&mut self, request: DeckRequest) -> Result<Progress, SessionError> {
        if self.state.selected_games.is_empty() {
            return Err(SessionError::NoGamesSelected);
        }
        let deck = DeckComposer::new(&self.catalog, &self.index, &self.state.selected_games)
            .compose(&request, &mut self.rng, &mut self.notices);
        info!(
            "generated deck of {} cards from {} game(s)",
            deck.combined.len(),
            self.state.selected_games.len()
        );

        let state = &mut self.state;
        state.card_counts = request.card_counts;
        state.special_card_counts = request.special_card_counts;
        state.sentry_card_counts = request.sentry_card_counts;
        state.sentry_enabled = request.sentry_enabled;
        state.corrupter_enabled = request.corrupter_enabled;
        state.initial_deck_size = deck.combined.len();
        state.deck = deck;
        state.current_index = None;
        state.phase = Phase::Browsing;
        self.persist();
        Ok(self.progress())
    }

    pub fn next(&mut self) -> Result<Navigation, SessionError> {
        self.require_deck()?;
        let state = &mut self.state;
        if let Some(card) = state
            .current_index
            .and_then(|index| state.deck.combined.get(index))
            .cloned()
        {
            state.deck.discard.push(card);
        }
        let next = state.current_index.map_or(0, |index| index + 1);
        let navigation = if next < state.deck.combined.len() {
            state.current_index = Some(next);
            Navigation::Advanced
        } else if !state.deck.discard.is_empty() {
            state.deck.reshuffle_discard(&mut self.rng);
            state.current_index = None;
            state.initial_deck_size = state.deck.combined.len();
            self.notices.notify(
                NoticeKind::Reshuffled,
                format!(
                    "Discard pile shuffled into a new deck of {} cards",
                    state.deck.combined.len()
                ),
            );
            Navigation::Reshuffled
        } else {
            self.notices
                .notify(NoticeKind::NoMoreCards, "No more cards in the deck");
            Navigation::Exhausted
        };
        self.persist();
        Ok(navigation)
    }

    pub fn prev(&mut self) -> Result<Navigation, SessionError> {
        self.require_deck()?;
        let Some(index) = self.state.current_index else {
            self.notices
                .notify(NoticeKind::AtStart, "Already at the start of the deck");
            return Ok(Navigation::AtStart);
        };
        self.state.current_index = index.checked_sub(1);
        self.state.deck.discard.pop();
        self.persist();
        Ok(Navigation::Retreated)
    }

    pub fn apply_named(&mut self, name: &str, n: Option<i64>) -> Result<(), SessionError> {
        let action: CardAction = name.parse()?;
        self.apply_action(action, n)
    }

    pub fn apply_action(&mut self, action: CardAction, n: Option<i64>) -> Result<(), SessionError> {
        self.require_deck()?;
        let index = self
            .state
            .current_index
            .filter(|index| *index < self.state.deck.combined.len())
            .ok_or_else(|| SessionError::InvalidState("no active card".to_string()))?;
        let deck = &mut self.state.deck;
        let name = deck.combined[index].name.clone();

        let message = match action {
            CardAction::ShuffleAnywhere => {
                deck.shuffle_anywhere(index, &mut self.rng);
                format!("\"{name}\" shuffled back into the deck")
            }
            CardAction::ShuffleTopN => {
                let n = match n {
                    Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
                    Some(n) => {
                        return Err(SessionError::InvalidIndex(format!(
                            "n must be at least 1, got {n}"
                        )))
                    }
                    None => {
                        return Err(SessionError::InvalidIndex(
                            "shuffleTopN needs n".to_string(),
                        ))
                    }
                };
                let placed = deck.shuffle_top_n(index, n, &mut self.rng);
                let n = placed.map_or(1, |(n, _)| n);
                format!("\"{name}\" shuffled into the next {n} cards")
            }
            CardAction::ReplaceSameType => {
                let current = &deck.combined[index];
                let Some(expr) = current.type_expr.clone().filter(|_| current.is_typed()) else {
                    return Err(SessionError::NoCandidates(String::new()));
                };
                let dealt: HashSet<&str> = deck
                    .combined
                    .iter()
                    .chain(deck.discard.iter())
                    .chain(deck.sentry.iter())
                    .map(|card| card.id.as_str())
                    .collect();
                let candidates: Vec<&Card> = self
                    .catalog
                    .cards_for(&self.state.selected_games)
                    .filter(|card| card.type_expr.as_deref() == Some(expr.as_str()))
                    .filter(|card| !dealt.contains(card.id.as_str()))
                    .collect();
                let replacement = self
                    .rng
                    .choose(&candidates)
                    .map(|card| (*card).clone())
                    .ok_or(SessionError::NoCandidates(expr))?;
                let message = format!("\"{name}\" replaced with \"{}\"", replacement.name);
                self.state.deck.combined[index] = replacement;
                message
            }
            CardAction::IntroduceSentry => {
                if deck.sentry.is_empty() {
                    return Err(SessionError::NoSentryCards);
                }
                if index + 1 >= deck.combined.len() {
                    return Err(SessionError::NoCardsAhead);
                }
                let count = deck.introduce_sentry(Some(index), &mut self.rng);
                format!("{count} Sentry cards shuffled into the remaining deck")
            }
        };
        debug!("{action}: {message}");
        self.notices.notify(NoticeKind::Info, message);
        self.persist();
        Ok(())
    }

    /// Resolves the id against the deck first, then the catalog.
    pub fn mark_in_play(&mut self, id: &str) -> Result<bool, SessionError> {
        let card = self
            .state
            .deck
            .find_card(id)
            .or_else(|| self.catalog.find_card(id))
            .cloned()
            .ok_or_else(|| SessionError::UnknownCard(id.to_string()))?;
        let added = self.state.deck.mark_in_play(card);
        self.persist();
        Ok(added)
    }

    pub fn clear_in_play(&mut self, id: &str) -> bool {
        let removed = self.state.deck.clear_in_play(id);
        self.persist();
        removed
    }

    pub fn clear_all_in_play(&mut self) -> usize {
        let cleared = self.state.deck.in_play.len();
        self.state.deck.in_play.clear();
        self.notices
            .notify(NoticeKind::Info, "All in-play cards have been cleared");
        self.persist();
        cleared
    }

    /// Back to `Empty`. Only display preferences may survive.
    pub fn reset(&mut self, keep_preferences: bool) {
        let preferences = self.state.preferences;
        self.state = SessionState::default();
        if keep_preferences {
            self.state.preferences = preferences;
        }
        self.index = CatalogIndex::default();
        if let Err(err) = self.store.remove() {
            warn!("could not clear session snapshot: {err}");
            self.notices.notify(
                NoticeKind::PersistenceFailure,
                format!("Saved session could not be cleared: {err}"),
            );
        }
        if keep_preferences {
            self.persist();
        }
        info!("session reset");
    }

    fn require_deck(&self) -> Result<(), SessionError> {
        match self.state.phase {
            Phase::Browsing => Ok(()),
            Phase::Empty => Err(SessionError::InvalidState(
                "no deck has been generated".to_string(),
            )),
        }
    }

    fn persist(&mut self) {
        let snapshot = SessionSnapshot::capture(&self.state);
        if let Err(err) = self.store.set(&snapshot) {
            warn!("could not save session snapshot: {err}");
            self.notices.notify(
                NoticeKind::PersistenceFailure,
                format!("Session could not be saved: {err}"),
            );
        }
    }
}
